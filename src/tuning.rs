//! Data-driven game balance
//!
//! Every gameplay constant lives here so a JSON file can override any subset of
//! them. Missing fields fall back to the defaults below.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};

/// Errors raised while loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning field `{field}` must be {requirement}")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
    },
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub character: CharacterTuning,
    pub obstacles: ObstacleTuning,
    pub rockets: RocketTuning,
    pub burst: BurstTuning,
    pub shield: ShieldTuning,
    pub gravity: GravityTuning,
    pub portal: PortalTuning,
    pub coins: CoinTuning,
    pub economy: EconomyTuning,
}

impl Tuning {
    /// Parse a (possibly partial) tuning document and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would break simulation invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        fn check(ok: bool, field: &'static str, requirement: &'static str) -> Result<(), TuningError> {
            if ok {
                Ok(())
            } else {
                Err(TuningError::Invalid { field, requirement })
            }
        }

        let c = &self.character;
        check(c.gravity > 0.0, "character.gravity", "positive")?;
        check(c.flap_impulse < 0.0, "character.flap_impulse", "negative (upward)")?;
        check(c.terminal_velocity > 0.0, "character.terminal_velocity", "positive")?;
        check(
            c.death_terminal_velocity >= c.terminal_velocity,
            "character.death_terminal_velocity",
            "at least character.terminal_velocity",
        )?;
        check(c.min_rotation < c.max_rotation, "character.min_rotation", "below max_rotation")?;

        let o = &self.obstacles;
        check(o.width > 0.0, "obstacles.width", "positive")?;
        check(
            o.gap_margin * 2.0 + o.gap < CANVAS_HEIGHT,
            "obstacles.gap",
            "small enough to fit between both margins",
        )?;
        check(o.spawn_interval_ms > 0.0, "obstacles.spawn_interval_ms", "positive")?;

        let r = &self.rockets;
        check(r.lane_count >= 2, "rockets.lane_count", "at least 2")?;
        check(r.formations_per_wave >= 1, "rockets.formations_per_wave", "at least 1")?;
        check(
            r.formation_delay_min_ms <= r.formation_delay_max_ms,
            "rockets.formation_delay_min_ms",
            "not above formation_delay_max_ms",
        )?;
        check(r.min_speed <= r.max_speed, "rockets.min_speed", "not above max_speed")?;
        check(
            (r.band_bottom() - r.min_y) / r.lane_count as f32 >= r.height,
            "rockets.lane_count",
            "small enough that every lane fits a rocket",
        )?;

        check(self.shield.max_hits >= 1, "shield.max_hits", "at least 1")?;
        check(self.portal.score_multiplier >= 1, "portal.score_multiplier", "at least 1")?;
        check(self.portal.max_radius > 0.0, "portal.max_radius", "positive")?;
        Ok(())
    }
}

/// Player character physics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterTuning {
    pub width: f32,
    pub height: f32,
    /// Fixed horizontal position
    pub home_x: f32,
    pub start_y: f32,
    pub gravity: f32,
    pub flap_impulse: f32,
    pub terminal_velocity: f32,
    pub death_terminal_velocity: f32,
    /// Upward kick when hitting an obstacle or the ground
    pub death_bounce: f32,
    /// Upward kick when blown up by a rocket
    pub blast_bounce: f32,
    /// Degrees of nose rotation per unit of vertical velocity
    pub rotation_per_velocity: f32,
    pub min_rotation: f32,
    pub max_rotation: f32,
    /// Fraction of the remaining angle covered per tick while falling dead
    pub death_rotation_ease: f32,
    pub glide_amplitude: f32,
    /// Radians per millisecond
    pub glide_speed: f32,
    pub hitbox_inset: f32,
    pub frame_interval_ms: f64,
    pub float_accel: f32,
    pub float_friction: f32,
    pub max_float_speed: f32,
    pub float_min_y: f32,
    pub float_max_y: f32,
    pub autopilot_gain: f32,
    pub autopilot_max_speed: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            width: 51.0,
            height: 36.0,
            home_x: CANVAS_WIDTH / 4.0,
            start_y: CANVAS_HEIGHT / 2.0,
            gravity: 0.5,
            flap_impulse: -10.0,
            terminal_velocity: 6.0,
            death_terminal_velocity: 15.0,
            death_bounce: -6.0,
            blast_bounce: -9.0,
            rotation_per_velocity: 3.0,
            min_rotation: -30.0,
            max_rotation: 90.0,
            death_rotation_ease: 0.08,
            glide_amplitude: 10.0,
            glide_speed: 0.004,
            hitbox_inset: 5.0,
            frame_interval_ms: 100.0,
            float_accel: 0.15,
            float_friction: 0.92,
            max_float_speed: 4.0,
            float_min_y: 50.0,
            float_max_y: CANVAS_HEIGHT - 100.0,
            autopilot_gain: 0.08,
            autopilot_max_speed: 4.0,
        }
    }
}

/// Pipe pairs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    pub width: f32,
    pub gap: f32,
    /// Minimum distance between the gap and the top/bottom of the canvas
    pub gap_margin: f32,
    pub spawn_interval_ms: f64,
    pub base_speed: f32,
    pub burst_speed: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            width: 70.0,
            gap: 150.0,
            gap_margin: 100.0,
            spawn_interval_ms: 1800.0,
            base_speed: 3.0,
            burst_speed: 5.0,
        }
    }
}

/// Rocket hazard waves
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RocketTuning {
    pub width: f32,
    pub height: f32,
    pub score_threshold: u64,
    pub warning_ms: f64,
    /// Top of the band rockets fly in
    pub min_y: f32,
    /// Distance from the canvas bottom to the bottom of the band
    pub band_bottom_margin: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub lane_count: u32,
    pub formations_per_wave: u32,
    pub formation_delay_min_ms: f64,
    pub formation_delay_max_ms: f64,
    pub wave_interval_ms: f64,
    pub min_wave_interval_ms: f64,
    /// Points past the threshold over which the wave interval shrinks
    pub difficulty_ramp: f32,
    /// Horizontal spacing between rockets of one formation
    pub stagger_x: f32,
    pub hitbox_inset_x: f32,
    pub hitbox_inset_y: f32,
    pub offscreen_margin: f32,
    pub ballistic_gravity: f32,
    pub ballistic_terminal: f32,
    pub ballistic_drag: f32,
    pub ballistic_speed_decay: f32,
    pub ballistic_spin_accel: f32,
}

impl RocketTuning {
    /// Bottom of the band rockets fly in
    pub fn band_bottom(&self) -> f32 {
        CANVAS_HEIGHT - self.band_bottom_margin
    }
}

impl Default for RocketTuning {
    fn default() -> Self {
        Self {
            width: 56.0,
            height: 40.0,
            score_threshold: 10,
            warning_ms: 800.0,
            min_y: 60.0,
            band_bottom_margin: 100.0,
            min_speed: 3.0,
            max_speed: 5.0,
            lane_count: 3,
            formations_per_wave: 3,
            formation_delay_min_ms: 1200.0,
            formation_delay_max_ms: 2200.0,
            wave_interval_ms: 3000.0,
            min_wave_interval_ms: 1500.0,
            difficulty_ramp: 30.0,
            stagger_x: 70.0,
            hitbox_inset_x: 4.0,
            hitbox_inset_y: 2.0,
            offscreen_margin: 20.0,
            ballistic_gravity: 0.6,
            ballistic_terminal: 15.0,
            ballistic_drag: 0.99,
            ballistic_speed_decay: 0.95,
            ballistic_spin_accel: 0.01,
        }
    }
}

/// Speed burst / invincibility
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstTuning {
    pub duration_ms: f64,
    pub cooldown_ms: f64,
}

impl Default for BurstTuning {
    fn default() -> Self {
        Self {
            duration_ms: 5000.0,
            cooldown_ms: 8000.0,
        }
    }
}

/// Shield
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldTuning {
    pub max_hits: u8,
    /// Window after an accepted hit during which further overlaps are absorbed for free
    pub hit_debounce_ms: f64,
    pub break_grace_ms: f64,
    pub cooldown_ms: f64,
}

impl Default for ShieldTuning {
    fn default() -> Self {
        Self {
            max_hits: 3,
            hit_debounce_ms: 500.0,
            break_grace_ms: 300.0,
            cooldown_ms: 2000.0,
        }
    }
}

/// Gravity invert
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityTuning {
    pub cooldown_ms: f64,
    /// How long the activation wave stays visible
    pub effect_ms: f64,
}

impl Default for GravityTuning {
    fn default() -> Self {
        Self {
            cooldown_ms: 10000.0,
            effect_ms: 2000.0,
        }
    }
}

/// Portal world switch
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalTuning {
    pub initial_trigger_score: u64,
    pub success_threshold_step: u64,
    pub miss_threshold_step: u64,
    pub entry_pos: Vec2,
    pub exit_pos: Vec2,
    pub max_radius: f32,
    /// Extra reach around the gate radius that still captures the character
    pub capture_margin: f32,
    pub spawn_ms: f64,
    pub open_window_ms: f64,
    pub suck_ms: f64,
    pub transition_ms: f64,
    pub new_world_ms: f64,
    pub pipe_grace_ms: f64,
    pub invincibility_ms: f64,
    pub rearm_delay_ms: f64,
    pub autopilot: bool,
    pub gravity_multiplier: f32,
    pub score_multiplier: u64,
    /// Use floating controls instead of scaled gravity inside the new world
    pub float_controls: bool,
}

impl Default for PortalTuning {
    fn default() -> Self {
        Self {
            initial_trigger_score: 5,
            success_threshold_step: 30,
            miss_threshold_step: 15,
            entry_pos: Vec2::new(170.0, 200.0),
            exit_pos: Vec2::new(170.0, 330.0),
            max_radius: 50.0,
            capture_margin: 10.0,
            spawn_ms: 1500.0,
            open_window_ms: 20000.0,
            suck_ms: 1500.0,
            transition_ms: 1200.0,
            new_world_ms: 20000.0,
            pipe_grace_ms: 3000.0,
            invincibility_ms: 3000.0,
            rearm_delay_ms: 3000.0,
            autopilot: true,
            gravity_multiplier: 0.5,
            score_multiplier: 2,
            float_controls: false,
        }
    }
}

/// Coin field inside the new world
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinTuning {
    pub spawn_interval_ms: f64,
    pub speed: f32,
    pub size: f32,
    pub collect_radius: f32,
    pub value: u64,
}

impl Default for CoinTuning {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 800.0,
            speed: 3.0,
            size: 30.0,
            collect_radius: 25.0,
            value: 1,
        }
    }
}

/// Currency and shop prices
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    pub currency_per_point: u64,
    pub shield_price: u64,
    pub burst_price: u64,
    pub gravity_price: u64,
    pub skin_price: u64,
    pub starter_charges: u32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            currency_per_point: 1,
            shield_price: 50,
            burst_price: 40,
            gravity_price: 60,
            skin_price: 150,
            starter_charges: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{ "obstacles": { "gap": 180.0 }, "portal": { "autopilot": false } }"#)
            .expect("partial tuning should parse");
        assert_eq!(tuning.obstacles.gap, 180.0);
        assert_eq!(tuning.obstacles.width, 70.0);
        assert!(!tuning.portal.autopilot);
        assert_eq!(tuning.portal.score_multiplier, 2);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = Tuning::from_json(r#"{ "character": { "flap_impulse": 4.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "character.flap_impulse",
                ..
            }
        ));

        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_lane_fit_validation() {
        let mut tuning = Tuning::default();
        tuning.rockets.lane_count = 50;
        assert!(tuning.validate().is_err());
    }
}
