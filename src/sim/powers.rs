//! Timed power-ups: shield, speed burst, gravity invert
//!
//! Every power follows `Ready -> Active -> Cooldown -> Ready`. The shield adds a
//! short `Breaking` grace once its health is gone. Transitions that happen with
//! time are applied in `update`; readiness queries also account for elapsed
//! cooldowns so an activation on the exact tick a cooldown ends is accepted.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::events::{EventQueue, GameEvent};
use super::rockets::RocketManager;
use crate::progress;
use crate::tuning::{BurstTuning, GravityTuning, ShieldTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerKind {
    Shield,
    SpeedBurst,
    GravityInvert,
}

impl PowerKind {
    pub const ALL: [PowerKind; 3] = [PowerKind::Shield, PowerKind::SpeedBurst, PowerKind::GravityInvert];

    /// Parse the snake_case id used by the page and in saved data
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "shield" => Some(PowerKind::Shield),
            "speed_burst" => Some(PowerKind::SpeedBurst),
            "gravity_invert" => Some(PowerKind::GravityInvert),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PowerKind::Shield => "shield",
            PowerKind::SpeedBurst => "speed burst",
            PowerKind::GravityInvert => "gravity invert",
        }
    }
}

/// Why an activation was refused. A refused activation changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PowerError {
    #[error("powers can only be used while playing")]
    NotPlaying,
    #[error("the portal is busy")]
    PortalBusy,
    #[error("no charges left")]
    NoCharges,
    #[error("still cooling down")]
    OnCooldown,
    #[error("already active")]
    AlreadyActive,
    #[error("nothing to affect")]
    NoTargets,
}

/// Read-only view of one power for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerStatus {
    pub kind: PowerKind,
    pub ready: bool,
    pub active: bool,
    /// 0 right after activation, 1 once usable again
    pub cooldown_progress: f32,
}

/// Shared query surface of the timed powers
pub trait PowerSystem {
    fn kind(&self) -> PowerKind;
    fn is_ready(&self, now: f64) -> bool;
    fn is_active(&self, now: f64) -> bool;
    fn cooldown_progress(&self, now: f64) -> f32;
    fn reset(&mut self);

    fn status(&self, now: f64) -> PowerStatus {
        PowerStatus {
            kind: self.kind(),
            ready: self.is_ready(now),
            active: self.is_active(now),
            cooldown_progress: self.cooldown_progress(now),
        }
    }
}

// ---------------------------------------------------------------------------
// Speed burst
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BurstPhase {
    Ready,
    Active { started_ms: f64, pinned_y: f32 },
    Cooldown { since_ms: f64 },
}

/// Holds the character at its altitude, speeds up the world and makes the
/// character immune to collisions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedBurst {
    tuning: BurstTuning,
    pub phase: BurstPhase,
}

impl SpeedBurst {
    pub fn new(tuning: BurstTuning) -> Self {
        Self {
            tuning,
            phase: BurstPhase::Ready,
        }
    }

    pub fn activate(&mut self, now: f64, pinned_y: f32) -> Result<(), PowerError> {
        match self.phase {
            BurstPhase::Active { .. } => return Err(PowerError::AlreadyActive),
            BurstPhase::Cooldown { .. } if !self.is_ready(now) => return Err(PowerError::OnCooldown),
            _ => {}
        }
        self.phase = BurstPhase::Active {
            started_ms: now,
            pinned_y,
        };
        Ok(())
    }

    pub fn update(&mut self, now: f64, queue: &mut EventQueue) {
        match self.phase {
            BurstPhase::Active { started_ms, .. } if now - started_ms >= self.tuning.duration_ms => {
                log::info!("speed burst expired");
                self.phase = BurstPhase::Cooldown { since_ms: now };
                queue.emit(GameEvent::PowerExpired(PowerKind::SpeedBurst));
            }
            BurstPhase::Cooldown { since_ms } if now - since_ms >= self.tuning.cooldown_ms => {
                self.phase = BurstPhase::Ready;
                queue.emit(GameEvent::PowerReady(PowerKind::SpeedBurst));
            }
            _ => {}
        }
    }

    /// End an active burst early (death)
    pub fn cancel(&mut self, now: f64) {
        if matches!(self.phase, BurstPhase::Active { .. }) {
            self.phase = BurstPhase::Cooldown { since_ms: now };
        }
    }

    /// Altitude the character is held at while active
    pub fn pinned_y(&self, now: f64) -> Option<f32> {
        match self.phase {
            BurstPhase::Active { pinned_y, .. } if self.is_active(now) => Some(pinned_y),
            _ => None,
        }
    }

    pub fn remaining_ms(&self, now: f64) -> f64 {
        match self.phase {
            BurstPhase::Active { started_ms, .. } => {
                (self.tuning.duration_ms - (now - started_ms)).max(0.0)
            }
            _ => 0.0,
        }
    }
}

impl PowerSystem for SpeedBurst {
    fn kind(&self) -> PowerKind {
        PowerKind::SpeedBurst
    }

    fn is_ready(&self, now: f64) -> bool {
        match self.phase {
            BurstPhase::Ready => true,
            BurstPhase::Active { .. } => false,
            BurstPhase::Cooldown { since_ms } => now - since_ms >= self.tuning.cooldown_ms,
        }
    }

    fn is_active(&self, now: f64) -> bool {
        match self.phase {
            BurstPhase::Active { started_ms, .. } => now - started_ms < self.tuning.duration_ms,
            _ => false,
        }
    }

    fn cooldown_progress(&self, now: f64) -> f32 {
        match self.phase {
            BurstPhase::Ready => 1.0,
            BurstPhase::Active { .. } => 0.0,
            BurstPhase::Cooldown { since_ms } => progress(now - since_ms, self.tuning.cooldown_ms),
        }
    }

    fn reset(&mut self) {
        self.phase = BurstPhase::Ready;
    }
}

// ---------------------------------------------------------------------------
// Shield
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShieldPhase {
    Ready,
    Active { health: u8, last_hit_ms: Option<f64> },
    /// Health exhausted; still absorbs for a short grace
    Breaking { since_ms: f64 },
    Cooldown { since_ms: f64 },
}

/// Absorbs obstacle hits until its health runs out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shield {
    tuning: ShieldTuning,
    pub phase: ShieldPhase,
}

impl Shield {
    pub fn new(tuning: ShieldTuning) -> Self {
        Self {
            tuning,
            phase: ShieldPhase::Ready,
        }
    }

    pub fn activate(&mut self, now: f64) -> Result<(), PowerError> {
        match self.phase {
            ShieldPhase::Active { .. } | ShieldPhase::Breaking { .. } => {
                return Err(PowerError::AlreadyActive);
            }
            ShieldPhase::Cooldown { .. } if !self.is_ready(now) => return Err(PowerError::OnCooldown),
            _ => {}
        }
        self.phase = ShieldPhase::Active {
            health: self.tuning.max_hits,
            last_hit_ms: None,
        };
        Ok(())
    }

    /// Absorb a hit. Returns false when the shield is not up and the hit goes through.
    pub fn absorb_hit(&mut self, now: f64, queue: &mut EventQueue) -> bool {
        match self.phase {
            ShieldPhase::Active { health, last_hit_ms } => {
                let debounced = last_hit_ms.is_some_and(|last| now - last < self.tuning.hit_debounce_ms);
                if debounced {
                    return true;
                }
                let health = health.saturating_sub(1);
                queue.emit(GameEvent::ShieldAbsorbed { health });
                if health == 0 {
                    log::info!("shield broken");
                    self.phase = ShieldPhase::Breaking { since_ms: now };
                    queue.emit(GameEvent::ShieldBroken);
                } else {
                    self.phase = ShieldPhase::Active {
                        health,
                        last_hit_ms: Some(now),
                    };
                }
                true
            }
            ShieldPhase::Breaking { .. } => true,
            ShieldPhase::Ready | ShieldPhase::Cooldown { .. } => false,
        }
    }

    pub fn update(&mut self, now: f64, queue: &mut EventQueue) {
        match self.phase {
            ShieldPhase::Breaking { since_ms } if now - since_ms >= self.tuning.break_grace_ms => {
                self.phase = ShieldPhase::Cooldown { since_ms: now };
                queue.emit(GameEvent::PowerExpired(PowerKind::Shield));
            }
            ShieldPhase::Cooldown { since_ms } if now - since_ms >= self.tuning.cooldown_ms => {
                self.phase = ShieldPhase::Ready;
                queue.emit(GameEvent::PowerReady(PowerKind::Shield));
            }
            _ => {}
        }
    }

    pub fn health(&self) -> u8 {
        match self.phase {
            ShieldPhase::Active { health, .. } => health,
            _ => 0,
        }
    }

    pub fn is_breaking(&self) -> bool {
        matches!(self.phase, ShieldPhase::Breaking { .. })
    }
}

impl PowerSystem for Shield {
    fn kind(&self) -> PowerKind {
        PowerKind::Shield
    }

    fn is_ready(&self, now: f64) -> bool {
        match self.phase {
            ShieldPhase::Ready => true,
            ShieldPhase::Cooldown { since_ms } => now - since_ms >= self.tuning.cooldown_ms,
            _ => false,
        }
    }

    fn is_active(&self, _now: f64) -> bool {
        matches!(self.phase, ShieldPhase::Active { .. } | ShieldPhase::Breaking { .. })
    }

    fn cooldown_progress(&self, now: f64) -> f32 {
        match self.phase {
            ShieldPhase::Ready => 1.0,
            ShieldPhase::Cooldown { since_ms } => progress(now - since_ms, self.tuning.cooldown_ms),
            _ => 0.0,
        }
    }

    fn reset(&mut self) {
        self.phase = ShieldPhase::Ready;
    }
}

// ---------------------------------------------------------------------------
// Gravity invert
// ---------------------------------------------------------------------------

/// Knocks every flying rocket out of the sky
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityInvert {
    tuning: GravityTuning,
    last_used_ms: Option<f64>,
    ready_announced: bool,
}

impl GravityInvert {
    pub fn new(tuning: GravityTuning) -> Self {
        Self {
            tuning,
            last_used_ms: None,
            ready_announced: true,
        }
    }

    /// Convert every active rocket. Fails without touching anything when there is
    /// nothing to convert or the power is cooling down.
    pub fn activate<R: Rng>(
        &mut self,
        now: f64,
        rockets: &mut RocketManager,
        rng: &mut R,
    ) -> Result<usize, PowerError> {
        if !self.is_ready(now) {
            return Err(PowerError::OnCooldown);
        }
        if rockets.eligible_count(now) == 0 {
            return Err(PowerError::NoTargets);
        }
        let converted = rockets.activate_gravity(now, rng);
        self.last_used_ms = Some(now);
        self.ready_announced = false;
        Ok(converted)
    }

    pub fn update(&mut self, now: f64, queue: &mut EventQueue) {
        if !self.ready_announced && self.is_ready(now) {
            self.ready_announced = true;
            queue.emit(GameEvent::PowerReady(PowerKind::GravityInvert));
        }
    }

    /// Progress of the visual wave, if one is running
    pub fn effect_progress(&self, now: f64) -> Option<f32> {
        self.last_used_ms
            .filter(|used| now - used < self.tuning.effect_ms)
            .map(|used| progress(now - used, self.tuning.effect_ms))
    }
}

impl PowerSystem for GravityInvert {
    fn kind(&self) -> PowerKind {
        PowerKind::GravityInvert
    }

    fn is_ready(&self, now: f64) -> bool {
        self.last_used_ms
            .is_none_or(|used| now - used >= self.tuning.cooldown_ms)
    }

    fn is_active(&self, now: f64) -> bool {
        self.effect_progress(now).is_some()
    }

    fn cooldown_progress(&self, now: f64) -> f32 {
        match self.last_used_ms {
            None => 1.0,
            Some(used) => progress(now - used, self.tuning.cooldown_ms),
        }
    }

    fn reset(&mut self) {
        self.last_used_ms = None;
        self.ready_announced = true;
    }
}

/// All three powers, owned by the game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerSystems {
    pub shield: Shield,
    pub burst: SpeedBurst,
    pub gravity: GravityInvert,
}

impl PowerSystems {
    pub fn new(shield: ShieldTuning, burst: BurstTuning, gravity: GravityTuning) -> Self {
        Self {
            shield: Shield::new(shield),
            burst: SpeedBurst::new(burst),
            gravity: GravityInvert::new(gravity),
        }
    }

    pub fn update(&mut self, now: f64, queue: &mut EventQueue) {
        self.shield.update(now, queue);
        self.burst.update(now, queue);
        self.gravity.update(now, queue);
    }

    pub fn get(&self, kind: PowerKind) -> &dyn PowerSystem {
        match kind {
            PowerKind::Shield => &self.shield,
            PowerKind::SpeedBurst => &self.burst,
            PowerKind::GravityInvert => &self.gravity,
        }
    }

    pub fn statuses(&self, now: f64) -> [PowerStatus; 3] {
        PowerKind::ALL.map(|kind| self.get(kind).status(now))
    }

    pub fn reset(&mut self) {
        self.shield.reset();
        self.burst.reset();
        self.gravity.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rockets::{Rocket, RocketMode};
    use crate::tuning::RocketTuning;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_power_ids_match_serde() {
        for kind in PowerKind::ALL {
            let id = serde_json::to_value(kind).unwrap();
            assert_eq!(PowerKind::from_id(id.as_str().unwrap()), Some(kind));
        }
        assert_eq!(PowerKind::from_id("teleport"), None);
        assert_eq!(PowerKind::from_id("Shield"), None);
    }

    #[test]
    fn test_burst_lifecycle() {
        let mut burst = SpeedBurst::new(BurstTuning::default());
        let mut queue = EventQueue::default();

        burst.activate(1000.0, 250.0).expect("ready burst activates");
        assert!(burst.is_active(1000.0));
        assert_eq!(burst.pinned_y(3000.0), Some(250.0));
        assert_eq!(burst.activate(2000.0, 0.0), Err(PowerError::AlreadyActive));

        burst.update(5999.0, &mut queue);
        assert!(burst.is_active(5999.0));
        burst.update(6000.0, &mut queue);
        assert!(!burst.is_active(6000.0));
        assert_eq!(burst.pinned_y(6000.0), None);
        assert_eq!(queue.take_events(), vec![GameEvent::PowerExpired(PowerKind::SpeedBurst)]);

        assert_eq!(burst.activate(7000.0, 0.0), Err(PowerError::OnCooldown));
        assert!((burst.cooldown_progress(10000.0) - 0.5).abs() < 1e-6);
        burst.update(14000.0, &mut queue);
        assert!(burst.is_ready(14000.0));
        assert_eq!(queue.take_events(), vec![GameEvent::PowerReady(PowerKind::SpeedBurst)]);
    }

    #[test]
    fn test_burst_cancel() {
        let mut burst = SpeedBurst::new(BurstTuning::default());
        burst.activate(0.0, 100.0).unwrap();
        burst.cancel(1000.0);
        assert!(!burst.is_active(1000.0));
        assert!(matches!(burst.phase, BurstPhase::Cooldown { since_ms } if since_ms == 1000.0));
    }

    #[test]
    fn test_shield_absorbs_three_hits_with_debounce() {
        let mut shield = Shield::new(ShieldTuning::default());
        let mut queue = EventQueue::default();
        assert!(!shield.absorb_hit(0.0, &mut queue));

        shield.activate(0.0).unwrap();
        assert_eq!(shield.health(), 3);

        assert!(shield.absorb_hit(100.0, &mut queue));
        assert_eq!(shield.health(), 2);
        // Inside the debounce window: absorbed, not counted
        assert!(shield.absorb_hit(400.0, &mut queue));
        assert_eq!(shield.health(), 2);
        assert!(shield.absorb_hit(600.0, &mut queue));
        assert_eq!(shield.health(), 1);
        assert!(shield.absorb_hit(1200.0, &mut queue));
        assert!(shield.is_breaking());
        assert!(queue.events().contains(&GameEvent::ShieldBroken));

        // Breaking still absorbs
        assert!(shield.absorb_hit(1300.0, &mut queue));
        shield.update(1500.0, &mut queue);
        assert!(matches!(shield.phase, ShieldPhase::Cooldown { .. }));
        assert!(!shield.absorb_hit(1600.0, &mut queue));
        assert_eq!(shield.activate(2000.0), Err(PowerError::OnCooldown));

        shield.update(3500.0, &mut queue);
        assert!(shield.is_ready(3500.0));
        shield.activate(3500.0).unwrap();
        assert_eq!(shield.health(), 3);
    }

    #[test]
    fn test_shield_rejects_double_activation() {
        let mut shield = Shield::new(ShieldTuning::default());
        shield.activate(0.0).unwrap();
        assert_eq!(shield.activate(10.0), Err(PowerError::AlreadyActive));
    }

    fn rockets_with_active(count: usize) -> RocketManager {
        let mut rockets = RocketManager::new(RocketTuning::default());
        for i in 0..count {
            rockets.rockets.push(Rocket {
                id: i as u32 + 1,
                pos: Vec2::new(200.0 + i as f32 * 60.0, 150.0),
                width: 56.0,
                height: 40.0,
                speed: 4.0,
                spawn_ms: 0.0,
                warning_ms: 800.0,
                formation_id: 1,
                mode: RocketMode::Normal,
            });
        }
        rockets
    }

    #[test]
    fn test_gravity_without_targets_changes_nothing() {
        let mut gravity = GravityInvert::new(GravityTuning::default());
        let mut rockets = rockets_with_active(0);
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(gravity.activate(1000.0, &mut rockets, &mut rng), Err(PowerError::NoTargets));
        assert!(gravity.is_ready(1000.0));
        assert_eq!(gravity.cooldown_progress(1000.0), 1.0);
    }

    #[test]
    fn test_gravity_converts_and_cools_down() {
        let mut gravity = GravityInvert::new(GravityTuning::default());
        let mut rockets = rockets_with_active(2);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut queue = EventQueue::default();

        assert_eq!(gravity.activate(1000.0, &mut rockets, &mut rng), Ok(2));
        assert!(rockets.rockets.iter().all(|r| r.is_ballistic()));
        assert!(gravity.is_active(2000.0));
        assert!(!gravity.is_active(3000.0));

        let mut more = rockets_with_active(1);
        assert_eq!(gravity.activate(5000.0, &mut more, &mut rng), Err(PowerError::OnCooldown));

        gravity.update(10999.0, &mut queue);
        assert!(queue.events().is_empty());
        gravity.update(11000.0, &mut queue);
        assert_eq!(queue.take_events(), vec![GameEvent::PowerReady(PowerKind::GravityInvert)]);
    }

    #[test]
    fn test_statuses() {
        let mut powers = PowerSystems::new(
            ShieldTuning::default(),
            BurstTuning::default(),
            GravityTuning::default(),
        );
        powers.shield.activate(0.0).unwrap();
        let statuses = powers.statuses(0.0);
        assert_eq!(statuses[0].kind, PowerKind::Shield);
        assert!(statuses[0].active);
        assert!(!statuses[0].ready);
        assert!(statuses[1].ready);
        assert_eq!(statuses[2].cooldown_progress, 1.0);

        powers.reset();
        assert!(powers.statuses(0.0).iter().all(|s| s.ready && !s.active));
    }
}
