//! The player-controlled flyer
//!
//! Motion is expressed per tick. Several systems move the character (gravity,
//! the speed burst pin, portal scripting, autopilot), but the orchestrator picks
//! exactly one motion mode per tick so they never overwrite each other.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::CANVAS_HEIGHT;
use crate::tuning::CharacterTuning;

/// Number of wing animation frames
pub const ANIMATION_FRAMES: u8 = 3;

/// Lifecycle of the character within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Alive,
    /// Hit an obstacle or the bounds, falling
    Dying,
    /// Blown up by a rocket, falling
    Blasting,
    /// Fall finished
    Dead,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Vertical velocity (positive = down), units per tick
    pub vel_y: f32,
    /// Nose rotation in degrees (positive = nose down)
    pub rotation: f32,
    /// Render scale (shrinks while being pulled into a portal)
    pub scale: f32,
    pub frame: u8,
    last_frame_ms: f64,
    pub lifecycle: Lifecycle,
    /// Set while a scripted sequence owns the character
    pub input_locked: bool,
    /// Vertical velocity used by floating controls
    pub float_vel: f32,
}

impl Character {
    pub fn new(tuning: &CharacterTuning) -> Self {
        Self {
            pos: Vec2::new(tuning.home_x, tuning.start_y),
            width: tuning.width,
            height: tuning.height,
            vel_y: 0.0,
            rotation: 0.0,
            scale: 1.0,
            frame: 0,
            last_frame_ms: 0.0,
            lifecycle: Lifecycle::Alive,
            input_locked: false,
            float_vel: 0.0,
        }
    }

    pub fn reset(&mut self, tuning: &CharacterTuning) {
        *self = Self::new(tuning);
    }

    /// Collision box (sprite box shrunk by the hitbox inset)
    pub fn bounds(&self, tuning: &CharacterTuning) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
            .inset(tuning.hitbox_inset, tuning.hitbox_inset)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Move so the sprite is centred on `center`
    pub fn set_center(&mut self, center: Vec2) {
        self.pos = center - Vec2::new(self.width / 2.0, self.height / 2.0);
    }

    pub fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }

    /// Upward impulse. Returns false when the character cannot flap.
    pub fn flap(&mut self, tuning: &CharacterTuning) -> bool {
        if !self.is_alive() || self.input_locked {
            return false;
        }
        self.vel_y = tuning.flap_impulse;
        true
    }

    /// Normal flight: accelerate, clamp to terminal velocity, tilt with velocity
    pub fn apply_gravity(&mut self, tuning: &CharacterTuning, gravity_scale: f32) {
        self.vel_y = (self.vel_y + tuning.gravity * gravity_scale).min(tuning.terminal_velocity);
        self.pos.y += self.vel_y;
        self.rotation = (self.vel_y * tuning.rotation_per_velocity)
            .clamp(tuning.min_rotation, tuning.max_rotation);
    }

    /// Bob around the start height before the first flap
    pub fn auto_glide(&mut self, tuning: &CharacterTuning, now: f64) {
        let phase = (now * tuning.glide_speed as f64).sin() as f32;
        self.pos.y = tuning.start_y + phase * tuning.glide_amplitude;
        self.vel_y = 0.0;
        self.rotation = 0.0;
    }

    /// Hold altitude (speed burst)
    pub fn pin(&mut self, y: f32) {
        self.pos.y = y;
        self.vel_y = 0.0;
        self.rotation = 0.0;
    }

    /// Steer smoothly toward `target_y` without gravity
    pub fn autopilot(&mut self, tuning: &CharacterTuning, target_y: f32) {
        self.vel_y = ((target_y - self.pos.y) * tuning.autopilot_gain)
            .clamp(-tuning.autopilot_max_speed, tuning.autopilot_max_speed);
        self.pos.y += self.vel_y;
        self.rotation = (self.vel_y * tuning.rotation_per_velocity)
            .clamp(tuning.min_rotation, tuning.max_rotation);
    }

    /// Plane-like floating: held input accelerates, friction slows, bounds clamp
    pub fn apply_float(&mut self, tuning: &CharacterTuning, up: bool, down: bool) {
        if up {
            self.float_vel -= tuning.float_accel;
        }
        if down {
            self.float_vel += tuning.float_accel;
        }
        self.float_vel = (self.float_vel * tuning.float_friction)
            .clamp(-tuning.max_float_speed, tuning.max_float_speed);
        self.pos.y += self.float_vel;

        if self.pos.y < tuning.float_min_y {
            self.pos.y = tuning.float_min_y;
            self.float_vel = 0.0;
        }
        if self.pos.y > tuning.float_max_y {
            self.pos.y = tuning.float_max_y;
            self.float_vel = 0.0;
        }
        self.vel_y = self.float_vel;
        self.rotation = self.float_vel * tuning.rotation_per_velocity;
    }

    /// Keep the sprite between the ceiling and the ground line
    pub fn clamp_to_bounds(&mut self, ground_y: f32) {
        let max_y = ground_y - self.height;
        if self.pos.y < 0.0 {
            self.pos.y = 0.0;
            self.vel_y = self.vel_y.max(0.0);
        } else if self.pos.y > max_y {
            self.pos.y = max_y;
            self.vel_y = self.vel_y.min(0.0);
        }
    }

    /// Obstacle or bounds death
    pub fn start_death(&mut self, tuning: &CharacterTuning) {
        self.begin_fall(Lifecycle::Dying, tuning.death_bounce);
    }

    /// Rocket death
    pub fn start_rocket_death(&mut self, tuning: &CharacterTuning) {
        self.begin_fall(Lifecycle::Blasting, tuning.blast_bounce);
    }

    fn begin_fall(&mut self, lifecycle: Lifecycle, bounce: f32) {
        if !self.is_alive() {
            return;
        }
        self.lifecycle = lifecycle;
        self.vel_y = bounce;
        self.input_locked = true;
        self.scale = 1.0;
    }

    /// Advance the death fall. Returns true once the fall has finished.
    pub fn update_death_fall(&mut self, tuning: &CharacterTuning, ground_y: f32) -> bool {
        match self.lifecycle {
            Lifecycle::Dead => return true,
            Lifecycle::Alive => return false,
            Lifecycle::Dying | Lifecycle::Blasting => {}
        }

        self.vel_y = (self.vel_y + tuning.gravity).min(tuning.death_terminal_velocity);
        self.pos.y += self.vel_y;
        self.rotation += (tuning.max_rotation - self.rotation) * tuning.death_rotation_ease;

        let landed = self.pos.y + self.height >= ground_y;
        if landed {
            self.pos.y = ground_y - self.height;
        }
        if landed || self.pos.y > CANVAS_HEIGHT {
            self.lifecycle = Lifecycle::Dead;
            self.vel_y = 0.0;
            return true;
        }
        false
    }

    /// Above the ceiling or below the ground line
    pub fn is_out_of_bounds(&self, ground_y: f32) -> bool {
        self.pos.y < 0.0 || self.pos.y + self.height > ground_y
    }

    /// Cycle the wing frames
    pub fn animate(&mut self, tuning: &CharacterTuning, now: f64) {
        if now - self.last_frame_ms > tuning.frame_interval_ms {
            self.frame = (self.frame + 1) % ANIMATION_FRAMES;
            self.last_frame_ms = now;
        }
    }
}
