//! Portal Flap - a side-scrolling flyer with power-ups and a portal world
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawning, collisions, power systems, portal)
//! - `tuning`: Data-driven game balance
//! - `profile` / `persistence`: High score, currency and owned power charges
//! - `shop`: Spending currency on charges and skins
//! - `session`: Frame driver tying the simulation to storage

pub mod persistence;
pub mod profile;
pub mod session;
pub mod shop;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use profile::{Medal, Profile};
pub use session::Session;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz; velocities are per tick)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame gap fed into the accumulator (tab switches, breakpoints)
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Playfield dimensions
    pub const CANVAS_WIDTH: f32 = 400.0;
    pub const CANVAS_HEIGHT: f32 = 600.0;
    pub const GROUND_HEIGHT: f32 = 80.0;
    pub const GROUND_Y: f32 = CANVAS_HEIGHT - GROUND_HEIGHT;
}

/// Fraction of `duration` covered by `elapsed`, clamped to [0, 1]
#[inline]
pub fn progress(elapsed: f64, duration: f64) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0) as f32
}

/// Cubic ease-out
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Cubic ease-in-out
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
