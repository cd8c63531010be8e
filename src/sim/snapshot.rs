//! Read-only view of the state for the renderer and HUD

use glam::Vec2;
use serde::Serialize;

use super::character::Lifecycle;
use super::coin_field::Coin;
use super::obstacles::Obstacle;
use super::portal::PortalGate;
use super::powers::PowerStatus;
use super::state::{GamePhase, GameState, RunSummary};
use crate::profile::PowerCharges;

#[derive(Debug, Clone, Serialize)]
pub struct CharacterView {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub scale: f32,
    pub frame: u8,
    pub lifecycle: Lifecycle,
    pub shielded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RocketView {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    /// Still announcing itself; draw the warning marker instead
    pub warning: bool,
    pub ballistic: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalView {
    pub phase: &'static str,
    pub gate: Option<PortalGate>,
    pub transition_progress: f32,
    pub new_world: bool,
    pub timer_remaining_ms: Option<f64>,
    pub invincible: bool,
    pub next_threshold: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub time_ms: f64,
    pub score: u64,
    pub best_score: u64,
    pub run_currency: u64,
    pub charges: PowerCharges,
    pub character: CharacterView,
    pub obstacles: Vec<Obstacle>,
    pub rockets: Vec<RocketView>,
    pub coins: Vec<Coin>,
    pub powers: [PowerStatus; 3],
    pub shield_health: u8,
    pub burst_remaining_ms: f64,
    /// Progress of the gravity wave animation
    pub gravity_wave: Option<f32>,
    pub portal: PortalView,
    pub screen_shake: f32,
    pub summary: Option<RunSummary>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let now = state.time_ms;
        let c = &state.character;
        Self {
            phase: state.phase,
            time_ms: now,
            score: state.score,
            best_score: state.best_score,
            run_currency: state.run_currency,
            charges: state.charges,
            character: CharacterView {
                pos: c.pos,
                width: c.width,
                height: c.height,
                rotation: c.rotation,
                scale: c.scale,
                frame: c.frame,
                lifecycle: c.lifecycle,
                shielded: state.powers.shield.health() > 0 || state.powers.shield.is_breaking(),
            },
            obstacles: state.obstacles.obstacles.clone(),
            rockets: state
                .rockets
                .rockets
                .iter()
                .map(|r| RocketView {
                    pos: r.pos,
                    width: r.width,
                    height: r.height,
                    rotation: r.rotation(),
                    warning: r.is_warning(now),
                    ballistic: r.is_ballistic(),
                })
                .collect(),
            coins: state.coins.coins.clone(),
            powers: state.powers.statuses(now),
            shield_health: state.powers.shield.health(),
            burst_remaining_ms: state.powers.burst.remaining_ms(now),
            gravity_wave: state.powers.gravity.effect_progress(now),
            portal: PortalView {
                phase: state.portal.phase.name(),
                gate: state.portal.gate,
                transition_progress: state.portal.transition_progress,
                new_world: state.portal.is_new_world(),
                timer_remaining_ms: state.portal.timer_remaining_ms(now),
                invincible: state.portal.is_invincible(now),
                next_threshold: state.portal.threshold,
            },
            screen_shake: state.screen_shake,
            summary: state.summary.clone(),
        }
    }
}
