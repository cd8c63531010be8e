//! Game state and core simulation types
//!
//! Every subsystem is an explicit instance owned here; nothing is global.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::character::Character;
use super::coin_field::CoinField;
use super::events::{DeathCause, EventQueue, GameEvent};
use super::obstacles::ObstacleManager;
use super::portal::PortalSystem;
use super::powers::PowerSystems;
use super::rockets::RocketManager;
use crate::profile::{Medal, PowerCharges};
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, character gliding
    Start,
    /// "Get ready", character gliding until the first real flap
    Ready,
    Playing,
    Paused,
    /// Hit an obstacle or the bounds, falling
    Dying,
    /// Blown up by a rocket, falling
    Blasting,
    GameOver,
}

/// Final tallies of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u64,
    pub best_score: u64,
    pub new_high_score: bool,
    pub currency_earned: u64,
    pub coins_collected: u32,
    pub medal: Medal,
    pub cause: DeathCause,
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    #[serde(skip, default = "unseeded_rng")]
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Simulation clock in milliseconds; frozen while paused or game over
    pub time_ms: f64,
    pub time_ticks: u64,
    pub score: u64,
    pub best_score: u64,
    /// Currency earned this run (passes and coins)
    pub run_currency: u64,
    /// Power charges available to spend
    pub charges: PowerCharges,
    /// Charges changed since the session last persisted them
    #[serde(skip)]
    pub charges_dirty: bool,
    pub character: Character,
    pub obstacles: ObstacleManager,
    pub rockets: RocketManager,
    pub powers: PowerSystems,
    pub portal: PortalSystem,
    pub coins: CoinField,
    /// Screen shake intensity (0-1, decays)
    pub screen_shake: f32,
    pub death_cause: Option<DeathCause>,
    pub summary: Option<RunSummary>,
    #[serde(skip)]
    pub(crate) queue: EventQueue,
    /// Events produced since the last `take_events`
    #[serde(skip)]
    outbox: Vec<GameEvent>,
}

fn unseeded_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

impl GameState {
    /// Create a new game state with the given seed and default balance
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Start,
            time_ms: 0.0,
            time_ticks: 0,
            score: 0,
            best_score: 0,
            run_currency: 0,
            charges: PowerCharges::uniform(tuning.economy.starter_charges),
            charges_dirty: false,
            character: Character::new(&tuning.character),
            obstacles: ObstacleManager::new(tuning.obstacles),
            rockets: RocketManager::new(tuning.rockets),
            powers: PowerSystems::new(tuning.shield, tuning.burst, tuning.gravity),
            portal: PortalSystem::new(tuning.portal),
            coins: CoinField::new(tuning.coins),
            screen_shake: 0.0,
            death_cause: None,
            summary: None,
            queue: EventQueue::default(),
            outbox: Vec::new(),
            tuning,
        }
    }

    /// Back to the title screen. Best score, charges and the RNG stream carry over.
    pub fn reset_run(&mut self) {
        self.character.reset(&self.tuning.character);
        self.obstacles.reset();
        self.rockets.reset();
        self.powers.reset();
        self.portal.reset();
        self.coins.reset();
        self.score = 0;
        self.run_currency = 0;
        self.screen_shake = 0.0;
        self.death_cause = None;
        self.summary = None;
        self.set_phase(GamePhase::Start);
    }

    pub fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("phase {from:?} -> {to:?}");
        self.phase = to;
        self.queue.emit(GameEvent::PhaseChanged { from, to });
    }

    pub fn add_shake(&mut self, amount: f32) {
        self.screen_shake = (self.screen_shake + amount).min(1.0);
    }

    /// Move this tick's events to the outbox
    pub(crate) fn flush_events(&mut self) {
        self.outbox.extend(self.queue.take_events());
    }

    /// Drain every event produced since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.flush_events();
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = GameState::new(1);
        assert_eq!(state.phase, GamePhase::Start);
        assert_eq!(state.charges, PowerCharges::uniform(1));
        assert_eq!(state.obstacles.speed(), 3.0);
    }

    #[test]
    fn test_reset_keeps_best_and_charges() {
        let mut state = GameState::new(1);
        state.phase = GamePhase::GameOver;
        state.score = 9;
        state.best_score = 9;
        state.charges.shield = 4;
        state.portal.threshold = 50;
        state.reset_run();

        assert_eq!(state.phase, GamePhase::Start);
        assert_eq!(state.score, 0);
        assert_eq!(state.best_score, 9);
        assert_eq!(state.charges.shield, 4);
        assert_eq!(state.portal.threshold, 5);
        assert_eq!(
            state.take_events(),
            vec![GameEvent::PhaseChanged {
                from: GamePhase::GameOver,
                to: GamePhase::Start
            }]
        );
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_shake_caps() {
        let mut state = GameState::new(1);
        state.add_shake(0.7);
        state.add_shake(0.7);
        assert_eq!(state.screen_shake, 1.0);
    }
}
