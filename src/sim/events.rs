//! Events and commands raised during a tick
//!
//! Subsystems never reach into each other. They push [`Command`]s (requests the
//! orchestrator must act on this tick) and [`GameEvent`]s (notifications for the
//! session, renderer and audio) into an [`EventQueue`]. The orchestrator drains the
//! commands exactly once per tick and forwards the events to the state's outbox.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacles::SegmentBreak;
use super::powers::{PowerError, PowerKind};
use super::state::GamePhase;
use crate::profile::Medal;

/// What ended a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Obstacle,
    Rocket,
    Bounds,
}

/// Why a rocket blew up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionCause {
    /// Hit the character
    Collision,
    /// Ballistic rocket reached the ground
    Ground,
}

/// Requests from a subsystem that the orchestrator carries out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Remove every obstacle (world swap)
    ClearObstacles,
    /// Remove every rocket (world swap)
    ClearHazards,
    /// Add screen shake, capped at 1.0
    Shake(f32),
    /// Start or stop the new-world coin field
    CoinField(bool),
}

/// Notifications emitted by the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    Flapped,
    ObstaclePassed { points: u64, score: u64 },
    SegmentBroken(SegmentBreak),
    CoinCollected { pos: Vec2, value: u64 },
    RocketWarning { y: f32 },
    RocketExploded { pos: Vec2, cause: ExplosionCause },
    PowerActivated(PowerKind),
    PowerRejected { kind: PowerKind, reason: PowerError },
    PowerExpired(PowerKind),
    PowerReady(PowerKind),
    ShieldAbsorbed { health: u8 },
    ShieldBroken,
    GravityWave { converted: usize },
    PortalOpened { pos: Vec2 },
    PortalMissed { next_threshold: u64 },
    PortalEntered,
    WorldSwapped { new_world: bool },
    ExitPortalOpened { pos: Vec2 },
    PortalCycleComplete { next_threshold: u64 },
    Died(DeathCause),
    GameOver {
        score: u64,
        best_score: u64,
        new_high_score: bool,
        currency_earned: u64,
        medal: Medal,
    },
}

/// Per-tick queue shared by all subsystems
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    commands: Vec<Command>,
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn command(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending commands; each command is delivered at most once
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Take all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_delivered_once() {
        let mut queue = EventQueue::default();
        queue.command(Command::ClearObstacles);
        queue.command(Command::Shake(0.3));
        assert_eq!(queue.take_commands().len(), 2);
        assert!(queue.take_commands().is_empty());
    }

    #[test]
    fn test_events_and_commands_are_separate() {
        let mut queue = EventQueue::default();
        queue.emit(GameEvent::Flapped);
        queue.command(Command::ClearHazards);
        assert_eq!(queue.events(), &[GameEvent::Flapped]);
        assert_eq!(queue.take_commands(), vec![Command::ClearHazards]);
        assert_eq!(queue.take_events(), vec![GameEvent::Flapped]);
    }
}
