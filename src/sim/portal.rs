//! Portal world switch
//!
//! ```text
//! Inactive -> EntryOpen -> SuckIn -> TransitioningIn -> NewWorld
//!    ^           |(miss)                                   |
//!    |           v                                         v
//!    +------ Cooldown <- TransitioningOut <- SuckOut <- ExitOpen
//! ```
//!
//! While the portal scripts the character (suck-in/out and the transitions) it
//! owns the character's position; the orchestrator skips every other motion
//! source and all danger checks.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::character::Character;
use super::collision::circle_contains;
use super::events::{Command, EventQueue, GameEvent};
use crate::consts::CANVAS_HEIGHT;
use crate::tuning::{CharacterTuning, PortalTuning};
use crate::{ease_in_out_cubic, ease_out_cubic, progress};

/// Turns of the spiral while being pulled in
const SPIRAL_TURNS: f32 = 2.0;
/// Gate spin per tick (radians)
const GATE_SPIN: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PortalPhase {
    Inactive,
    EntryOpen { opened_ms: f64 },
    SuckIn { started_ms: f64, from: Vec2 },
    TransitioningIn { started_ms: f64 },
    NewWorld { entered_ms: f64 },
    ExitOpen { opened_ms: f64 },
    SuckOut { started_ms: f64, from: Vec2 },
    TransitioningOut { started_ms: f64 },
    Cooldown { started_ms: f64 },
}

impl PortalPhase {
    pub fn name(&self) -> &'static str {
        match self {
            PortalPhase::Inactive => "inactive",
            PortalPhase::EntryOpen { .. } => "entry_open",
            PortalPhase::SuckIn { .. } => "suck_in",
            PortalPhase::TransitioningIn { .. } => "transitioning_in",
            PortalPhase::NewWorld { .. } => "new_world",
            PortalPhase::ExitOpen { .. } => "exit_open",
            PortalPhase::SuckOut { .. } => "suck_out",
            PortalPhase::TransitioningOut { .. } => "transitioning_out",
            PortalPhase::Cooldown { .. } => "cooldown",
        }
    }
}

/// A visible portal gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortalGate {
    pub pos: Vec2,
    pub radius: f32,
    pub alpha: f32,
    pub rotation: f32,
}

impl PortalGate {
    fn new(pos: Vec2) -> Self {
        Self {
            pos,
            radius: 0.0,
            alpha: 0.0,
            rotation: 0.0,
        }
    }

    fn grow(&mut self, t: f32, max_radius: f32) {
        self.radius = max_radius * ease_out_cubic(t);
        self.alpha = t;
        self.rotation = (self.rotation + GATE_SPIN) % TAU;
    }

    /// Open enough and close enough to pull the character in
    pub fn captures(&self, point: Vec2, margin: f32) -> bool {
        self.alpha >= 0.5 && circle_contains(self.pos, self.radius + margin, point)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSystem {
    tuning: PortalTuning,
    pub phase: PortalPhase,
    /// Score at which the next entry gate opens
    pub threshold: u64,
    pub has_triggered: bool,
    pub gate: Option<PortalGate>,
    /// Radial wipe progress while transitioning
    pub transition_progress: f32,
    new_world: bool,
    invincible_until_ms: Option<f64>,
    autopilot: bool,
    pipes_resume_ms: Option<f64>,
}

impl PortalSystem {
    pub fn new(tuning: PortalTuning) -> Self {
        Self {
            tuning,
            phase: PortalPhase::Inactive,
            threshold: tuning.initial_trigger_score,
            has_triggered: false,
            gate: None,
            transition_progress: 0.0,
            new_world: false,
            invincible_until_ms: None,
            autopilot: false,
            pipes_resume_ms: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }

    pub fn can_trigger(&self, score: u64) -> bool {
        !self.has_triggered && score >= self.threshold && self.phase == PortalPhase::Inactive
    }

    pub fn is_new_world(&self) -> bool {
        self.new_world
    }

    pub fn score_multiplier(&self) -> u64 {
        if self.new_world {
            self.tuning.score_multiplier
        } else {
            1
        }
    }

    pub fn gravity_multiplier(&self) -> f32 {
        if self.new_world {
            self.tuning.gravity_multiplier
        } else {
            1.0
        }
    }

    /// Floating controls replace gravity inside the new world
    pub fn uses_float_controls(&self) -> bool {
        self.new_world && self.tuning.float_controls
    }

    /// The portal owns the character's motion
    pub fn is_scripted(&self) -> bool {
        matches!(
            self.phase,
            PortalPhase::SuckIn { .. }
                | PortalPhase::TransitioningIn { .. }
                | PortalPhase::SuckOut { .. }
                | PortalPhase::TransitioningOut { .. }
        )
    }

    /// Obstacles and rockets can hurt the character in this phase
    pub fn allows_danger(&self, now: f64) -> bool {
        matches!(
            self.phase,
            PortalPhase::Inactive | PortalPhase::EntryOpen { .. } | PortalPhase::Cooldown { .. }
        ) && !self.is_invincible(now)
    }

    pub fn is_invincible(&self, now: f64) -> bool {
        self.invincible_until_ms.is_some_and(|until| now < until)
    }

    pub fn autopilot_active(&self) -> bool {
        self.autopilot
    }

    pub fn cancel_autopilot(&mut self) {
        if self.autopilot {
            log::debug!("autopilot cancelled by input");
            self.autopilot = false;
        }
    }

    /// Spawning pauses while a gate is open and resumes once it closes
    pub fn should_spawn_pipes(&self, now: f64) -> bool {
        if self.new_world || self.is_scripted() {
            return false;
        }
        if matches!(
            self.phase,
            PortalPhase::EntryOpen { .. } | PortalPhase::ExitOpen { .. }
        ) {
            return false;
        }
        self.pipes_resume_ms.is_none_or(|at| now >= at)
    }

    /// Time left on the current countdown (entry window or new-world timer)
    pub fn timer_remaining_ms(&self, now: f64) -> Option<f64> {
        match self.phase {
            PortalPhase::EntryOpen { opened_ms } => {
                Some((self.tuning.open_window_ms - (now - opened_ms)).max(0.0))
            }
            PortalPhase::NewWorld { entered_ms } => {
                Some((self.tuning.new_world_ms - (now - entered_ms)).max(0.0))
            }
            _ => None,
        }
    }

    /// Where autopilot steers the character
    pub fn autopilot_target_y(&self) -> f32 {
        CANVAS_HEIGHT / 3.0
    }

    pub fn update(
        &mut self,
        now: f64,
        score: u64,
        character: &mut Character,
        character_tuning: &CharacterTuning,
        queue: &mut EventQueue,
    ) {
        if self.autopilot && !self.is_invincible(now) {
            self.autopilot = false;
        }

        let t = self.tuning;
        match self.phase {
            PortalPhase::Inactive => {
                if self.can_trigger(score) {
                    log::info!("entry portal opened at score {score}");
                    self.has_triggered = true;
                    self.gate = Some(PortalGate::new(t.entry_pos));
                    self.phase = PortalPhase::EntryOpen { opened_ms: now };
                    queue.emit(GameEvent::PortalOpened { pos: t.entry_pos });
                }
            }
            PortalPhase::EntryOpen { opened_ms } => {
                if self.grow_and_capture(now, opened_ms, character) {
                    log::info!("character entered the portal");
                    character.input_locked = true;
                    self.phase = PortalPhase::SuckIn {
                        started_ms: now,
                        from: character.center(),
                    };
                    queue.emit(GameEvent::PortalEntered);
                } else if now - opened_ms >= t.open_window_ms {
                    self.threshold += t.miss_threshold_step;
                    self.has_triggered = false;
                    self.gate = None;
                    self.phase = PortalPhase::Cooldown { started_ms: now };
                    log::info!("portal missed, next at score {}", self.threshold);
                    queue.emit(GameEvent::PortalMissed {
                        next_threshold: self.threshold,
                    });
                }
            }
            PortalPhase::SuckIn { started_ms, from } => {
                if self.pull(now, started_ms, from, character) {
                    self.gate = None;
                    self.phase = PortalPhase::TransitioningIn { started_ms: now };
                }
            }
            PortalPhase::TransitioningIn { started_ms } => {
                self.transition_progress = progress(now - started_ms, t.transition_ms);
                if self.transition_progress >= 1.0 {
                    self.transition_progress = 0.0;
                    self.new_world = true;
                    self.place_after_transition(character, character_tuning);
                    queue.command(Command::ClearObstacles);
                    queue.command(Command::ClearHazards);
                    queue.command(Command::CoinField(true));
                    self.phase = PortalPhase::NewWorld { entered_ms: now };
                    log::info!("entered new world");
                    queue.emit(GameEvent::WorldSwapped { new_world: true });
                }
            }
            PortalPhase::NewWorld { entered_ms } => {
                if now - entered_ms >= t.new_world_ms {
                    self.gate = Some(PortalGate::new(t.exit_pos));
                    self.phase = PortalPhase::ExitOpen { opened_ms: now };
                    log::info!("exit portal opened");
                    queue.emit(GameEvent::ExitPortalOpened { pos: t.exit_pos });
                }
            }
            PortalPhase::ExitOpen { opened_ms } => {
                if self.grow_and_capture(now, opened_ms, character) {
                    character.input_locked = true;
                    self.phase = PortalPhase::SuckOut {
                        started_ms: now,
                        from: character.center(),
                    };
                    queue.emit(GameEvent::PortalEntered);
                }
            }
            PortalPhase::SuckOut { started_ms, from } => {
                if self.pull(now, started_ms, from, character) {
                    self.gate = None;
                    self.phase = PortalPhase::TransitioningOut { started_ms: now };
                }
            }
            PortalPhase::TransitioningOut { started_ms } => {
                self.transition_progress = progress(now - started_ms, t.transition_ms);
                if self.transition_progress >= 1.0 {
                    self.transition_progress = 0.0;
                    self.new_world = false;
                    self.place_after_transition(character, character_tuning);
                    queue.command(Command::ClearObstacles);
                    queue.command(Command::ClearHazards);
                    queue.command(Command::CoinField(false));

                    self.threshold += t.success_threshold_step;
                    self.has_triggered = false;
                    self.pipes_resume_ms = Some(now + t.pipe_grace_ms);
                    self.invincible_until_ms = Some(now + t.invincibility_ms);
                    self.autopilot = t.autopilot;
                    self.phase = PortalPhase::Cooldown { started_ms: now };
                    log::info!("back in the normal world, next portal at score {}", self.threshold);
                    queue.emit(GameEvent::WorldSwapped { new_world: false });
                    queue.emit(GameEvent::PortalCycleComplete {
                        next_threshold: self.threshold,
                    });
                }
            }
            PortalPhase::Cooldown { started_ms } => {
                if now - started_ms >= t.rearm_delay_ms {
                    self.phase = PortalPhase::Inactive;
                }
            }
        }
    }

    fn grow_and_capture(&mut self, now: f64, opened_ms: f64, character: &Character) -> bool {
        let t = self.tuning;
        match self.gate.as_mut() {
            Some(gate) => {
                gate.grow(progress(now - opened_ms, t.spawn_ms), t.max_radius);
                gate.captures(character.center(), t.capture_margin)
            }
            None => false,
        }
    }

    /// Spiral the character into the gate. Returns true when the pull is done.
    fn pull(&mut self, now: f64, started_ms: f64, from: Vec2, character: &mut Character) -> bool {
        let t = progress(now - started_ms, self.tuning.suck_ms);
        let eased = ease_in_out_cubic(t);
        let target = self.gate.map_or(from, |g| g.pos);
        if let Some(gate) = self.gate.as_mut() {
            gate.rotation = (gate.rotation + GATE_SPIN * 3.0) % TAU;
        }

        let offset = from - target;
        let base_angle = offset.y.atan2(offset.x);
        let angle = base_angle + eased * SPIRAL_TURNS * TAU;
        let distance = offset.length() * (1.0 - eased);
        character.set_center(target + Vec2::new(angle.cos(), angle.sin()) * distance);
        character.scale = (1.0 - eased).max(0.0);
        character.rotation = eased * 360.0;
        character.vel_y = 0.0;
        t >= 1.0
    }

    fn place_after_transition(&self, character: &mut Character, tuning: &CharacterTuning) {
        character.pos = Vec2::new(tuning.home_x, CANVAS_HEIGHT / 3.0);
        character.vel_y = 0.0;
        character.float_vel = 0.0;
        character.rotation = 0.0;
        character.scale = 1.0;
        character.input_locked = false;
    }
}
