//! Fixed timestep simulation tick
//!
//! Per playing tick: power activation, flap, character motion, obstacles,
//! rockets, powers, portal, coin field, command drain, collisions, scoring.

use super::events::{Command, DeathCause, GameEvent};
use super::powers::{PowerError, PowerKind, PowerSystem};
use super::state::{GamePhase, GameState, RunSummary};
use crate::consts::{GROUND_Y, SIM_DT_MS};
use crate::profile::Medal;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Flap (click/tap/space)
    pub flap: bool,
    /// Pause toggle
    pub pause: bool,
    /// Use a power
    pub activate: Option<PowerKind>,
    /// Held up/down for floating controls
    pub float_up: bool,
    pub float_down: bool,
    /// Start over from the game over screen
    pub restart: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.set_phase(GamePhase::Paused);
                state.flush_events();
                return;
            }
            GamePhase::Paused => state.set_phase(GamePhase::Playing),
            _ => {}
        }
    }

    // The clock stands still while paused or game over
    match state.phase {
        GamePhase::Paused => {
            state.flush_events();
            return;
        }
        GamePhase::GameOver => {
            if input.restart {
                state.reset_run();
            }
            state.flush_events();
            return;
        }
        _ => {}
    }

    state.time_ms += SIM_DT_MS;
    state.time_ticks += 1;

    state.screen_shake *= 0.9;
    if state.screen_shake < 0.01 {
        state.screen_shake = 0.0;
    }

    if let Some(kind) = input.activate {
        activate_power(state, kind);
    }

    match state.phase {
        GamePhase::Start | GamePhase::Ready => tick_intro(state, input),
        GamePhase::Playing => tick_playing(state, input),
        GamePhase::Dying | GamePhase::Blasting => tick_death_fall(state),
        GamePhase::Paused | GamePhase::GameOver => {}
    }

    state.flush_events();
}

fn tick_intro(state: &mut GameState, input: &TickInput) {
    let now = state.time_ms;
    let tuning = &state.tuning.character;
    state.character.auto_glide(tuning, now);
    state.character.animate(tuning, now);

    if !input.flap {
        return;
    }
    match state.phase {
        GamePhase::Start => state.set_phase(GamePhase::Ready),
        GamePhase::Ready => {
            state.set_phase(GamePhase::Playing);
            if state.character.flap(&state.tuning.character) {
                state.queue.emit(GameEvent::Flapped);
            }
        }
        _ => {}
    }
}

fn tick_playing(state: &mut GameState, input: &TickInput) {
    let now = state.time_ms;

    let can_flap = !state.portal.is_scripted()
        && !state.portal.uses_float_controls()
        && state.powers.burst.pinned_y(now).is_none();
    if input.flap && can_flap && state.character.flap(&state.tuning.character) {
        state.portal.cancel_autopilot();
        state.queue.emit(GameEvent::Flapped);
    }

    move_character(state, input);

    let spawning = state.portal.should_spawn_pipes(now);
    let speed = if state.powers.burst.is_active(now) {
        state.tuning.obstacles.burst_speed
    } else {
        state.tuning.obstacles.base_speed
    };
    state.obstacles.set_speed(speed);
    state.obstacles.update(now, spawning, &mut state.rng);
    state
        .rockets
        .update(now, state.score, spawning, &mut state.rng, &mut state.queue);

    state.powers.update(now, &mut state.queue);

    state.portal.update(
        now,
        state.score,
        &mut state.character,
        &state.tuning.character,
        &mut state.queue,
    );

    let center = state.character.center();
    state.run_currency += state.coins.update(now, center, &mut state.rng, &mut state.queue);

    apply_commands(state);

    let died = resolve_collisions(state);
    apply_commands(state);
    if died {
        return;
    }

    score_passes(state);
}

/// Exactly one motion source drives the character per tick
fn move_character(state: &mut GameState, input: &TickInput) {
    let now = state.time_ms;
    let tuning = &state.tuning.character;
    let character = &mut state.character;

    if state.portal.is_scripted() {
        // Positioned by the portal
    } else if let Some(y) = state.powers.burst.pinned_y(now) {
        character.pin(y);
    } else if state.portal.autopilot_active() {
        character.autopilot(tuning, state.portal.autopilot_target_y());
    } else if state.portal.uses_float_controls() {
        character.apply_float(tuning, input.float_up || input.flap, input.float_down);
    } else {
        character.apply_gravity(tuning, state.portal.gravity_multiplier());
    }
    character.animate(tuning, now);
}

fn apply_commands(state: &mut GameState) {
    for command in state.queue.take_commands() {
        match command {
            Command::ClearObstacles => state.obstacles.clear(),
            Command::ClearHazards => state.rockets.clear(),
            Command::Shake(amount) => state.add_shake(amount),
            Command::CoinField(true) => state.coins.start(),
            Command::CoinField(false) => state.coins.stop(),
        }
    }
}

/// Collision precedence: shield, invincibility, fatal hit, bounds.
/// Returns true if the character died this tick.
fn resolve_collisions(state: &mut GameState) -> bool {
    let now = state.time_ms;
    let bounds = state.character.bounds(&state.tuning.character);
    let bursting = state.powers.burst.is_active(now);

    if state.portal.allows_danger(now) && !bursting {
        if state.obstacles.check_collision(&bounds) {
            if state.powers.shield.absorb_hit(now, &mut state.queue) {
                if let Some(broken) = state.obstacles.destroy_colliding_segment(&bounds) {
                    state.queue.emit(GameEvent::SegmentBroken(broken));
                    state.queue.command(Command::Shake(0.2));
                }
            } else {
                kill(state, DeathCause::Obstacle);
                return true;
            }
        }
        if state.rockets.check_collision(&bounds, now, &mut state.queue) {
            kill(state, DeathCause::Rocket);
            return true;
        }
    }

    if state.portal.is_scripted() || !state.character.is_out_of_bounds(GROUND_Y) {
        return false;
    }
    if bursting || state.portal.is_invincible(now) {
        state.character.clamp_to_bounds(GROUND_Y);
        return false;
    }
    kill(state, DeathCause::Bounds);
    true
}

fn kill(state: &mut GameState, cause: DeathCause) {
    let now = state.time_ms;
    let tuning = &state.tuning.character;
    let phase = match cause {
        DeathCause::Rocket => {
            state.character.start_rocket_death(tuning);
            GamePhase::Blasting
        }
        DeathCause::Obstacle | DeathCause::Bounds => {
            state.character.start_death(tuning);
            GamePhase::Dying
        }
    };
    state.powers.burst.cancel(now);
    state.obstacles.set_speed(state.tuning.obstacles.base_speed);
    state.death_cause = Some(cause);
    state.queue.emit(GameEvent::Died(cause));
    state.queue.command(Command::Shake(0.5));
    log::info!("died ({cause:?}) at score {}", state.score);
    state.set_phase(phase);
}

fn score_passes(state: &mut GameState) {
    let x = state.character.pos.x;
    while state.obstacles.check_score(x) {
        let points = state.portal.score_multiplier();
        state.score += points;
        state.run_currency += points * state.tuning.economy.currency_per_point;
        state.queue.emit(GameEvent::ObstaclePassed {
            points,
            score: state.score,
        });
    }
}

fn tick_death_fall(state: &mut GameState) {
    let now = state.time_ms;
    let tuning = &state.tuning.character;
    state.character.animate(tuning, now);
    if state.character.update_death_fall(tuning, GROUND_Y) {
        finish_run(state);
    }
}

fn finish_run(state: &mut GameState) {
    let score = state.score;
    let new_high_score = score > state.best_score;
    if new_high_score {
        state.best_score = score;
    }
    let summary = RunSummary {
        score,
        best_score: state.best_score,
        new_high_score,
        currency_earned: state.run_currency,
        coins_collected: state.coins.collected,
        medal: Medal::for_score(score),
        cause: state.death_cause.unwrap_or(DeathCause::Bounds),
    };
    state.queue.emit(GameEvent::GameOver {
        score,
        best_score: summary.best_score,
        new_high_score,
        currency_earned: summary.currency_earned,
        medal: summary.medal,
    });
    log::info!("game over: score {score}, medal {:?}", summary.medal);
    state.summary = Some(summary);
    state.coins.stop();
    state.set_phase(GamePhase::GameOver);
}

/// Try to use a power. Charges are only spent when the power actually fires.
fn activate_power(state: &mut GameState, kind: PowerKind) {
    match try_activate(state, kind) {
        Ok(()) => {
            let charges = state.charges.get_mut(kind);
            *charges = charges.saturating_sub(1);
            state.charges_dirty = true;
            log::info!("{} activated, {} charges left", kind.name(), *charges);
            state.queue.emit(GameEvent::PowerActivated(kind));
        }
        Err(reason) => {
            log::warn!("{} rejected: {reason}", kind.name());
            state.queue.emit(GameEvent::PowerRejected { kind, reason });
        }
    }
}

fn try_activate(state: &mut GameState, kind: PowerKind) -> Result<(), PowerError> {
    let now = state.time_ms;
    if state.phase != GamePhase::Playing {
        return Err(PowerError::NotPlaying);
    }
    if state.portal.is_scripted() {
        return Err(PowerError::PortalBusy);
    }
    if state.charges.get(kind) == 0 {
        return Err(PowerError::NoCharges);
    }

    match kind {
        PowerKind::Shield => state.powers.shield.activate(now),
        PowerKind::SpeedBurst => {
            state.powers.burst.activate(now, state.character.pos.y)?;
            state.character.pin(state.character.pos.y);
            Ok(())
        }
        PowerKind::GravityInvert => {
            let converted = state
                .powers
                .gravity
                .activate(now, &mut state.rockets, &mut state.rng)?;
            state.queue.emit(GameEvent::GravityWave { converted });
            Ok(())
        }
    }
}

/// Time left on the active speed burst, for the HUD
pub fn burst_remaining_ms(state: &GameState) -> f64 {
    state.powers.burst.remaining_ms(state.time_ms)
}

/// Whether the given power could be used right now (ignoring charges)
pub fn power_ready(state: &GameState, kind: PowerKind) -> bool {
    state.powers.get(kind).is_ready(state.time_ms)
}
