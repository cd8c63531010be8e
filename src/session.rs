//! Frame driver tying the simulation to the player profile
//!
//! The host calls [`Session::frame`] once per display refresh with its
//! timestamp. Input setters only latch flags; they take effect on the next
//! simulation tick. Storage is touched at game over, on purchases, on skin
//! changes and when power charges were spent (at most one charge write per frame).

use crate::consts::{MAX_FRAME_MS, MAX_SUBSTEPS, SIM_DT_MS};
use crate::persistence::ProfileStore;
use crate::profile::Profile;
use crate::shop::{self, ShopItem};
use crate::sim::{GameEvent, GameState, PowerKind, Snapshot, TickInput, tick};
use crate::tuning::Tuning;

pub struct Session<S: ProfileStore> {
    state: GameState,
    store: S,
    profile: Profile,
    /// Time accumulator for the fixed timestep
    accumulator: f64,
    last_time_ms: Option<f64>,
    input: TickInput,
    /// Events since the host last drained them
    events: Vec<GameEvent>,
}

impl<S: ProfileStore> Session<S> {
    pub fn new(store: S, seed: u64, tuning: Tuning) -> Self {
        let profile = Profile::load(&store, tuning.economy.starter_charges);
        let mut state = GameState::with_tuning(seed, tuning);
        state.best_score = profile.high_score;
        state.charges = profile.charges;
        log::info!("session started with seed {seed}");

        Self {
            state,
            store,
            profile,
            accumulator: 0.0,
            last_time_ms: None,
            input: TickInput::default(),
            events: Vec::new(),
        }
    }

    /// Advance by the wall time since the previous frame. Returns the number
    /// of simulation ticks run.
    pub fn frame(&mut self, time_ms: f64) -> u32 {
        let dt = match self.last_time_ms {
            Some(last) => (time_ms - last).clamp(0.0, MAX_FRAME_MS),
            None => 0.0,
        };
        self.last_time_ms = Some(time_ms);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT_MS;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog instead of catching up next frame
            self.accumulator = self.accumulator.min(SIM_DT_MS);
        }

        self.persist_charges();
        substeps
    }

    /// Run exactly one simulation tick with the latched input
    pub fn step(&mut self) {
        tick(&mut self.state, &self.input);

        // Clear one-shot inputs after processing; held float keys stay
        self.input.flap = false;
        self.input.pause = false;
        self.input.activate = None;
        self.input.restart = false;

        for event in self.state.take_events() {
            if let GameEvent::GameOver {
                score,
                currency_earned,
                ..
            } = &event
            {
                self.record_run(*score, *currency_earned);
            }
            self.events.push(event);
        }
    }

    fn record_run(&mut self, score: u64, currency_earned: u64) {
        if self.profile.record_score(score) {
            log::info!("new high score {score}");
            if let Err(err) = self.store.save_high_score(score) {
                log::warn!("could not save high score: {err}");
            }
        }
        self.profile.currency += currency_earned;
        if let Err(err) = self.store.save_currency(self.profile.currency) {
            log::warn!("could not save currency: {err}");
        }
    }

    /// Write spent charges through to the profile and the store
    fn persist_charges(&mut self) {
        if !self.state.charges_dirty {
            return;
        }
        self.state.charges_dirty = false;
        self.profile.charges = self.state.charges;
        if let Err(err) = self.store.save_owned_power_charges(&self.profile.charges) {
            log::warn!("could not save power charges: {err}");
        }
    }

    pub fn flap(&mut self) {
        self.input.flap = true;
    }

    pub fn toggle_pause(&mut self) {
        self.input.pause = true;
    }

    pub fn activate(&mut self, kind: PowerKind) {
        self.input.activate = Some(kind);
    }

    /// Held state of the up/down keys used by the floating controls
    pub fn set_float(&mut self, up: bool, down: bool) {
        self.input.float_up = up;
        self.input.float_down = down;
    }

    pub fn restart(&mut self) {
        self.input.restart = true;
    }

    /// Buy from the shop. Returns false (and logs why) if the purchase was refused.
    pub fn purchase(&mut self, item: &ShopItem, price: u64) -> bool {
        self.persist_charges();
        if let Err(err) = shop::purchase(&mut self.profile, item, price) {
            log::warn!("purchase of {item:?} refused: {err}");
            return false;
        }
        log::info!("bought {item:?} for {price}");

        let saved = match item {
            ShopItem::Power(_) => {
                self.state.charges = self.profile.charges;
                self.store.save_owned_power_charges(&self.profile.charges)
            }
            ShopItem::Skin(_) => self.store.save_owned_skins(&self.profile.skins),
        };
        if let Err(err) = saved.and_then(|()| self.store.save_currency(self.profile.currency)) {
            log::warn!("could not save purchase: {err}");
        }
        true
    }

    /// Switch to an owned skin and remember the choice
    pub fn equip_skin(&mut self, id: &str) -> bool {
        if !self.profile.equip_skin(id) {
            log::warn!("cannot equip unowned skin {id}");
            return false;
        }
        if let Err(err) = self.store.save_equipped_skin(id) {
            log::warn!("could not save equipped skin: {err}");
        }
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    /// Drain the events produced since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::GamePhase;

    fn session() -> Session<MemoryStore> {
        Session::new(MemoryStore::default(), 7, Tuning::default())
    }

    #[test]
    fn test_frame_accumulates_fixed_ticks() {
        let mut session = session();
        assert_eq!(session.frame(1000.0), 0);
        assert_eq!(session.frame(1000.0 + SIM_DT_MS * 2.5), 2);
        // Half a tick carried over
        assert_eq!(session.frame(1000.0 + SIM_DT_MS * 3.6), 1);
        assert_eq!(session.state().time_ticks, 3);
    }

    #[test]
    fn test_long_frame_is_capped() {
        let mut session = session();
        session.frame(0.0);
        let ticks = session.frame(5000.0);
        assert!(ticks <= MAX_SUBSTEPS);
        assert!(session.state().time_ms < MAX_FRAME_MS + 1.0);
    }

    #[test]
    fn test_one_shot_input_cleared_after_tick() {
        let mut session = session();
        session.flap();
        session.step();
        assert_eq!(session.state().phase, GamePhase::Ready);
        session.step();
        assert_eq!(session.state().phase, GamePhase::Ready);
    }

    #[test]
    fn test_profile_seeds_state() {
        let store = MemoryStore {
            high_score: Some(12),
            charges: Some(crate::profile::PowerCharges::uniform(4)),
            ..Default::default()
        };
        let session = Session::new(store, 1, Tuning::default());
        assert_eq!(session.state().best_score, 12);
        assert_eq!(session.state().charges.shield, 4);
    }
}
