//! Portal Flap entry point
//!
//! On the web the library's `start` hook does all setup and the page drives
//! `WebGame`. Natively this binary plays headless smoke runs with a simple bot:
//!
//! ```text
//! portal-flap [seed] [seconds] [tuning.json]
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::process::ExitCode;

    use portal_flap::Session;
    use portal_flap::Tuning;
    use portal_flap::consts::{CANVAS_HEIGHT, SIM_DT_MS};
    use portal_flap::persistence::MemoryStore;
    use portal_flap::sim::{GameEvent, GamePhase, GameState, PowerKind};

    struct Args {
        seed: u64,
        seconds: u32,
        tuning: Tuning,
    }

    fn parse_args() -> Result<Args, String> {
        let mut args = std::env::args().skip(1);
        let seed = match args.next() {
            Some(s) => s.parse().map_err(|_| format!("bad seed: {s}"))?,
            None => 12345,
        };
        let seconds = match args.next() {
            Some(s) => s.parse().map_err(|_| format!("bad duration: {s}"))?,
            None => 120,
        };
        let tuning = match args.next() {
            Some(path) => {
                let json = std::fs::read_to_string(&path).map_err(|err| format!("{path}: {err}"))?;
                Tuning::from_json(&json).map_err(|err| format!("{path}: {err}"))?
            }
            None => Tuning::default(),
        };
        Ok(Args {
            seed,
            seconds,
            tuning,
        })
    }

    /// Height the bot tries to hold: the portal when one is open, else the next gap
    fn target_y(state: &GameState) -> f32 {
        if let Some(gate) = state.portal.gate {
            return gate.pos.y;
        }
        let x = state.character.pos.x;
        state
            .obstacles
            .obstacles
            .iter()
            .find(|o| o.right() > x)
            .map(|o| o.top_height + o.gap / 2.0)
            .unwrap_or(CANVAS_HEIGHT * 0.4)
    }

    fn drive(session: &mut Session<MemoryStore>) {
        let state = session.state();
        let phase = state.phase;
        match phase {
            GamePhase::Start | GamePhase::Ready => session.flap(),
            GamePhase::GameOver => session.restart(),
            GamePhase::Playing => {
                let target = target_y(state);
                let y = state.character.center().y;
                let falling = state.character.vel_y > 0.0;
                let rockets_live = state.rockets.eligible_count(state.time_ms) > 0;
                let gravity_ready = state.charges.gravity_invert > 0
                    && portal_flap::sim::tick::power_ready(state, PowerKind::GravityInvert);

                session.set_float(y > target + 10.0, y < target - 10.0);
                if falling && y > target + 15.0 {
                    session.flap();
                }
                if rockets_live && gravity_ready {
                    session.activate(PowerKind::GravityInvert);
                }
            }
            _ => {}
        }
    }

    pub fn run() -> ExitCode {
        let args = match parse_args() {
            Ok(args) => args,
            Err(err) => {
                log::error!("{err}");
                eprintln!("usage: portal-flap [seed] [seconds] [tuning.json]");
                return ExitCode::FAILURE;
            }
        };
        log::info!("Portal Flap (headless) seed {} for {}s", args.seed, args.seconds);

        let mut session = Session::new(MemoryStore::default(), args.seed, args.tuning);
        let frames = u64::from(args.seconds) * 60;
        let mut runs = 0u32;
        let mut coins = 0u64;
        let mut portals = 0u32;

        let mut now = 0.0;
        for _ in 0..frames {
            drive(&mut session);
            session.frame(now);
            now += SIM_DT_MS;

            for event in session.take_events() {
                match event {
                    GameEvent::GameOver { score, medal, .. } => {
                        runs += 1;
                        log::info!("run {runs}: score {score} ({medal:?})");
                    }
                    GameEvent::CoinCollected { value, .. } => coins += value,
                    GameEvent::PortalEntered => portals += 1,
                    _ => {}
                }
            }
        }

        let profile = session.profile();
        log::info!(
            "{runs} runs finished, best {}, wallet {} ({coins} from coins), {portals} portal trips, {} storage writes",
            profile.high_score,
            profile.currency,
            session.store().writes
        );
        ExitCode::SUCCESS
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::init();
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the library's `start`, this is just to satisfy the compiler
}
