//! Session tests against an in-memory profile store

use portal_flap::Session;
use portal_flap::Tuning;
use portal_flap::persistence::MemoryStore;
use portal_flap::profile::PowerCharges;
use portal_flap::shop::ShopItem;
use portal_flap::sim::{GameEvent, GamePhase, PowerKind};

fn session_with(store: MemoryStore) -> Session<MemoryStore> {
    Session::new(store, 2024, Tuning::default())
}

/// Start a run and let the character drop until the game is over
fn crash(session: &mut Session<MemoryStore>) -> Vec<GameEvent> {
    session.flap();
    session.step();
    session.flap();
    session.step();
    assert_eq!(session.state().phase, GamePhase::Playing);

    let mut events = Vec::new();
    for _ in 0..2000 {
        session.step();
        events.extend(session.take_events());
        if session.state().phase == GamePhase::GameOver {
            return events;
        }
    }
    panic!("run never ended");
}

#[test]
fn test_game_over_keeps_better_stored_high_score() {
    let mut session = session_with(MemoryStore {
        high_score: Some(100),
        currency: Some(30),
        ..Default::default()
    });
    let events = crash(&mut session);

    let game_over = events.iter().find_map(|e| match e {
        GameEvent::GameOver {
            score,
            best_score,
            new_high_score,
            ..
        } => Some((*score, *best_score, *new_high_score)),
        _ => None,
    });
    assert_eq!(game_over, Some((0, 100, false)));

    let store = session.store();
    assert_eq!(store.high_score, Some(100));
    // Only the wallet is written back
    assert_eq!(store.currency, Some(30));
    assert_eq!(store.writes, 1);
}

/// Pipes with a gap covering almost the whole playfield, so a steady flapper
/// passes every one of them
fn wide_gap_tuning() -> Tuning {
    let mut tuning = Tuning::default();
    tuning.obstacles.gap_margin = 60.0;
    tuning.obstacles.gap = 470.0;
    tuning
}

#[test]
fn test_beaten_high_score_is_saved() {
    let mut session = Session::new(
        MemoryStore {
            high_score: Some(2),
            ..Default::default()
        },
        2024,
        wide_gap_tuning(),
    );
    session.flap();
    session.step();
    session.flap();
    session.step();

    for _ in 0..2000 {
        if session.state().score >= 3 {
            break;
        }
        if session.state().character.pos.y > 250.0 {
            session.flap();
        }
        session.step();
        assert_eq!(session.state().phase, GamePhase::Playing);
    }
    assert!(session.state().score >= 3);

    let mut events = Vec::new();
    for _ in 0..2000 {
        session.step();
        events.extend(session.take_events());
        if session.state().phase == GamePhase::GameOver {
            break;
        }
    }
    let score = session.state().score;
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::GameOver {
            new_high_score: true,
            ..
        }
    )));
    assert_eq!(session.profile().high_score, score);
    assert_eq!(session.store().high_score, Some(score));
    assert_eq!(session.store().currency, Some(score));
    // High score plus wallet
    assert_eq!(session.store().writes, 2);
}

#[test]
fn test_restart_after_game_over() {
    let mut session = session_with(MemoryStore::default());
    crash(&mut session);

    session.step();
    assert_eq!(session.state().phase, GamePhase::GameOver);
    session.restart();
    session.step();
    assert_eq!(session.state().phase, GamePhase::Start);
    assert_eq!(session.state().score, 0);
}

#[test]
fn test_purchase_updates_profile_state_and_store() {
    let mut session = session_with(MemoryStore {
        currency: Some(100),
        ..Default::default()
    });

    assert!(session.purchase(&ShopItem::Power(PowerKind::Shield), 50));
    assert_eq!(session.profile().currency, 50);
    assert_eq!(session.state().charges.shield, 2);
    assert_eq!(session.store().currency, Some(50));
    assert_eq!(session.store().charges.map(|c| c.shield), Some(2));
    let writes = session.store().writes;

    assert!(!session.purchase(&ShopItem::Power(PowerKind::GravityInvert), 60));
    assert_eq!(session.profile().currency, 50);
    assert_eq!(session.state().charges.gravity_invert, 1);
    assert_eq!(session.store().writes, writes);
}

#[test]
fn test_skin_purchase_persists_owned_skins() {
    let mut session = session_with(MemoryStore {
        currency: Some(200),
        ..Default::default()
    });
    let neon = ShopItem::Skin("neon".into());

    assert!(session.purchase(&neon, 150));
    assert!(!session.purchase(&neon, 150));
    assert!(session.equip_skin("neon"));
    assert!(!session.equip_skin("midnight"));

    let skins = session.store().skins.clone().unwrap_or_default();
    assert!(skins.iter().any(|s| s == "neon"));
    assert!(skins.iter().any(|s| s == "classic"));
    assert_eq!(session.store().currency, Some(50));
    assert_eq!(session.store().equipped_skin.as_deref(), Some("neon"));

    // A fresh session over the same storage comes back with the skin on
    let reloaded = session_with(session.store().clone());
    assert_eq!(reloaded.profile().equipped_skin, "neon");
}

#[test]
fn test_spent_charge_written_once() {
    let mut session = session_with(MemoryStore {
        charges: Some(PowerCharges::uniform(1)),
        ..Default::default()
    });

    let mut t = 0.0;
    session.frame(t);
    for _ in 0..2 {
        session.flap();
        t += 20.0;
        session.frame(t);
    }
    assert_eq!(session.state().phase, GamePhase::Playing);
    assert_eq!(session.store().writes, 0);

    session.activate(PowerKind::Shield);
    t += 20.0;
    session.frame(t);
    assert!(
        session
            .take_events()
            .contains(&GameEvent::PowerActivated(PowerKind::Shield))
    );
    assert_eq!(session.profile().charges.shield, 0);
    assert_eq!(
        session.store().charges,
        Some(PowerCharges {
            shield: 0,
            speed_burst: 1,
            gravity_invert: 1
        })
    );
    assert_eq!(session.store().writes, 1);

    t += 20.0;
    session.frame(t);
    assert_eq!(session.store().writes, 1);
}

#[test]
fn test_read_only_store_does_not_break_play() {
    let mut session = session_with(MemoryStore {
        currency: Some(100),
        read_only: true,
        ..Default::default()
    });
    assert!(session.purchase(&ShopItem::Power(PowerKind::SpeedBurst), 40));
    assert_eq!(session.state().charges.speed_burst, 2);
    crash(&mut session);
    assert_eq!(session.store().writes, 0);
}
