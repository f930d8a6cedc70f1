//! End-to-end progression sequences exercised through the public session API.

use inkblade_game::{Catalog, ConfirmOutcome, EngineEvent, Purchase, Session, economy};

fn new_session() -> Session {
    Session::with_default_catalog(0)
}

#[test]
fn ten_clicks_from_a_fresh_state() {
    let mut session = new_session();
    for step in 1..=10 {
        session.click(0);
        let state = session.state();
        assert_eq!(state.total_clicks, step);
        let expected = f64::from(u32::try_from(step).unwrap());
        assert!((state.strokes - expected).abs() < 1e-9, "step {step}");
        assert!((session.total_multiplier() - 1.0).abs() < f64::EPSILON);
    }
}

#[test]
fn first_upgrade_purchase_and_refusal_at_zero() {
    let mut session = new_session();
    for _ in 0..10 {
        session.click(0);
    }
    assert!((session.state().strokes - 10.0).abs() < 1e-9);

    let outcome = session.buy_upgrade("pencil_sharpener").unwrap();
    assert!(matches!(outcome, Purchase::Bought { cost } if (cost - 10.0).abs() < f64::EPSILON));
    let state = session.state();
    assert!((state.strokes - 0.0).abs() < 1e-9);
    assert!((state.click_power - 2.0).abs() < f64::EPSILON);
    assert_eq!(state.upgrade_count("pencil_sharpener"), 1);

    let again = session.buy_upgrade("pencil_sharpener").unwrap();
    assert_eq!(again, Purchase::Refused);
    assert_eq!(session.state().upgrade_count("pencil_sharpener"), 1);
}

#[test]
fn one_generator_ticks_at_its_base_rate() {
    let mut session = new_session();
    session.state_mut().strokes = 15.0;
    assert!(session.hire_artist("doodler").unwrap().bought());
    assert!((session.state().passive_rate - 1.0).abs() < f64::EPSILON);

    session.tick(10.0, 0);
    let state = session.state();
    assert!((state.strokes - 10.0).abs() < 1e-9);
    // Spending on the hire never touches total_strokes.
    assert!((state.total_strokes - 10.0).abs() < 1e-9);
}

#[test]
fn prestige_at_exactly_the_threshold() {
    let mut session = new_session();
    let catalog = Catalog::default_catalog();
    let threshold = catalog.tuning.prestige_threshold;
    session.state_mut().total_strokes = threshold;

    let expected = (threshold / catalog.tuning.erasure_divisor).sqrt().floor();
    let earned = session.execute_prestige().expect("threshold run earns points");
    assert!((earned - expected).abs() < f64::EPSILON);

    let state = session.state();
    assert_eq!(state.prestige_count, 1);
    assert!((state.total_strokes - 0.0).abs() < f64::EPSILON);
    assert!((state.erasure_points - expected).abs() < f64::EPSILON);
}

#[test]
fn strokes_never_go_negative_across_mixed_mutations() {
    let mut session = new_session();
    for round in 0..200i64 {
        match round % 7 {
            0 => {
                session.click(round);
            }
            1 => {
                session.tick(0.5, round);
            }
            2 => {
                let _ = session.buy_upgrade("pencil_sharpener").unwrap();
            }
            3 => {
                let _ = session.hire_artist("doodler").unwrap();
            }
            4 => {
                let _ = session.advance_media_tier();
            }
            5 => {
                let _ = session.request_prestige(round);
            }
            _ => {
                let _ = session.buy_prestige_upgrade("muscle_memory").unwrap();
            }
        }
        assert!(
            session.state().strokes >= 0.0,
            "strokes negative after round {round}"
        );
    }
}

#[test]
fn passive_rate_is_always_an_exact_resummation() {
    let mut session = new_session();
    session.state_mut().strokes = 10_000_000.0;
    let catalog = session.catalog().clone();

    for id in ["doodler", "doodler", "sketch_artist", "caricaturist"] {
        assert!(session.hire_artist(id).unwrap().bought());
        let expected: f64 = catalog
            .artists()
            .iter()
            .map(|def| def.base_rate * f64::from(session.state().artist_count(&def.id)))
            .sum();
        assert!((session.state().passive_rate - expected).abs() < f64::EPSILON);
    }

    // The resummation invariant also holds through a head-started prestige.
    session.state_mut().total_strokes = catalog.tuning.prestige_threshold;
    session
        .state_mut()
        .prestige_upgrades
        .insert("sketch_head_start".to_string(), 3);
    session.execute_prestige().unwrap();
    assert_eq!(session.state().artist_count("doodler"), 3);
    assert!((session.state().passive_rate - 3.0).abs() < f64::EPSILON);
}

#[test]
fn milestones_unlock_in_catalog_order_and_emit_once() {
    let mut session = new_session();
    session.state_mut().total_strokes = 30_000.0;
    session.check_sword_unlocks();
    session.check_sword_unlocks();

    let unlocked = &session.state().unlocked_swords;
    assert_eq!(
        unlocked,
        &vec![
            "butter_knife".to_string(),
            "letter_opener".to_string(),
            "broadsword".to_string(),
            "swordfish".to_string(),
            "crossword_sword".to_string(),
        ]
    );

    let events = session.drain_events();
    let unlock_events: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::SwordUnlocked { .. }))
        .collect();
    assert_eq!(unlock_events.len(), 4);
}

#[test]
fn achievements_survive_prestige() {
    let mut session = new_session();
    session.click(0);
    assert!(session.state().has_achievement("first_stroke"));

    session.state_mut().total_strokes = 10_000_000.0;
    session.execute_prestige().unwrap();
    assert!(session.state().has_achievement("first_stroke"));
}

#[test]
fn prestige_counters_are_monotone() {
    let mut session = new_session();
    let catalog = session.catalog().clone();
    let mut last_points = 0.0;
    let mut last_lifetime = 0.0;

    for run in 1..=3 {
        session.state_mut().total_strokes = catalog.tuning.prestige_threshold * f64::from(run);
        session.execute_prestige().unwrap();
        let state = session.state();
        assert_eq!(state.prestige_count, run);
        assert!(state.total_erasure_points >= last_points);
        assert!(state.lifetime_strokes > last_lifetime);
        last_points = state.total_erasure_points;
        last_lifetime = state.lifetime_strokes;
    }
}

#[test]
fn reset_confirmation_expires_without_second_request() {
    let mut session = new_session();
    session.state_mut().strokes = 999.0;
    assert_eq!(session.request_reset(0), ConfirmOutcome::Armed);

    let window = session.catalog().tuning.reset_confirm_ms;
    session.tick(0.0, window + 1);
    assert!(!session.state().reset_confirm.armed);
    assert!((session.state().strokes - 999.0).abs() < f64::EPSILON);
}

#[test]
fn effective_rates_reflect_all_three_axes() {
    let mut session = new_session();
    let catalog = session.catalog().clone();
    let state = session.state_mut();
    state.strokes = 2_000_000.0;
    state.total_strokes = 600_000.0;
    state.media_tier = 2; // x10
    state.prestige_upgrades.insert("speed_sketch".to_string(), 1); // x1.5
    state.prestige_upgrades.insert("muscle_memory".to_string(), 2); // x1.2 click
    state.prestige_upgrades.insert("art_school".to_string(), 4); // x2.0 artists
    state.artists.insert("doodler".to_string(), 10);
    state.recalc_passive_rate(&catalog);
    session.check_sword_unlocks(); // swords through 500k: +42%

    let state = session.state();
    let mult = economy::total_multiplier(&catalog, state);
    assert!((mult - 10.0 * 1.42 * 1.5).abs() < 1e-9);
    assert!(
        (economy::effective_click_power(&catalog, state) - state.click_power * mult * 1.2).abs()
            < 1e-9
    );
    assert!(
        (economy::effective_passive_rate(&catalog, state) - 10.0 * mult * 2.0).abs() < 1e-6
    );
}
