//! Whole-match behaviour through the application driver
//!
//! Every test runs headless: no camera (moves complete instantly), events
//! captured by a recording HUD.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use proptest::prelude::*;

use sling_boom::Game;
use sling_boom::services::{Hud, Services};
use sling_boom::settings::{FirstSide, MatchSettings};
use sling_boom::sim::{Command, GameEvent, MatchPhase, MatchState, Projectile, Team, Unit, UnitId};

const ALLY: UnitId = UnitId(0);
const BOT: UnitId = UnitId(1);

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<GameEvent>>>);

impl Hud for Recorder {
    fn on_event(&mut self, event: &GameEvent) {
        self.0.borrow_mut().push(event.clone());
    }
}

impl Recorder {
    fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }
}

fn game_with(state: MatchState) -> (Game, Recorder) {
    let hud = Recorder::default();
    let game = Game::new(state, Services::headless().with_hud(hud.clone()));
    (game, hud)
}

fn duel(seed: u64) -> (Game, Recorder) {
    let mut settings = MatchSettings::default();
    settings.turn.first_side = FirstSide::Ally;
    let mut state = MatchState::new(seed, settings);
    state.add_unit(Unit::human(UnitId(0), "Ally", Vec2::new(-8.0, 0.5)));
    state.add_unit(Unit::ai(UnitId(0), "Bot", Vec2::new(8.0, 0.5)));
    game_with(state)
}

/// Step until `done` holds, at most `max_ticks` times
fn run_until(game: &mut Game, max_ticks: u32, done: impl Fn(&Game) -> bool) -> bool {
    for _ in 0..max_ticks {
        if done(game) {
            return true;
        }
        game.step();
    }
    done(game)
}

fn is_acting(game: &Game, id: UnitId) -> bool {
    game.state.current() == Some(id) && game.state.unit(id).is_some_and(|u| u.is_acting())
}

#[test]
fn test_energy_grows_each_ally_turn() {
    let (mut game, hud) = duel(1);
    game.start_match();
    assert!(run_until(&mut game, 200, |g| is_acting(g, ALLY)));

    // Seeded at the base maximum, then +1 for the first turn
    let first = hud.0.borrow().iter().find_map(|e| match e {
        GameEvent::EnergyChanged { energy, max_energy } => Some((*energy, *max_energy)),
        _ => None,
    });
    assert_eq!(first, Some((3, 3)));
    assert_eq!(game.state.shared().max_energy(), 4);

    game.push(Command::EndTurn { unit: ALLY });
    game.step();
    assert!(run_until(&mut game, 200, |g| is_acting(g, BOT)));
    assert_eq!(game.state.opponent_turns(), 1);
    assert_eq!(game.state.unit(BOT).unwrap().max_energy(), 4);

    assert!(run_until(&mut game, 120 * 10, |g| is_acting(g, ALLY)));
    assert_eq!(game.state.shared().max_energy(), 5);
    assert_eq!(game.state.shared().energy(), 5);
    assert_eq!(game.state.unit(ALLY).unwrap().energy(), 5);
}

#[test]
fn test_end_turn_outside_running_is_ignored() {
    let (mut game, hud) = duel(2);
    game.push(Command::EndTurn { unit: ALLY });
    game.step();
    assert_eq!(game.state.phase(), MatchPhase::Idle);

    game.start_match();
    game.push(Command::EndTurn { unit: ALLY });
    game.step();
    assert_eq!(game.state.phase(), MatchPhase::Starting);
    assert_eq!(hud.count(|e| matches!(e, GameEvent::TurnEnded { .. })), 0);
}

#[test]
fn test_player_end_turn_during_ai_turn_is_ignored() {
    let mut settings = MatchSettings::default();
    settings.turn.first_side = FirstSide::Opponent;
    let mut state = MatchState::new(8, settings);
    state.add_unit(Unit::human(UnitId(0), "Ally", Vec2::new(-8.0, 0.5)));
    state.add_unit(Unit::ai(UnitId(0), "Bot", Vec2::new(8.0, 0.5)));
    let (mut game, hud) = game_with(state);
    game.start_match();
    assert!(run_until(&mut game, 200, |g| is_acting(g, BOT)));

    game.push(Command::EndTurn { unit: ALLY });
    game.push(Command::EndTurn { unit: BOT });
    game.step();
    assert!(is_acting(&game, BOT));
    assert_eq!(hud.count(|e| matches!(e, GameEvent::TurnEnded { .. })), 0);
}

#[test]
fn test_game_over_fires_once() {
    let (mut game, hud) = duel(3);
    game.start_match();
    assert!(run_until(&mut game, 200, |g| is_acting(g, ALLY)));

    game.state.kill_unit(BOT);
    game.state.check_game_over();
    game.state.kill_unit(BOT);
    // A late death changes nothing once the match is decided
    game.state.damage_unit(ALLY, 500);
    game.state.check_game_over();
    for _ in 0..240 {
        game.step();
    }
    game.push(Command::EndTurn { unit: ALLY });
    game.step();

    assert_eq!(game.state.phase(), MatchPhase::GameOver { winner: Some(Team::Ally) });
    assert_eq!(hud.count(|e| matches!(e, GameEvent::MatchResult { .. })), 1);
    assert_eq!(hud.count(|e| matches!(e, GameEvent::ShowGameOver { ally_won: true })), 1);
    assert_eq!(hud.count(|e| matches!(e, GameEvent::LevelCompleted { stars: 3 })), 1);
    assert_eq!(hud.count(|e| matches!(e, GameEvent::TurnEnded { .. })), 0);
    assert_eq!(game.rank.points, 50);
}

#[test]
fn test_acting_unit_killed_mid_turn_ends_match() {
    let (mut game, hud) = duel(4);
    game.start_match();
    assert!(run_until(&mut game, 200, |g| is_acting(g, ALLY)));

    game.state.damage_unit(ALLY, 1000);
    game.step();
    assert_eq!(game.state.phase(), MatchPhase::GameOver { winner: Some(Team::Opponent) });
    assert_eq!(game.state.acting_count(), 0);
    assert_eq!(game.state.current(), None);
    assert!(!game.state.timer().running);

    for _ in 0..130 {
        game.step();
    }
    assert_eq!(hud.count(|e| matches!(e, GameEvent::ShowGameOver { ally_won: false })), 1);
    // Losing from zero stays at zero
    assert_eq!(game.rank.points, 0);
}

#[test]
fn test_splash_radius_boundary_through_tick() {
    let mut settings = MatchSettings::default();
    settings.turn.first_side = FirstSide::Ally;
    let mut state = MatchState::new(5, settings);
    let eps = 0.01;
    let r: f32 = 5.0;
    // Unit centres sit 0.5 above the ground, blast is centred on the ground
    let inside_x = ((r - eps).powi(2) - 0.25).sqrt();
    let outside_x = ((r + eps).powi(2) - 0.25).sqrt();
    let shooter = state.add_unit(Unit::human(UnitId(0), "Ally", Vec2::new(-20.0, 0.5)));
    let inside = state.add_unit(Unit::ai(UnitId(0), "Inside", Vec2::new(-inside_x, 0.5)));
    let outside = state.add_unit(Unit::ai(UnitId(0), "Outside", Vec2::new(outside_x, 0.5)));
    let (mut game, hud) = game_with(state);
    game.start_match();
    assert!(run_until(&mut game, 200, |g| is_acting(g, shooter)));

    let id = game.state.next_entity_id();
    game.state.projectiles.push(Projectile {
        id,
        owner: shooter,
        volley: id,
        pos: Vec2::new(0.0, 0.25),
        vel: Vec2::new(0.0, -5.0),
        radius: 0.2,
        damage: 30,
        splash_radius: r,
        force: 15.0,
    });
    for _ in 0..5 {
        game.step();
    }

    assert!(game.state.projectiles.is_empty());
    assert_eq!(hud.count(|e| matches!(e, GameEvent::Explosion { .. })), 1);
    assert_eq!(game.state.unit(inside).unwrap().health(), 70);
    assert_eq!(game.state.unit(outside).unwrap().health(), 100);
}

#[test]
fn test_splash_kills_last_opponent_mid_turn() {
    let mut settings = MatchSettings::default();
    settings.turn.first_side = FirstSide::Ally;
    let mut state = MatchState::new(9, settings);
    state.add_unit(Unit::human(UnitId(0), "Ally", Vec2::new(-8.0, 0.5)));
    state.add_unit(Unit::ai(UnitId(0), "Bot", Vec2::new(8.0, 0.5)).with_max_health(30));
    let (mut game, hud) = game_with(state);
    game.start_match();
    assert!(run_until(&mut game, 200, |g| is_acting(g, ALLY)));

    // Lands on the ground a metre short of the bot
    let id = game.state.next_entity_id();
    game.state.projectiles.push(Projectile {
        id,
        owner: ALLY,
        volley: id,
        pos: Vec2::new(7.0, 0.25),
        vel: Vec2::new(0.0, -5.0),
        radius: 0.2,
        damage: 30,
        splash_radius: 5.0,
        force: 15.0,
    });
    for _ in 0..5 {
        game.step();
    }

    assert!(game.state.projectiles.is_empty());
    assert!(game.state.unit(BOT).unwrap().is_dead());
    assert_eq!(game.state.phase(), MatchPhase::GameOver { winner: Some(Team::Ally) });
    assert_eq!(game.state.acting_count(), 0);
    assert_eq!(hud.count(|e| matches!(e, GameEvent::UnitDied { unit } if *unit == BOT)), 1);
    assert_eq!(hud.count(|e| matches!(e, GameEvent::MatchResult { .. })), 1);
    assert_eq!(game.rank.points, 50);
}

#[test]
fn test_reset_then_start_matches_a_fresh_match() {
    let (mut game, _hud) = duel(6);
    game.start_match();
    assert!(run_until(&mut game, 200, |g| is_acting(g, ALLY)));
    game.push(Command::EndTurn { unit: ALLY });
    game.step();
    assert!(run_until(&mut game, 200, |g| is_acting(g, BOT)));

    game.reset_match();
    assert_eq!(game.state.phase(), MatchPhase::Idle);
    assert_eq!(game.state.acting_count(), 0);
    assert_eq!(game.state.opponent_turns(), 0);
    assert!(game.state.order().is_empty());
    assert_eq!(game.state.shared().max_energy(), 3);
    assert_eq!(game.state.pending_tasks(), 0);
    assert!(game.state.projectiles.is_empty());

    // Nothing from the old match may wake up again
    for _ in 0..120 * 6 {
        game.step();
    }
    assert_eq!(game.state.phase(), MatchPhase::Idle);

    game.start_match();
    assert!(run_until(&mut game, 200, |g| is_acting(g, ALLY)));
    assert_eq!(game.state.order(), &[ALLY, BOT]);
    assert_eq!(game.state.shared().max_energy(), 4);
    assert_eq!(game.state.opponent_turns(), 0);
    assert_eq!(game.state.acting_count(), 1);
}

#[test]
fn test_match_without_units_aborts() {
    let (mut game, hud) = game_with(MatchState::new(7, MatchSettings::default()));
    game.start_match();
    for _ in 0..120 * 3 {
        game.step();
    }
    assert_eq!(game.state.phase(), MatchPhase::Idle);
    assert_eq!(hud.count(|e| matches!(e, GameEvent::MatchAborted(_))), 1);
}

// === Property tests ===

#[derive(Debug, Clone)]
enum Action {
    Select(usize),
    Shoot(f32, f32),
    Drag(f32, f32),
    EndTurn,
    Wait(u16),
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0usize..6).prop_map(Action::Select),
        (-20.0f32..20.0, 0.0f32..20.0).prop_map(|(x, y)| Action::Shoot(x, y)),
        (-3.0f32..3.0, -3.0f32..3.0).prop_map(|(x, y)| Action::Drag(x, y)),
        Just(Action::EndTurn),
        (1u16..400).prop_map(Action::Wait),
    ]
}

fn skirmish(seed: u64) -> (Game, Recorder) {
    let mut state = MatchState::new(seed, MatchSettings::default());
    state.add_unit(Unit::human(UnitId(0), "A0", Vec2::new(-12.0, 0.5)));
    state.add_unit(Unit::human(UnitId(0), "A1", Vec2::new(-7.0, 0.5)));
    state.add_unit(Unit::ai(UnitId(0), "O0", Vec2::new(9.0, 0.5)));
    game_with(state)
}

/// Turn authority and energy invariants, checked after every tick
fn check_invariants(game: &Game, last_max: &mut u32) -> Result<(), TestCaseError> {
    let state = &game.state;
    let acting: Vec<UnitId> = state.units.iter().filter(|u| u.is_acting()).map(|u| u.id).collect();
    prop_assert!(acting.len() <= 1, "several units acting: {acting:?}");
    if let Some(&id) = acting.first() {
        prop_assert!(state.is_running());
        prop_assert_eq!(state.current(), Some(id));
    }

    let shared = state.shared();
    prop_assert!(shared.energy() <= shared.max_energy());
    prop_assert!(shared.max_energy() >= *last_max, "max energy dropped");
    *last_max = shared.max_energy();
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_turn_and_energy_invariants(
        seed in 0u64..1000,
        actions in prop::collection::vec(action(), 1..40),
    ) {
        let (mut game, hud) = skirmish(seed);
        game.start_match();
        let mut last_max = 0;

        for action in actions {
            let unit = game.state.current().unwrap_or(UnitId(0));
            let ticks = match action {
                Action::Select(index) => {
                    game.push(Command::SelectCard { unit, index });
                    1
                }
                Action::Shoot(x, y) => {
                    game.push(Command::Shoot { unit, velocity: Vec2::new(x, y) });
                    1
                }
                Action::Drag(x, y) => {
                    game.push(Command::Drag { unit, drag: Vec2::new(x, y) });
                    1
                }
                Action::EndTurn => {
                    game.push(Command::EndTurn { unit });
                    1
                }
                Action::Wait(n) => n,
            };
            for _ in 0..ticks {
                game.step();
                check_invariants(&game, &mut last_max)?;
            }
        }

        let results = hud.count(|e| matches!(e, GameEvent::MatchResult { .. }));
        let over = matches!(game.state.phase(), MatchPhase::GameOver { .. });
        prop_assert_eq!(results, usize::from(over));
    }
}
