//! Sling Boom headless driver
//!
//! Plays a small level at the fixed timestep with the AI on one side and a
//! scripted player on the other, logging every milestone.
//!
//! Usage: `sling-boom [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use anyhow::{Context, Result, bail};
    use glam::Vec2;

    use sling_boom::consts::TICKS_PER_SECOND;
    use sling_boom::services::{LogHud, Services};
    use sling_boom::sim::{
        BonusTarget, Command, MatchPhase, MatchState, Obstacle, ObstacleId, Unit, UnitId, ballistic_velocity,
    };
    use sling_boom::{Game, MatchSettings};

    /// Give up on matches that run longer than this (game seconds)
    const MAX_MATCH_SECS: f32 = 600.0;

    pub fn run() -> Result<()> {
        let mut args = std::env::args().skip(1);
        let settings = match args.next() {
            Some(path) => load_settings(&path)?,
            None => MatchSettings::default(),
        };
        let seed = match args.next() {
            Some(s) => s.parse::<u64>().with_context(|| format!("invalid seed '{s}'"))?,
            None => 1,
        };

        let mut game = Game::new(build_level(seed, settings), Services::headless().with_hud(LogHud));
        game.start_match();

        let max_ticks = (MAX_MATCH_SECS * TICKS_PER_SECOND) as u64;
        while game.state.time_ticks < max_ticks {
            if let Some((unit, commands)) = scripted_turn(&game.state) {
                log::debug!("Scripted player acting for {unit}");
                for command in commands {
                    game.push(command);
                }
            }
            game.step();

            match game.state.phase() {
                MatchPhase::GameOver { winner } if game.state.pending_tasks() == 0 => {
                    let verdict = winner.map_or("nobody", |t| t.as_str());
                    log::info!(
                        "Finished after {:.1}s, winner: {verdict}, rank points: {}",
                        game.state.time_ticks as f32 / TICKS_PER_SECOND,
                        game.rank.points
                    );
                    return Ok(());
                }
                MatchPhase::Idle => bail!("match aborted before it began"),
                _ => {}
            }
        }
        bail!("match still running after {MAX_MATCH_SECS}s")
    }

    fn load_settings(path: &str) -> Result<MatchSettings> {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        let settings = MatchSettings::from_json(&json).with_context(|| format!("parsing {path}"))?;
        settings.validate().with_context(|| format!("validating {path}"))?;
        log::info!("Loaded settings from {path}");
        Ok(settings)
    }

    /// Two allies behind a breakable wall, two opponents on a ledge, one
    /// bonus airship drifting overhead
    fn build_level(seed: u64, settings: MatchSettings) -> MatchState {
        let mut state = MatchState::new(seed, settings);
        state.add_unit(Unit::human(UnitId(0), "Rook", Vec2::new(-14.0, 0.5)));
        state.add_unit(Unit::human(UnitId(0), "Wren", Vec2::new(-10.0, 0.5)));
        state.add_unit(Unit::ai(UnitId(0), "Grit", Vec2::new(10.0, 0.5)));
        state.add_unit(Unit::ai(UnitId(0), "Husk", Vec2::new(15.0, 0.5)).with_max_health(60));

        state.add_obstacle(Obstacle::new(ObstacleId(0), Vec2::new(-6.0, 1.0), Vec2::new(0.5, 1.0)));
        state.add_obstacle(Obstacle::new(ObstacleId(0), Vec2::new(0.0, 2.0), Vec2::new(0.5, 2.0)).indestructible());
        state.add_target(BonusTarget::new(
            0,
            Vec2::new(-12.0, 14.0),
            Vec2::new(12.0, 14.0),
            6.0,
            1,
        ));
        state
    }

    /// Commands for the acting human unit: cheapest affordable card, lobbed
    /// at the nearest opponent. Waits while its own shells are in the air.
    fn scripted_turn(state: &MatchState) -> Option<(UnitId, Vec<Command>)> {
        let id = state.current()?;
        let unit = state.unit(id).filter(|u| u.is_human() && u.is_acting())?;
        if unit.is_committed() || state.projectiles.iter().any(|p| p.owner == id) {
            return None;
        }

        let cards = &state.settings.cards;
        let shared = state.shared();
        let index = shared
            .hand()
            .iter()
            .enumerate()
            .filter(|&(_, &card)| shared.can_afford(cards.cost(card)))
            .min_by_key(|&(_, &card)| cards.cost(card))
            .map(|(i, _)| i)?;

        let target = state
            .units
            .iter()
            .filter(|u| u.is_alive() && u.team != unit.team)
            .min_by(|a, b| a.pos.distance(unit.pos).total_cmp(&b.pos.distance(unit.pos)))?;
        let velocity = ballistic_velocity(
            unit.fire_point(),
            target.pos,
            1.6,
            state.settings.projectile.gravity,
        );

        Some((
            id,
            vec![
                Command::SelectCard { unit: id, index },
                Command::Shoot { unit: id, velocity },
            ],
        ))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Sling Boom (headless) starting...");
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_start in the library
}
