//! Fixed timestep simulation tick
//!
//! Applies queued player commands, runs due continuations, counts down the
//! turn timer and moves every shell and target one step.

use glam::Vec2;
use log::{debug, info};

use super::cards::CardKind;
use super::collision::{Contact, find_contact};
use super::events::GameEvent;
use super::obstacle::ObstacleId;
use super::projectile::{Body, Projectile, affected_bodies};
use super::state::{MatchState, Step};
use super::tasks::Scope;
use super::unit::{DamageOutcome, UnitId};
use crate::audio::SoundCue;

/// A player command, applied at the start of the next tick
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectCard { unit: UnitId, index: usize },
    Shoot { unit: UnitId, velocity: Vec2 },
    /// Slingshot release; the drag vector points the way the shot flies
    Drag { unit: UnitId, drag: Vec2 },
    /// Pass; refused unless `unit` is the acting human
    EndTurn { unit: UnitId },
    CameraReady,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub commands: Vec<Command>,
}

impl TickInput {
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Advance the match by one fixed timestep
pub fn tick(state: &mut MatchState, input: &TickInput, dt: f32) {
    for command in &input.commands {
        state.apply_command(command);
    }

    state.time_ticks += 1;
    state.run_due_steps();
    state.advance_timer(dt);

    for target in &mut state.targets {
        target.advance(dt);
    }
    state.step_projectiles(dt);
    state.apply_kill_zone();
}

impl MatchState {
    /// Refused commands are logged by the action itself and otherwise dropped
    fn apply_command(&mut self, command: &Command) {
        match *command {
            Command::SelectCard { unit, index } => {
                let _ = self.select_action(unit, index);
            }
            Command::Shoot { unit, velocity } => {
                let _ = self.shoot(unit, velocity);
            }
            Command::Drag { unit, drag } => {
                let _ = self.shoot_drag(unit, drag);
            }
            Command::EndTurn { unit } => {
                let _ = self.request_end_turn(unit);
            }
            Command::CameraReady => self.camera_ready(),
        }
    }

    /// Launch one volley of `card` from `owner`. Returns the shell count.
    pub(crate) fn spawn_volley(&mut self, owner: UnitId, card: CardKind, aimed: Vec2) -> usize {
        let Some(origin) = self.unit(owner).map(|u| u.fire_point()) else {
            return 0;
        };
        let spec = self.settings.cards.spec(card).clone();
        let radius = self.settings.projectile.radius;
        let volley = self.next_entity_id();

        let velocities = spec.volley_velocities(aimed);
        for vel in &velocities {
            let id = self.next_entity_id();
            self.projectiles.push(Projectile {
                id,
                owner,
                volley,
                pos: origin,
                vel: *vel,
                radius,
                damage: spec.damage,
                splash_radius: spec.splash_radius,
                force: spec.force,
            });
        }

        debug!("{owner} fired {} x{}", card.as_str(), velocities.len());
        self.emit(GameEvent::ShotFired {
            unit: owner,
            volley,
            card,
            projectiles: velocities.len(),
        });
        velocities.len()
    }

    /// Move every shell, then resolve the ones that touched something
    fn step_projectiles(&mut self, dt: f32) {
        if self.projectiles.is_empty() {
            return;
        }
        let gravity = self.settings.projectile.gravity;
        let ground_y = self.settings.arena.ground_y;

        let mut flying = Vec::with_capacity(self.projectiles.len());
        let mut impacts = Vec::new();
        for mut proj in std::mem::take(&mut self.projectiles) {
            proj.step(gravity, dt);
            if !self.settings.arena.contains(proj.pos) {
                debug!("Shell {} left the arena", proj.id);
                continue;
            }
            match find_contact(&proj, &self.units, &self.obstacles, &self.targets, ground_y) {
                Some(contact) => impacts.push((proj, contact)),
                None => flying.push(proj),
            }
        }
        self.projectiles = flying;

        for (proj, contact) in impacts {
            self.resolve_impact(&proj, contact);
        }
    }

    /// Apply a shell's blast at its contact point
    fn resolve_impact(&mut self, proj: &Projectile, contact: Contact) {
        let hits = affected_bodies(contact.point, contact.body, proj, &self.units, &self.obstacles);
        debug!(
            "Shell {} from {} hit {:?}, {} bodies affected",
            proj.id,
            proj.owner,
            contact.body,
            hits.len()
        );

        self.emit(GameEvent::PlaySound(SoundCue::Explosion));
        self.emit(GameEvent::Explosion {
            pos: contact.point,
            radius: proj.splash_radius,
        });

        for hit in hits {
            self.emit(GameEvent::Impulse {
                body: hit.body,
                impulse: hit.impulse,
            });
            match hit.body {
                Body::Unit(id) if id != proj.owner => self.damage_unit(id, proj.damage),
                Body::Obstacle(id) => self.destroy_obstacle(id),
                _ => {}
            }
        }

        if let Body::Target(id) = contact.body {
            self.hit_target(id);
        }

        let delay = self.settings.turn.deferred_check_delay;
        self.schedule(delay, Scope::Match, Step::DeferredGameOverCheck);
    }

    /// Deal damage, reporting health and a death if this hit was fatal
    pub fn damage_unit(&mut self, id: UnitId, amount: u32) {
        let Some(unit) = self.unit_mut(id) else { return };
        let outcome = unit.take_damage(amount);
        let (health, max_health) = (unit.health(), unit.max_health());
        if outcome == DamageOutcome::Ignored {
            return;
        }
        self.emit(GameEvent::HealthChanged {
            unit: id,
            health,
            max_health,
        });
        if outcome == DamageOutcome::Killed {
            info!("{id} was killed");
            self.emit(GameEvent::UnitDied { unit: id });
            self.on_unit_died(id);
        }
    }

    /// Kill outright regardless of health
    pub fn kill_unit(&mut self, id: UnitId) {
        let Some(unit) = self.unit_mut(id) else { return };
        if !unit.force_death() {
            return;
        }
        let max_health = unit.max_health();
        self.emit(GameEvent::HealthChanged {
            unit: id,
            health: 0,
            max_health,
        });
        self.emit(GameEvent::UnitDied { unit: id });
        self.on_unit_died(id);
    }

    fn destroy_obstacle(&mut self, id: ObstacleId) {
        let destroyed = self
            .obstacles
            .iter_mut()
            .find(|o| o.id == id)
            .is_some_and(|o| o.take_damage());
        if destroyed {
            self.emit(GameEvent::ObstacleDestroyed(id));
            let delay = self.settings.turn.obstacle_removal_delay;
            self.schedule(delay, Scope::Match, Step::RemoveObstacle(id));
        }
    }

    pub(crate) fn remove_obstacle(&mut self, id: ObstacleId) {
        let before = self.obstacles.len();
        self.obstacles.retain(|o| o.id != id);
        if self.obstacles.len() != before {
            self.emit(GameEvent::ObstacleRemoved(id));
        }
    }

    fn hit_target(&mut self, id: u32) {
        let buff = self
            .targets
            .iter_mut()
            .find(|t| t.id == id)
            .and_then(|t| t.hit());
        if let Some(energy_buff) = buff {
            info!("Bonus target {id} destroyed");
            self.emit(GameEvent::TargetDestroyed { id, energy_buff });
            self.buff_ally_energy(energy_buff);
        }
    }

    /// Units that fell below the kill plane die
    fn apply_kill_zone(&mut self) {
        let kill_y = self.settings.arena.kill_plane_y;
        let fallen: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| u.is_alive() && u.pos.y < kill_y)
            .map(|u| u.id)
            .collect();
        for id in fallen {
            info!("{id} fell out of the arena");
            self.kill_unit(id);
        }
    }
}
