//! Opponent turn state machine
//!
//! Thinking -> Aiming -> Firing -> EndDelay, one turn-scoped step each, so
//! closing the turn early (timer, death, game over) drops whatever is left.

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};

use super::aim::{AimPlanner, nearest_target};
use super::cards::CardKind;
use super::events::GameEvent;
use super::state::{MatchState, Step};
use super::tasks::Scope;
use super::unit::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiPhase {
    #[default]
    Idle,
    Thinking,
    /// Shot planned, preview showing
    Aiming,
    Firing,
    /// Shot away, waiting before handing over the turn
    EndDelay,
}

/// Per-unit AI state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiBrain {
    pub phase: AiPhase,
    /// Launch velocity chosen while thinking
    pub planned: Option<Vec2>,
    pub target: Option<UnitId>,
}

impl AiBrain {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl MatchState {
    /// The step belongs to the unit that is acting right now and its brain
    /// is where the step expects it to be
    fn ai_in_phase(&self, id: UnitId, phase: AiPhase) -> bool {
        self.is_running()
            && self.current == Some(id)
            && self.unit(id).is_some_and(|u| {
                u.is_alive() && u.is_acting() && u.brain().is_some_and(|b| b.phase == phase)
            })
    }

    pub(crate) fn ai_think(&mut self, id: UnitId) {
        if !self.ai_in_phase(id, AiPhase::Thinking) {
            return;
        }
        let Some(shooter) = self.units.get(id.0 as usize) else {
            return;
        };
        let Some((target_id, target_pos)) = nearest_target(shooter, &self.units).map(|t| (t.id, t.pos))
        else {
            info!("{id} has nothing to shoot at, passing");
            self.end_turn();
            return;
        };

        let planner = AimPlanner::new(
            &self.settings.ai,
            self.settings.projectile.gravity,
            self.settings.arena.ground_y,
        );
        let Some(velocity) = planner.plan(shooter, target_pos, &self.units, &mut self.rng) else {
            info!("{id} found no shot that spares its team, forfeiting turn");
            self.end_turn();
            return;
        };
        let points = planner.trajectory_points(shooter.fire_point(), velocity);

        let Some(unit) = self.units.get_mut(id.0 as usize) else {
            return;
        };
        let turned = unit.face_towards(velocity);
        let facing = unit.facing;
        if let Some(brain) = unit.brain_mut() {
            brain.phase = AiPhase::Aiming;
            brain.planned = Some(velocity);
            brain.target = Some(target_id);
        }
        if turned {
            self.emit(GameEvent::FacingChanged { unit: id, facing });
        }

        let delay = if self.settings.ai.show_preview {
            self.emit(GameEvent::AimPreview { unit: id, points });
            self.settings.ai.preview_duration
        } else {
            0.0
        };
        self.schedule(delay, Scope::Turn, Step::AiFire(id));
    }

    pub(crate) fn ai_fire(&mut self, id: UnitId) {
        if !self.ai_in_phase(id, AiPhase::Aiming) {
            return;
        }
        let cost = self.settings.cards.cost(CardKind::Standard);
        let Some(unit) = self.unit_mut(id) else { return };
        let Some(velocity) = unit.brain().and_then(|b| b.planned) else {
            return;
        };
        unit.consume_energy(cost);
        if let Some(brain) = unit.brain_mut() {
            brain.phase = AiPhase::Firing;
        }

        if self.settings.ai.show_preview {
            self.emit(GameEvent::AimPreviewCleared { unit: id });
        }
        self.spawn_volley(id, CardKind::Standard, velocity);

        if let Some(brain) = self.unit_mut(id).and_then(|u| u.brain_mut()) {
            brain.phase = AiPhase::EndDelay;
        }
        let delay = self.settings.ai.end_turn_delay;
        self.schedule(delay, Scope::Turn, Step::AiEndTurn(id));
    }

    pub(crate) fn ai_end_turn(&mut self, id: UnitId) {
        if self.ai_in_phase(id, AiPhase::EndDelay) {
            self.end_turn();
        }
    }
}
