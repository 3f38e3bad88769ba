//! Turn scheduling and game-over monitoring
//!
//! Every transition of the match lifecycle goes through here. Work that has
//! to wait (start-up delays, camera moves, grace periods, the result screen)
//! is parked as a `Step` in the task queue and resumed by `run_step`.

use glam::Vec2;
use log::{debug, error, info, warn};
use rand::Rng;

use super::aim::{AimPlanner, drag_velocity};
use super::ai::AiPhase;
use super::cards::CardKind;
use super::error::{ActionError, MatchError};
use super::events::{CameraShot, GameEvent};
use super::state::{MatchPhase, MatchState, Step};
use super::tasks::{Scope, Signal, TaskId};
use super::unit::{Team, Unit, UnitId};
use crate::audio::SoundCue;
use crate::seconds_to_ticks;
use crate::settings::FirstSide;

impl MatchState {
    /// Run `step` after `delay_secs` of simulation time
    pub(crate) fn schedule(&mut self, delay_secs: f32, scope: Scope, step: Step) -> TaskId {
        let now = self.time_ticks;
        self.tasks.after(now, seconds_to_ticks(delay_secs), scope, step)
    }

    /// Ask for a camera move and park `then` until it completes
    fn request_camera(&mut self, shot: CameraShot, scope: Scope, then: Step) {
        self.emit(GameEvent::CameraRequested(shot));
        self.tasks.on_signal(Signal::CameraReady, scope, then);
    }

    /// The last requested camera move finished
    pub fn camera_ready(&mut self) {
        let mark = self.tasks.watermark();
        while let Some(step) = self.tasks.pop_signaled(Signal::CameraReady, mark) {
            self.run_step(step);
        }
    }

    /// Run every continuation that is due at the current tick
    pub(crate) fn run_due_steps(&mut self) {
        while let Some(step) = self.tasks.pop_due(self.time_ticks) {
            self.run_step(step);
        }
    }

    pub(crate) fn run_step(&mut self, step: Step) {
        match step {
            Step::Discover { attempt } => self.discover(attempt),
            Step::BeginMatch => self.begin_match(),
            Step::BeginTurn => self.begin_turn(),
            Step::ActivateCurrent => self.activate_current(),
            Step::AutoEndCheck => self.auto_end_check(),
            Step::AiThink(id) => self.ai_think(id),
            Step::AiFire(id) => self.ai_fire(id),
            Step::AiEndTurn(id) => self.ai_end_turn(id),
            Step::DeferredGameOverCheck => self.prune_dead(),
            Step::ShowGameOver { ally_won } => self.show_game_over(ally_won),
            Step::RemoveObstacle(id) => self.remove_obstacle(id),
        }
    }

    // === Lifecycle ===

    /// Begin a match. A match already in progress (or finished) is reset first.
    pub fn start_match(&mut self) {
        if self.phase != MatchPhase::Idle {
            info!("Restarting match from {}", self.phase.as_str());
            self.reset_match();
        }
        self.phase = MatchPhase::Starting;
        info!("Match starting (seed {})", self.seed);
        self.emit(GameEvent::MatchStarting);
        let delay = self.settings.turn.init_delay;
        self.schedule(delay, Scope::Match, Step::Discover { attempt: 0 });
    }

    fn discover(&mut self, attempt: u32) {
        if self.phase != MatchPhase::Starting {
            return;
        }
        if !self.units.iter().any(|u| u.is_alive()) {
            let retries = self.settings.turn.discovery_retries;
            if attempt < retries {
                debug!("No units yet, retry {}/{}", attempt + 1, retries);
                let interval = self.settings.turn.discovery_retry_interval;
                self.schedule(interval, Scope::Match, Step::Discover { attempt: attempt + 1 });
            } else {
                error!("No units found after {} attempts, aborting match", attempt + 1);
                self.phase = MatchPhase::Idle;
                self.emit(GameEvent::MatchAborted(MatchError::NoUnits));
            }
            return;
        }

        self.build_turn_order();
        self.shared.seed(&self.settings.cards, &mut self.rng);
        self.sync_allies();
        self.request_camera(CameraShot::Overview, Scope::Match, Step::BeginMatch);
    }

    /// Interleave the sides (ally, opponent, ally, ...) and pick who opens
    fn build_turn_order(&mut self) {
        let allies: Vec<UnitId> = self.living(Team::Ally).map(|u| u.id).collect();
        let opponents: Vec<UnitId> = self.living(Team::Opponent).map(|u| u.id).collect();

        let mut order = Vec::with_capacity(allies.len() + opponents.len());
        for i in 0..allies.len().max(opponents.len()) {
            order.extend(allies.get(i));
            order.extend(opponents.get(i));
        }

        let opponent_first = match self.settings.turn.first_side {
            FirstSide::Random => self.rng.random_bool(0.5),
            FirstSide::Ally => false,
            FirstSide::Opponent => true,
        };
        if opponent_first && order.len() > 1 {
            order.rotate_left(1);
        }

        info!(
            "Turn order: {} allies, {} opponents, {} first",
            allies.len(),
            opponents.len(),
            if opponent_first { "opponent" } else { "ally" }
        );
        self.order = order;
        self.turn_index = 0;
        self.emit(GameEvent::TurnOrderBuilt {
            order: self.order.clone(),
        });
    }

    fn begin_match(&mut self) {
        if self.phase != MatchPhase::Starting {
            return;
        }
        self.phase = MatchPhase::Running;
        self.turn_index = 0;
        info!("Match running with {} units", self.order.len());
        self.check_game_over();
        self.begin_turn();
    }

    /// Force `Idle`, dropping every pending continuation and shell in flight
    pub fn stop_match(&mut self) {
        self.tasks.cancel_all();
        self.timer.stop();
        self.auto_end = None;
        self.current = None;
        self.turn_started = false;
        for unit in &mut self.units {
            if unit.is_acting() {
                unit.end_turn();
            }
            if let Some(brain) = unit.brain_mut() {
                brain.reset();
            }
        }
        self.projectiles.clear();
        if self.phase != MatchPhase::Idle {
            info!("Match stopped from {}", self.phase.as_str());
            self.phase = MatchPhase::Idle;
            self.emit(GameEvent::HideAll);
        }
    }

    /// Stop and forget the turn order and every energy gain
    pub fn reset_match(&mut self) {
        self.stop_match();
        self.order.clear();
        self.turn_index = 0;
        self.shared.reset();
        self.opponent_turns = 0;
    }

    // === Turns ===

    fn begin_turn(&mut self) {
        if !self.is_running() {
            return;
        }
        self.prune_dead();
        if !self.is_running() || self.order.is_empty() {
            return;
        }
        if self.turn_index >= self.order.len() {
            self.turn_index = 0;
        }
        let id = self.order[self.turn_index];
        self.current = Some(id);
        self.request_camera(CameraShot::Focus(id), Scope::Turn, Step::ActivateCurrent);
    }

    /// Camera is on the unit: hand it turn authority
    fn activate_current(&mut self) {
        if !self.is_running() {
            return;
        }
        let Some(id) = self.current else { return };
        let Some(unit) = self.unit(id).filter(|u| u.is_alive()) else {
            warn!("{id} cannot take its turn, skipping");
            self.close_turn(id);
            self.after_turn();
            return;
        };
        let (team, name, human) = (unit.team, unit.name.clone(), unit.is_human());

        if human {
            self.shared.begin_ally_turn(&self.settings.cards, &mut self.rng);
            if let Some(unit) = self.unit_mut(id) {
                unit.begin_turn();
            }
            self.sync_allies();
            self.emit(GameEvent::PlaySound(SoundCue::PlayerTurn));
        } else {
            self.opponent_turns += 1;
            let max_energy = self.settings.turn.base_max_energy + self.opponent_turns;
            if let Some(unit) = self.unit_mut(id) {
                unit.set_energy(max_energy, max_energy);
                unit.begin_turn();
                if let Some(brain) = unit.brain_mut() {
                    brain.reset();
                    brain.phase = AiPhase::Thinking;
                }
            }
            let think = self.settings.ai.think_time;
            self.schedule(think, Scope::Turn, Step::AiThink(id));
        }

        self.turn_started = true;
        info!("{} turn: {} ({id})", team.as_str(), name);
        self.emit(GameEvent::TurnStarted { unit: id, team, name });
        self.start_timer();
    }

    /// Finish the acting unit's turn and move to the next one.
    ///
    /// No-op unless the match is running and a unit is acting.
    pub fn end_turn(&mut self) {
        if !self.is_running() {
            debug!("end_turn ignored while {}", self.phase.as_str());
            return;
        }
        let Some(id) = self
            .current
            .filter(|&id| self.unit(id).is_some_and(|u| u.is_acting()))
        else {
            debug!("end_turn ignored, no unit is acting");
            return;
        };

        let pos = self.order.iter().position(|&u| u == id);
        self.close_turn(id);
        if let Some(pos) = pos {
            self.turn_index = (pos + 1) % self.order.len();
        }
        self.after_turn();
    }

    /// Revoke turn authority and drop everything bound to the turn
    fn close_turn(&mut self, id: UnitId) {
        self.timer.stop();
        if let Some(task) = self.auto_end.take() {
            self.tasks.cancel(task);
        }
        self.tasks.cancel_scope(Scope::Turn);

        let show_preview = self.settings.ai.show_preview;
        let mut clear_preview = false;
        let mut human = false;
        if let Some(unit) = self.unit_mut(id) {
            unit.end_turn();
            human = unit.is_human();
            if let Some(brain) = unit.brain_mut() {
                clear_preview = show_preview && brain.phase == AiPhase::Aiming;
                brain.reset();
            }
        }
        if clear_preview {
            self.emit(GameEvent::AimPreviewCleared { unit: id });
        }
        if human {
            self.sync_allies();
        }
        self.current = None;
        // A unit still waiting on its focus camera never had a turn to end
        if std::mem::take(&mut self.turn_started) {
            self.emit(GameEvent::TurnEnded { unit: id });
        }
        self.emit(GameEvent::HideAll);
    }

    /// Between turns: drop the dead, then overview and hand over
    fn after_turn(&mut self) {
        self.prune_dead();
        if !self.is_running() {
            return;
        }
        self.request_camera(CameraShot::Overview, Scope::Match, Step::BeginTurn);
    }

    fn start_timer(&mut self) {
        self.timer.start(self.settings.turn.turn_duration);
        self.emit(GameEvent::TimerChanged {
            seconds_left: self.timer.shown,
        });
    }

    pub(crate) fn advance_timer(&mut self, dt: f32) {
        if let Some(seconds_left) = self.timer.advance(dt) {
            self.emit(GameEvent::TimerChanged { seconds_left });
        }
        if self.timer.expired() {
            self.timer.stop();
            info!("Turn timer expired");
            self.end_turn();
        }
    }

    // === Deaths and game over ===

    /// Remove from the turn order, keeping the cursor on the same unit.
    /// Returns false if the unit was not in the order.
    pub(crate) fn remove_from_order(&mut self, id: UnitId) -> bool {
        let Some(pos) = self.order.iter().position(|&u| u == id) else {
            return false;
        };
        self.order.remove(pos);
        if pos < self.turn_index {
            self.turn_index -= 1;
        }
        if self.turn_index >= self.order.len() {
            self.turn_index = 0;
        }
        true
    }

    /// Drop every dead unit from the order, then re-check for game over
    pub(crate) fn prune_dead(&mut self) {
        let dead: Vec<UnitId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| self.unit(id).is_none_or(|u| u.is_dead()))
            .collect();
        for id in dead {
            self.remove_from_order(id);
        }
        self.check_game_over();
    }

    pub(crate) fn on_unit_died(&mut self, id: UnitId) {
        if !self.is_running() {
            return;
        }
        let was_current = self.current == Some(id);
        self.remove_from_order(id);
        self.check_game_over();
        if was_current && self.is_running() {
            info!("{id} died during its own turn");
            self.close_turn(id);
            self.after_turn();
        }
    }

    fn side_present(&self, team: Team) -> bool {
        self.order
            .iter()
            .any(|&id| self.unit(id).is_some_and(|u| u.team == team && u.is_alive()))
    }

    /// End the match if a side has been wiped out. Safe to call any time;
    /// only a running match can end, so it ends once.
    pub fn check_game_over(&mut self) {
        if !self.is_running() {
            return;
        }
        let winner = match (self.side_present(Team::Ally), self.side_present(Team::Opponent)) {
            (true, true) => return,
            (true, false) => Some(Team::Ally),
            (false, true) => Some(Team::Opponent),
            (false, false) => None,
        };
        self.declare_game_over(winner);
    }

    fn declare_game_over(&mut self, winner: Option<Team>) {
        self.phase = MatchPhase::GameOver { winner };
        self.current = None;
        self.turn_started = false;
        for unit in &mut self.units {
            if unit.is_acting() {
                unit.end_turn();
            }
            if let Some(brain) = unit.brain_mut() {
                brain.reset();
            }
        }
        self.timer.stop();
        self.auto_end = None;
        self.tasks.cancel_all();

        let ally_won = winner == Some(Team::Ally);
        let points_delta = if ally_won {
            i64::from(self.settings.turn.points_for_win)
        } else {
            -i64::from(self.settings.turn.points_for_loss)
        };
        match winner {
            Some(team) => info!("Game over: {} side wins", team.as_str()),
            None => info!("Game over: no survivors"),
        }

        self.emit(GameEvent::HideAll);
        self.emit(GameEvent::MatchResult {
            winner,
            points_delta,
        });
        if ally_won {
            self.emit(GameEvent::LevelCompleted { stars: 3 });
        }
        let delay = self.settings.turn.game_over_delay;
        self.schedule(delay, Scope::Match, Step::ShowGameOver { ally_won });
    }

    fn show_game_over(&mut self, ally_won: bool) {
        let cue = if ally_won { SoundCue::Win } else { SoundCue::Lose };
        self.emit(GameEvent::PlaySound(cue));
        self.emit(GameEvent::ShowGameOver { ally_won });
    }

    // === Human actions ===

    /// Pay for the card at `hand_index` and arm it for the next shot
    pub fn select_action(&mut self, unit: UnitId, hand_index: usize) -> Result<CardKind, ActionError> {
        self.try_select(unit, hand_index)
            .inspect_err(|e| debug!("{unit} cannot select card {hand_index}: {e}"))
    }

    fn try_select(&mut self, id: UnitId, hand_index: usize) -> Result<CardKind, ActionError> {
        let unit = self.check_human_turn(id)?;
        if unit.is_committed() {
            return Err(ActionError::AlreadyCommitted);
        }
        let hand = self.shared.hand();
        let card = *hand.get(hand_index).ok_or(ActionError::IndexOutOfRange {
            index: hand_index,
            len: hand.len(),
        })?;
        let cost = self.settings.cards.cost(card);
        if !self.shared.can_afford(cost) {
            return Err(ActionError::InsufficientEnergy {
                cost,
                energy: self.shared.energy(),
            });
        }

        self.shared.consume_energy(cost);
        self.shared.take_card(hand_index);
        if let Some(task) = self.auto_end.take() {
            self.tasks.cancel(task);
        }
        if let Some(unit) = self.unit_mut(id) {
            unit.commit(card);
        }
        self.sync_allies();
        debug!("{id} committed {} for {cost}", card.as_str());
        self.emit(GameEvent::PlaySound(SoundCue::Click));
        self.emit(GameEvent::CardSelected { unit: id, card });
        Ok(card)
    }

    /// Fire the committed card. Returns the number of shells launched.
    pub fn shoot(&mut self, unit: UnitId, velocity: Vec2) -> Result<usize, ActionError> {
        self.try_shoot(unit, velocity)
            .inspect_err(|e| debug!("{unit} cannot shoot: {e}"))
    }

    fn try_shoot(&mut self, id: UnitId, velocity: Vec2) -> Result<usize, ActionError> {
        self.check_human_turn(id)?;
        let unit = self.unit_mut(id).ok_or(ActionError::UnknownUnit(id))?;
        let card = unit.take_committed().ok_or(ActionError::NotCommitted)?;
        let turned = unit.face_towards(velocity);
        let facing = unit.facing;
        if turned {
            self.emit(GameEvent::FacingChanged { unit: id, facing });
        }

        let count = self.spawn_volley(id, card, velocity);
        self.sync_allies();
        self.on_shot_fired(id);
        Ok(count)
    }

    /// Shoot with a slingshot drag instead of a raw velocity
    pub fn shoot_drag(&mut self, unit: UnitId, drag: Vec2) -> Result<usize, ActionError> {
        match drag_velocity(drag, &self.settings.drag) {
            Some(velocity) => self.shoot(unit, velocity),
            None => {
                debug!("{unit} drag of {:.2} ignored", drag.length());
                Err(ActionError::DragTooShort)
            }
        }
    }

    /// A player passing. Only the acting human may end its own turn.
    pub fn request_end_turn(&mut self, unit: UnitId) -> Result<(), ActionError> {
        self.check_human_turn(unit)
            .inspect_err(|e| debug!("{unit} cannot end the turn: {e}"))?;
        self.end_turn();
        Ok(())
    }

    /// Preview arc for a shot from `unit` at `velocity`
    pub fn trajectory_points(&self, unit: UnitId, velocity: Vec2) -> Vec<Vec2> {
        let Some(unit) = self.unit(unit) else {
            return Vec::new();
        };
        AimPlanner::new(
            &self.settings.ai,
            self.settings.projectile.gravity,
            self.settings.arena.ground_y,
        )
        .trajectory_points(unit.fire_point(), velocity)
    }

    fn check_human_turn(&self, id: UnitId) -> Result<&Unit, ActionError> {
        if !self.is_running() {
            return Err(ActionError::NotRunning);
        }
        let unit = self.unit(id).ok_or(ActionError::UnknownUnit(id))?;
        if self.current != Some(id) || !unit.is_acting() {
            return Err(ActionError::NotYourTurn);
        }
        if !unit.is_human() {
            return Err(ActionError::NotHuman);
        }
        Ok(unit)
    }

    /// A human shot starts (or restarts) the grace countdown
    fn on_shot_fired(&mut self, id: UnitId) {
        if !self.unit(id).is_some_and(|u| u.is_human()) {
            return;
        }
        if let Some(task) = self.auto_end.take() {
            self.tasks.cancel(task);
        }
        let delay = self.settings.turn.auto_end_delay;
        self.auto_end = Some(self.schedule(delay, Scope::Turn, Step::AutoEndCheck));
    }

    fn auto_end_check(&mut self) {
        self.auto_end = None;
        if !self.is_running() {
            return;
        }
        let Some(unit) = self.current.and_then(|id| self.unit(id)) else {
            return;
        };
        if !unit.is_human() || !unit.is_acting() || unit.is_committed() {
            return;
        }
        if self.shared.hand().is_empty() || !self.shared.has_playable(&self.settings.cards) {
            info!("{} has nothing left to play, ending turn", unit.id);
            self.end_turn();
        }
    }

    /// Permanently raise the ally energy pool and refill it
    pub fn buff_ally_energy(&mut self, amount: u32) {
        self.shared.buff(amount);
        info!(
            "Ally energy buffed by {amount}, max now {}",
            self.shared.max_energy()
        );
        self.sync_allies();
        if let Some(task) = self.auto_end.take() {
            self.tasks.cancel(task);
        }
        if self.timer.running {
            self.start_timer();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MatchSettings;

    fn arena(allies: usize, opponents: usize) -> MatchState {
        let mut settings = MatchSettings::default();
        settings.turn.first_side = FirstSide::Ally;
        let mut state = MatchState::new(42, settings);
        for i in 0..allies {
            state.add_unit(Unit::human(UnitId(0), format!("A{i}"), Vec2::new(-10.0 - 4.0 * i as f32, 0.5)));
        }
        for i in 0..opponents {
            state.add_unit(Unit::ai(UnitId(0), format!("O{i}"), Vec2::new(10.0 + 4.0 * i as f32, 0.5)));
        }
        state
    }

    /// Advance time, answering every camera request at once
    fn run(state: &mut MatchState, secs: f32) {
        for _ in 0..seconds_to_ticks(secs) {
            state.time_ticks += 1;
            state.run_due_steps();
            state.advance_timer(crate::consts::SIM_DT);
            while state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::CameraRequested(_)))
            {
                state.camera_ready();
            }
        }
    }

    #[test]
    fn test_interleaved_order() {
        let mut state = arena(3, 2);
        state.start_match();
        run(&mut state, 1.0);
        let ids: Vec<u32> = state.order().iter().map(|id| id.0).collect();
        // allies are 0..3, opponents 3..5
        assert_eq!(ids, vec![0, 3, 1, 4, 2]);
    }

    #[test]
    fn test_opponent_first_rotates() {
        let mut state = arena(2, 2);
        state.settings.turn.first_side = FirstSide::Opponent;
        state.start_match();
        run(&mut state, 1.0);
        let ids: Vec<u32> = state.order().iter().map(|id| id.0).collect();
        assert_eq!(ids, vec![2, 1, 3, 0]);
        assert_eq!(state.current(), Some(UnitId(2)));
    }

    #[test]
    fn test_no_units_aborts_after_retries() {
        let mut state = arena(0, 0);
        state.start_match();
        assert_eq!(state.phase(), MatchPhase::Starting);
        run(&mut state, 0.5 + 0.2 * 4.0);
        assert_eq!(state.phase(), MatchPhase::Starting);
        state.time_ticks += seconds_to_ticks(0.2);
        state.run_due_steps();
        assert_eq!(state.phase(), MatchPhase::Idle);
        assert!(state
            .drain_events()
            .contains(&GameEvent::MatchAborted(MatchError::NoUnits)));
    }

    #[test]
    fn test_late_units_are_discovered() {
        let mut state = arena(0, 0);
        state.start_match();
        run(&mut state, 0.6);
        state.add_unit(Unit::human(UnitId(0), "Late", Vec2::new(-5.0, 0.5)));
        state.add_unit(Unit::ai(UnitId(0), "Later", Vec2::new(5.0, 0.5)));
        run(&mut state, 0.5);
        assert!(state.is_running());
        assert_eq!(state.acting_count(), 1);
    }

    #[test]
    fn test_remove_before_cursor_keeps_current() {
        let mut state = arena(2, 2);
        state.order = vec![UnitId(0), UnitId(2), UnitId(1), UnitId(3)];
        state.turn_index = 2;
        assert!(state.remove_from_order(UnitId(0)));
        assert_eq!(state.order[state.turn_index], UnitId(1));
        assert!(state.remove_from_order(UnitId(3)));
        assert_eq!(state.order[state.turn_index], UnitId(1));
        assert!(!state.remove_from_order(UnitId(3)));
        // Removing the last entry at the cursor wraps
        state.turn_index = 1;
        state.remove_from_order(UnitId(1));
        assert_eq!(state.turn_index, 0);
    }

    #[test]
    fn test_end_turn_outside_running_is_noop() {
        let mut state = arena(1, 1);
        state.end_turn();
        assert_eq!(state.phase(), MatchPhase::Idle);
        state.start_match();
        state.end_turn();
        assert_eq!(state.phase(), MatchPhase::Starting);
        assert!(state.drain_events().iter().all(|e| !matches!(e, GameEvent::TurnEnded { .. })));
    }

    #[test]
    fn test_player_cannot_end_an_ai_turn() {
        let mut state = arena(1, 1);
        state.settings.turn.first_side = FirstSide::Opponent;
        state.start_match();
        run(&mut state, 1.0);
        let (ally, bot) = (UnitId(0), UnitId(1));
        assert_eq!(state.current(), Some(bot));
        assert!(state.unit(bot).unwrap().is_acting());

        assert_eq!(state.request_end_turn(ally), Err(ActionError::NotYourTurn));
        assert_eq!(state.request_end_turn(bot), Err(ActionError::NotHuman));
        assert_eq!(state.current(), Some(bot));
        assert!(state.unit(bot).unwrap().is_acting());
        assert!(state.drain_events().iter().all(|e| !matches!(e, GameEvent::TurnEnded { .. })));
    }

    #[test]
    fn test_acting_human_can_pass() {
        let mut state = arena(1, 1);
        state.start_match();
        run(&mut state, 1.0);
        assert_eq!(state.request_end_turn(UnitId(0)), Ok(()));
        assert_eq!(state.current(), None);
        assert!(state.drain_events().contains(&GameEvent::TurnEnded { unit: UnitId(0) }));
    }

    #[test]
    fn test_select_and_shoot() {
        let mut state = arena(1, 1);
        state.start_match();
        run(&mut state, 1.0);
        let ally = UnitId(0);
        assert_eq!(state.current(), Some(ally));
        assert_eq!(state.shoot(ally, Vec2::X), Err(ActionError::NotCommitted));
        assert_eq!(state.select_action(UnitId(1), 0), Err(ActionError::NotYourTurn));
        assert!(matches!(
            state.select_action(ally, 9),
            Err(ActionError::IndexOutOfRange { index: 9, len: 4 })
        ));

        // Turn 1 of the ally: max energy grew from 3 to 4
        assert_eq!(state.shared().energy(), 4);
        let card = state.shared().hand()[0];
        let cost = state.settings.cards.cost(card);
        assert_eq!(state.select_action(ally, 0), Ok(card));
        assert_eq!(state.shared().energy(), 4 - cost);
        assert_eq!(state.shared().hand().len(), 3);
        assert_eq!(state.unit(ally).unwrap().energy(), 4 - cost);
        assert_eq!(state.select_action(ally, 0), Err(ActionError::AlreadyCommitted));

        let fired = state.shoot(ally, Vec2::new(8.0, 8.0)).unwrap();
        assert_eq!(fired, state.settings.cards.spec(card).count as usize);
        assert_eq!(state.projectiles.len(), fired);
        assert!(!state.unit(ally).unwrap().is_committed());
        assert!(state.auto_end.is_some());
    }

    #[test]
    fn test_insufficient_energy_changes_nothing() {
        let mut state = arena(1, 1);
        state.start_match();
        run(&mut state, 1.0);
        state.shared.consume_energy(100);
        let hand_before = state.shared().hand().to_vec();
        assert!(matches!(
            state.select_action(UnitId(0), 0),
            Err(ActionError::InsufficientEnergy { energy: 0, .. })
        ));
        assert_eq!(state.shared().hand(), hand_before.as_slice());
        assert!(!state.unit(UnitId(0)).unwrap().is_committed());
    }

    #[test]
    fn test_timer_forces_end_turn() {
        let mut state = arena(1, 1);
        state.settings.turn.turn_duration = 2.0;
        state.start_match();
        run(&mut state, 1.0);
        assert_eq!(state.current(), Some(UnitId(0)));
        run(&mut state, 2.1);
        assert_eq!(state.current(), Some(UnitId(1)));
        assert!(!state.unit(UnitId(0)).unwrap().is_acting());
    }

    #[test]
    fn test_mid_turn_elimination_ends_match() {
        let mut state = arena(1, 2);
        state.start_match();
        run(&mut state, 1.0);
        assert_eq!(state.current(), Some(UnitId(0)));
        state.unit_mut(UnitId(1)).unwrap().force_death();
        state.on_unit_died(UnitId(1));
        assert!(state.is_running());
        state.unit_mut(UnitId(2)).unwrap().force_death();
        state.on_unit_died(UnitId(2));
        assert_eq!(state.phase(), MatchPhase::GameOver { winner: Some(Team::Ally) });
        assert_eq!(state.acting_count(), 0);
        assert!(!state.timer().running);
        // Only the result screen is still pending
        assert_eq!(state.pending_tasks(), 1);
        let events = state.drain_events();
        let results = events
            .iter()
            .filter(|e| matches!(e, GameEvent::MatchResult { .. }))
            .count();
        assert_eq!(results, 1);
        assert!(events.contains(&GameEvent::MatchResult {
            winner: Some(Team::Ally),
            points_delta: 50
        }));
        assert!(events.contains(&GameEvent::LevelCompleted { stars: 3 }));

        // Repeated checks do nothing
        state.check_game_over();
        state.prune_dead();
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_acting_unit_death_hands_over() {
        let mut state = arena(2, 1);
        state.start_match();
        run(&mut state, 1.0);
        assert_eq!(state.current(), Some(UnitId(0)));
        state.unit_mut(UnitId(0)).unwrap().force_death();
        state.on_unit_died(UnitId(0));
        assert!(state.is_running());
        assert_eq!(state.current(), None);
        assert_eq!(state.order(), &[UnitId(2), UnitId(1)]);
        run(&mut state, 0.1);
        assert_eq!(state.current(), Some(UnitId(2)));
    }

    #[test]
    fn test_death_before_activation_ends_no_turn() {
        let mut state = arena(1, 2);
        state.start_match();
        run(&mut state, 1.0);
        state.end_turn();
        // Overview done, the focus pan on O0 is still moving
        state.camera_ready();
        assert_eq!(state.current(), Some(UnitId(1)));
        assert!(!state.unit(UnitId(1)).unwrap().is_acting());
        state.drain_events();

        state.unit_mut(UnitId(1)).unwrap().force_death();
        state.on_unit_died(UnitId(1));
        assert!(state.is_running());
        assert_eq!(state.current(), None);
        assert!(state.drain_events().iter().all(|e| !matches!(e, GameEvent::TurnEnded { .. })));

        // Finish the overview, then O1 takes over
        state.camera_ready();
        run(&mut state, 0.1);
        assert_eq!(state.current(), Some(UnitId(2)));
        assert_eq!(state.acting_count(), 1);
    }

    #[test]
    fn test_buff_restarts_timer_and_grace() {
        let mut state = arena(1, 1);
        state.start_match();
        run(&mut state, 1.0);
        state.settings.turn.auto_end_delay = 10.0;
        state.select_action(UnitId(0), 0).unwrap();
        state.shoot(UnitId(0), Vec2::new(0.0, 30.0)).unwrap();
        run(&mut state, 5.0);
        assert!(state.timer().remaining < 26.0);
        let max_before = state.shared().max_energy();
        state.buff_ally_energy(2);
        assert_eq!(state.shared().max_energy(), max_before + 2);
        assert_eq!(state.shared().energy(), max_before + 2);
        assert_eq!(state.timer().remaining, 30.0);
        assert!(state.auto_end.is_none());
    }

    #[test]
    fn test_stop_is_idempotent_and_silences_tasks() {
        let mut state = arena(1, 1);
        state.start_match();
        run(&mut state, 1.0);
        state.stop_match();
        state.stop_match();
        assert_eq!(state.phase(), MatchPhase::Idle);
        assert_eq!(state.pending_tasks(), 0);
        assert_eq!(state.acting_count(), 0);
        state.drain_events();
        run(&mut state, 40.0);
        assert!(state.drain_events().is_empty());
    }
}
