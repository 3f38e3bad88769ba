//! Match state and core simulation types
//!
//! Everything a match needs lives in one `MatchState`: the unit arena, the
//! turn order, the shared ally pool, pending continuations and the outgoing
//! event queue. The application owns it and drives it through `tick`.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::obstacle::{Obstacle, ObstacleId};
use super::projectile::Projectile;
use super::shared::SharedPlayerState;
use super::target::BonusTarget;
use super::tasks::{TaskId, Tasks};
use super::unit::{Team, Unit, UnitId};
use crate::settings::MatchSettings;

/// Lifecycle of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Nothing scheduled
    Idle,
    /// Waiting for units to show up and the intro camera to finish
    Starting,
    /// Turns are being played
    Running,
    /// Terminal. `None` means both sides were wiped out.
    GameOver { winner: Option<Team> },
}

impl MatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::Idle => "Idle",
            MatchPhase::Starting => "Starting",
            MatchPhase::Running => "Running",
            MatchPhase::GameOver { .. } => "GameOver",
        }
    }
}

/// Deferred work, resumed by the scheduler when due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Discover { attempt: u32 },
    BeginMatch,
    BeginTurn,
    ActivateCurrent,
    AutoEndCheck,
    AiThink(UnitId),
    AiFire(UnitId),
    AiEndTurn(UnitId),
    DeferredGameOverCheck,
    ShowGameOver { ally_won: bool },
    RemoveObstacle(ObstacleId),
}

/// Per-turn countdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnTimer {
    pub remaining: f32,
    pub running: bool,
    /// Whole seconds last reported to the HUD
    pub shown: u32,
}

impl TurnTimer {
    pub fn start(&mut self, duration: f32) {
        self.remaining = duration;
        self.running = true;
        self.shown = duration.max(0.0).ceil() as u32;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Count down. Returns the new whole-second value when it changes.
    pub fn advance(&mut self, dt: f32) -> Option<u32> {
        if !self.running {
            return None;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        let shown = self.remaining.ceil() as u32;
        if shown != self.shown {
            self.shown = shown;
            Some(shown)
        } else {
            None
        }
    }

    pub fn expired(&self) -> bool {
        self.running && self.remaining <= 0.0
    }
}

/// Complete match state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct MatchState {
    /// Seed the match RNG was created from
    pub seed: u64,
    pub settings: MatchSettings,
    pub(crate) phase: MatchPhase,
    /// Simulation tick counter
    pub time_ticks: u64,

    /// Unit arena; `UnitId(n)` is index n. Dead units stay.
    pub units: Vec<Unit>,
    /// Breakable walls (sorted by id)
    pub obstacles: Vec<Obstacle>,
    pub targets: Vec<BonusTarget>,
    /// Shells in flight (sorted by id)
    pub projectiles: Vec<Projectile>,

    pub(crate) order: Vec<UnitId>,
    pub(crate) turn_index: usize,
    pub(crate) current: Option<UnitId>,
    /// The current unit has been handed authority (its focus camera is done)
    pub(crate) turn_started: bool,
    pub(crate) shared: SharedPlayerState,
    /// Opponent turns started this match
    pub(crate) opponent_turns: u32,
    pub(crate) timer: TurnTimer,
    /// Pending grace-period check after a human shot
    pub(crate) auto_end: Option<TaskId>,
    pub(crate) tasks: Tasks<Step>,
    pub(crate) rng: Pcg32,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl MatchState {
    /// Create an empty arena with the given seed
    pub fn new(seed: u64, settings: MatchSettings) -> Self {
        let shared = SharedPlayerState::new(
            settings.turn.base_max_energy,
            settings.turn.energy_per_turn,
            settings.turn.hand_size,
        );
        Self {
            seed,
            settings,
            phase: MatchPhase::Idle,
            time_ticks: 0,
            units: Vec::new(),
            obstacles: Vec::new(),
            targets: Vec::new(),
            projectiles: Vec::new(),
            order: Vec::new(),
            turn_index: 0,
            current: None,
            turn_started: false,
            shared,
            opponent_turns: 0,
            timer: TurnTimer::default(),
            auto_end: None,
            tasks: Tasks::new(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID (obstacles, targets, shells, volleys)
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Put a unit into the arena. Its id is reassigned to its arena slot.
    pub fn add_unit(&mut self, mut unit: Unit) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        unit.id = id;
        self.units.push(unit);
        id
    }

    pub fn add_obstacle(&mut self, mut obstacle: Obstacle) -> ObstacleId {
        let id = ObstacleId(self.next_entity_id());
        obstacle.id = id;
        self.obstacles.push(obstacle);
        id
    }

    pub fn add_target(&mut self, mut target: BonusTarget) -> u32 {
        let id = self.next_entity_id();
        target.id = id;
        self.targets.push(target);
        id
    }

    #[inline]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == MatchPhase::Running
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0 as usize)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.0 as usize)
    }

    /// Turn order as unit ids
    pub fn order(&self) -> &[UnitId] {
        &self.order
    }

    #[inline]
    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    /// Unit whose turn it is (set from turn begin until turn close)
    #[inline]
    pub fn current(&self) -> Option<UnitId> {
        self.current
    }

    pub fn shared(&self) -> &SharedPlayerState {
        &self.shared
    }

    #[inline]
    pub fn opponent_turns(&self) -> u32 {
        self.opponent_turns
    }

    pub fn timer(&self) -> &TurnTimer {
        &self.timer
    }

    /// Units currently holding turn authority
    pub fn acting_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_acting()).count()
    }

    pub fn living(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |u| u.team == team && u.is_alive())
    }

    /// Number of continuations waiting to run
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Queue an event for the application
    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every queued event, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Push the shared pool into every living ally and notify the HUD
    pub(crate) fn sync_allies(&mut self) {
        let hand = self.shared.hand().to_vec();
        let energy = self.shared.energy();
        let max_energy = self.shared.max_energy();
        for unit in self
            .units
            .iter_mut()
            .filter(|u| u.team == Team::Ally && u.is_alive())
        {
            unit.sync_shared(&hand, energy, max_energy);
        }
        self.emit(GameEvent::EnergyChanged { energy, max_energy });
        self.emit(GameEvent::HandChanged { hand });
    }
}
