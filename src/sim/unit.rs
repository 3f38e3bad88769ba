//! Combatant state
//!
//! A single `Unit` type covers both sides; who drives it is decided per
//! instance by its `Controller`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ai::AiBrain;
use super::cards::CardKind;

/// Index-stable handle into the match unit arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// The two sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Ally,
    Opponent,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Ally => "Ally",
            Team::Opponent => "Opponent",
        }
    }
}

/// Horizontal facing of a unit sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Left,
    Right,
}

/// Input seat for a human-driven unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HumanSeat {
    /// Local copy of the shared hand (display only, the match owns the real one)
    pub hand: Vec<CardKind>,
    /// Card paid for but not yet fired
    pub committed: Option<CardKind>,
}

/// Who decides what a unit does on its turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Controller {
    Human(HumanSeat),
    Ai(AiBrain),
}

/// Result of applying damage to a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Unit was already dead
    Ignored,
    /// Health dropped but the unit survives
    Hurt,
    /// This hit killed the unit
    Killed,
}

/// A combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub team: Team,
    pub controller: Controller,
    /// Body centre (world units, y up)
    pub pos: Vec2,
    /// Body radius for contact tests
    pub radius: f32,
    pub facing: Facing,
    health: u32,
    max_health: u32,
    energy: u32,
    max_energy: u32,
    is_dead: bool,
    is_acting: bool,
}

/// Default body radius
pub const UNIT_RADIUS: f32 = 0.5;
/// Default max health
pub const UNIT_MAX_HEALTH: u32 = 100;

impl Unit {
    pub fn new(id: UnitId, name: impl Into<String>, team: Team, controller: Controller, pos: Vec2) -> Self {
        Self {
            id,
            name: name.into(),
            team,
            controller,
            pos,
            radius: UNIT_RADIUS,
            facing: Facing::default(),
            health: UNIT_MAX_HEALTH,
            max_health: UNIT_MAX_HEALTH,
            energy: 0,
            max_energy: 0,
            is_dead: false,
            is_acting: false,
        }
    }

    /// Ally unit driven by a human player
    pub fn human(id: UnitId, name: impl Into<String>, pos: Vec2) -> Self {
        Self::new(id, name, Team::Ally, Controller::Human(HumanSeat::default()), pos)
    }

    /// Opponent unit driven by the AI planner
    pub fn ai(id: UnitId, name: impl Into<String>, pos: Vec2) -> Self {
        Self::new(id, name, Team::Opponent, Controller::Ai(AiBrain::default()), pos)
    }

    pub fn with_max_health(mut self, max_health: u32) -> Self {
        self.max_health = max_health;
        self.health = max_health;
        self
    }

    #[inline]
    pub fn health(&self) -> u32 {
        self.health
    }

    #[inline]
    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    #[inline]
    pub fn energy(&self) -> u32 {
        self.energy
    }

    #[inline]
    pub fn max_energy(&self) -> u32 {
        self.max_energy
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    #[inline]
    pub fn is_acting(&self) -> bool {
        self.is_acting
    }

    pub fn is_human(&self) -> bool {
        matches!(self.controller, Controller::Human(_))
    }

    /// Card selected and paid for but not yet fired
    pub fn committed(&self) -> Option<CardKind> {
        match &self.controller {
            Controller::Human(seat) => seat.committed,
            Controller::Ai(_) => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.committed().is_some()
    }

    pub fn seat(&self) -> Option<&HumanSeat> {
        match &self.controller {
            Controller::Human(seat) => Some(seat),
            Controller::Ai(_) => None,
        }
    }

    pub fn brain(&self) -> Option<&AiBrain> {
        match &self.controller {
            Controller::Ai(brain) => Some(brain),
            Controller::Human(_) => None,
        }
    }

    pub fn brain_mut(&mut self) -> Option<&mut AiBrain> {
        match &mut self.controller {
            Controller::Ai(brain) => Some(brain),
            Controller::Human(_) => None,
        }
    }

    /// Where projectiles leave the unit (just above the body)
    pub fn fire_point(&self) -> Vec2 {
        self.pos + Vec2::new(0.0, self.radius * 1.2)
    }

    /// Turn authority granted
    pub fn begin_turn(&mut self) {
        self.is_acting = true;
        if let Controller::Human(seat) = &mut self.controller {
            seat.committed = None;
        }
    }

    /// Turn authority revoked; any uncommitted selection is dropped
    pub fn end_turn(&mut self) {
        self.is_acting = false;
        if let Controller::Human(seat) = &mut self.controller {
            seat.committed = None;
        }
    }

    pub(crate) fn commit(&mut self, card: CardKind) {
        if let Controller::Human(seat) = &mut self.controller {
            seat.committed = Some(card);
        }
    }

    pub(crate) fn take_committed(&mut self) -> Option<CardKind> {
        match &mut self.controller {
            Controller::Human(seat) => seat.committed.take(),
            Controller::Ai(_) => None,
        }
    }

    /// Copy the shared pool into this unit's local cache
    pub fn sync_shared(&mut self, hand: &[CardKind], energy: u32, max_energy: u32) {
        self.energy = energy.min(max_energy);
        self.max_energy = max_energy;
        if let Controller::Human(seat) = &mut self.controller {
            seat.hand.clear();
            seat.hand.extend_from_slice(hand);
        }
    }

    pub fn set_energy(&mut self, energy: u32, max_energy: u32) {
        self.max_energy = max_energy;
        self.energy = energy.min(max_energy);
    }

    /// Spend energy, clamping at zero
    pub fn consume_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_sub(amount);
    }

    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.is_dead {
            return DamageOutcome::Ignored;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.die();
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt
        }
    }

    /// Kill regardless of health. Returns false if already dead.
    pub fn force_death(&mut self) -> bool {
        if self.is_dead {
            return false;
        }
        self.die();
        true
    }

    fn die(&mut self) {
        self.is_dead = true;
        self.health = 0;
        self.is_acting = false;
        if let Controller::Human(seat) = &mut self.controller {
            seat.committed = None;
        }
    }

    /// Turn to face a shot direction. Near-vertical shots keep the current
    /// facing. Returns true if the facing changed.
    pub fn face_towards(&mut self, velocity: Vec2) -> bool {
        let facing = if velocity.x > 0.1 {
            Facing::Right
        } else if velocity.x < -0.1 {
            Facing::Left
        } else {
            return false;
        };
        let changed = facing != self.facing;
        self.facing = facing;
        changed
    }
}
