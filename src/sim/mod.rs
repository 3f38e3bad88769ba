//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies; the outside world is reached
//!   only through the `GameEvent` queue

pub mod ai;
pub mod aim;
pub mod cards;
pub mod collision;
pub mod error;
pub mod events;
pub mod obstacle;
pub mod projectile;
pub mod shared;
pub mod state;
pub mod target;
pub mod tasks;
pub mod tick;
pub mod turn;
pub mod unit;

pub use ai::{AiBrain, AiPhase};
pub use aim::{AimPlanner, ballistic_velocity, drag_velocity, trajectory};
pub use cards::{CardKind, CardSpec, CardTable};
pub use error::{ActionError, MatchError};
pub use events::{CameraShot, GameEvent};
pub use obstacle::{Obstacle, ObstacleId};
pub use projectile::{Body, Projectile};
pub use shared::SharedPlayerState;
pub use state::{MatchPhase, MatchState, Step, TurnTimer};
pub use target::BonusTarget;
pub use tasks::{Scope, Signal, TaskId, Tasks};
pub use tick::{Command, TickInput, tick};
pub use unit::{Controller, DamageOutcome, Facing, HumanSeat, Team, Unit, UnitId};
