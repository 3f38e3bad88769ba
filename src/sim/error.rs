//! Match error types

use serde::{Deserialize, Serialize};

use super::unit::UnitId;

/// Why a player action was refused. Refusals never change match state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionError {
    NotRunning,
    NotYourTurn,
    NotHuman,
    UnknownUnit(UnitId),
    AlreadyCommitted,
    NotCommitted,
    IndexOutOfRange { index: usize, len: usize },
    InsufficientEnergy { cost: u32, energy: u32 },
    /// Drag shorter than the minimum
    DragTooShort,
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::NotRunning => write!(f, "match is not running"),
            ActionError::NotYourTurn => write!(f, "unit is not the acting unit"),
            ActionError::NotHuman => write!(f, "unit is not human-controlled"),
            ActionError::UnknownUnit(id) => write!(f, "no such unit {id}"),
            ActionError::AlreadyCommitted => write!(f, "a card is already committed"),
            ActionError::NotCommitted => write!(f, "no card committed"),
            ActionError::IndexOutOfRange { index, len } => {
                write!(f, "hand index {index} out of range (hand has {len})")
            }
            ActionError::InsufficientEnergy { cost, energy } => {
                write!(f, "card costs {cost} but only {energy} energy left")
            }
            ActionError::DragTooShort => write!(f, "drag too short to shoot"),
        }
    }
}

impl std::error::Error for ActionError {}

/// Why a match could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchError {
    /// No living units were found after every discovery attempt
    NoUnits,
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::NoUnits => write!(f, "no units found in the arena"),
        }
    }
}

impl std::error::Error for MatchError {}
