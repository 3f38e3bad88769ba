//! Events emitted by the match for the outside world
//!
//! The simulation never calls services directly. It queues `GameEvent`s and
//! the application drains and dispatches them after each step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::cards::CardKind;
use super::error::MatchError;
use super::obstacle::ObstacleId;
use super::projectile::Body;
use super::unit::{Facing, Team, UnitId};
use crate::audio::SoundCue;

/// Camera move the match waits on before continuing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraShot {
    /// Pull back to show the whole arena
    Overview,
    /// Close in on one unit
    Focus(UnitId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    // === Match flow ===
    MatchStarting,
    MatchAborted(MatchError),
    TurnOrderBuilt { order: Vec<UnitId> },
    /// Answer with `MatchState::camera_ready` once the move completes
    CameraRequested(CameraShot),
    TurnStarted { unit: UnitId, team: Team, name: String },
    TurnEnded { unit: UnitId },
    /// Hide turn-specific UI (hand, aim guides, timer)
    HideAll,
    MatchResult { winner: Option<Team>, points_delta: i64 },
    LevelCompleted { stars: u8 },
    ShowGameOver { ally_won: bool },

    // === HUD state ===
    EnergyChanged { energy: u32, max_energy: u32 },
    HandChanged { hand: Vec<CardKind> },
    HealthChanged { unit: UnitId, health: u32, max_health: u32 },
    TimerChanged { seconds_left: u32 },
    CardSelected { unit: UnitId, card: CardKind },

    // === Shots and world ===
    ShotFired { unit: UnitId, volley: u32, card: CardKind, projectiles: usize },
    AimPreview { unit: UnitId, points: Vec<Vec2> },
    AimPreviewCleared { unit: UnitId },
    FacingChanged { unit: UnitId, facing: Facing },
    /// Push for the external physics provider to apply
    Impulse { body: Body, impulse: Vec2 },
    Explosion { pos: Vec2, radius: f32 },
    ObstacleDestroyed(ObstacleId),
    ObstacleRemoved(ObstacleId),
    TargetDestroyed { id: u32, energy_buff: u32 },
    UnitDied { unit: UnitId },
    PlaySound(SoundCue),
}
