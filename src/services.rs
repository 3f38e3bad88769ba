//! Collaborators the match talks to
//!
//! The simulation only emits `GameEvent`s. `app::Game` routes them to the
//! services installed here. Every service except the score store is optional;
//! a missing one is skipped, and a missing camera completes instantly.

use log::{debug, info};

use crate::audio::SoundCue;
use crate::sim::{CameraShot, GameEvent};

/// Receives every event the match emits (HUD widgets, overlays, effects)
pub trait Hud {
    fn on_event(&mut self, event: &GameEvent);
}

/// Camera cinematics. `advance` returns true on the tick the current move
/// completes.
pub trait CameraRig {
    fn begin(&mut self, shot: CameraShot);
    fn advance(&mut self, dt: f32) -> bool;
}

/// Plays a cue at the given gain (already mixed)
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue, volume: f32);
}

/// Integer key-value store for rank points
pub trait ScoreStore {
    /// Stored points, or None if nothing was saved yet
    fn load_points(&self) -> Option<u32>;
    fn store_points(&mut self, points: u32);
}

/// Level flow (unlocking the next level, star ratings)
pub trait LevelProgress {
    fn complete_level(&mut self, stars: u8);
}

/// Service context owned by the application
pub struct Services {
    pub hud: Option<Box<dyn Hud>>,
    pub camera: Option<Box<dyn CameraRig>>,
    pub audio: Option<Box<dyn AudioSink>>,
    pub scores: Box<dyn ScoreStore>,
    pub levels: Option<Box<dyn LevelProgress>>,
}

impl Default for Services {
    fn default() -> Self {
        Self::headless()
    }
}

impl Services {
    /// No presentation at all, points kept in memory
    pub fn headless() -> Self {
        Self {
            hud: None,
            camera: None,
            audio: None,
            scores: Box::new(MemoryScoreStore::default()),
            levels: None,
        }
    }

    pub fn with_hud(mut self, hud: impl Hud + 'static) -> Self {
        self.hud = Some(Box::new(hud));
        self
    }

    pub fn with_camera(mut self, camera: impl CameraRig + 'static) -> Self {
        self.camera = Some(Box::new(camera));
        self
    }

    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    pub fn with_scores(mut self, scores: impl ScoreStore + 'static) -> Self {
        self.scores = Box::new(scores);
        self
    }

    pub fn with_levels(mut self, levels: impl LevelProgress + 'static) -> Self {
        self.levels = Some(Box::new(levels));
        self
    }
}

/// Non-persistent score store
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    points: Option<u32>,
}

impl MemoryScoreStore {
    pub fn with_points(points: u32) -> Self {
        Self {
            points: Some(points),
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load_points(&self) -> Option<u32> {
        self.points
    }

    fn store_points(&mut self, points: u32) {
        self.points = Some(points);
    }
}

/// Camera that just waits out fixed durations
#[derive(Debug, Clone)]
pub struct TimedCamera {
    /// Pan out to the whole arena
    pub overview_secs: f32,
    /// Hold on the overview before handing back
    pub overview_hold_secs: f32,
    /// Pan to a unit
    pub focus_secs: f32,
    remaining: Option<f32>,
}

impl Default for TimedCamera {
    fn default() -> Self {
        Self {
            overview_secs: 1.0,
            overview_hold_secs: 3.0,
            focus_secs: 1.0,
            remaining: None,
        }
    }
}

impl TimedCamera {
    pub fn is_moving(&self) -> bool {
        self.remaining.is_some()
    }
}

impl CameraRig for TimedCamera {
    fn begin(&mut self, shot: CameraShot) {
        let secs = match shot {
            CameraShot::Overview => self.overview_secs + self.overview_hold_secs,
            CameraShot::Focus(_) => self.focus_secs,
        };
        debug!("Camera move {shot:?} for {secs:.1}s");
        self.remaining = Some(secs);
    }

    fn advance(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.remaining.as_mut() else {
            return false;
        };
        *remaining -= dt;
        if *remaining <= 0.0 {
            self.remaining = None;
            true
        } else {
            false
        }
    }
}

/// Writes the milestones of a match to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHud;

impl Hud for LogHud {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::TurnStarted { unit, team, name } => {
                info!("[hud] {} turn: {name} ({unit})", team.as_str());
            }
            GameEvent::EnergyChanged { energy, max_energy } => {
                info!("[hud] energy {energy}/{max_energy}");
            }
            GameEvent::HealthChanged {
                unit,
                health,
                max_health,
            } => info!("[hud] {unit} health {health}/{max_health}"),
            GameEvent::ShowGameOver { ally_won } => {
                info!("[hud] {}", if *ally_won { "VICTORY" } else { "DEFEAT" });
            }
            other => debug!("[hud] {other:?}"),
        }
    }
}
