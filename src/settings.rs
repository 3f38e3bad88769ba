//! Match tuning
//!
//! Every timing, energy, AI and physics constant the match reads lives here.
//! Persisted separately from rank points in LocalStorage, and loadable from a
//! JSON file by the native driver.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::cards::CardTable;

/// Which side takes the first turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FirstSide {
    /// Coin flip from the match RNG
    #[default]
    Random,
    Ally,
    Opponent,
}

/// Turn flow, energy and match lifecycle timings (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnSettings {
    pub turn_duration: f32,
    /// Grace period after a human shot before auto-ending
    pub auto_end_delay: f32,
    pub hand_size: usize,
    pub base_max_energy: u32,
    pub energy_per_turn: u32,
    pub first_side: FirstSide,

    // === Lifecycle ===
    pub init_delay: f32,
    pub discovery_retries: u32,
    pub discovery_retry_interval: f32,
    pub game_over_delay: f32,
    pub deferred_check_delay: f32,
    pub obstacle_removal_delay: f32,

    // === Rank ===
    pub points_for_win: u32,
    pub points_for_loss: u32,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            turn_duration: 30.0,
            auto_end_delay: 3.0,
            hand_size: 4,
            base_max_energy: 3,
            energy_per_turn: 1,
            first_side: FirstSide::Random,

            init_delay: 0.5,
            discovery_retries: 5,
            discovery_retry_interval: 0.2,
            game_over_delay: 1.0,
            deferred_check_delay: 0.5,
            obstacle_removal_delay: 0.2,

            points_for_win: 50,
            points_for_loss: 30,
        }
    }
}

/// Opponent aim planner tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub think_time: f32,
    /// Horizontal jitter half-range; vertical jitter is half of it
    pub accuracy: f32,
    pub unsafe_radius: f32,
    pub max_retries: u32,
    pub avoid_friendly_fire: bool,
    pub direct_flight_time: f32,
    pub lob_flight_time: f32,
    pub sample_count: usize,
    pub sample_step: f32,
    pub show_preview: bool,
    pub preview_duration: f32,
    pub end_turn_delay: f32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            think_time: 1.0,
            accuracy: 1.0,
            unsafe_radius: 2.0,
            max_retries: 5,
            avoid_friendly_fire: true,
            direct_flight_time: 1.0,
            lob_flight_time: 1.5,
            sample_count: 40,
            sample_step: 0.05,
            show_preview: true,
            preview_duration: 1.0,
            end_turn_delay: 3.0,
        }
    }
}

/// Built-in ballistic integrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSettings {
    /// Vertical acceleration (negative is down)
    pub gravity: f32,
    pub radius: f32,
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            radius: 0.2,
        }
    }
}

/// Playable volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    pub ground_y: f32,
    /// Units below this height die
    pub kill_plane_y: f32,
    pub bounds_min: Vec2,
    pub bounds_max: Vec2,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            ground_y: 0.0,
            kill_plane_y: -10.0,
            bounds_min: Vec2::new(-60.0, -20.0),
            bounds_max: Vec2::new(60.0, 80.0),
        }
    }
}

impl ArenaSettings {
    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.bounds_min).all() && p.cmple(self.bounds_max).all()
    }
}

/// Slingshot drag mapping for human shots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    pub max_drag_distance: f32,
    pub drag_force_multiplier: f32,
    pub min_drag_distance: f32,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            max_drag_distance: 3.0,
            drag_force_multiplier: 15.0,
            min_drag_distance: 0.2,
        }
    }
}

/// Settings rejected by `MatchSettings::from_json` or `validate`
#[derive(Debug)]
pub enum SettingsError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Parse(e) => write!(f, "malformed settings: {e}"),
            SettingsError::Invalid(msg) => write!(f, "invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Parse(e) => Some(e),
            SettingsError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Complete match configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MatchSettings {
    pub turn: TurnSettings,
    pub ai: AiSettings,
    pub projectile: ProjectileSettings,
    pub arena: ArenaSettings,
    pub drag: DragSettings,
    pub cards: CardTable,
}

impl MatchSettings {
    /// Parse and validate. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: MatchSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));

        if !(self.turn.turn_duration > 0.0) {
            return invalid("turn_duration must be positive");
        }
        if self.turn.hand_size == 0 {
            return invalid("hand_size must be at least 1");
        }
        let delays = [
            self.turn.auto_end_delay,
            self.turn.init_delay,
            self.turn.discovery_retry_interval,
            self.turn.game_over_delay,
            self.turn.deferred_check_delay,
            self.turn.obstacle_removal_delay,
            self.ai.think_time,
            self.ai.preview_duration,
            self.ai.end_turn_delay,
        ];
        if delays.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return invalid("delays must be finite and non-negative");
        }
        if !(self.ai.direct_flight_time > 0.0 && self.ai.lob_flight_time > 0.0) {
            return invalid("flight times must be positive");
        }
        if !(self.ai.sample_step > 0.0) || self.ai.sample_count == 0 {
            return invalid("trajectory sampling needs a positive step and count");
        }
        if self.ai.accuracy < 0.0 || self.ai.unsafe_radius < 0.0 {
            return invalid("accuracy and unsafe_radius must be non-negative");
        }
        if !(self.projectile.radius > 0.0) {
            return invalid("projectile radius must be positive");
        }
        if self.arena.bounds_min.cmpge(self.arena.bounds_max).any() {
            return invalid("arena bounds_min must be below bounds_max");
        }
        if self.drag.min_drag_distance > self.drag.max_drag_distance {
            return invalid("min_drag_distance exceeds max_drag_distance");
        }
        for kind in crate::sim::cards::CardKind::ALL {
            let spec = self.cards.spec(kind);
            if spec.count == 0 || spec.splash_radius < 0.0 {
                return Err(SettingsError::Invalid(format!(
                    "card {} needs count >= 1 and a non-negative splash radius",
                    kind.as_str()
                )));
            }
        }
        Ok(())
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "sling_boom_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
