//! Sling Boom - turn-based artillery combat core
//!
//! Core modules:
//! - `sim`: Deterministic match simulation (turn order, shared energy, projectiles, AI aiming)
//! - `app`: Fixed-step driver that owns the match and its services
//! - `services`: HUD, camera, audio, score storage and level-flow interfaces
//! - `settings`: Data-driven match tuning
//! - `rank`: Persisted rank points
//! - `audio`: Sound cue catalogue and volume mixing

pub mod app;
pub mod audio;
pub mod rank;
pub mod services;
pub mod settings;
pub mod sim;

pub use app::Game;
pub use rank::RankPoints;
pub use settings::MatchSettings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Simulation ticks per second of game time
    pub const TICKS_PER_SECOND: f32 = 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Frame delta clamp (seconds) applied by the driver
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Convert a duration in seconds to whole simulation ticks (rounded, never negative)
#[inline]
pub fn seconds_to_ticks(secs: f32) -> u64 {
    (secs.max(0.0) * consts::TICKS_PER_SECOND).round() as u64
}

/// Rotate a vector counter-clockwise by `degrees` around the view axis
#[inline]
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Position of a ballistic body at time `t` under constant vertical gravity
#[inline]
pub fn ballistic_point(origin: Vec2, velocity: Vec2, gravity: f32, t: f32) -> Vec2 {
    origin + velocity * t + Vec2::new(0.0, 0.5 * gravity * t * t)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Sling Boom core loaded");
}
