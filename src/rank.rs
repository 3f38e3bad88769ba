//! Player rank points
//!
//! A single non-negative counter, persisted under `PlayerPoints`. Wins add
//! points, losses take them away, and the total never drops below zero.

use serde::{Deserialize, Serialize};

use crate::services::ScoreStore;

/// Rank points the player has accumulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RankPoints {
    pub points: u32,
}

impl RankPoints {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "PlayerPoints";

    /// Read from the store, starting at zero if nothing was saved
    pub fn load(store: &dyn ScoreStore) -> Self {
        let points = store.load_points().unwrap_or(0);
        log::info!("Rank points: {points}");
        Self { points }
    }

    pub fn save(&self, store: &mut dyn ScoreStore) {
        store.store_points(self.points);
    }

    /// Add (or with a negative delta, remove) points, clamping at zero.
    /// Returns the new total.
    pub fn apply(&mut self, delta: i64) -> u32 {
        let total = (i64::from(self.points) + delta).clamp(0, i64::from(u32::MAX));
        self.points = total as u32;
        log::info!("Rank points {delta:+} -> {}", self.points);
        self.points
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalScoreStore;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::RankPoints;
    use crate::services::ScoreStore;

    /// Rank points in browser LocalStorage
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LocalScoreStore;

    impl LocalScoreStore {
        fn storage() -> Option<web_sys::Storage> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
        }
    }

    impl ScoreStore for LocalScoreStore {
        fn load_points(&self) -> Option<u32> {
            let json = Self::storage()?
                .get_item(RankPoints::STORAGE_KEY)
                .ok()
                .flatten()?;
            match serde_json::from_str::<u32>(&json) {
                Ok(points) => Some(points),
                Err(e) => {
                    log::warn!("Ignoring stored rank points: {e}");
                    None
                }
            }
        }

        fn store_points(&mut self, points: u32) {
            let Some(storage) = Self::storage() else {
                return;
            };
            if let Ok(json) = serde_json::to_string(&points) {
                let _ = storage.set_item(RankPoints::STORAGE_KEY, &json);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryScoreStore;

    #[test]
    fn test_apply_clamps_at_zero() {
        let mut rank = RankPoints { points: 20 };
        assert_eq!(rank.apply(50), 70);
        assert_eq!(rank.apply(-30), 40);
        assert_eq!(rank.apply(-100), 0);
        assert_eq!(rank.apply(-1), 0);
    }

    #[test]
    fn test_load_and_save() {
        let mut store = MemoryScoreStore::default();
        let mut rank = RankPoints::load(&store);
        assert_eq!(rank.points, 0);
        rank.apply(50);
        rank.save(&mut store);
        assert_eq!(RankPoints::load(&store).points, 50);
    }
}
