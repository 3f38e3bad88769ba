//! Breakable terrain
//!
//! Walls break on the first qualifying hit and never come back. Boundary walls
//! are flagged indestructible and only ever absorb impulses.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::closest_point_aabb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleState {
    Intact,
    Destroyed,
}

/// Axis-aligned wall block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub center: Vec2,
    pub half_extents: Vec2,
    pub indestructible: bool,
    state: ObstacleState,
}

impl Obstacle {
    pub fn new(id: ObstacleId, center: Vec2, half_extents: Vec2) -> Self {
        Self {
            id,
            center,
            half_extents,
            indestructible: false,
            state: ObstacleState::Intact,
        }
    }

    pub fn indestructible(mut self) -> Self {
        self.indestructible = true;
        self
    }

    #[inline]
    pub fn state(&self) -> ObstacleState {
        self.state
    }

    #[inline]
    pub fn is_intact(&self) -> bool {
        self.state == ObstacleState::Intact
    }

    /// Break the wall. Returns true only on the Intact -> Destroyed transition.
    pub fn take_damage(&mut self) -> bool {
        if self.state == ObstacleState::Destroyed || self.indestructible {
            return false;
        }
        self.state = ObstacleState::Destroyed;
        true
    }

    /// Closest point of the block to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        closest_point_aabb(p, self.center, self.half_extents)
    }

    /// Distance from `p` to the block surface (0 inside)
    pub fn distance_to(&self, p: Vec2) -> f32 {
        (p - self.closest_point(p)).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaks_exactly_once() {
        let mut wall = Obstacle::new(ObstacleId(1), Vec2::ZERO, Vec2::ONE);
        assert!(wall.take_damage());
        assert_eq!(wall.state(), ObstacleState::Destroyed);
        assert!(!wall.take_damage());
        assert_eq!(wall.state(), ObstacleState::Destroyed);
    }

    #[test]
    fn test_indestructible_ignores_damage() {
        let mut wall = Obstacle::new(ObstacleId(2), Vec2::ZERO, Vec2::ONE).indestructible();
        assert!(!wall.take_damage());
        assert!(wall.is_intact());
    }

    #[test]
    fn test_distance_to_surface() {
        let wall = Obstacle::new(ObstacleId(3), Vec2::new(5.0, 1.0), Vec2::new(0.5, 1.0));
        assert_eq!(wall.distance_to(Vec2::new(5.0, 1.5)), 0.0);
        assert!((wall.distance_to(Vec2::new(7.5, 1.0)) - 2.0).abs() < 1e-5);
    }
}
