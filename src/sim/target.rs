//! Flying bonus target
//!
//! Shuttles between two waypoints. Shooting it down buffs the ally energy pool.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusTarget {
    pub id: u32,
    pub from: Vec2,
    pub to: Vec2,
    pub pos: Vec2,
    pub radius: f32,
    /// Seconds for one leg of the trip
    pub leg_duration: f32,
    /// Max energy granted when destroyed
    pub energy_buff: u32,
    progress: f32,
    outbound: bool,
    destroyed: bool,
}

impl BonusTarget {
    pub fn new(id: u32, from: Vec2, to: Vec2, leg_duration: f32, energy_buff: u32) -> Self {
        Self {
            id,
            from,
            to,
            pos: from,
            radius: 0.8,
            leg_duration: leg_duration.max(0.01),
            energy_buff,
            progress: 0.0,
            outbound: true,
            destroyed: false,
        }
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Fly along the current leg, turning around at either end
    pub fn advance(&mut self, dt: f32) {
        if self.destroyed {
            return;
        }
        self.progress += dt / self.leg_duration;
        if self.progress >= 1.0 {
            self.progress -= 1.0;
            self.outbound = !self.outbound;
        }
        let (a, b) = if self.outbound {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        };
        self.pos = a.lerp(b, self.progress);
    }

    /// Shot down. Returns the energy buff the first time only.
    pub fn hit(&mut self) -> Option<u32> {
        if self.destroyed {
            return None;
        }
        self.destroyed = true;
        Some(self.energy_buff)
    }
}
