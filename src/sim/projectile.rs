//! Projectiles and blast resolution

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::impulse_falloff;
use super::obstacle::{Obstacle, ObstacleId};
use super::unit::{Unit, UnitId};

/// Anything a blast can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Body {
    Unit(UnitId),
    Obstacle(ObstacleId),
    Target(u32),
    Ground,
}

/// A shell in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    /// Shooter; never hit by its own shells
    pub owner: UnitId,
    /// Shells fired together share a volley id and pass through each other
    pub volley: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: u32,
    /// 0 = direct hit only
    pub splash_radius: f32,
    pub force: f32,
}

impl Projectile {
    /// Semi-implicit Euler step under vertical gravity
    pub fn step(&mut self, gravity: f32, dt: f32) {
        self.vel.y += gravity * dt;
        self.pos += self.vel * dt;
    }
}

/// One body pushed (and possibly damaged) by a blast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub body: Body,
    pub impulse: Vec2,
}

/// Unit direction from `from` to `to`, straight up when they coincide
fn push_dir(from: Vec2, to: Vec2) -> Vec2 {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO { Vec2::Y } else { dir }
}

/// Bodies a blast at `impact` affects.
///
/// With a splash radius every living unit whose centre and every intact
/// obstacle whose surface lies within the radius (inclusive) is pushed, with
/// the impulse falling off linearly to the rim. Without one only the body that
/// was hit directly is affected. The owner may be pushed; whether it takes
/// damage is the caller's call.
pub fn affected_bodies(
    impact: Vec2,
    direct: Body,
    proj: &Projectile,
    units: &[Unit],
    obstacles: &[Obstacle],
) -> Vec<Hit> {
    let r = proj.splash_radius;
    if r <= 0.0 {
        let along = proj.vel.normalize_or_zero() * proj.force;
        let hit = match direct {
            Body::Unit(id) => units
                .iter()
                .any(|u| u.id == id && u.is_alive())
                .then_some(Hit { body: direct, impulse: along }),
            Body::Obstacle(id) => obstacles
                .iter()
                .any(|o| o.id == id && o.is_intact())
                .then_some(Hit { body: direct, impulse: along }),
            Body::Target(_) | Body::Ground => None,
        };
        return hit.into_iter().collect();
    }

    let mut hits = Vec::new();
    for unit in units.iter().filter(|u| u.is_alive()) {
        let d = unit.pos.distance(impact);
        if d <= r {
            hits.push(Hit {
                body: Body::Unit(unit.id),
                impulse: push_dir(impact, unit.pos) * proj.force * impulse_falloff(d, r),
            });
        }
    }
    for obstacle in obstacles.iter().filter(|o| o.is_intact()) {
        let d = obstacle.distance_to(impact);
        if d <= r {
            hits.push(Hit {
                body: Body::Obstacle(obstacle.id),
                impulse: push_dir(impact, obstacle.center) * proj.force * impulse_falloff(d, r),
            });
        }
    }
    hits
}
