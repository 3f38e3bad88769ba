//! Contact detection for projectiles
//!
//! Shells are small and slow compared to the bodies they hit, so a swept test
//! is not needed at 120 Hz: each tick the shell centre is checked against
//! every body inflated by the shell radius.

use glam::Vec2;

use super::obstacle::Obstacle;
use super::projectile::{Body, Projectile};
use super::target::BonusTarget;
use super::unit::Unit;

/// First body a projectile touched this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body: Body,
    /// Where the blast is centred
    pub point: Vec2,
}

/// Is `p` within `radius` of `center` (boundary inclusive)
#[inline]
pub fn point_circle(p: Vec2, center: Vec2, radius: f32) -> bool {
    p.distance_squared(center) <= radius * radius
}

/// Closest point of an axis-aligned box to `p`
#[inline]
pub fn closest_point_aabb(p: Vec2, center: Vec2, half_extents: Vec2) -> Vec2 {
    p.clamp(center - half_extents, center + half_extents)
}

/// Does a circle at `p` overlap the box
#[inline]
pub fn circle_aabb(p: Vec2, radius: f32, center: Vec2, half_extents: Vec2) -> bool {
    point_circle(closest_point_aabb(p, center, half_extents), p, radius)
}

/// Linear blast falloff: 1 at the centre, 0 at the rim, 0 beyond it.
/// A zero radius means a direct hit at full strength.
#[inline]
pub fn impulse_falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 1.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

/// Find what `proj` is touching, in fixed priority: units, obstacles,
/// targets, then the ground. The owner and dead units are never hit.
pub fn find_contact(
    proj: &Projectile,
    units: &[Unit],
    obstacles: &[Obstacle],
    targets: &[BonusTarget],
    ground_y: f32,
) -> Option<Contact> {
    let p = proj.pos;

    let unit = units
        .iter()
        .filter(|u| u.is_alive() && u.id != proj.owner)
        .find(|u| point_circle(p, u.pos, u.radius + proj.radius));
    if let Some(unit) = unit {
        return Some(Contact {
            body: Body::Unit(unit.id),
            point: p,
        });
    }

    let obstacle = obstacles
        .iter()
        .filter(|o| o.is_intact())
        .find(|o| circle_aabb(p, proj.radius, o.center, o.half_extents));
    if let Some(obstacle) = obstacle {
        return Some(Contact {
            body: Body::Obstacle(obstacle.id),
            point: p,
        });
    }

    let target = targets
        .iter()
        .filter(|t| !t.is_destroyed())
        .find(|t| point_circle(p, t.pos, t.radius + proj.radius));
    if let Some(target) = target {
        return Some(Contact {
            body: Body::Target(target.id),
            point: p,
        });
    }

    if p.y - proj.radius <= ground_y {
        return Some(Contact {
            body: Body::Ground,
            point: Vec2::new(p.x, ground_y),
        });
    }

    None
}
