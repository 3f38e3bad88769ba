//! Ballistic aiming
//!
//! Shared by the AI (planning a shot that will not clip a teammate) and the
//! human seat (turning a slingshot drag into a launch velocity and drawing the
//! preview arc).

use glam::Vec2;
use rand::Rng;

use super::unit::Unit;
use crate::ballistic_point;
use crate::settings::{AiSettings, DragSettings};

/// Launch velocity that reaches `to` from `from` after `flight_time` seconds
pub fn ballistic_velocity(from: Vec2, to: Vec2, flight_time: f32, gravity: f32) -> Vec2 {
    let t = flight_time.max(1e-3);
    let d = to - from;
    Vec2::new(d.x / t, d.y / t - 0.5 * gravity * t)
}

/// Sampled flight path at `t = i * step` for `i < count`, cut off at the
/// first sample below the ground
pub fn trajectory(
    origin: Vec2,
    velocity: Vec2,
    gravity: f32,
    ground_y: f32,
    count: usize,
    step: f32,
) -> Vec<Vec2> {
    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let p = ballistic_point(origin, velocity, gravity, i as f32 * step);
        if p.y < ground_y {
            break;
        }
        points.push(p);
    }
    points
}

/// Does any sample pass strictly inside `unsafe_radius` of a living teammate
/// of `shooter`
pub fn endangers_teammates(points: &[Vec2], shooter: &Unit, units: &[Unit], unsafe_radius: f32) -> bool {
    units
        .iter()
        .filter(|u| u.is_alive() && u.team == shooter.team && u.id != shooter.id)
        .any(|mate| points.iter().any(|p| p.distance(mate.pos) < unsafe_radius))
}

/// Nearest living unit of the other side, by straight-line distance
pub fn nearest_target<'a>(shooter: &Unit, units: &'a [Unit]) -> Option<&'a Unit> {
    units
        .iter()
        .filter(|u| u.is_alive() && u.team != shooter.team)
        .min_by(|a, b| {
            a.pos
                .distance_squared(shooter.pos)
                .total_cmp(&b.pos.distance_squared(shooter.pos))
        })
}

/// Launch velocity for a slingshot drag (already pointing the way the shot
/// should fly). Drags below the minimum are ignored; long drags are capped.
pub fn drag_velocity(drag: Vec2, settings: &DragSettings) -> Option<Vec2> {
    if drag.length() < settings.min_drag_distance {
        return None;
    }
    Some(drag.clamp_length_max(settings.max_drag_distance) * settings.drag_force_multiplier)
}

/// Friendly-fire-aware shot planner
#[derive(Debug, Clone, Copy)]
pub struct AimPlanner<'a> {
    pub ai: &'a AiSettings,
    pub gravity: f32,
    pub ground_y: f32,
}

impl<'a> AimPlanner<'a> {
    pub fn new(ai: &'a AiSettings, gravity: f32, ground_y: f32) -> Self {
        Self { ai, gravity, ground_y }
    }

    /// Preview polyline for a shot
    pub fn trajectory_points(&self, origin: Vec2, velocity: Vec2) -> Vec<Vec2> {
        trajectory(
            origin,
            velocity,
            self.gravity,
            self.ground_y,
            self.ai.sample_count,
            self.ai.sample_step,
        )
    }

    fn is_safe(&self, shooter: &Unit, units: &[Unit], velocity: Vec2) -> bool {
        if !self.ai.avoid_friendly_fire {
            return true;
        }
        let points = self.trajectory_points(shooter.fire_point(), velocity);
        !endangers_teammates(&points, shooter, units, self.ai.unsafe_radius)
    }

    /// Pick a launch velocity toward `target`, or None if every candidate
    /// would pass too close to a teammate.
    ///
    /// Tries up to `max_retries` direct shots at jittered aim points, then one
    /// lofted shot without jitter.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        shooter: &Unit,
        target: Vec2,
        units: &[Unit],
        rng: &mut R,
    ) -> Option<Vec2> {
        let origin = shooter.fire_point();
        let spread = self.ai.accuracy;

        for attempt in 0..self.ai.max_retries {
            // Miss by up to `accuracy` around the target, whatever the flight time
            let aim = target
                + Vec2::new(
                    rng.random_range(-spread..=spread),
                    rng.random_range(-spread * 0.5..=spread * 0.5),
                );
            let candidate = ballistic_velocity(origin, aim, self.ai.direct_flight_time, self.gravity);
            if self.is_safe(shooter, units, candidate) {
                return Some(candidate);
            }
            log::debug!("{}: direct shot {} rejected, teammate in the way", shooter.id, attempt + 1);
        }

        let lob = ballistic_velocity(origin, target, self.ai.lob_flight_time, self.gravity);
        if self.is_safe(shooter, units, lob) {
            log::debug!("{}: falling back to a lofted shot", shooter.id);
            return Some(lob);
        }
        None
    }
}
