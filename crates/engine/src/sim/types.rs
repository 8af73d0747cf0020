use glam::{Vec2, Vec3};

use super::time_of_day::DayPhase;

/// Planar directions shorter than this are treated as "no direction".
pub const DIRECTION_EPSILON: f32 = 1.0e-6;

/// Position plus yaw about the vertical axis. Yaw 0 faces +z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub yaw: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
        }
    }
}

impl Pose {
    pub fn on_ground(planar: Vec2, ground_height: f32) -> Self {
        Self {
            position: Vec3::new(planar.x, ground_height, planar.y),
            yaw: 0.0,
        }
    }

    /// Ground-plane position as (x, z).
    pub fn planar(&self) -> Vec2 {
        planar(self.position)
    }

    pub(crate) fn translate_planar(&mut self, delta: Vec2) {
        self.position.x += delta.x;
        self.position.z += delta.y;
    }
}

pub fn planar(position: Vec3) -> Vec2 {
    Vec2::new(position.x, position.z)
}

/// Yaw that faces along a planar (x, z) direction.
pub fn yaw_toward(direction: Vec2) -> f32 {
    direction.x.atan2(direction.y)
}

/// Read-only view of shared world state, captured once at the start of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub dt: f32,
    pub hour: f32,
    pub day_phase: DayPhase,
}

impl TickContext {
    pub fn new(dt: f32, hour: f32) -> Self {
        Self {
            dt,
            hour,
            day_phase: DayPhase::from_hour(hour),
        }
    }
}

pub(crate) fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}
