use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::app::{InputAction, InputSnapshot};

use super::types::{yaw_toward, Pose, DIRECTION_EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerTuning {
    pub move_speed: f32,
    pub blend: f32,
    pub damping: f32,
    pub stop_epsilon: f32,
    pub max_speed: f32,
    pub facing_threshold: f32,
    pub radius: f32,
    pub ground_height: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            blend: 0.2,
            damping: 0.85,
            stop_epsilon: 0.01,
            max_speed: 8.0,
            facing_threshold: 0.1,
            radius: 0.5,
            ground_height: 0.0,
        }
    }
}

/// Held direction keys for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    pub fn from_input(input: &InputSnapshot) -> Self {
        Self {
            forward: input.is_down(InputAction::MoveForward),
            back: input.is_down(InputAction::MoveBack),
            left: input.is_down(InputAction::MoveLeft),
            right: input.is_down(InputAction::MoveRight),
        }
    }

    /// Unit direction in the (forward, right) basis, or zero when nothing is
    /// held or opposing keys cancel.
    fn local_direction(self) -> Vec2 {
        let axis = |positive: bool, negative: bool| (i8::from(positive) - i8::from(negative)) as f32;
        let local = Vec2::new(axis(self.right, self.left), axis(self.forward, self.back));
        local.normalize_or_zero()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerState {
    pub pose: Pose,
    pub velocity: Vec2,
    pub is_moving: bool,
}

impl PlayerState {
    pub fn spawn(at: Vec2, tuning: &PlayerTuning) -> Self {
        Self {
            pose: Pose::on_ground(at, tuning.ground_height),
            velocity: Vec2::ZERO,
            is_moving: false,
        }
    }
}

/// Ground-plane forward and right for a camera facing. Degenerate facings
/// fall back to +z forward.
pub fn camera_relative_basis(facing: Vec3) -> (Vec2, Vec2) {
    let flat = Vec2::new(facing.x, facing.z);
    let forward = if flat.is_finite() && flat.length() > DIRECTION_EPSILON {
        flat.normalize()
    } else {
        Vec2::Y
    };
    let right = Vec2::new(-forward.y, forward.x);
    (forward, right)
}

pub fn integrate_player(
    player: &mut PlayerState,
    intent: MoveIntent,
    camera_facing: Vec3,
    tuning: &PlayerTuning,
    dt: f32,
) {
    let local = intent.local_direction();
    if local != Vec2::ZERO {
        let (forward, right) = camera_relative_basis(camera_facing);
        let direction = (forward * local.y + right * local.x).normalize_or_zero();
        let desired = direction * tuning.move_speed;
        player.velocity += (desired - player.velocity) * tuning.blend;
    } else {
        player.velocity *= tuning.damping;
        if player.velocity.length() < tuning.stop_epsilon {
            player.velocity = Vec2::ZERO;
        }
    }

    player.velocity = player.velocity.clamp_length_max(tuning.max_speed);
    player.pose.translate_planar(player.velocity * dt);

    let speed = player.velocity.length();
    player.is_moving = speed > tuning.facing_threshold;
    if player.is_moving {
        player.pose.yaw = yaw_toward(player.velocity);
    }
}
