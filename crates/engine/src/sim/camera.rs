use glam::{Quat, Vec3};
use serde::Deserialize;

use super::types::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraTuning {
    pub base_offset: Vec3,
    pub position_smoothing: f32,
    pub look_smoothing: f32,
    pub yaw_smoothing: f32,
    pub recenter_rate: f32,
    pub idle_threshold_seconds: f32,
    pub yaw_limit: f32,
    pub pointer_sensitivity: f32,
    pub look_height: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            base_offset: Vec3::new(0.0, 2.4, -5.5),
            position_smoothing: 0.12,
            look_smoothing: 0.15,
            yaw_smoothing: 0.14,
            recenter_rate: 0.08,
            idle_threshold_seconds: 1.0,
            yaw_limit: std::f32::consts::PI / 2.2,
            pointer_sensitivity: 0.0035,
            look_height: 1.2,
            min_zoom: 3.0,
            max_zoom: 15.0,
            zoom_step: 0.5,
        }
    }
}

/// Smoothed chase camera with temporary free-look and wheel zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    position: Vec3,
    look_at: Vec3,
    yaw_offset: f32,
    yaw_target: f32,
    elapsed_seconds: f32,
    last_pointer_seconds: f32,
    zoom_distance: f32,
    has_target: bool,
}

impl CameraState {
    pub fn new(tuning: &CameraTuning) -> Self {
        Self {
            position: tuning.base_offset,
            look_at: Vec3::new(0.0, tuning.look_height, 0.0),
            yaw_offset: 0.0,
            yaw_target: 0.0,
            elapsed_seconds: 0.0,
            last_pointer_seconds: 0.0,
            zoom_distance: tuning
                .base_offset
                .length()
                .clamp(tuning.min_zoom, tuning.max_zoom),
            has_target: false,
        }
    }

    /// Direction the camera looks in; drives camera-relative player movement.
    pub fn facing(&self) -> Vec3 {
        self.look_at - self.position
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn yaw_offset(&self) -> f32 {
        self.yaw_offset
    }

    pub fn yaw_target(&self) -> f32 {
        self.yaw_target
    }

    pub fn zoom_distance(&self) -> f32 {
        self.zoom_distance
    }

    /// Advances the camera one frame. Without a target nothing changes.
    pub fn update(
        &mut self,
        target: Option<Pose>,
        pointer_dx: f32,
        zoom_steps: i32,
        tuning: &CameraTuning,
        dt: f32,
    ) {
        let Some(target) = target else {
            return;
        };

        self.elapsed_seconds += dt.max(0.0);
        self.apply_zoom(zoom_steps, tuning);

        if pointer_dx != 0.0 && pointer_dx.is_finite() {
            self.yaw_target = (self.yaw_target - pointer_dx * tuning.pointer_sensitivity)
                .clamp(-tuning.yaw_limit, tuning.yaw_limit);
            self.last_pointer_seconds = self.elapsed_seconds;
        }

        self.yaw_offset += (self.yaw_target - self.yaw_offset) * tuning.yaw_smoothing;
        self.yaw_offset = self.yaw_offset.clamp(-tuning.yaw_limit, tuning.yaw_limit);

        if self.elapsed_seconds - self.last_pointer_seconds > tuning.idle_threshold_seconds {
            self.yaw_target += -self.yaw_target * tuning.recenter_rate;
        }

        let offset = tuning.base_offset.normalize_or_zero() * self.zoom_distance;
        let total_yaw = target.yaw + self.yaw_offset;
        let desired_position = target.position + Quat::from_rotation_y(total_yaw) * offset;
        let desired_look = target.position + Vec3::new(0.0, tuning.look_height, 0.0);

        if self.has_target {
            self.position += (desired_position - self.position) * tuning.position_smoothing;
            self.look_at += (desired_look - self.look_at) * tuning.look_smoothing;
        } else {
            self.position = desired_position;
            self.look_at = desired_look;
            self.has_target = true;
        }
    }

    fn apply_zoom(&mut self, zoom_steps: i32, tuning: &CameraTuning) {
        if zoom_steps == 0 {
            return;
        }
        self.zoom_distance = (self.zoom_distance - zoom_steps as f32 * tuning.zoom_step)
            .clamp(tuning.min_zoom, tuning.max_zoom);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    const FRAME_DT: f32 = 1.0 / 60.0;

    fn assert_vec3_close(actual: Vec3, expected: Vec3) {
        assert!(
            (actual - expected).length() < 1.0e-3,
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn target_at_origin() -> Option<Pose> {
        Some(Pose::on_ground(Vec2::ZERO, 0.0))
    }

    #[test]
    fn first_target_snaps_behind_the_player() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState::new(&tuning);

        camera.update(target_at_origin(), 0.0, 0, &tuning, FRAME_DT);

        let expected_offset = tuning.base_offset.normalize() * camera.zoom_distance();
        assert_vec3_close(camera.position(), expected_offset);
        assert_vec3_close(camera.look_at(), Vec3::new(0.0, 1.2, 0.0));
        assert!(camera.facing().z > 0.0);
    }

    #[test]
    fn missing_target_holds_every_field() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState::new(&tuning);
        camera.update(target_at_origin(), -50.0, 1, &tuning, FRAME_DT);
        let before = camera.clone();

        for _ in 0..120 {
            camera.update(None, 30.0, 2, &tuning, FRAME_DT);
        }

        assert_eq!(camera, before);
    }

    #[test]
    fn position_converges_on_moved_target() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState::new(&tuning);
        camera.update(target_at_origin(), 0.0, 0, &tuning, FRAME_DT);

        let moved = Pose::on_ground(Vec2::new(10.0, 0.0), 0.0);
        for _ in 0..200 {
            camera.update(Some(moved), 0.0, 0, &tuning, FRAME_DT);
        }

        let expected = moved.position + tuning.base_offset.normalize() * camera.zoom_distance();
        assert_vec3_close(camera.position(), expected);
        assert_vec3_close(camera.look_at(), Vec3::new(10.0, 1.2, 0.0));
    }

    #[test]
    fn free_look_is_not_recentered_before_idle_threshold() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState::new(&tuning);
        camera.update(target_at_origin(), -100.0, 0, &tuning, FRAME_DT);
        let yaw_target = camera.yaw_target();
        assert!((yaw_target - 0.35).abs() < 1.0e-5);

        for _ in 0..54 {
            camera.update(target_at_origin(), 0.0, 0, &tuning, FRAME_DT);
        }
        assert_eq!(camera.yaw_target(), yaw_target);
        assert!(camera.yaw_offset() > 0.3);

        for _ in 0..240 {
            camera.update(target_at_origin(), 0.0, 0, &tuning, FRAME_DT);
        }
        assert!(camera.yaw_target().abs() < 0.01);
        assert!(camera.yaw_offset().abs() < 0.05);
    }

    #[test]
    fn free_look_is_clamped_to_yaw_limit() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState::new(&tuning);

        camera.update(target_at_origin(), -10_000.0, 0, &tuning, FRAME_DT);
        assert_eq!(camera.yaw_target(), tuning.yaw_limit);

        camera.update(target_at_origin(), 20_000.0, 0, &tuning, FRAME_DT);
        assert_eq!(camera.yaw_target(), -tuning.yaw_limit);
        assert!(camera.yaw_offset().abs() <= tuning.yaw_limit);
    }

    #[test]
    fn zoom_steps_are_clamped_to_range() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState::new(&tuning);
        let start = camera.zoom_distance();

        camera.update(target_at_origin(), 0.0, 2, &tuning, FRAME_DT);
        assert!((camera.zoom_distance() - (start - 1.0)).abs() < 1.0e-5);

        camera.update(target_at_origin(), 0.0, 100, &tuning, FRAME_DT);
        assert_eq!(camera.zoom_distance(), tuning.min_zoom);

        camera.update(target_at_origin(), 0.0, -100, &tuning, FRAME_DT);
        assert_eq!(camera.zoom_distance(), tuning.max_zoom);
    }

    #[test]
    fn camera_swings_with_target_yaw() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState::new(&tuning);
        let mut facing_east = Pose::on_ground(Vec2::ZERO, 0.0);
        facing_east.yaw = std::f32::consts::FRAC_PI_2;

        camera.update(Some(facing_east), 0.0, 0, &tuning, FRAME_DT);

        assert!(camera.position().x < -4.0, "camera behind +x facing: {:?}", camera.position());
        assert!(camera.facing().x > 0.0);
    }
}
