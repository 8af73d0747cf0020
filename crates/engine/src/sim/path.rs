use glam::Vec2;
use thiserror::Error;

use super::types::{yaw_toward, Pose, DIRECTION_EPSILON};

pub const DEFAULT_ARRIVAL_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("path has no waypoints")]
    Empty,
    #[error("waypoint {index} is not finite")]
    NonFinite { index: usize },
}

/// Cyclic waypoint loop on the ground plane. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    waypoints: Vec<Vec2>,
}

impl Path {
    pub fn new(waypoints: Vec<Vec2>) -> Result<Self, PathError> {
        if waypoints.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some(index) = waypoints.iter().position(|point| !point.is_finite()) {
            return Err(PathError::NonFinite { index });
        }
        Ok(Self { waypoints })
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    /// Index is taken modulo the path length.
    pub fn waypoint(&self, index: usize) -> Vec2 {
        self.waypoints[index % self.waypoints.len()]
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathFollowerState {
    target_index: usize,
}

impl PathFollowerState {
    pub fn new(target_index: usize) -> Self {
        Self { target_index }
    }

    pub fn target_index(&self) -> usize {
        self.target_index
    }

    /// Brings the cursor back into range after the active path changed.
    pub fn wrap_to(&mut self, path: &Path) {
        self.target_index %= path.waypoint_count();
    }

    fn advance(&mut self, path: &Path) -> usize {
        self.target_index = (self.target_index + 1) % path.waypoint_count();
        self.target_index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowStep {
    Moved,
    Arrived { reached: usize, next: usize },
    Held,
}

/// One follower tick: either arrive at the current waypoint (no movement) or
/// step toward it without passing it.
pub fn follow_path(
    pose: &mut Pose,
    path: &Path,
    state: &mut PathFollowerState,
    speed: f32,
    dt: f32,
    arrival_threshold: f32,
) -> FollowStep {
    state.wrap_to(path);
    let target = path.waypoint(state.target_index);
    let to_target = target - pose.planar();
    let distance = to_target.length();

    if distance < arrival_threshold {
        let reached = state.target_index;
        let next = state.advance(path);
        return FollowStep::Arrived { reached, next };
    }

    if distance <= DIRECTION_EPSILON {
        return FollowStep::Held;
    }

    let direction = to_target / distance;
    let step = (speed.max(0.0) * dt.max(0.0)).min(distance);
    if step > 0.0 {
        pose.translate_planar(direction * step);
    }
    pose.yaw = yaw_toward(direction);
    FollowStep::Moved
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn square_path() -> Path {
        Path::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ])
        .expect("path")
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(Path::new(Vec::new()), Err(PathError::Empty));
    }

    #[test]
    fn non_finite_waypoint_is_rejected() {
        let result = Path::new(vec![Vec2::ZERO, Vec2::new(f32::NAN, 1.0)]);
        assert_eq!(result, Err(PathError::NonFinite { index: 1 }));
    }

    #[test]
    fn arrival_advances_cursor_without_moving() {
        let path = square_path();
        let mut state = PathFollowerState::new(0);
        let mut pose = Pose::on_ground(Vec2::new(0.2, 0.0), 0.0);

        let step = follow_path(&mut pose, &path, &mut state, 2.0, 0.1, 0.5);

        assert_eq!(step, FollowStep::Arrived { reached: 0, next: 1 });
        assert_eq!(pose.position, Vec3::new(0.2, 0.0, 0.0));
        assert_eq!(state.target_index(), 1);
    }

    #[test]
    fn step_faces_direction_of_travel() {
        let path = square_path();
        let mut state = PathFollowerState::new(1);
        let mut pose = Pose::on_ground(Vec2::ZERO, 0.3);

        let step = follow_path(&mut pose, &path, &mut state, 2.0, 0.5, 0.5);

        assert_eq!(step, FollowStep::Moved);
        assert!((pose.position.x - 1.0).abs() < 1.0e-5);
        assert!((pose.position.y - 0.3).abs() < 1.0e-6);
        assert!((pose.yaw - std::f32::consts::FRAC_PI_2).abs() < 1.0e-5);
    }

    #[test]
    fn step_never_overshoots_the_waypoint() {
        let path = square_path();
        let mut state = PathFollowerState::new(1);
        let mut pose = Pose::on_ground(Vec2::new(3.0, 0.0), 0.0);

        follow_path(&mut pose, &path, &mut state, 100.0, 1.0, 0.5);

        assert!((pose.position.x - 4.0).abs() < 1.0e-5);
        assert_eq!(state.target_index(), 1);
    }

    #[test]
    fn cycle_closes_after_one_arrival_per_waypoint() {
        let path = square_path();
        let mut state = PathFollowerState::new(0);
        let mut pose = Pose::on_ground(Vec2::ZERO, 0.0);
        let mut arrivals = Vec::new();

        for _ in 0..10_000 {
            if let FollowStep::Arrived { reached, .. } =
                follow_path(&mut pose, &path, &mut state, 1.5, 1.0 / 60.0, 0.5)
            {
                arrivals.push(reached);
                if arrivals.len() == path.waypoint_count() {
                    break;
                }
            }
        }

        assert_eq!(arrivals, vec![0, 1, 2, 3]);
        assert_eq!(state.target_index(), 0);
    }

    #[test]
    fn out_of_range_cursor_is_wrapped() {
        let path = Path::new(vec![Vec2::new(10.0, 0.0), Vec2::new(-10.0, 0.0)]).expect("path");
        let mut state = PathFollowerState::new(3);
        let mut pose = Pose::default();

        follow_path(&mut pose, &path, &mut state, 1.0, 0.1, 0.5);

        assert_eq!(state.target_index(), 1);
        assert!(pose.position.x < 0.0);
    }
}
