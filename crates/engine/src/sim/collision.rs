use glam::{Vec2, Vec3};

use super::types::planar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleObstacle {
    pub center: Vec2,
    pub radius: f32,
}

impl CircleObstacle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn at(position: Vec3, radius: f32) -> Self {
        Self::new(planar(position), radius)
    }
}

/// Pushes `position` out of each overlapping obstacle in order, one pass.
/// Coincident centers are skipped. Returns the number of pushes applied.
pub fn resolve_overlaps(position: &mut Vec3, radius: f32, obstacles: &[CircleObstacle]) -> u32 {
    let mut pushes = 0u32;
    for obstacle in obstacles {
        let offset = planar(*position) - obstacle.center;
        let distance = offset.length();
        let min_distance = radius + obstacle.radius;
        if distance > 0.0 && distance < min_distance {
            let push = offset / distance * (min_distance - distance);
            position.x += push.x;
            position.z += push.y;
            pushes = pushes.saturating_add(1);
        }
    }
    pushes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_resolved_to_contact_distance() {
        let mut position = Vec3::new(1.0, 0.0, 0.0);
        let obstacles = [CircleObstacle::new(Vec2::ZERO, 1.5)];

        let pushes = resolve_overlaps(&mut position, 0.5, &obstacles);

        assert_eq!(pushes, 1);
        assert!((planar(position).length() - 2.0).abs() < 1.0e-5);
        assert_eq!(position.y, 0.0);
    }

    #[test]
    fn single_obstacle_never_leaves_penetration() {
        for step in 0..32 {
            let angle = step as f32 * 0.2;
            let start = Vec2::new(angle.cos(), angle.sin()) * (0.1 + step as f32 * 0.05);
            let obstacle = CircleObstacle::new(Vec2::new(0.25, -0.5), 1.0);
            let mut position = Vec3::new(start.x, 0.0, start.y);

            resolve_overlaps(&mut position, 0.5, &[obstacle]);

            let gap = planar(position).distance(obstacle.center);
            assert!(gap >= 1.5 - 1.0e-4, "step {step}: {gap}");
        }
    }

    #[test]
    fn coincident_center_is_skipped() {
        let mut position = Vec3::new(3.0, 0.2, 3.0);
        let obstacles = [CircleObstacle::new(Vec2::new(3.0, 3.0), 2.0)];

        assert_eq!(resolve_overlaps(&mut position, 0.5, &obstacles), 0);
        assert_eq!(position, Vec3::new(3.0, 0.2, 3.0));
    }

    #[test]
    fn separated_obstacles_are_untouched() {
        let mut position = Vec3::new(10.0, 0.0, 0.0);
        let obstacles = [
            CircleObstacle::new(Vec2::ZERO, 1.0),
            CircleObstacle::at(Vec3::new(10.0, 5.0, 3.0), 1.0),
        ];

        assert_eq!(resolve_overlaps(&mut position, 0.5, &obstacles), 0);
    }

    #[test]
    fn obstacles_are_resolved_sequentially_from_the_updated_position() {
        let mut position = Vec3::new(0.5, 0.0, 0.0);
        let obstacles = [
            CircleObstacle::new(Vec2::ZERO, 1.0),
            CircleObstacle::new(Vec2::new(2.2, 0.0), 0.5),
        ];

        let pushes = resolve_overlaps(&mut position, 0.5, &obstacles);

        assert_eq!(pushes, 2);
        assert!((position.x - 1.2).abs() < 1.0e-5);
    }
}
