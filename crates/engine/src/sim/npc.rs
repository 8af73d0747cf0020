use std::sync::Arc;

use serde::Deserialize;

use super::path::{follow_path, FollowStep, Path, PathFollowerState};
use super::time_of_day::DayPhase;
use super::types::{Pose, TickContext};

pub const DEFAULT_NPC_SPEED: f32 = 1.5;

/// Defaults applied to NPCs that do not override them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NpcTuning {
    pub speed: f32,
    pub radius: f32,
    pub ground_height: f32,
}

impl Default for NpcTuning {
    fn default() -> Self {
        Self {
            speed: DEFAULT_NPC_SPEED,
            radius: 0.5,
            ground_height: 0.0,
        }
    }
}

/// Four waypoint loops, one per day phase. Shared read-only between NPCs.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    name: String,
    paths: [Path; 4],
}

impl Routine {
    /// Paths are given in `DayPhase::ALL` order.
    pub fn new(name: impl Into<String>, paths: [Path; 4]) -> Self {
        Self {
            name: name.into(),
            paths,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_for(&self, phase: DayPhase) -> &Path {
        &self.paths[phase.index()]
    }
}

#[derive(Debug, Clone)]
pub struct NpcState {
    pub name: String,
    pub routine: Arc<Routine>,
    pub pose: Pose,
    pub follower: PathFollowerState,
    pub speed: f32,
    pub radius: f32,
    pub active_phase: DayPhase,
}

impl NpcState {
    pub fn new(
        name: impl Into<String>,
        routine: Arc<Routine>,
        pose: Pose,
        speed: f32,
        radius: f32,
        phase: DayPhase,
    ) -> Self {
        Self {
            name: name.into(),
            routine,
            pose,
            follower: PathFollowerState::default(),
            speed,
            radius,
            active_phase: phase,
        }
    }
}

/// Follows the path for the frame's day phase. Switching phase keeps the
/// cursor, wrapped into the new path's range.
pub fn update_npc(npc: &mut NpcState, ctx: &TickContext, arrival_threshold: f32) -> FollowStep {
    npc.active_phase = ctx.day_phase;
    let routine = Arc::clone(&npc.routine);
    let path = routine.path_for(ctx.day_phase);
    npc.follower.wrap_to(path);
    follow_path(
        &mut npc.pose,
        path,
        &mut npc.follower,
        npc.speed,
        ctx.dt,
        arrival_threshold,
    )
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::path::DEFAULT_ARRIVAL_THRESHOLD;

    fn path(points: &[(f32, f32)]) -> Path {
        Path::new(points.iter().map(|(x, z)| Vec2::new(*x, *z)).collect()).expect("path")
    }

    fn commuter() -> Arc<Routine> {
        Arc::new(Routine::new(
            "commuter",
            [
                path(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (0.0, 5.0)]),
                path(&[(20.0, 20.0), (-20.0, -20.0)]),
                path(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]),
                path(&[(0.0, 0.0)]),
            ],
        ))
    }

    #[test]
    fn routine_resolves_path_by_phase() {
        let routine = commuter();
        assert_eq!(routine.path_for(DayPhase::Morning).waypoint_count(), 4);
        assert_eq!(routine.path_for(DayPhase::Day).waypoint_count(), 2);
        assert_eq!(routine.path_for(DayPhase::Night).waypoint_count(), 1);
    }

    #[test]
    fn switching_bucket_wraps_cursor_instead_of_resetting() {
        let mut npc = NpcState::new(
            "walker",
            commuter(),
            Pose::on_ground(Vec2::new(0.0, 3.0), 0.0),
            DEFAULT_NPC_SPEED,
            0.4,
            DayPhase::Morning,
        );
        npc.follower = PathFollowerState::new(3);

        update_npc(&mut npc, &TickContext::new(1.0 / 60.0, 8.99), DEFAULT_ARRIVAL_THRESHOLD);
        assert_eq!(npc.follower.target_index(), 3);
        assert_eq!(npc.active_phase, DayPhase::Morning);

        let before = npc.pose.planar();
        let step = update_npc(&mut npc, &TickContext::new(1.0 / 60.0, 9.0), DEFAULT_ARRIVAL_THRESHOLD);

        assert_eq!(step, FollowStep::Moved);
        assert_eq!(npc.follower.target_index(), 1);
        assert_eq!(npc.active_phase, DayPhase::Day);
        let moved = npc.pose.planar() - before;
        assert!(moved.x < 0.0 && moved.y < 0.0, "heading toward (-20, -20): {moved:?}");
    }

    #[test]
    fn npc_walks_at_configured_speed() {
        let mut npc = NpcState::new(
            "walker",
            commuter(),
            Pose::on_ground(Vec2::ZERO, 0.0),
            DEFAULT_NPC_SPEED,
            0.4,
            DayPhase::Morning,
        );
        npc.follower = PathFollowerState::new(1);

        update_npc(&mut npc, &TickContext::new(1.0, 7.0), DEFAULT_ARRIVAL_THRESHOLD);

        assert!((npc.pose.position.x - 1.5).abs() < 1.0e-5);
    }

    #[test]
    fn single_waypoint_night_path_keeps_arriving_in_place() {
        let mut npc = NpcState::new(
            "sleeper",
            commuter(),
            Pose::on_ground(Vec2::new(0.1, 0.0), 0.0),
            DEFAULT_NPC_SPEED,
            0.4,
            DayPhase::Night,
        );
        npc.follower = PathFollowerState::new(2);

        let step = update_npc(&mut npc, &TickContext::new(0.1, 23.0), DEFAULT_ARRIVAL_THRESHOLD);

        assert_eq!(step, FollowStep::Arrived { reached: 0, next: 0 });
        assert_eq!(npc.pose.planar(), Vec2::new(0.1, 0.0));
    }
}
