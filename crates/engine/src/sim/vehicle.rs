use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::path::{follow_path, FollowStep, Path, PathFollowerState};
use super::traffic::{SignalId, SignalPhases};
use super::types::Pose;

pub const DEFAULT_APPROACH_INDEX: usize = 2;
pub const DEFAULT_INTERSECTION_INDEX: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleTuning {
    pub nominal_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub stop_distance: f32,
    pub stop_speed: f32,
    pub ground_height: f32,
    pub radius: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            nominal_speed: 3.0,
            acceleration: 6.0,
            deceleration: 8.0,
            stop_distance: 2.0,
            stop_speed: 0.5,
            ground_height: 0.3,
            radius: 1.0,
        }
    }
}

/// A lane loop with its gating signal. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    pub name: String,
    pub path: Path,
    pub signal: Option<SignalId>,
    pub approach_index: usize,
    pub intersection_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleZone {
    Cruising,
    Approaching,
    InIntersection,
}

impl VehicleZone {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cruising => "cruising",
            Self::Approaching => "approaching",
            Self::InIntersection => "in_intersection",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VehicleState {
    pub road: Arc<Road>,
    pub pose: Pose,
    pub follower: PathFollowerState,
    pub speed: f32,
    pub nominal_speed: f32,
    pub radius: f32,
}

impl VehicleState {
    /// Places the vehicle on waypoint `start_index` of its road at nominal speed.
    pub fn spawn(road: Arc<Road>, start_index: usize, tuning: &VehicleTuning) -> Self {
        let start = road.path.waypoint(start_index);
        let nominal_speed = tuning.nominal_speed.max(0.0);
        Self {
            pose: Pose::on_ground(start, tuning.ground_height),
            follower: PathFollowerState::new(start_index % road.path.waypoint_count()),
            speed: nominal_speed,
            nominal_speed,
            radius: tuning.radius,
            road,
        }
    }

    pub fn zone(&self) -> VehicleZone {
        let cursor = self.follower.target_index();
        if cursor == self.road.approach_index {
            VehicleZone::Approaching
        } else if cursor == self.road.intersection_index {
            VehicleZone::InIntersection
        } else {
            VehicleZone::Cruising
        }
    }

    fn must_stop(&self, phases: &SignalPhases) -> bool {
        if self.zone() != VehicleZone::Approaching {
            return false;
        }
        self.road
            .signal
            .and_then(|id| phases.get(id))
            .is_some_and(|phase| phase.stops_traffic())
    }
}

/// Ramps speed against the gating signal, then follows the road. Holds in
/// place when braked to a crawl close to the stop line.
pub fn update_vehicle(
    vehicle: &mut VehicleState,
    tuning: &VehicleTuning,
    phases: &SignalPhases,
    dt: f32,
    arrival_threshold: f32,
) -> FollowStep {
    let road = Arc::clone(&vehicle.road);
    vehicle.follower.wrap_to(&road.path);

    let must_stop = vehicle.must_stop(phases);
    let speed = if must_stop {
        vehicle.speed - tuning.deceleration * dt
    } else {
        vehicle.speed + tuning.acceleration * dt
    };
    vehicle.speed = speed.clamp(0.0, vehicle.nominal_speed);

    if must_stop && vehicle.speed < tuning.stop_speed {
        let target = road.path.waypoint(vehicle.follower.target_index());
        if vehicle.pose.planar().distance(target) < tuning.stop_distance {
            return FollowStep::Held;
        }
    }

    follow_path(
        &mut vehicle.pose,
        &road.path,
        &mut vehicle.follower,
        vehicle.speed,
        dt,
        arrival_threshold,
    )
}
