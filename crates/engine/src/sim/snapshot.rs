use glam::Vec3;

use super::time_of_day::DayPhase;
use super::traffic::{DirectionGroup, SignalId, SignalPhase};
use super::types::Pose;
use super::vehicle::VehicleZone;
use super::weather::WeatherState;

/// Everything a presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub frame_index: u64,
    pub hour: f32,
    pub day_phase: DayPhase,
    pub is_dark: bool,
    pub paused: bool,
    pub player: PlayerView,
    pub camera: CameraView,
    pub npcs: Vec<NpcView>,
    pub vehicles: Vec<VehicleView>,
    pub signals: Vec<SignalView>,
    pub weather: WeatherState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub pose: Pose,
    pub is_moving: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub look_at: Vec3,
    pub zoom_distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpcView {
    pub name: String,
    pub pose: Pose,
    pub phase: DayPhase,
    pub target_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleView {
    pub road: String,
    pub pose: Pose,
    pub speed: f32,
    pub zone: VehicleZone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalView {
    pub id: SignalId,
    pub name: String,
    pub position: Vec3,
    pub group: DirectionGroup,
    pub phase: SignalPhase,
}

impl FrameSnapshot {
    pub fn moving_vehicle_count(&self) -> usize {
        self.vehicles
            .iter()
            .filter(|vehicle| vehicle.speed > 0.0)
            .count()
    }
}
