mod camera;
mod clock;
mod collision;
mod events;
mod npc;
mod path;
mod player;
mod snapshot;
mod time_of_day;
mod traffic;
mod types;
mod vehicle;
mod weather;
mod world;

pub use camera::{CameraState, CameraTuning};
pub use clock::{clamp_frame_delta, ClockTuning, FixedTicker, FrameClock, FrameDelta, WorldClock};
pub use collision::{resolve_overlaps, CircleObstacle};
pub use events::{AgentRef, EventBus, SimEvent, SimEventCounts, SimEventKind};
pub use npc::{update_npc, NpcState, NpcTuning, Routine, DEFAULT_NPC_SPEED};
pub use path::{
    follow_path, FollowStep, Path, PathError, PathFollowerState, DEFAULT_ARRIVAL_THRESHOLD,
};
pub use player::{camera_relative_basis, integrate_player, MoveIntent, PlayerState, PlayerTuning};
pub use snapshot::{CameraView, FrameSnapshot, NpcView, PlayerView, SignalView, VehicleView};
pub use time_of_day::{format_clock, is_dark, wrap_hour, DayPhase, HOURS_PER_DAY};
pub use traffic::{
    DirectionGroup, SignalId, SignalNetwork, SignalPhase, SignalPhases, SignalTuning,
    TrafficSignal,
};
pub use types::{planar, yaw_toward, Pose, TickContext};
pub use vehicle::{
    update_vehicle, Road, VehicleState, VehicleTuning, VehicleZone, DEFAULT_APPROACH_INDEX,
    DEFAULT_INTERSECTION_INDEX,
};
pub use weather::{WeatherKind, WeatherState, WeatherSystem, WeatherTuning};
pub use world::{CityWorld, SimTuning};
