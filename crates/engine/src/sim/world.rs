use serde::Deserialize;
use tracing::{debug, info};

use crate::app::InputSnapshot;
use crate::content::CityContent;

use super::camera::{CameraState, CameraTuning};
use super::clock::{ClockTuning, WorldClock};
use super::collision::{resolve_overlaps, CircleObstacle};
use super::events::{AgentRef, EventBus, SimEvent, SimEventCounts};
use super::npc::{update_npc, NpcState, NpcTuning};
use super::path::{FollowStep, DEFAULT_ARRIVAL_THRESHOLD};
use super::player::{integrate_player, MoveIntent, PlayerState, PlayerTuning};
use super::snapshot::{CameraView, FrameSnapshot, NpcView, PlayerView, SignalView, VehicleView};
use super::time_of_day::{is_dark, DayPhase};
use super::traffic::{SignalNetwork, SignalTuning};
use super::types::{sanitize_dt, Pose, TickContext};
use super::vehicle::{update_vehicle, VehicleState, VehicleTuning};
use super::weather::{WeatherKind, WeatherState, WeatherSystem, WeatherTuning};

/// Every tunable constant of the simulation, grouped by subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimTuning {
    pub clock: ClockTuning,
    pub signals: SignalTuning,
    pub player: PlayerTuning,
    pub camera: CameraTuning,
    pub npcs: NpcTuning,
    pub vehicles: VehicleTuning,
    pub weather: WeatherTuning,
    pub arrival_threshold: f32,
}

impl Default for SimTuning {
    fn default() -> Self {
        Self {
            clock: ClockTuning::default(),
            signals: SignalTuning::default(),
            player: PlayerTuning::default(),
            camera: CameraTuning::default(),
            npcs: NpcTuning::default(),
            vehicles: VehicleTuning::default(),
            weather: WeatherTuning::default(),
            arrival_threshold: DEFAULT_ARRIVAL_THRESHOLD,
        }
    }
}

/// Owns all per-entity state and runs one frame at a time.
#[derive(Debug)]
pub struct CityWorld {
    tuning: SimTuning,
    clock: WorldClock,
    player: PlayerState,
    camera: CameraState,
    npcs: Vec<NpcState>,
    vehicles: Vec<VehicleState>,
    signals: SignalNetwork,
    weather: WeatherSystem,
    static_obstacles: Vec<CircleObstacle>,
    obstacle_scratch: Vec<CircleObstacle>,
    events: EventBus,
    /// Day phase as last reported through `DayPhaseChanged`.
    reported_phase: DayPhase,
    frame_index: u64,
}

impl CityWorld {
    pub fn from_content(content: &CityContent) -> Self {
        let tuning = content.tuning;
        let clock = WorldClock::new(&tuning.clock);
        let phase = clock.day_phase();

        let npcs = content
            .npcs
            .iter()
            .map(|spawn| {
                NpcState::new(
                    spawn.name.clone(),
                    spawn.routine.clone(),
                    Pose::on_ground(spawn.position, tuning.npcs.ground_height),
                    spawn.speed,
                    spawn.radius,
                    phase,
                )
            })
            .collect::<Vec<_>>();

        let vehicles = content
            .vehicles
            .iter()
            .map(|spawn| {
                let mut vehicle =
                    VehicleState::spawn(spawn.road.clone(), spawn.start_index, &tuning.vehicles);
                if let Some(nominal_speed) = spawn.nominal_speed {
                    vehicle.nominal_speed = nominal_speed;
                    vehicle.speed = nominal_speed;
                }
                vehicle
            })
            .collect::<Vec<_>>();

        let static_obstacles = content
            .obstacles
            .iter()
            .map(|obstacle| obstacle.shape)
            .collect::<Vec<_>>();

        let world = Self {
            clock,
            player: PlayerState::spawn(content.player_spawn, &tuning.player),
            camera: CameraState::new(&tuning.camera),
            signals: SignalNetwork::new(content.signals.clone(), &tuning.signals),
            weather: WeatherSystem::new(&tuning.weather, phase),
            obstacle_scratch: Vec::with_capacity(
                static_obstacles.len() + npcs.len() + vehicles.len(),
            ),
            npcs,
            vehicles,
            static_obstacles,
            events: EventBus::default(),
            reported_phase: phase,
            frame_index: 0,
            tuning,
        };
        info!(
            npc_count = world.npcs.len(),
            vehicle_count = world.vehicles.len(),
            signal_count = world.signals.signals().len(),
            obstacle_count = world.static_obstacles.len(),
            hour = world.clock.hour(),
            weather = world.weather.state().kind.label(),
            "world_created"
        );
        world
    }

    /// Runs one frame: clock, player, collision, camera, agents, then the
    /// coarse signal and weather timers.
    pub fn step(&mut self, dt: f32, input: &InputSnapshot) {
        let dt = sanitize_dt(dt);
        self.frame_index = self.frame_index.saturating_add(1);

        if input.paused() != self.clock.is_paused() {
            self.clock.set_paused(input.paused());
            self.events.emit(SimEvent::PauseChanged {
                paused: input.paused(),
            });
            info!(paused = input.paused(), frame = self.frame_index, "pause_toggled");
        }

        let previous_phase = self.reported_phase;
        self.clock.advance(dt);
        let ctx = TickContext::new(dt, self.clock.hour());
        if ctx.day_phase != previous_phase {
            self.reported_phase = ctx.day_phase;
            self.events.emit(SimEvent::DayPhaseChanged {
                from: previous_phase,
                to: ctx.day_phase,
            });
            debug!(
                from = previous_phase.label(),
                to = ctx.day_phase.label(),
                hour = ctx.hour,
                "day_phase_changed"
            );
        }

        let committed_phases = self.signals.phases();

        integrate_player(
            &mut self.player,
            MoveIntent::from_input(input),
            self.camera.facing(),
            &self.tuning.player,
            dt,
        );
        self.resolve_player_overlaps();

        self.camera.update(
            Some(self.player.pose),
            input.pointer_delta().x,
            input.zoom_delta_steps(),
            &self.tuning.camera,
            dt,
        );

        let arrival_threshold = self.tuning.arrival_threshold;
        for (index, npc) in self.npcs.iter_mut().enumerate() {
            if let FollowStep::Arrived { reached, .. } = update_npc(npc, &ctx, arrival_threshold) {
                self.events.emit(SimEvent::WaypointReached {
                    agent: AgentRef::Npc(index),
                    index: reached,
                });
            }
        }

        for (index, vehicle) in self.vehicles.iter_mut().enumerate() {
            let step = update_vehicle(
                vehicle,
                &self.tuning.vehicles,
                &committed_phases,
                dt,
                arrival_threshold,
            );
            if let FollowStep::Arrived { reached, .. } = step {
                self.events.emit(SimEvent::WaypointReached {
                    agent: AgentRef::Vehicle(index),
                    index: reached,
                });
            }
        }

        if !self.clock.is_paused() {
            self.signals.advance_timer(dt, &mut self.events);
            if let Some(state) = self.weather.advance(dt, ctx.day_phase) {
                self.events.emit(SimEvent::WeatherChanged {
                    kind: state.kind,
                    intensity: state.intensity,
                });
            }
        }

        self.events.finish_frame();
    }

    /// Static obstacles first, then NPCs and vehicles where they stood
    /// before this frame's agent updates.
    fn resolve_player_overlaps(&mut self) {
        self.obstacle_scratch.clear();
        self.obstacle_scratch.extend_from_slice(&self.static_obstacles);
        self.obstacle_scratch.extend(
            self.npcs
                .iter()
                .map(|npc| CircleObstacle::at(npc.pose.position, npc.radius)),
        );
        self.obstacle_scratch.extend(
            self.vehicles
                .iter()
                .map(|vehicle| CircleObstacle::at(vehicle.pose.position, vehicle.radius)),
        );
        resolve_overlaps(
            &mut self.player.pose.position,
            self.tuning.player.radius,
            &self.obstacle_scratch,
        );
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let hour = self.clock.hour();
        FrameSnapshot {
            frame_index: self.frame_index,
            hour,
            day_phase: self.clock.day_phase(),
            is_dark: is_dark(hour),
            paused: self.clock.is_paused(),
            player: PlayerView {
                pose: self.player.pose,
                is_moving: self.player.is_moving,
            },
            camera: CameraView {
                position: self.camera.position(),
                look_at: self.camera.look_at(),
                zoom_distance: self.camera.zoom_distance(),
            },
            npcs: self
                .npcs
                .iter()
                .map(|npc| NpcView {
                    name: npc.name.clone(),
                    pose: npc.pose,
                    phase: npc.active_phase,
                    target_index: npc.follower.target_index(),
                })
                .collect(),
            vehicles: self
                .vehicles
                .iter()
                .map(|vehicle| VehicleView {
                    road: vehicle.road.name.clone(),
                    pose: vehicle.pose,
                    speed: vehicle.speed,
                    zone: vehicle.zone(),
                })
                .collect(),
            signals: self
                .signals
                .signals()
                .iter()
                .map(|signal| SignalView {
                    id: signal.id,
                    name: signal.name.clone(),
                    position: signal.position,
                    group: signal.group,
                    phase: signal.phase,
                })
                .collect(),
            weather: self.weather.state(),
        }
    }

    /// Events of the last finished frame.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    pub fn last_frame_event_counts(&self) -> SimEventCounts {
        self.events.last_frame_counts()
    }

    /// Overrides the weather; the change is reported with the next frame's events.
    pub fn force_weather(&mut self, kind: WeatherKind, intensity: f32) -> WeatherState {
        let state = self.weather.force(kind, intensity);
        self.events.emit(SimEvent::WeatherChanged {
            kind: state.kind,
            intensity: state.intensity,
        });
        info!(kind = kind.label(), intensity = state.intensity, "weather_forced");
        state
    }

    /// Jumps the clock; a bucket change is reported by the next `step`.
    pub fn set_time_of_day(&mut self, hour: f32) {
        self.clock.set_hour(hour);
    }

    pub fn time_of_day(&self) -> f32 {
        self.clock.hour()
    }

    pub fn day_phase(&self) -> DayPhase {
        self.clock.day_phase()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn tuning(&self) -> &SimTuning {
        &self.tuning
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn npcs(&self) -> &[NpcState] {
        &self.npcs
    }

    pub fn vehicles(&self) -> &[VehicleState] {
        &self.vehicles
    }

    pub fn signals(&self) -> &SignalNetwork {
        &self.signals
    }

    pub fn weather(&self) -> WeatherState {
        self.weather.state()
    }
}
