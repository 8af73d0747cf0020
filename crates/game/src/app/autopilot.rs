use city_engine::sim::{format_clock, FrameSnapshot, SimEvent};
use city_engine::{FrameHost, HostControl, InputAction, InputCollector};
use glam::Vec2;
use tracing::{debug, info};

const STATUS_EVERY_FRAMES: u64 = 300;
const POINTER_SWEEP_PX: f32 = 6.0;

/// One stretch of scripted input, repeated for `frames` frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScriptStep {
    pub(crate) frames: u64,
    pub(crate) held: &'static [InputAction],
    pub(crate) pointer_dx: f32,
    pub(crate) zoom_steps: i32,
}

const WALK_LOOP: &[ScriptStep] = &[
    ScriptStep {
        frames: 240,
        held: &[InputAction::MoveForward],
        pointer_dx: 0.0,
        zoom_steps: 0,
    },
    ScriptStep {
        frames: 90,
        held: &[InputAction::MoveForward, InputAction::MoveRight],
        pointer_dx: POINTER_SWEEP_PX,
        zoom_steps: 0,
    },
    ScriptStep {
        frames: 120,
        held: &[],
        pointer_dx: 0.0,
        zoom_steps: 0,
    },
    ScriptStep {
        frames: 1,
        held: &[],
        pointer_dx: 0.0,
        zoom_steps: 2,
    },
    ScriptStep {
        frames: 240,
        held: &[InputAction::MoveBack],
        pointer_dx: -POINTER_SWEEP_PX,
        zoom_steps: 0,
    },
    ScriptStep {
        frames: 1,
        held: &[],
        pointer_dx: 0.0,
        zoom_steps: -2,
    },
];

const MOVEMENT_ACTIONS: [InputAction; 4] = [
    InputAction::MoveForward,
    InputAction::MoveBack,
    InputAction::MoveLeft,
    InputAction::MoveRight,
];

/// Headless host that walks the player around on a fixed loop and reports
/// the city through the log.
#[derive(Debug)]
pub(crate) struct Autopilot {
    script: &'static [ScriptStep],
    max_frames: Option<u64>,
    presented_frames: u64,
    signal_changes: u64,
    waypoint_arrivals: u64,
}

impl Autopilot {
    pub(crate) fn new(max_frames: Option<u64>) -> Self {
        Self::with_script(WALK_LOOP, max_frames)
    }

    pub(crate) fn with_script(script: &'static [ScriptStep], max_frames: Option<u64>) -> Self {
        Self {
            script,
            max_frames,
            presented_frames: 0,
            signal_changes: 0,
            waypoint_arrivals: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn presented_frames(&self) -> u64 {
        self.presented_frames
    }

    fn step_for_frame(&self, frame_index: u64) -> Option<&ScriptStep> {
        let cycle: u64 = self.script.iter().map(|step| step.frames).sum();
        if cycle == 0 {
            return None;
        }
        let mut offset = frame_index % cycle;
        for step in self.script {
            if offset < step.frames {
                return Some(step);
            }
            offset -= step.frames;
        }
        None
    }
}

impl FrameHost for Autopilot {
    fn pump_input(&mut self, frame_index: u64, input: &mut InputCollector) -> HostControl {
        if self.max_frames.is_some_and(|limit| frame_index >= limit) {
            return HostControl::Quit;
        }

        let step = self.step_for_frame(frame_index).copied();
        for action in MOVEMENT_ACTIONS {
            let held = step.is_some_and(|step| step.held.contains(&action));
            input.set_action(action, held);
        }
        if let Some(step) = step {
            if step.pointer_dx != 0.0 {
                input.add_pointer_delta(Vec2::new(step.pointer_dx, 0.0));
            }
            if step.zoom_steps != 0 {
                input.add_zoom_steps(step.zoom_steps);
            }
        }
        HostControl::Continue
    }

    fn present(&mut self, snapshot: &FrameSnapshot, events: &[SimEvent]) {
        self.presented_frames = self.presented_frames.saturating_add(1);

        for event in events {
            match event {
                SimEvent::SignalChanged { .. } => {
                    self.signal_changes = self.signal_changes.saturating_add(1);
                }
                SimEvent::WaypointReached { agent, index } => {
                    self.waypoint_arrivals = self.waypoint_arrivals.saturating_add(1);
                    debug!(agent = ?agent, index, "waypoint_reached");
                }
                SimEvent::DayPhaseChanged { from, to } => {
                    info!(
                        from = from.label(),
                        to = to.label(),
                        clock = %format_clock(snapshot.hour),
                        is_dark = snapshot.is_dark,
                        "day_phase_changed"
                    );
                }
                SimEvent::WeatherChanged { .. } | SimEvent::PauseChanged { .. } => {}
            }
        }

        if snapshot.frame_index % STATUS_EVERY_FRAMES == 0 {
            let player = snapshot.player.pose.position;
            info!(
                frame = snapshot.frame_index,
                clock = %format_clock(snapshot.hour),
                day_phase = snapshot.day_phase.label(),
                weather = snapshot.weather.kind.label(),
                player_x = player.x,
                player_z = player.z,
                moving_vehicles = snapshot.moving_vehicle_count(),
                signal_changes = self.signal_changes,
                waypoint_arrivals = self.waypoint_arrivals,
                "city_status"
            );
        }
    }
}
