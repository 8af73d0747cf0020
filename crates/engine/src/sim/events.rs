use super::time_of_day::DayPhase;
use super::traffic::{SignalId, SignalPhase};
use super::weather::WeatherKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRef {
    Npc(usize),
    Vehicle(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    WaypointReached { agent: AgentRef, index: usize },
    SignalChanged { signal: SignalId, phase: SignalPhase },
    DayPhaseChanged { from: DayPhase, to: DayPhase },
    WeatherChanged { kind: WeatherKind, intensity: f32 },
    PauseChanged { paused: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEventKind {
    WaypointReached,
    SignalChanged,
    DayPhaseChanged,
    WeatherChanged,
    PauseChanged,
}

impl SimEvent {
    pub fn kind(&self) -> SimEventKind {
        match self {
            Self::WaypointReached { .. } => SimEventKind::WaypointReached,
            Self::SignalChanged { .. } => SimEventKind::SignalChanged,
            Self::DayPhaseChanged { .. } => SimEventKind::DayPhaseChanged,
            Self::WeatherChanged { .. } => SimEventKind::WeatherChanged,
            Self::PauseChanged { .. } => SimEventKind::PauseChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimEventCounts {
    pub total: u32,
    pub waypoint_reached: u32,
    pub signal_changed: u32,
    pub day_phase_changed: u32,
    pub weather_changed: u32,
    pub pause_changed: u32,
}

impl SimEventCounts {
    fn record(&mut self, kind: SimEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            SimEventKind::WaypointReached => &mut self.waypoint_reached,
            SimEventKind::SignalChanged => &mut self.signal_changed,
            SimEventKind::DayPhaseChanged => &mut self.day_phase_changed,
            SimEventKind::WeatherChanged => &mut self.weather_changed,
            SimEventKind::PauseChanged => &mut self.pause_changed,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Collects events while a frame runs; the finished frame's events stay
/// available until drained or replaced by the next frame.
#[derive(Debug, Default)]
pub struct EventBus {
    current_frame: Vec<SimEvent>,
    last_frame: Vec<SimEvent>,
    last_frame_counts: SimEventCounts,
}

impl EventBus {
    pub fn emit(&mut self, event: SimEvent) {
        self.current_frame.push(event);
    }

    pub fn emitted_so_far(&self) -> &[SimEvent] {
        &self.current_frame
    }

    pub fn finish_frame(&mut self) {
        let mut counts = SimEventCounts::default();
        for event in &self.current_frame {
            counts.record(event.kind());
        }
        self.last_frame_counts = counts;
        self.last_frame.clear();
        self.last_frame.append(&mut self.current_frame);
    }

    pub fn last_frame(&self) -> &[SimEvent] {
        &self.last_frame
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.last_frame)
    }

    pub fn last_frame_counts(&self) -> SimEventCounts {
        self.last_frame_counts
    }
}
