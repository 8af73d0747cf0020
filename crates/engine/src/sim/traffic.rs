use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::clock::FixedTicker;
use super::events::{EventBus, SimEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPhase {
    #[default]
    Green,
    Yellow,
    Red,
}

impl SignalPhase {
    pub const CYCLE: [SignalPhase; 3] = [SignalPhase::Green, SignalPhase::Yellow, SignalPhase::Red];

    pub fn next(self) -> Self {
        match self {
            Self::Green => Self::Yellow,
            Self::Yellow => Self::Red,
            Self::Red => Self::Green,
        }
    }

    pub const fn cycle_index(self) -> usize {
        match self {
            Self::Green => 0,
            Self::Yellow => 1,
            Self::Red => 2,
        }
    }

    /// Vehicles on the approach must brake for yellow and red.
    pub fn stops_traffic(self) -> bool {
        matches!(self, Self::Yellow | Self::Red)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionGroup {
    NorthSouth,
    EastWest,
}

/// Index of a signal inside its network, resolved once at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(pub u32);

impl SignalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSignal {
    pub id: SignalId,
    pub name: String,
    pub position: Vec3,
    pub group: DirectionGroup,
    pub phase: SignalPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalTuning {
    pub signal_interval_ms: u64,
}

impl Default for SignalTuning {
    fn default() -> Self {
        Self {
            signal_interval_ms: 4000,
        }
    }
}

/// Phases as they stood at the end of the previous frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalPhases {
    phases: Vec<SignalPhase>,
}

impl SignalPhases {
    pub fn get(&self, id: SignalId) -> Option<SignalPhase> {
        self.phases.get(id.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SignalNetwork {
    signals: Vec<TrafficSignal>,
    timer: FixedTicker,
    advances: u64,
}

impl SignalNetwork {
    /// Signals must be ordered by id, starting at zero.
    pub fn new(signals: Vec<TrafficSignal>, tuning: &SignalTuning) -> Self {
        Self {
            signals,
            timer: FixedTicker::new(Duration::from_millis(tuning.signal_interval_ms)),
            advances: 0,
        }
    }

    /// Runs the signal timer and returns how many phase advances happened.
    pub fn advance_timer(&mut self, dt_seconds: f32, events: &mut EventBus) -> u32 {
        let steps = self.timer.advance(dt_seconds);
        let cycle = SignalPhase::CYCLE.len() as u32;
        let replayed = if steps > cycle {
            // Whole cycles leave every phase unchanged; only the tail is replayed.
            let replayed = cycle + steps % cycle;
            self.advances = self.advances.saturating_add(u64::from(steps - replayed));
            debug!(steps, replayed, "signal_backlog_collapsed");
            replayed
        } else {
            steps
        };
        for _ in 0..replayed {
            self.advance_phase(events);
        }
        steps
    }

    /// Moves every signal one phase along the cycle.
    pub fn advance_phase(&mut self, events: &mut EventBus) {
        self.advances = self.advances.saturating_add(1);
        for signal in &mut self.signals {
            signal.phase = signal.phase.next();
            events.emit(SimEvent::SignalChanged {
                signal: signal.id,
                phase: signal.phase,
            });
        }
        debug!(
            advances = self.advances,
            signal_count = self.signals.len(),
            "signal_phase_advanced"
        );
    }

    pub fn phase(&self, id: SignalId) -> Option<SignalPhase> {
        self.signals.get(id.index()).map(|signal| signal.phase)
    }

    pub fn phases(&self) -> SignalPhases {
        SignalPhases {
            phases: self.signals.iter().map(|signal| signal.phase).collect(),
        }
    }

    pub fn signals(&self) -> &[TrafficSignal] {
        &self.signals
    }

    pub fn find_by_name(&self, name: &str) -> Option<SignalId> {
        self.signals
            .iter()
            .find(|signal| signal.name == name)
            .map(|signal| signal.id)
    }

    pub fn advances(&self) -> u64 {
        self.advances
    }

    /// Pairs of crossing signals that start in the same phase. All signals
    /// advance in lockstep, so such pairs show green together on every cycle.
    pub fn simultaneous_green_conflicts(&self) -> Vec<(SignalId, SignalId)> {
        let mut conflicts = Vec::new();
        for (i, first) in self.signals.iter().enumerate() {
            for second in &self.signals[i + 1..] {
                if first.group != second.group && first.phase == second.phase {
                    conflicts.push((first.id, second.id));
                }
            }
        }
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(id: u32, group: DirectionGroup, phase: SignalPhase) -> TrafficSignal {
        TrafficSignal {
            id: SignalId(id),
            name: format!("light-{id}"),
            position: Vec3::ZERO,
            group,
            phase,
        }
    }

    fn crossing() -> SignalNetwork {
        SignalNetwork::new(
            vec![
                signal(0, DirectionGroup::NorthSouth, SignalPhase::Green),
                signal(1, DirectionGroup::EastWest, SignalPhase::Red),
            ],
            &SignalTuning::default(),
        )
    }

    #[test]
    fn phase_after_t_advances_is_cycle_at_t_mod_three() {
        let mut network = crossing();
        let mut events = EventBus::default();
        for t in 1..=10usize {
            network.advance_phase(&mut events);
            assert_eq!(
                network.phase(SignalId(0)),
                Some(SignalPhase::CYCLE[t % 3]),
                "advance {t}"
            );
            assert_eq!(
                network.phase(SignalId(1)),
                Some(SignalPhase::CYCLE[(2 + t) % 3])
            );
        }
    }

    #[test]
    fn timer_fires_once_per_interval_regardless_of_frame_size() {
        let mut network = crossing();
        let mut events = EventBus::default();

        let mut fired = 0;
        for _ in 0..239 {
            fired += network.advance_timer(1.0 / 60.0, &mut events);
        }
        assert_eq!(fired, 0);
        fired += network.advance_timer(0.05, &mut events);
        assert_eq!(fired, 1);

        assert_eq!(network.advance_timer(8.0, &mut events), 2);
        assert_eq!(network.advances(), 3);
    }

    #[test]
    fn long_backlog_replays_only_the_cycle_remainder() {
        let mut network = crossing();
        let mut events = EventBus::default();

        assert_eq!(network.advance_timer(4001.0, &mut events), 1000);

        assert_eq!(network.advances(), 1000);
        assert_eq!(network.phase(SignalId(0)), Some(SignalPhase::Yellow));
        assert_eq!(network.phase(SignalId(1)), Some(SignalPhase::Green));
        assert_eq!(events.emitted_so_far().len(), 8);
    }

    #[test]
    fn each_advance_emits_one_event_per_signal() {
        let mut network = crossing();
        let mut events = EventBus::default();
        network.advance_phase(&mut events);

        assert_eq!(
            events.emitted_so_far(),
            &[
                SimEvent::SignalChanged {
                    signal: SignalId(0),
                    phase: SignalPhase::Yellow
                },
                SimEvent::SignalChanged {
                    signal: SignalId(1),
                    phase: SignalPhase::Green
                },
            ]
        );
    }

    #[test]
    fn phases_snapshot_is_detached_from_network() {
        let mut network = crossing();
        let snapshot = network.phases();
        network.advance_phase(&mut EventBus::default());

        assert_eq!(snapshot.get(SignalId(0)), Some(SignalPhase::Green));
        assert_eq!(network.phase(SignalId(0)), Some(SignalPhase::Yellow));
        assert_eq!(snapshot.get(SignalId(7)), None);
    }

    #[test]
    fn crossing_groups_in_same_phase_are_reported() {
        let network = SignalNetwork::new(
            vec![
                signal(0, DirectionGroup::NorthSouth, SignalPhase::Green),
                signal(1, DirectionGroup::NorthSouth, SignalPhase::Green),
                signal(2, DirectionGroup::EastWest, SignalPhase::Green),
                signal(3, DirectionGroup::EastWest, SignalPhase::Red),
            ],
            &SignalTuning::default(),
        );

        assert_eq!(
            network.simultaneous_green_conflicts(),
            vec![(SignalId(0), SignalId(2)), (SignalId(1), SignalId(2))]
        );
        assert!(crossing().simultaneous_green_conflicts().is_empty());
    }

    #[test]
    fn lookup_by_name() {
        let network = crossing();
        assert_eq!(network.find_by_name("light-1"), Some(SignalId(1)));
        assert_eq!(network.find_by_name("missing"), None);
    }
}
