//! Ambient weather state. Only the state is simulated; particles and audio
//! belong to the presentation layer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::time_of_day::DayPhase;

const MIN_INTENSITY: f32 = 0.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherKind {
    #[default]
    Clear,
    Rain,
    Snow,
    Fog,
}

impl WeatherKind {
    pub const ALL: [WeatherKind; 4] = [
        WeatherKind::Clear,
        WeatherKind::Rain,
        WeatherKind::Snow,
        WeatherKind::Fog,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Fog => "fog",
        }
    }

    /// Relative roll weight for this kind during `phase`.
    fn weight(self, phase: DayPhase) -> u32 {
        match (phase, self) {
            (DayPhase::Day, Self::Clear) => 5,
            (DayPhase::Morning, Self::Fog) => 3,
            (DayPhase::Evening, Self::Rain | Self::Snow) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeatherState {
    pub kind: WeatherKind,
    pub intensity: f32,
    /// How strongly visibility is reduced, 0 for none.
    pub visibility_factor: f32,
}

impl WeatherState {
    pub fn new(kind: WeatherKind, intensity: f32) -> Self {
        if kind == WeatherKind::Clear {
            return Self::default();
        }
        let intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let scale = if kind == WeatherKind::Fog { 0.9 } else { 0.6 };
        Self {
            kind,
            intensity,
            visibility_factor: (intensity * scale).min(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherTuning {
    pub min_interval_seconds: f32,
    pub max_interval_seconds: f32,
    pub seed: u64,
}

impl Default for WeatherTuning {
    fn default() -> Self {
        Self {
            min_interval_seconds: 20.0,
            max_interval_seconds: 70.0,
            seed: 0x00c1_7751,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherSystem {
    state: WeatherState,
    rng: StdRng,
    min_interval_seconds: f32,
    max_interval_seconds: f32,
    next_roll_in: f32,
}

impl WeatherSystem {
    /// Rolls the opening weather for `phase` and schedules the next change.
    pub fn new(tuning: &WeatherTuning, phase: DayPhase) -> Self {
        let min_interval_seconds = tuning.min_interval_seconds.max(f32::EPSILON);
        let mut system = Self {
            state: WeatherState::default(),
            rng: StdRng::seed_from_u64(tuning.seed),
            min_interval_seconds,
            max_interval_seconds: tuning.max_interval_seconds.max(min_interval_seconds),
            next_roll_in: 0.0,
        };
        system.state = system.roll(phase);
        system.next_roll_in = system.draw_interval();
        system
    }

    pub fn state(&self) -> WeatherState {
        self.state
    }

    pub fn seconds_until_change(&self) -> f32 {
        self.next_roll_in
    }

    /// Counts down the change timer and returns the new state when it fires.
    pub fn advance(&mut self, dt_seconds: f32, phase: DayPhase) -> Option<WeatherState> {
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return None;
        }
        self.next_roll_in -= dt_seconds;
        if self.next_roll_in > 0.0 {
            return None;
        }
        self.state = self.roll(phase);
        self.next_roll_in = self.draw_interval();
        info!(
            kind = self.state.kind.label(),
            intensity = self.state.intensity,
            phase = phase.label(),
            next_change_s = self.next_roll_in,
            "weather_changed"
        );
        Some(self.state)
    }

    /// Overrides the current weather without touching the change timer.
    pub fn force(&mut self, kind: WeatherKind, intensity: f32) -> WeatherState {
        self.state = WeatherState::new(kind, intensity);
        self.state
    }

    fn roll(&mut self, phase: DayPhase) -> WeatherState {
        let total: u32 = WeatherKind::ALL.iter().map(|kind| kind.weight(phase)).sum();
        let mut pick = self.rng.gen_range(0..total);
        let mut chosen = WeatherKind::Clear;
        for kind in WeatherKind::ALL {
            let weight = kind.weight(phase);
            if pick < weight {
                chosen = kind;
                break;
            }
            pick -= weight;
        }

        let intensity = if chosen == WeatherKind::Clear {
            0.0
        } else {
            self.rng.gen_range(MIN_INTENSITY..=1.0)
        };
        WeatherState::new(chosen, intensity)
    }

    fn draw_interval(&mut self) -> f32 {
        if self.max_interval_seconds > self.min_interval_seconds {
            self.rng
                .gen_range(self.min_interval_seconds..=self.max_interval_seconds)
        } else {
            self.min_interval_seconds
        }
    }
}
