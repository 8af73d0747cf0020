use std::time::{Duration, Instant};

use serde::Deserialize;

use super::time_of_day::{wrap_hour, DayPhase, HOURS_PER_DAY};

/// Counts whole fixed intervals out of variable frame deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTicker {
    interval_seconds: f64,
    accumulated_seconds: f64,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self::from_seconds(interval.as_secs_f64())
    }

    pub fn from_seconds(interval_seconds: f64) -> Self {
        Self {
            interval_seconds: normalize_interval(interval_seconds),
            accumulated_seconds: 0.0,
        }
    }

    /// Returns how many intervals completed during `dt_seconds`.
    pub fn advance(&mut self, dt_seconds: f32) -> u32 {
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return 0;
        }
        self.accumulated_seconds += f64::from(dt_seconds);
        let whole = (self.accumulated_seconds / self.interval_seconds).floor();
        self.accumulated_seconds %= self.interval_seconds;
        if whole >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            whole as u32
        }
    }

    /// Changes the interval for the next firing; already accumulated time is kept.
    pub fn set_interval_seconds(&mut self, interval_seconds: f64) {
        self.interval_seconds = normalize_interval(interval_seconds);
    }

    pub fn interval_seconds(&self) -> f64 {
        self.interval_seconds
    }

    pub fn remaining_seconds(&self) -> f64 {
        (self.interval_seconds - self.accumulated_seconds).max(0.0)
    }
}

fn normalize_interval(interval_seconds: f64) -> f64 {
    if interval_seconds.is_finite() && interval_seconds > 0.0 {
        interval_seconds
    } else {
        f64::from(f32::EPSILON)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockTuning {
    pub start_hour: f32,
    pub hours_per_step: f32,
    pub step_interval_ms: u64,
}

impl Default for ClockTuning {
    fn default() -> Self {
        Self {
            start_hour: 8.0,
            hours_per_step: 0.01,
            step_interval_ms: 20,
        }
    }
}

/// In-world time of day, advanced in fixed steps and frozen while paused.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldClock {
    hour: f32,
    hours_per_step: f32,
    steps: FixedTicker,
    paused: bool,
}

impl WorldClock {
    pub fn new(tuning: &ClockTuning) -> Self {
        Self {
            hour: wrap_hour(tuning.start_hour),
            hours_per_step: tuning.hours_per_step,
            steps: FixedTicker::new(Duration::from_millis(tuning.step_interval_ms)),
            paused: false,
        }
    }

    /// Returns the number of world-time steps applied.
    pub fn advance(&mut self, dt_seconds: f32) -> u32 {
        if self.paused {
            return 0;
        }
        let steps = self.steps.advance(dt_seconds);
        if steps > 0 {
            let advanced = (f64::from(steps) * f64::from(self.hours_per_step))
                % f64::from(HOURS_PER_DAY);
            self.hour = wrap_hour(self.hour + advanced as f32);
        }
        steps
    }

    pub fn hour(&self) -> f32 {
        self.hour
    }

    pub fn day_phase(&self) -> DayPhase {
        DayPhase::from_hour(self.hour)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_hour(&mut self, hour: f32) {
        self.hour = wrap_hour(hour);
    }

    /// In-world hours that pass per real second while running.
    pub fn hours_per_second(&self) -> f32 {
        (f64::from(self.hours_per_step) / self.steps.interval_seconds()) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDelta {
    pub raw: Duration,
    pub clamped: Duration,
}

impl FrameDelta {
    pub fn seconds(&self) -> f32 {
        self.clamped.as_secs_f32()
    }

    pub fn was_clamped(&self) -> bool {
        self.raw > self.clamped
    }
}

/// Measures wall-clock time between frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last_frame: Instant,
    max_frame_delta: Duration,
}

impl FrameClock {
    pub fn start(now: Instant, max_frame_delta: Duration) -> Self {
        Self {
            last_frame: now,
            max_frame_delta,
        }
    }

    pub fn tick(&mut self, now: Instant) -> FrameDelta {
        let raw = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        FrameDelta {
            raw,
            clamped: clamp_frame_delta(raw, self.max_frame_delta),
        }
    }
}

pub fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_delta_is_counted_without_iterating() {
        let mut ticker = FixedTicker::new(Duration::from_millis(20));

        assert_eq!(ticker.advance(f32::MAX), u32::MAX);
        assert!(ticker.remaining_seconds() <= 0.02);
        assert_eq!(ticker.advance(0.0), 0);
    }

    #[test]
    fn world_clock_stays_in_range_after_huge_delta() {
        let mut clock = WorldClock::new(&ClockTuning::default());
        clock.advance(f32::MAX);

        assert!(clock.hour().is_finite());
        assert!((0.0..HOURS_PER_DAY).contains(&clock.hour()));
    }

    #[test]
    fn ticker_counts_whole_intervals_across_frames() {
        let mut ticker = FixedTicker::new(Duration::from_millis(100));
        assert_eq!(ticker.advance(0.05), 0);
        assert_eq!(ticker.advance(0.05), 1);
        assert_eq!(ticker.advance(0.35), 3);
        assert!((ticker.remaining_seconds() - 0.05).abs() < 1.0e-4);
    }

    #[test]
    fn ticker_ignores_non_positive_deltas() {
        let mut ticker = FixedTicker::new(Duration::from_millis(10));
        assert_eq!(ticker.advance(0.0), 0);
        assert_eq!(ticker.advance(-1.0), 0);
        assert_eq!(ticker.advance(f32::INFINITY), 0);
    }

    #[test]
    fn world_clock_advances_half_an_hour_per_second_by_default() {
        let mut clock = WorldClock::new(&ClockTuning::default());
        for _ in 0..60 {
            clock.advance(1.0 / 60.0);
        }
        assert!((clock.hour() - 8.5).abs() < 0.02, "hour {}", clock.hour());
        assert!((clock.hours_per_second() - 0.5).abs() < 1.0e-4);
    }

    #[test]
    fn world_clock_wraps_past_midnight() {
        let mut clock = WorldClock::new(&ClockTuning {
            start_hour: 23.995,
            ..ClockTuning::default()
        });
        clock.advance(0.021);
        assert!(clock.hour() < 0.01, "hour {}", clock.hour());
        assert_eq!(clock.day_phase(), DayPhase::Night);
    }

    #[test]
    fn paused_world_clock_does_not_accumulate() {
        let mut clock = WorldClock::new(&ClockTuning::default());
        clock.set_paused(true);
        assert_eq!(clock.advance(5.0), 0);
        assert_eq!(clock.hour(), 8.0);

        clock.set_paused(false);
        assert_eq!(clock.advance(0.019), 0);
        assert_eq!(clock.advance(0.002), 1);
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn frame_clock_reports_raw_and_clamped_delta() {
        let start = Instant::now();
        let mut clock = FrameClock::start(start, Duration::from_millis(250));

        let normal = clock.tick(start + Duration::from_millis(16));
        assert_eq!(normal.raw, Duration::from_millis(16));
        assert!(!normal.was_clamped());

        let stalled = clock.tick(start + Duration::from_millis(1016));
        assert_eq!(stalled.raw, Duration::from_millis(1000));
        assert_eq!(stalled.clamped, Duration::from_millis(250));
        assert!(stalled.was_clamped());
    }
}
