use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::content::{load_city_content, ContentError};
use crate::sim::{CityWorld, FrameClock, FrameSnapshot, SimEvent};
use crate::{resolve_app_paths, StartupError};

use super::input::InputCollector;
use super::metrics::{MetricsAccumulator, MetricsHandle};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    /// Stop after this much wall time. `None` runs until the host quits.
    pub run_duration: Option<Duration>,
    /// Content file to load instead of the project default.
    pub world_file: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(60),
            run_duration: None,
            world_file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostControl {
    Continue,
    Quit,
}

/// The platform side of the loop: feeds raw input and shows each frame.
pub trait FrameHost {
    fn pump_input(&mut self, frame_index: u64, input: &mut InputCollector) -> HostControl;

    fn present(&mut self, snapshot: &FrameSnapshot, events: &[SimEvent]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    HostQuit,
    RunDurationElapsed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSummary {
    pub frames: u64,
    pub events: u64,
    pub clamped_frames: u64,
    pub simulated_seconds: f64,
    pub exit: LoopExit,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load city content: {0}")]
    Content(#[from] ContentError),
}

pub fn run_app(config: LoopConfig, host: &mut dyn FrameHost) -> Result<LoopSummary, AppError> {
    run_app_with_metrics(config, host, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    host: &mut dyn FrameHost,
    metrics_handle: MetricsHandle,
) -> Result<LoopSummary, AppError> {
    let app_paths = resolve_app_paths()?;
    let world_file = config
        .world_file
        .clone()
        .unwrap_or_else(|| app_paths.world_file.clone());
    info!(
        root = %app_paths.root.display(),
        content_dir = %app_paths.content_dir.display(),
        world_file = %world_file.display(),
        "startup"
    );

    let content = load_city_content(&world_file)?;
    let mut world = CityWorld::from_content(&content);
    Ok(run_world(&mut world, host, &config, &metrics_handle))
}

/// Drives `world` at the host's pace until the host quits or the run
/// duration elapses.
pub fn run_world(
    world: &mut CityWorld,
    host: &mut dyn FrameHost,
    config: &LoopConfig,
    metrics_handle: &MetricsHandle,
) -> LoopSummary {
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);

    info!(
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        run_duration_ms = config.run_duration.map(|limit| limit.as_millis() as u64),
        "loop_config"
    );

    let started = Instant::now();
    let mut frame_clock = FrameClock::start(started, max_frame_delta);
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval, started);
    let mut input_collector = InputCollector::new();
    let mut summary = LoopSummary {
        frames: 0,
        events: 0,
        clamped_frames: 0,
        simulated_seconds: 0.0,
        exit: LoopExit::HostQuit,
    };

    loop {
        let frame_start = Instant::now();
        if run_duration_elapsed(config.run_duration, frame_start.saturating_duration_since(started))
        {
            summary.exit = LoopExit::RunDurationElapsed;
            info!(frames = summary.frames, "run_duration_elapsed");
            break;
        }

        if host.pump_input(world.frame_index(), &mut input_collector) == HostControl::Quit {
            info!(reason = "host", frames = summary.frames, "shutdown_requested");
            break;
        }
        let input = input_collector.snapshot_for_tick();
        if input.quit_requested() {
            info!(reason = "input", frames = summary.frames, "shutdown_requested");
            break;
        }

        let delta = frame_clock.tick(frame_start);
        if delta.was_clamped() {
            warn!(
                raw_ms = delta.raw.as_millis() as u64,
                clamped_ms = delta.clamped.as_millis() as u64,
                "frame_delta_clamped"
            );
            summary.clamped_frames = summary.clamped_frames.saturating_add(1);
        }

        world.step(delta.seconds(), &input);
        let events = world.drain_events();
        host.present(&world.snapshot(), &events);

        summary.frames = summary.frames.saturating_add(1);
        summary.events = summary.events.saturating_add(events.len() as u64);
        summary.simulated_seconds += f64::from(delta.seconds());
        metrics_accumulator.record_frame(delta.clamped, delta.was_clamped());
        metrics_accumulator.record_events(events.len());

        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now()) {
            metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                frame_time_ms = snapshot.frame_time_ms,
                events_per_second = snapshot.events_per_second,
                clamped_frames = snapshot.clamped_frames,
                hour = world.time_of_day(),
                "loop_metrics"
            );
        }

        let cap_sleep = compute_cap_sleep(
            Instant::now().saturating_duration_since(frame_start),
            render_frame_target,
        );
        if cap_sleep > Duration::ZERO {
            thread::sleep(cap_sleep);
        }
    }

    info!(
        frames = summary.frames,
        events = summary.events,
        clamped_frames = summary.clamped_frames,
        simulated_seconds = summary.simulated_seconds,
        "shutdown"
    );
    summary
}

fn run_duration_elapsed(limit: Option<Duration>, elapsed: Duration) -> bool {
    limit.is_some_and(|limit| elapsed >= limit)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
