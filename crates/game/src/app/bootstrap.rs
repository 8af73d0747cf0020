use std::env;
use std::path::PathBuf;
use std::time::Duration;

use city_engine::LoopConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::autopilot::Autopilot;

const WORLD_FILE_ENV_VAR: &str = "CITYSIM_WORLD";
const RUN_SECONDS_ENV_VAR: &str = "CITYSIM_RUN_SECONDS";
const MAX_FPS_ENV_VAR: &str = "CITYSIM_MAX_FPS";
const DEFAULT_RUN_SECONDS: u64 = 60;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) host: Autopilot,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "city_sim_startup");

    let defaults = LoopConfig::default();
    let config = LoopConfig {
        world_file: read_env(WORLD_FILE_ENV_VAR).map(PathBuf::from),
        run_duration: resolve_run_duration(read_env(RUN_SECONDS_ENV_VAR).as_deref()),
        max_render_fps: resolve_max_fps(
            read_env(MAX_FPS_ENV_VAR).as_deref(),
            defaults.max_render_fps,
        ),
        ..defaults
    };

    AppWiring {
        config,
        host: Autopilot::new(None),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn read_env(var: &'static str) -> Option<String> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(value.trim().to_string()),
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(env_var = var, error = %err, "unable to read env var; using default");
            None
        }
    }
}

/// `0` runs until the host quits.
fn resolve_run_duration(raw: Option<&str>) -> Option<Duration> {
    let seconds = match raw {
        None => DEFAULT_RUN_SECONDS,
        Some(value) => match value.parse::<u64>() {
            Ok(seconds) => seconds,
            Err(_) => {
                warn!(
                    env_var = RUN_SECONDS_ENV_VAR,
                    value,
                    fallback_seconds = DEFAULT_RUN_SECONDS,
                    "invalid run duration; using default"
                );
                DEFAULT_RUN_SECONDS
            }
        },
    };
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

/// `0` or `off` disables the render cap.
fn resolve_max_fps(raw: Option<&str>, fallback: Option<u32>) -> Option<u32> {
    let Some(value) = raw else {
        return fallback;
    };
    if value.eq_ignore_ascii_case("off") {
        return None;
    }
    match value.parse::<u32>() {
        Ok(0) => None,
        Ok(fps) => Some(fps),
        Err(_) => {
            warn!(env_var = MAX_FPS_ENV_VAR, value, "invalid fps cap; using default");
            fallback
        }
    }
}
