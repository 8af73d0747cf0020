mod input;
mod loop_runner;
mod metrics;

pub use input::{InputAction, InputCollector, InputSnapshot};
pub use loop_runner::{
    run_app, run_app_with_metrics, run_world, AppError, FrameHost, HostControl, LoopConfig,
    LoopExit, LoopSummary,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
