use std::process::ExitCode;

use city_engine::run_app;
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    match run_app(app.config, &mut app.host) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                exit = ?summary.exit,
                "city_sim_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
