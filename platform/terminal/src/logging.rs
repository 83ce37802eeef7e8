use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging() -> Result<WorkerGuard> {
    // stdout belongs to the matrix renderer.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    let file_appender = tracing_appender::rolling::Builder::new()
        .filename_prefix("matrix")
        .filename_suffix("log")
        .rotation(tracing_appender::rolling::Rotation::NEVER)
        .build(get_log_directory().context("failed to get log directory")?)
        .context("Failed to build the rolling log file appender.")?;
    let (non_blocking, appender_guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(tracing_subscriber::filter::EnvFilter::from_env("MATRIX_LOG"))
        .with(fmt_layer)
        .with(file_layer)
        .init();
    Ok(appender_guard)
}

/// `$XDG_STATE_HOME/matrix` on Linux, the local data directory elsewhere.
pub fn get_log_directory() -> Result<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join("matrix"))
        .context("no state or data directory found, please set $XDG_STATE_HOME or $HOME")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_directory_is_namespaced() {
        if let Ok(dir) = get_log_directory() {
            assert!(dir.ends_with("matrix"), "{}", dir.display());
        }
    }
}
