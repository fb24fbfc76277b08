/// Logging setup and the event log handed to the routing layer
use crate::config::LogPaths;
use anyhow::Context;
use std::path::Path;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub const ACCESS_TARGET: &str = "access";
pub const DASHBOARD_TARGET: &str = "dashboard_access";

const KEEP_LOG_FILES: usize = 4;

/// Install the global subscriber.
///
/// Console output is filtered by `RUST_LOG`. Three rolling files are written
/// regardless: `error.log` (ERROR and above), `access.log` (one line per
/// request) and `dashboard_access.log` in the dashboard directory.
pub fn init_tracing(paths: &LogPaths) -> anyhow::Result<()> {
    let error_file = rolling_file(&paths.log_dir, "error")?;
    let access_file = rolling_file(&paths.log_dir, ACCESS_TARGET)?;
    let dashboard_file = rolling_file(&paths.dashboard_dir, DASHBOARD_TARGET)?;

    let console = fmt::layer().with_filter(EnvFilter::from_default_env());
    let errors = fmt::layer()
        .with_ansi(false)
        .with_writer(error_file)
        .with_filter(LevelFilter::ERROR);
    let access = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_writer(access_file)
        .with_filter(filter_fn(|meta| meta.target() == ACCESS_TARGET));
    let dashboard = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(dashboard_file)
        .with_filter(filter_fn(|meta| meta.target() == DASHBOARD_TARGET));

    let _ = tracing_subscriber::registry()
        .with(console)
        .with(errors)
        .with(access)
        .with(dashboard)
        .try_init();

    Ok(())
}

/// Daily-rotated `<prefix>.log` in `dir`, keeping the last few files
pub fn rolling_file(dir: &Path, prefix: &str) -> anyhow::Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(KEEP_LOG_FILES)
        .build(dir)
        .with_context(|| format!("opening {prefix} log in {}", dir.display()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogChannel {
    /// One line per inbound request
    Access,
    /// Dashboard findings such as extreme earthquakes
    Dashboard,
}

/// Sink for structured dashboard events
pub trait EventLog: Send + Sync {
    fn record(&self, channel: LogChannel, event: &str);
}

/// Forwards events to `tracing` under a per-channel target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn record(&self, channel: LogChannel, event: &str) {
        match channel {
            LogChannel::Access => info!(target: ACCESS_TARGET, "{}", event),
            LogChannel::Dashboard => info!(target: DASHBOARD_TARGET, "{}", event),
        }
    }
}

#[cfg(test)]
pub use memory::MemoryEventLog;
