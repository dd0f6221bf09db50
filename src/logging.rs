//! Logging configuration using tracing

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{GraphError, Result};

/// Environment variable holding the log filter, e.g. `BRAILLEGRAPH_LOG=trace`.
pub const LOG_ENV: &str = "BRAILLEGRAPH_LOG";

const DEFAULT_FILTER: &str = "braillegraph=info";

/// Sends log output to `path`. The terminal belongs to the UI, so nothing
/// is ever written to stdout or stderr.
pub fn init(path: &Path) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| GraphError::invalid_config(format!("log path {path:?} has no file name")))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| GraphError::invalid_config(format!("cannot install logger: {e}")))?;

    tracing::info!(log = %path.display(), "braillegraph starting");
    Ok(())
}
