//! Diagnostics for the agent process.
//!
//! Answers go to stdout; everything traced goes to stderr or to the file
//! named by `--log-file`. [`init`] runs once, after the level is known.

use std::fs::OpenOptions;
use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Install the global subscriber.
///
/// `level` is a level name or any `EnvFilter` directive. When `prefer_level`
/// is set (a `-v` flag was given) it beats `RUST_LOG`; otherwise `RUST_LOG`
/// wins and `level` comes from the config file.
pub fn init(level: &str, prefer_level: bool, log_file: Option<&Path>) -> Result<(), AppError> {
    let filter = build_filter(level, prefer_level)?;
    let writer = make_writer(log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init()
        .map_err(|e| AppError::Logger(format!("subscriber already installed: {e}")))
}

fn build_filter(level: &str, prefer_level: bool) -> Result<EnvFilter, AppError> {
    let from_level = || EnvFilter::try_new(level).map_err(|e| e.to_string());
    let from_env = || EnvFilter::try_from_default_env().map_err(|e| e.to_string());

    let filter = if prefer_level {
        from_level().or_else(|_| from_env())
    } else {
        from_env().or_else(|_| from_level())
    };
    filter.map_err(|e| AppError::Logger(format!("no usable filter for level '{level}': {e}")))
}

/// Append to `log_file` when given, stderr otherwise.
fn make_writer(log_file: Option<&Path>) -> Result<BoxMakeWriter, AppError> {
    let Some(path) = log_file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    let file = OpenOptions::new().create(true).append(true).open(path).map_err(|e| {
        AppError::Logger(format!("cannot open log file {}: {e}", path.display()))
    })?;
    Ok(BoxMakeWriter::new(file))
}

/// `-v` count to level; `0` keeps the configured level.
pub fn level_for_verbosity(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    }
}
