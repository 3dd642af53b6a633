//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend behind the `log` facade exactly once.
//! - Route records to rolling files or stderr according to `LogConfig`.
//!
//! # Invariants
//! - Re-initialization with an identical level and target is a no-op.
//! - Re-initialization with a different level or target is rejected.
//! - Core log events carry metadata only: never literal values, row data or
//!   bound parameters.

use crate::config::LogConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::info;
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "genrepo";

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

/// Destination of log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    Directory(PathBuf),
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    RelativeLogDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    AlreadyInitialized {
        active: String,
        requested: String,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(dir) => {
                write!(f, "log_dir must be an absolute path, got `{}`", dir.display())
            }
            Self::CreateDir { dir, source } => write!(
                f,
                "failed to create log directory `{}`: {source}",
                dir.display()
            ),
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyInitialized { active, requested } => write!(
                f,
                "logging already initialized as `{active}`; refusing to switch to `{requested}`"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::UnsupportedLevel(_)
            | Self::RelativeLogDir(_)
            | Self::AlreadyInitialized { .. } => None,
        }
    }
}

struct LoggingState {
    level: &'static str,
    target: LogTarget,
    _handle: LoggerHandle,
}

impl LoggingState {
    fn describe(level: &str, target: &LogTarget) -> String {
        format!("{level}@{target}")
    }
}

/// Starts process logging.
///
/// # Errors
/// - Level is not one of trace|debug|info|warn|error.
/// - `log_dir` is relative or cannot be created.
/// - The backend fails to start.
/// - Logging is already active with a different level or target.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let level = normalize_level(&config.level)?;
    let target = match &config.log_dir {
        Some(dir) => LogTarget::Directory(normalize_log_dir(dir)?),
        None => LogTarget::Stderr,
    };

    let state = LOGGING_STATE.get_or_try_init(|| start_backend(level, &target, config))?;

    if state.level != level || state.target != target {
        return Err(LoggingError::AlreadyInitialized {
            active: LoggingState::describe(state.level, &state.target),
            requested: LoggingState::describe(level, &target),
        });
    }

    Ok(())
}

/// Active `(level, target)`, or `None` before `init_logging` succeeds.
pub fn logging_status() -> Option<(&'static str, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_backend(
    level: &'static str,
    target: &LogTarget,
    config: &LogConfig,
) -> Result<LoggingState, LoggingError> {
    let logger = Logger::try_with_str(level).map_err(LoggingError::Backend)?;

    let logger = match target {
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                dir: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(config.max_file_bytes),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(config.max_files),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };

    let handle = logger.start().map_err(LoggingError::Backend)?;

    info!(
        "event=logging_init module=logging status=ok level={level} target={target} version={}",
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        level,
        target: target.clone(),
        _handle: handle,
    })
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn normalize_log_dir(dir: &Path) -> Result<PathBuf, LoggingError> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Err(LoggingError::RelativeLogDir(dir.to_path_buf()))
    }
}
