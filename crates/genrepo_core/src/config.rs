//! Typed options for connection bootstrap, units of work and logging.
//!
//! # Responsibility
//! - Describe every tunable the core reads, with safe defaults.
//! - Stay format-agnostic: hosts deserialize these from whatever source they own.
//!
//! # Invariants
//! - Every field has a default, so partial documents decode.
//! - Connection strings and config-file discovery stay outside core.

use crate::logging::default_log_level;
use crate::predicate::FilterMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_LOG_FILES: usize = 5;

/// How a unit of work opens its transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Locks are taken lazily on first read/write.
    #[default]
    Deferred,
    /// Write lock is taken at `BEGIN`.
    Immediate,
    /// Exclusive lock is taken at `BEGIN`.
    Exclusive,
}

impl TransactionMode {
    /// SQL used to open the transaction.
    pub const fn begin_sql(self) -> &'static str {
        match self {
            Self::Deferred => "BEGIN DEFERRED;",
            Self::Immediate => "BEGIN IMMEDIATE;",
            Self::Exclusive => "BEGIN EXCLUSIVE;",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::Immediate => "immediate",
            Self::Exclusive => "exclusive",
        }
    }
}

/// Connection and unit-of-work options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbOptions {
    /// SQLite busy handler timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// Enables `PRAGMA foreign_keys` on every opened connection.
    pub foreign_keys: bool,
    /// Locking behavior of the transaction opened by `UnitOfWork::begin`.
    pub transaction_mode: TransactionMode,
    /// Rendering of WHERE-clause literals.
    pub filter_mode: FilterMode,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
            transaction_mode: TransactionMode::default(),
            filter_mode: FilterMode::default(),
        }
    }
}

impl DbOptions {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Logging bootstrap options.
///
/// `log_dir = None` routes records to stderr; otherwise rolling files are
/// written under the given absolute directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
    pub max_file_bytes: u64,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
            max_file_bytes: DEFAULT_MAX_LOG_FILE_BYTES,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DbOptions, LogConfig, TransactionMode};
    use crate::predicate::FilterMode;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn db_options_decode_partial_documents_with_defaults() {
        let options: DbOptions = serde_json::from_value(serde_json::json!({
            "transaction_mode": "immediate",
            "filter_mode": "inline"
        }))
        .unwrap();

        assert_eq!(options.transaction_mode, TransactionMode::Immediate);
        assert_eq!(options.filter_mode, FilterMode::Inline);
        assert!(options.foreign_keys);
        assert_eq!(options.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn db_options_default_to_bound_filters() {
        let options = DbOptions::default();
        assert_eq!(options.filter_mode, FilterMode::Bound);
        assert_eq!(options.transaction_mode.begin_sql(), "BEGIN DEFERRED;");
    }

    #[test]
    fn unknown_transaction_mode_is_rejected() {
        let err = serde_json::from_value::<DbOptions>(serde_json::json!({
            "transaction_mode": "eventually"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }

    #[test]
    fn log_config_decodes_directory() {
        let config: LogConfig = serde_json::from_value(serde_json::json!({
            "level": "warn",
            "log_dir": "/var/log/genrepo"
        }))
        .unwrap();

        assert_eq!(config.level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/genrepo")));
        assert_eq!(config.max_files, 5);
    }
}
