//! SQLite connection bootstrap.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for units of work.
//! - Apply the connection pragmas named by `DbOptions`.
//!
//! # Invariants
//! - Returned connections are in autocommit mode; transactions are owned by
//!   `UnitOfWork`, never by this module.
//! - Requested pragmas are verified after being set.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    PragmaMismatch {
        pragma: &'static str,
        expected: i64,
        actual: i64,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::PragmaMismatch {
                pragma,
                expected,
                actual,
            } => write!(
                f,
                "pragma `{pragma}` reads back {actual} after being set to {expected}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::PragmaMismatch { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
