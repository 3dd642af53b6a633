//! Generic data-access core.
//!
//! Compiles typed predicates into SQL filters, builds CRUD statements from
//! declared record metadata and executes them inside an explicit
//! unit of work over SQLite.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod predicate;
pub mod repo;
pub mod schema;
pub mod service;
pub mod statement;
pub mod uow;

pub use config::{DbOptions, LogConfig, TransactionMode};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::entry::{Entry, EntryRecord};
pub use model::Model;
pub use predicate::{
    compile, CompareOp, Field, Filter, FilterMode, Literal, Predicate, PredicateError,
};
pub use repo::crud_repo::{CrudRepository, RepoError, RepoResult, SqliteRepository};
pub use schema::{resolve, ColumnDef, ColumnKind, Record, RecordDescriptor, SchemaError};
pub use service::crud_service::CrudService;
pub use statement::{Statement, StatementError};
pub use uow::{FailedStatement, Operation, UnitOfWork, UowState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
