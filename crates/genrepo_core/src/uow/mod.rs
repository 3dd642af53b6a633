//! Transactional unit of work over one SQLite connection.
//!
//! # Responsibility
//! - Own exactly one connection and the one transaction opened on it.
//! - Execute every repository statement inside that transaction.
//! - Govern commit, rollback and release of the connection.
//!
//! # Invariants
//! - Statements only execute in `UowState::Open`.
//! - Nothing persists without an explicit `commit()`.
//! - A statement failure poisons the unit: the next `commit()` rolls back.
//! - `dispose()` releases the connection at most once; `Drop` calls it.
//! - One instance serves one caller; `&mut self` receivers enforce that.

use crate::config::DbOptions;
use crate::db::DbError;
use crate::model::Model;
use crate::predicate::FilterMode;
use crate::repo::crud_repo::{RepoError, RepoResult, SqliteRepository};
use crate::schema::Record;
use crate::statement::Statement;
use log::{debug, error, info, warn};
use rusqlite::{params_from_iter, Connection};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Lifecycle state of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UowState {
    Open,
    Committed,
    RolledBack,
    Disposed,
}

impl UowState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
            Self::Disposed => "disposed",
        }
    }
}

impl Display for UowState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository operation, used for error context and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetAll,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetAll => "get_all",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Verb and noun used in execution error messages.
    pub(crate) const fn describe(self) -> (&'static str, &'static str) {
        match self {
            Self::GetAll => ("list", "records"),
            Self::Get => ("get", "record"),
            Self::Create => ("create", "record"),
            Self::Update => ("update", "records"),
            Self::Delete => ("delete", "records"),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First statement failure observed inside a unit of work.
///
/// The driver error is shared with the `RepoError::Execution` returned to the
/// caller, so a later aborted commit still exposes it through `source()`.
#[derive(Debug, Clone)]
pub struct FailedStatement {
    pub operation: Operation,
    /// Record type the statement was issued for.
    pub entity: &'static str,
    pub source: Arc<rusqlite::Error>,
}

impl Display for FailedStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} on `{}` failed: {}",
            self.operation, self.entity, self.source
        )
    }
}

/// One transactional session bounding a set of repository operations.
pub struct UnitOfWork {
    id: Uuid,
    conn: Option<Connection>,
    state: UowState,
    failure: Option<FailedStatement>,
    filter_mode: FilterMode,
    started_at: Instant,
}

impl UnitOfWork {
    /// Takes ownership of `conn` and opens a transaction on it.
    ///
    /// # Errors
    /// - Returns `RepoError::Db` when `BEGIN` fails; the connection is dropped.
    pub fn begin(conn: Connection, options: &DbOptions) -> RepoResult<Self> {
        let id = Uuid::new_v4();
        let mode = options.transaction_mode;

        if let Err(err) = conn.execute_batch(mode.begin_sql()) {
            error!(
                "event=uow_begin module=uow status=error uow_id={id} mode={} error={err}",
                mode.as_str()
            );
            return Err(RepoError::Db(DbError::Sqlite(err)));
        }

        info!(
            "event=uow_begin module=uow status=ok uow_id={id} mode={} filter_mode={:?}",
            mode.as_str(),
            options.filter_mode
        );

        Ok(Self {
            id,
            conn: Some(conn),
            state: UowState::Open,
            failure: None,
            filter_mode: options.filter_mode,
            started_at: Instant::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> UowState {
        self.state
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    /// First statement failure recorded since `begin`, if any.
    pub fn failure(&self) -> Option<&FailedStatement> {
        self.failure.as_ref()
    }

    /// Repository for `M` that executes through this unit of work.
    pub fn repository<M: Model>(&mut self) -> SqliteRepository<'_, M> {
        SqliteRepository::new(self)
    }

    /// Runs a mutating statement and returns the affected row count.
    pub fn execute(
        &mut self,
        operation: Operation,
        entity: &'static str,
        statement: &Statement,
    ) -> RepoResult<usize> {
        let conn = self.open_connection(operation.as_str())?;
        let result = run_execute(conn, statement);
        self.observe(operation, entity, result)
    }

    /// Runs a query and maps every returned row to `R`.
    pub fn query<R: Record>(
        &mut self,
        operation: Operation,
        entity: &'static str,
        statement: &Statement,
    ) -> RepoResult<Vec<R>> {
        let conn = self.open_connection(operation.as_str())?;
        let result = run_query(conn, statement);
        self.observe(operation, entity, result)
    }

    /// Commits the transaction.
    ///
    /// When a statement already failed in this unit, or `COMMIT` itself fails,
    /// the transaction is rolled back and the failure is returned. Either way
    /// the unit leaves `Open` for good.
    pub fn commit(&mut self) -> RepoResult<()> {
        let Some(conn) = self.conn.as_ref().filter(|_| self.state == UowState::Open) else {
            return Err(RepoError::NotOpen {
                state: self.state,
                operation: "commit",
            });
        };

        if let Some(failure) = self.failure.take() {
            rollback_quietly(self.id, conn);
            self.state = UowState::RolledBack;
            warn!(
                "event=uow_commit module=uow status=aborted uow_id={} failed_operation={} entity={}",
                self.id, failure.operation, failure.entity
            );
            return Err(RepoError::CommitAborted(failure));
        }

        match conn.execute_batch("COMMIT;") {
            Ok(()) => {
                self.state = UowState::Committed;
                info!(
                    "event=uow_commit module=uow status=ok uow_id={} duration_ms={}",
                    self.id,
                    self.started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                rollback_quietly(self.id, conn);
                self.state = UowState::RolledBack;
                error!(
                    "event=uow_commit module=uow status=error uow_id={} error={err}",
                    self.id
                );
                Err(RepoError::Commit(DbError::Sqlite(err)))
            }
        }
    }

    /// Abandons the transaction without committing.
    pub fn rollback(&mut self) -> RepoResult<()> {
        let conn = self.open_connection("rollback")?;
        let result = conn.execute_batch("ROLLBACK;");
        self.state = UowState::RolledBack;

        match result {
            Ok(()) => {
                info!("event=uow_rollback module=uow status=ok uow_id={}", self.id);
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=uow_rollback module=uow status=error uow_id={} error={err}",
                    self.id
                );
                Err(RepoError::Db(DbError::Sqlite(err)))
            }
        }
    }

    /// Releases the transaction and connection. Safe to call repeatedly.
    ///
    /// An uncommitted transaction is rolled back first.
    pub fn dispose(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        let previous = self.state;
        if previous == UowState::Open {
            rollback_quietly(self.id, &conn);
        }
        self.state = UowState::Disposed;

        if let Err((_conn, err)) = conn.close() {
            warn!(
                "event=uow_dispose module=uow status=error uow_id={} error={err}",
                self.id
            );
            return;
        }

        info!(
            "event=uow_dispose module=uow status=ok uow_id={} previous_state={previous}",
            self.id
        );
    }

    fn open_connection(&self, operation: &'static str) -> RepoResult<&Connection> {
        match (&self.conn, self.state) {
            (Some(conn), UowState::Open) => Ok(conn),
            _ => Err(RepoError::NotOpen {
                state: self.state,
                operation,
            }),
        }
    }

    fn observe<T>(
        &mut self,
        operation: Operation,
        entity: &'static str,
        result: rusqlite::Result<T>,
    ) -> RepoResult<T> {
        match result {
            Ok(value) => {
                debug!(
                    "event=statement module=uow status=ok uow_id={} operation={operation} entity={entity}",
                    self.id
                );
                Ok(value)
            }
            Err(source) => {
                warn!(
                    "event=statement module=uow status=error uow_id={} operation={operation} entity={entity} error={source}",
                    self.id
                );
                let source = Arc::new(source);
                if self.failure.is_none() {
                    self.failure = Some(FailedStatement {
                        operation,
                        entity,
                        source: Arc::clone(&source),
                    });
                }
                Err(RepoError::Execution {
                    operation,
                    entity,
                    source,
                })
            }
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn run_execute(conn: &Connection, statement: &Statement) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(statement.sql())?;
    stmt.execute(params_from_iter(statement.params()))
}

fn run_query<R: Record>(conn: &Connection, statement: &Statement) -> rusqlite::Result<Vec<R>> {
    let mut stmt = conn.prepare(statement.sql())?;
    let mut rows = stmt.query(params_from_iter(statement.params()))?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        records.push(R::from_row(row)?);
    }

    Ok(records)
}

// SQLite may already have ended the transaction (e.g. on SQLITE_FULL).
fn rollback_quietly(id: Uuid, conn: &Connection) {
    if conn.is_autocommit() {
        return;
    }
    if let Err(err) = conn.execute_batch("ROLLBACK;") {
        error!("event=uow_rollback module=uow status=error uow_id={id} error={err}");
    }
}

#[cfg(test)]
mod tests {
    use super::{Operation, UnitOfWork, UowState};
    use crate::config::DbOptions;
    use crate::db::open_db_in_memory;
    use crate::repo::crud_repo::RepoError;
    use crate::statement::Statement;

    fn begin() -> UnitOfWork {
        let options = DbOptions::default();
        let conn = open_db_in_memory(&options).unwrap();
        conn.execute_batch("CREATE TABLE T (ID INTEGER PRIMARY KEY);")
            .unwrap();
        UnitOfWork::begin(conn, &options).unwrap()
    }

    fn raw(sql: &str) -> Statement {
        Statement::new(sql, Vec::new())
    }

    #[test]
    fn begin_opens_transaction() {
        let uow = begin();
        assert_eq!(uow.state(), UowState::Open);
        assert!(uow.failure().is_none());
    }

    #[test]
    fn commit_moves_to_committed_and_rejects_further_work() {
        let mut uow = begin();
        let rows = uow
            .execute(Operation::Create, "T", &raw("INSERT INTO T (ID) VALUES (1)"))
            .unwrap();
        assert_eq!(rows, 1);

        uow.commit().unwrap();
        assert_eq!(uow.state(), UowState::Committed);

        let err = uow
            .execute(Operation::Create, "T", &raw("INSERT INTO T (ID) VALUES (2)"))
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::NotOpen {
                state: UowState::Committed,
                operation: "create"
            }
        ));
        assert!(matches!(uow.commit(), Err(RepoError::NotOpen { .. })));
    }

    #[test]
    fn failed_statement_poisons_commit() {
        let mut uow = begin();
        uow.execute(Operation::Create, "T", &raw("INSERT INTO T (ID) VALUES (1)"))
            .unwrap();
        let err = uow
            .execute(Operation::Create, "T", &raw("INSERT INTO T (ID) VALUES (1)"))
            .unwrap_err();
        assert!(matches!(err, RepoError::Execution { operation: Operation::Create, .. }));
        assert_eq!(uow.failure().map(|f| f.operation), Some(Operation::Create));

        let err = uow.commit().unwrap_err();
        assert!(matches!(err, RepoError::CommitAborted(ref failed) if failed.entity == "T"));
        let cause = std::error::Error::source(&err).unwrap();
        assert!(cause.to_string().contains("UNIQUE"));
        assert_eq!(uow.state(), UowState::RolledBack);
    }

    #[test]
    fn explicit_rollback_ends_the_unit() {
        let mut uow = begin();
        uow.rollback().unwrap();
        assert_eq!(uow.state(), UowState::RolledBack);
        assert!(matches!(uow.rollback(), Err(RepoError::NotOpen { .. })));
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut uow = begin();
        uow.dispose();
        assert_eq!(uow.state(), UowState::Disposed);
        uow.dispose();
        assert_eq!(uow.state(), UowState::Disposed);
        assert!(matches!(uow.commit(), Err(RepoError::NotOpen { .. })));
    }
}
