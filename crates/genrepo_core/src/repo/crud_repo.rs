//! CRUD repository contract, SQLite implementation and the error type shared
//! by the data-access layer.

use crate::db::DbError;
use crate::model::Model;
use crate::predicate::{compile, Predicate, PredicateError};
use crate::schema::{resolve, Record, SchemaError};
use crate::statement::{self, StatementError};
use crate::uow::{FailedStatement, Operation, UnitOfWork, UowState};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Data-access error.
#[derive(Debug)]
pub enum RepoError {
    /// Record metadata is missing or malformed.
    Configuration(SchemaError),
    /// Predicate cannot be rendered for the record.
    UnsupportedPredicate(PredicateError),
    Statement(StatementError),
    /// Statement failed while running; the driver error is kept as `source`.
    Execution {
        operation: Operation,
        /// Record type the statement was issued for.
        entity: &'static str,
        source: Arc<rusqlite::Error>,
    },
    /// Unit of work no longer accepts commands.
    NotOpen {
        state: UowState,
        operation: &'static str,
    },
    /// Commit refused because a statement failed earlier; rolled back.
    CommitAborted(FailedStatement),
    /// `COMMIT` failed; rolled back.
    Commit(DbError),
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "configuration error: {err}"),
            Self::UnsupportedPredicate(err) => write!(f, "{err}"),
            Self::Statement(err) => write!(f, "{err}"),
            Self::Execution {
                operation,
                entity,
                source,
            } => {
                let (verb, noun) = operation.describe();
                write!(f, "could not {verb} `{entity}` {noun}: {source}")
            }
            Self::NotOpen { state, operation } => {
                write!(f, "unit of work is {state}; cannot run `{operation}`")
            }
            Self::CommitAborted(failed) => {
                write!(f, "commit aborted and rolled back after failed statement: {failed}")
            }
            Self::Commit(err) => write!(f, "commit failed and was rolled back: {err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::UnsupportedPredicate(err) => Some(err),
            Self::Statement(err) => Some(err),
            Self::Execution { source, .. } => Some(source.as_ref()),
            Self::CommitAborted(failed) => Some(failed.source.as_ref()),
            Self::Commit(err) | Self::Db(err) => Some(err),
            Self::NotOpen { .. } => None,
        }
    }
}

impl From<SchemaError> for RepoError {
    fn from(value: SchemaError) -> Self {
        Self::Configuration(value)
    }
}

impl From<PredicateError> for RepoError {
    fn from(value: PredicateError) -> Self {
        Self::UnsupportedPredicate(value)
    }
}

impl From<StatementError> for RepoError {
    fn from(value: StatementError) -> Self {
        Self::Statement(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Repository interface for one model type.
pub trait CrudRepository<M: Model> {
    fn get_all(&mut self, predicate: Option<&Predicate<M::Record>>) -> RepoResult<Vec<M>>;
    /// First matching model, or `None` when nothing matches.
    fn get(&mut self, predicate: Option<&Predicate<M::Record>>) -> RepoResult<Option<M>>;
    fn create(&mut self, model: &M) -> RepoResult<usize>;
    fn update(&mut self, model: &M, predicate: &Predicate<M::Record>) -> RepoResult<usize>;
    fn delete(&mut self, predicate: &Predicate<M::Record>) -> RepoResult<usize>;
}

/// SQLite-backed repository executing through a borrowed unit of work.
pub struct SqliteRepository<'uow, M> {
    uow: &'uow mut UnitOfWork,
    _model: PhantomData<fn() -> M>,
}

impl<'uow, M: Model> SqliteRepository<'uow, M> {
    pub fn new(uow: &'uow mut UnitOfWork) -> Self {
        Self {
            uow,
            _model: PhantomData,
        }
    }

    fn select(
        &mut self,
        operation: Operation,
        predicate: Option<&Predicate<M::Record>>,
    ) -> RepoResult<Vec<M>> {
        let started_at = Instant::now();
        let descriptor = resolve::<M::Record>()?;
        let filter = compile(predicate, &descriptor, self.uow.filter_mode())?;
        let statement = statement::select(&descriptor, &filter);

        let records =
            self.uow
                .query::<M::Record>(operation, descriptor.record_name(), &statement)?;
        debug!(
            "event=repo_{operation} module=repo status=ok uow_id={} entity={} rows={} duration_ms={}",
            self.uow.id(),
            descriptor.record_name(),
            records.len(),
            started_at.elapsed().as_millis()
        );

        Ok(records.into_iter().map(M::from_record).collect())
    }

    fn log_mutation(&self, operation: Operation, entity: &str, rows: usize, started_at: Instant) {
        debug!(
            "event=repo_{operation} module=repo status=ok uow_id={} entity={entity} rows={rows} duration_ms={}",
            self.uow.id(),
            started_at.elapsed().as_millis()
        );
    }
}

impl<M: Model> CrudRepository<M> for SqliteRepository<'_, M> {
    fn get_all(&mut self, predicate: Option<&Predicate<M::Record>>) -> RepoResult<Vec<M>> {
        self.select(Operation::GetAll, predicate)
    }

    fn get(&mut self, predicate: Option<&Predicate<M::Record>>) -> RepoResult<Option<M>> {
        Ok(self.select(Operation::Get, predicate)?.into_iter().next())
    }

    fn create(&mut self, model: &M) -> RepoResult<usize> {
        let started_at = Instant::now();
        let descriptor = resolve::<M::Record>()?;
        let statement = statement::insert(&descriptor, model.to_record().to_values())?;

        let rows = self
            .uow
            .execute(Operation::Create, descriptor.record_name(), &statement)?;
        self.log_mutation(Operation::Create, descriptor.record_name(), rows, started_at);
        Ok(rows)
    }

    fn update(&mut self, model: &M, predicate: &Predicate<M::Record>) -> RepoResult<usize> {
        let started_at = Instant::now();
        let descriptor = resolve::<M::Record>()?;
        let filter = compile(Some(predicate), &descriptor, self.uow.filter_mode())?;
        let statement = statement::update(&descriptor, model.to_record().to_values(), &filter)?;

        let rows = self
            .uow
            .execute(Operation::Update, descriptor.record_name(), &statement)?;
        self.log_mutation(Operation::Update, descriptor.record_name(), rows, started_at);
        Ok(rows)
    }

    fn delete(&mut self, predicate: &Predicate<M::Record>) -> RepoResult<usize> {
        let started_at = Instant::now();
        let descriptor = resolve::<M::Record>()?;
        let filter = compile(Some(predicate), &descriptor, self.uow.filter_mode())?;
        let statement = statement::delete(&descriptor, &filter);

        let rows = self
            .uow
            .execute(Operation::Delete, descriptor.record_name(), &statement)?;
        self.log_mutation(Operation::Delete, descriptor.record_name(), rows, started_at);
        Ok(rows)
    }
}
