//! CRUD statement construction.
//!
//! # Responsibility
//! - Combine a `RecordDescriptor` and a compiled `Filter` into executable
//!   SELECT/INSERT/UPDATE/DELETE text.
//! - Bind record field values as `@column` named parameters.
//!
//! # Invariants
//! - Column lists, SET lists and value lists follow descriptor order.
//! - `params` are ordered by SQLite binding index: named column parameters
//!   first (first-occurrence order), then the filter's `?` placeholders.
//! - A filter is appended as ` WHERE <filter>` only when it is non-empty.

use crate::predicate::Filter;
use crate::schema::RecordDescriptor;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// SQL text plus its positional parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    /// Wraps hand-written SQL; `params` must follow binding-index order.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// Record supplied a different number of values than declared columns.
    ArityMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl Display for StatementError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArityMismatch {
                table,
                expected,
                actual,
            } => write!(
                f,
                "`{table}` declares {expected} columns but the record supplied {actual} values"
            ),
        }
    }
}

impl Error for StatementError {}

/// `SELECT * FROM <table> [WHERE <filter>]`
pub fn select(descriptor: &RecordDescriptor, filter: &Filter) -> Statement {
    let sql = format!("SELECT * FROM {}", descriptor.table_name());
    filtered(sql, Vec::new(), filter)
}

/// `INSERT INTO <table> (<c1>, ...) VALUES (@c1, ...)`
pub fn insert(
    descriptor: &RecordDescriptor,
    values: Vec<Value>,
) -> Result<Statement, StatementError> {
    ensure_arity(descriptor, &values)?;

    let columns = descriptor.column_names().collect::<Vec<_>>().join(", ");
    let placeholders = descriptor
        .column_names()
        .map(|name| format!("@{name}"))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            descriptor.table_name()
        ),
        params: values,
    })
}

/// `UPDATE <table> SET <c1> = @c1, ... [WHERE <filter>]`
///
/// An empty filter updates every row; repositories always pass one.
pub fn update(
    descriptor: &RecordDescriptor,
    values: Vec<Value>,
    filter: &Filter,
) -> Result<Statement, StatementError> {
    ensure_arity(descriptor, &values)?;

    let assignments = descriptor
        .column_names()
        .map(|name| format!("{name} = @{name}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {assignments}", descriptor.table_name());

    Ok(filtered(sql, values, filter))
}

/// `DELETE FROM <table> [WHERE <filter>]`
pub fn delete(descriptor: &RecordDescriptor, filter: &Filter) -> Statement {
    let sql = format!("DELETE FROM {}", descriptor.table_name());
    filtered(sql, Vec::new(), filter)
}

fn filtered(mut sql: String, mut params: Vec<Value>, filter: &Filter) -> Statement {
    if !filter.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(filter.sql());
        params.extend_from_slice(filter.params());
    }
    Statement { sql, params }
}

fn ensure_arity(descriptor: &RecordDescriptor, values: &[Value]) -> Result<(), StatementError> {
    let expected = descriptor.columns().len();
    if values.len() == expected {
        Ok(())
    } else {
        Err(StatementError::ArityMismatch {
            table: descriptor.table_name(),
            expected,
            actual: values.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{delete, insert, select, update, StatementError};
    use crate::model::entry::EntryRecord;
    use crate::predicate::{compile, Filter, FilterMode, Predicate};
    use crate::schema::{resolve, Record, RecordDescriptor};
    use rusqlite::types::Value;
    use std::sync::Arc;
    use time::macros::date;

    fn descriptor() -> Arc<RecordDescriptor> {
        resolve::<EntryRecord>().unwrap()
    }

    fn filter(predicate: &Predicate<EntryRecord>, mode: FilterMode) -> Filter {
        compile(Some(predicate), &descriptor(), mode).unwrap()
    }

    fn sample() -> EntryRecord {
        EntryRecord {
            id: 7,
            description: Some("seven".to_string()),
            date: date!(2024 - 01 - 01),
        }
    }

    #[test]
    fn select_without_filter_has_no_where_clause() {
        let statement = select(&descriptor(), &Filter::default());
        assert_eq!(statement.sql(), "SELECT * FROM ENTRIES");
        assert!(statement.params().is_empty());
    }

    #[test]
    fn select_appends_compiled_filter() {
        let statement = select(
            &descriptor(),
            &filter(&EntryRecord::ID.eq(1), FilterMode::Inline),
        );
        assert_eq!(statement.sql(), "SELECT * FROM ENTRIES WHERE ID = '1'");
    }

    #[test]
    fn insert_lists_columns_and_named_parameters_in_order() {
        let statement = insert(&descriptor(), sample().to_values()).unwrap();
        assert_eq!(
            statement.sql(),
            "INSERT INTO ENTRIES (ID, DESCRIPTION, DATE) VALUES (@ID, @DESCRIPTION, @DATE)"
        );
        assert_eq!(
            statement.params(),
            &[
                Value::Integer(7),
                Value::Text("seven".to_string()),
                Value::Text("2024-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn update_binds_row_values_before_filter_values() {
        let statement = update(
            &descriptor(),
            sample().to_values(),
            &filter(&EntryRecord::ID.eq(7), FilterMode::Bound),
        )
        .unwrap();

        assert_eq!(
            statement.sql(),
            "UPDATE ENTRIES SET ID = @ID, DESCRIPTION = @DESCRIPTION, DATE = @DATE WHERE ID = ?"
        );
        assert_eq!(statement.params().len(), 4);
        assert_eq!(statement.params()[3], Value::Integer(7));
    }

    #[test]
    fn delete_appends_compiled_filter() {
        let statement = delete(
            &descriptor(),
            &filter(&EntryRecord::DESCRIPTION.is_null(), FilterMode::Bound),
        );
        assert_eq!(statement.sql(), "DELETE FROM ENTRIES WHERE DESCRIPTION IS NULL");
    }

    #[test]
    fn value_count_must_match_column_count() {
        let err = insert(&descriptor(), vec![Value::Integer(1)]).unwrap_err();
        assert_eq!(
            err,
            StatementError::ArityMismatch {
                table: "ENTRIES",
                expected: 3,
                actual: 1,
            }
        );
    }
}
