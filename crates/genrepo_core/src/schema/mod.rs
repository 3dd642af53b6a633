//! Storage-record metadata resolution.
//!
//! # Responsibility
//! - Declare the capability set a storage record must provide (`Record`).
//! - Turn declared table/column metadata into a validated `RecordDescriptor`.
//! - Cache descriptors per record type for the process lifetime.
//!
//! # Invariants
//! - Column order equals declaration order and is reused by every statement,
//!   so INSERT column lists and value lists always line up.
//! - Table and column names are plain SQL identifiers.
//! - A missing table name is a configuration error; resolution is never retried.

use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::Row;
use std::any::{type_name, TypeId};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

static DESCRIPTORS: Lazy<RwLock<HashMap<TypeId, Arc<RecordDescriptor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Storage class of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    /// `time::Date`, persisted as `YYYY-MM-DD` text.
    Date,
    /// Persisted as integer `0`/`1`.
    Boolean,
}

/// One declared column: name plus storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// Internal storage type whose fields map one-to-one onto table columns.
///
/// Metadata is declared on the type instead of being discovered at call time.
pub trait Record: Sized + 'static {
    /// Table backing this record. `None` means the declaration is missing,
    /// which `resolve` reports as a configuration error.
    const TABLE_NAME: Option<&'static str>;
    /// Every persisted field, in declaration order.
    const COLUMNS: &'static [ColumnDef];

    /// Field values in `COLUMNS` order.
    fn to_values(&self) -> Vec<Value>;

    /// Reads one record from a row that exposes every declared column by name.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Resolved, validated metadata for one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    record_name: &'static str,
    table_name: &'static str,
    columns: Vec<ColumnDef>,
}

impl RecordDescriptor {
    /// Unqualified name of the record type, used to label errors.
    pub fn record_name(&self) -> &'static str {
        self.record_name
    }

    pub fn table_name(&self) -> &'static str {
        self.table_name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|column| column.name)
    }

    /// Looks a column up by name, ignoring ASCII case like SQLite does.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }
}

/// Configuration error raised while resolving record metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    MissingTableName {
        record: &'static str,
    },
    InvalidIdentifier {
        record: &'static str,
        identifier: &'static str,
    },
    NoColumns {
        record: &'static str,
    },
    DuplicateColumn {
        record: &'static str,
        column: &'static str,
    },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTableName { record } => {
                write!(f, "could not get table name for `{record}`")
            }
            Self::InvalidIdentifier { record, identifier } => write!(
                f,
                "`{record}` declares `{identifier}`, which is not a plain SQL identifier"
            ),
            Self::NoColumns { record } => write!(f, "`{record}` declares no columns"),
            Self::DuplicateColumn { record, column } => {
                write!(f, "`{record}` declares column `{column}` more than once")
            }
        }
    }
}

impl Error for SchemaError {}

/// Resolves the descriptor for `R`, computing it on first use.
///
/// # Errors
/// - Returns `SchemaError` when the declared metadata is missing or malformed.
///   Failures are not cached; every call re-reports them.
pub fn resolve<R: Record>() -> Result<Arc<RecordDescriptor>, SchemaError> {
    let key = TypeId::of::<R>();
    if let Some(descriptor) = DESCRIPTORS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(Arc::clone(descriptor));
    }

    let record = type_name::<R>();
    let descriptor = match build_descriptor(record, R::TABLE_NAME, R::COLUMNS) {
        Ok(descriptor) => Arc::new(descriptor),
        Err(err) => {
            error!("event=schema_resolve module=schema status=error record={record} error={err}");
            return Err(err);
        }
    };

    let mut cache = DESCRIPTORS.write().unwrap_or_else(PoisonError::into_inner);
    let resolved = Arc::clone(cache.entry(key).or_insert(descriptor));
    debug!(
        "event=schema_resolve module=schema status=ok record={record} table={} columns={}",
        resolved.table_name,
        resolved.columns.len()
    );
    Ok(resolved)
}

fn build_descriptor(
    record: &'static str,
    table_name: Option<&'static str>,
    columns: &'static [ColumnDef],
) -> Result<RecordDescriptor, SchemaError> {
    let table_name = table_name.ok_or(SchemaError::MissingTableName { record })?;
    ensure_identifier(record, table_name)?;

    if columns.is_empty() {
        return Err(SchemaError::NoColumns { record });
    }

    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        ensure_identifier(record, column.name)?;
        if !seen.insert(column.name.to_ascii_lowercase()) {
            return Err(SchemaError::DuplicateColumn {
                record,
                column: column.name,
            });
        }
    }

    Ok(RecordDescriptor {
        record_name: short_type_name(record),
        table_name,
        columns: columns.to_vec(),
    })
}

/// `a::b::Tagged<c::D>` becomes `Tagged`.
fn short_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

fn ensure_identifier(record: &'static str, identifier: &'static str) -> Result<(), SchemaError> {
    if IDENTIFIER_RE.is_match(identifier) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier { record, identifier })
    }
}
