//! `Entry` sample model and its `ENTRIES` storage record.

use crate::model::Model;
use crate::predicate::Field;
use crate::schema::{ColumnDef, ColumnKind, Record};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use time::Date;

/// Storage record for the `ENTRIES` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub id: i64,
    pub description: Option<String>,
    pub date: Date,
}

impl EntryRecord {
    pub const ID: Field<Self> = Field::new("ID");
    pub const DESCRIPTION: Field<Self> = Field::new("DESCRIPTION");
    pub const DATE: Field<Self> = Field::new("DATE");

    /// Table definition matching `COLUMNS`, for demos and tests.
    pub const CREATE_TABLE_SQL: &'static str = "CREATE TABLE IF NOT EXISTS ENTRIES (
        ID INTEGER PRIMARY KEY,
        DESCRIPTION TEXT NULL,
        DATE TEXT NOT NULL
    );";
}

impl Record for EntryRecord {
    const TABLE_NAME: Option<&'static str> = Some("ENTRIES");
    const COLUMNS: &'static [ColumnDef] = &[
        ColumnDef::new("ID", ColumnKind::Integer),
        ColumnDef::new("DESCRIPTION", ColumnKind::Text),
        ColumnDef::new("DATE", ColumnKind::Date),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            self.description.clone().map_or(Value::Null, Value::Text),
            Value::Text(self.date.to_string()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("ID")?,
            description: row.get("DESCRIPTION")?,
            date: row.get("DATE")?,
        })
    }
}

/// Caller-facing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    pub description: Option<String>,
    pub date: Date,
}

impl Model for Entry {
    type Record = EntryRecord;

    fn to_record(&self) -> EntryRecord {
        EntryRecord {
            id: self.id,
            description: self.description.clone(),
            date: self.date,
        }
    }

    fn from_record(record: EntryRecord) -> Self {
        Self {
            id: record.id,
            description: record.description,
            date: record.date,
        }
    }
}
