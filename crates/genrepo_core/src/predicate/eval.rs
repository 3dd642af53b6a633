//! Native evaluation of a predicate against an in-memory record.

use super::ast::{CompareOp, Comparison, Literal, Node, Predicate};
use super::{PredicateError, LITERAL_KIND_MISMATCH};
use crate::schema::{ColumnDef, Record};
use rusqlite::types::Value;
use std::cmp::Ordering;

static NULL: Value = Value::Null;

impl<R: Record> Predicate<R> {
    /// Evaluates the predicate against an in-memory record.
    ///
    /// Follows SQL semantics for WHERE clauses: a comparison with a NULL
    /// operand is never satisfied, except through `IS [NOT] NULL`. Values of
    /// incomparable storage classes never match.
    pub fn matches(&self, record: &R) -> Result<bool, PredicateError> {
        let values = record.to_values();
        eval_node(self.node(), R::COLUMNS, &values)
    }
}

fn eval_node(
    node: &Node,
    columns: &[ColumnDef],
    values: &[Value],
) -> Result<bool, PredicateError> {
    match node {
        // Both sides are checked so errors surface regardless of short-circuiting.
        Node::And(left, right) => {
            let left = eval_node(left, columns, values)?;
            let right = eval_node(right, columns, values)?;
            Ok(left && right)
        }
        Node::Or(left, right) => {
            let left = eval_node(left, columns, values)?;
            let right = eval_node(right, columns, values)?;
            Ok(left || right)
        }
        Node::Compare(comparison) => eval_comparison(comparison, columns, values),
    }
}

fn eval_comparison(
    comparison: &Comparison,
    columns: &[ColumnDef],
    values: &[Value],
) -> Result<bool, PredicateError> {
    let (column, value) = columns
        .iter()
        .position(|column| column.name.eq_ignore_ascii_case(comparison.column))
        .map(|index| (&columns[index], values.get(index).unwrap_or(&NULL)))
        .ok_or(PredicateError::UnknownColumn {
            column: comparison.column,
        })?;
    if !comparison.value.fits(column.kind) {
        return Err(PredicateError::Unsupported {
            kind: LITERAL_KIND_MISMATCH,
        });
    }

    match (comparison.op, &comparison.value) {
        (CompareOp::Eq, Literal::Null) => Ok(matches!(value, Value::Null)),
        (CompareOp::Ne, Literal::Null) => Ok(!matches!(value, Value::Null)),
        (CompareOp::Lt | CompareOp::Gt, Literal::Null) => Err(PredicateError::Unsupported {
            kind: "ordering comparison against NULL",
        }),
        (op, literal) => {
            let Some(ordering) = compare(value, &literal.to_value()) else {
                return Ok(false);
            };
            Ok(match op {
                CompareOp::Eq => ordering == Ordering::Equal,
                CompareOp::Ne => ordering != Ordering::Equal,
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Gt => ordering == Ordering::Greater,
            })
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Integer(a), Value::Real(b)) => (*a as f64).partial_cmp(b),
        (Value::Real(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
        (Value::Blob(a), Value::Blob(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::model::entry::EntryRecord;
    use crate::predicate::{Field, PredicateError};
    use time::macros::date;

    fn record(id: i64, description: Option<&str>) -> EntryRecord {
        EntryRecord {
            id,
            description: description.map(str::to_string),
            date: date!(2024 - 03 - 15),
        }
    }

    #[test]
    fn comparisons_follow_column_values() {
        let row = record(5, Some("b"));
        assert!(EntryRecord::ID.eq(5).matches(&row).unwrap());
        assert!(EntryRecord::ID.gt(4).matches(&row).unwrap());
        assert!(!EntryRecord::ID.lt(5).matches(&row).unwrap());
        assert!(EntryRecord::DESCRIPTION.gt("a").matches(&row).unwrap());
        assert!(EntryRecord::DATE.lt(date!(2024 - 04 - 01)).matches(&row).unwrap());
    }

    #[test]
    fn null_values_only_match_null_checks() {
        let row = record(1, None);
        assert!(EntryRecord::DESCRIPTION.is_null().matches(&row).unwrap());
        assert!(!EntryRecord::DESCRIPTION.is_not_null().matches(&row).unwrap());
        assert!(!EntryRecord::DESCRIPTION.eq("a").matches(&row).unwrap());
        assert!(!EntryRecord::DESCRIPTION.ne("a").matches(&row).unwrap());
    }

    #[test]
    fn connectives_combine_results() {
        let row = record(2, Some("x"));
        let hit = EntryRecord::ID.eq(2) & EntryRecord::DESCRIPTION.eq("x");
        let miss = EntryRecord::ID.eq(3) | EntryRecord::DESCRIPTION.eq("y");
        assert!(hit.matches(&row).unwrap());
        assert!(!miss.matches(&row).unwrap());
    }

    #[test]
    fn undeclared_column_is_an_error() {
        let row = record(1, None);
        let predicate = EntryRecord::ID.eq(1) | Field::<EntryRecord>::new("NOPE").eq(1);
        assert_eq!(
            predicate.matches(&row).unwrap_err(),
            PredicateError::UnknownColumn { column: "NOPE" }
        );
    }

    #[test]
    fn literal_of_the_wrong_kind_is_an_error() {
        let row = record(1, Some("1"));
        let expected = PredicateError::Unsupported {
            kind: "literal type does not match column",
        };
        assert_eq!(EntryRecord::ID.eq("1").matches(&row).unwrap_err(), expected);
        assert_eq!(
            EntryRecord::DESCRIPTION.eq(1).matches(&row).unwrap_err(),
            expected
        );
        let nested = EntryRecord::ID.eq(1) | EntryRecord::DATE.lt(20240101);
        assert_eq!(nested.matches(&row).unwrap_err(), expected);
    }

    #[test]
    fn reals_compare_against_integer_columns() {
        let row = record(3, None);
        assert!(EntryRecord::ID.gt(2.5).matches(&row).unwrap());
        assert!(!EntryRecord::ID.eq(3.5).matches(&row).unwrap());
    }
}
