//! WHERE-clause rendering of a predicate against a resolved descriptor.

use super::ast::{CompareOp, Comparison, Literal, Node, Predicate};
use super::{PredicateError, LITERAL_KIND_MISMATCH};
use crate::schema::{Record, RecordDescriptor};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Rendering of WHERE-clause literals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Literals become anonymous `?` placeholders bound at execution.
    #[default]
    Bound,
    /// Literals are embedded as SQL text (`= 'value'`), quotes doubled.
    Inline,
}

/// Compiled filter: WHERE-clause body (without the `WHERE` keyword) and the
/// values for its placeholders, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    sql: String,
    params: Vec<Value>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Compiles an optional predicate into a filter for `descriptor`.
///
/// An absent predicate yields an empty filter. Column names are emitted in
/// their declared spelling.
///
/// # Errors
/// - `UnknownColumn` when a comparison names an undeclared column.
/// - `Unsupported` for ordering comparisons against NULL and non-finite reals.
pub fn compile<R: Record>(
    predicate: Option<&Predicate<R>>,
    descriptor: &RecordDescriptor,
    mode: FilterMode,
) -> Result<Filter, PredicateError> {
    let Some(predicate) = predicate else {
        return Ok(Filter::default());
    };

    let mut compiler = Compiler {
        descriptor,
        mode,
        filter: Filter::default(),
    };
    compiler.node(predicate.node())?;
    Ok(compiler.filter)
}

struct Compiler<'a> {
    descriptor: &'a RecordDescriptor,
    mode: FilterMode,
    filter: Filter,
}

impl Compiler<'_> {
    fn node(&mut self, node: &Node) -> Result<(), PredicateError> {
        match node {
            Node::And(left, right) => {
                self.and_operand(left)?;
                self.filter.sql.push_str(" AND ");
                self.and_operand(right)
            }
            Node::Or(left, right) => {
                self.node(left)?;
                self.filter.sql.push_str(" OR ");
                self.node(right)
            }
            Node::Compare(comparison) => self.comparison(comparison),
        }
    }

    // AND binds tighter than OR, so only an OR under an AND needs grouping.
    fn and_operand(&mut self, node: &Node) -> Result<(), PredicateError> {
        if matches!(node, Node::Or(..)) {
            self.filter.sql.push('(');
            self.node(node)?;
            self.filter.sql.push(')');
            Ok(())
        } else {
            self.node(node)
        }
    }

    fn comparison(&mut self, comparison: &Comparison) -> Result<(), PredicateError> {
        let column = self
            .descriptor
            .column(comparison.column)
            .ok_or(PredicateError::UnknownColumn {
                column: comparison.column,
            })?;
        if !comparison.value.fits(column.kind) {
            return Err(PredicateError::Unsupported {
                kind: LITERAL_KIND_MISMATCH,
            });
        }
        self.filter.sql.push_str(column.name);

        match (comparison.op, &comparison.value) {
            (CompareOp::Eq, Literal::Null) => self.filter.sql.push_str(" IS NULL"),
            (CompareOp::Ne, Literal::Null) => self.filter.sql.push_str(" IS NOT NULL"),
            (CompareOp::Lt | CompareOp::Gt, Literal::Null) => {
                return Err(PredicateError::Unsupported {
                    kind: "ordering comparison against NULL",
                });
            }
            (op, literal) => {
                self.filter.sql.push(' ');
                self.filter.sql.push_str(op.sql());
                self.filter.sql.push(' ');
                self.literal(literal)?;
            }
        }

        Ok(())
    }

    fn literal(&mut self, literal: &Literal) -> Result<(), PredicateError> {
        if matches!(literal, Literal::Real(value) if !value.is_finite()) {
            return Err(PredicateError::Unsupported {
                kind: "non-finite real literal",
            });
        }

        match self.mode {
            FilterMode::Bound => {
                self.filter.sql.push('?');
                self.filter.params.push(literal.to_value());
            }
            FilterMode::Inline => self.filter.sql.push_str(&inline_literal(literal)),
        }
        Ok(())
    }
}

fn inline_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "NULL".to_string(),
        Literal::Integer(value) => format!("'{value}'"),
        Literal::Real(value) => format!("'{value}'"),
        Literal::Text(value) => format!("'{}'", value.replace('\'', "''")),
        Literal::Date(value) => format!("'{value}'"),
        Literal::Bool(value) => format!("'{}'", i64::from(*value)),
    }
}
