//! Typed boolean predicates over one record type, and their SQL rendering.
//!
//! # Responsibility
//! - Model filters as an explicit AST (`And`, `Or`, `Compare`).
//! - Compile that AST into a WHERE-clause fragment for a resolved record.
//! - Evaluate the same AST natively so both paths can be checked against
//!   each other.
//!
//! # Invariants
//! - A `Predicate<R>` only ever references fields of `R`.
//! - Every comparison's left side must name a declared column of `R`.
//! - A comparison's literal must fit the column's declared kind.
//! - Null equality renders as `IS NULL` / `IS NOT NULL` in every mode.

mod ast;
mod compile;
mod eval;

pub use ast::{CompareOp, Comparison, Field, Literal, Node, Predicate};
pub use compile::{compile, Filter, FilterMode};

use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) const LITERAL_KIND_MISMATCH: &str = "literal type does not match column";

/// Predicate that cannot be rendered or evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// Comparison left side is not a declared column.
    UnknownColumn { column: &'static str },
    /// Node shape the SQL rendering has no form for.
    Unsupported { kind: &'static str },
}

impl Display for PredicateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownColumn { column } => {
                write!(f, "predicate references undeclared column `{column}`")
            }
            Self::Unsupported { kind } => write!(f, "unsupported predicate node: {kind}"),
        }
    }
}

impl Error for PredicateError {}
