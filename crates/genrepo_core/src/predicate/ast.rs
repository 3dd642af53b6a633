//! Predicate AST: comparison leaves, connectives, and typed field handles.

use crate::schema::{ColumnKind, Record};
use rusqlite::types::Value;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr};
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
}

impl CompareOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Gt => "gt",
        }
    }

    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Date(Date),
    Bool(bool),
}

impl Literal {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Storage value used when the literal is bound as a parameter.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(value) => Value::Integer(*value),
            Self::Real(value) => Value::Real(*value),
            Self::Text(value) => Value::Text(value.clone()),
            Self::Date(value) => Value::Text(value.to_string()),
            Self::Bool(value) => Value::Integer(i64::from(*value)),
        }
    }

    /// Whether the literal may be compared against a column of `kind`.
    ///
    /// `Null` fits every column; integers and reals share the numeric family.
    pub fn fits(&self, kind: ColumnKind) -> bool {
        matches!(
            (self, kind),
            (Self::Null, _)
                | (Self::Integer(_) | Self::Real(_), ColumnKind::Integer | ColumnKind::Real)
                | (Self::Text(_), ColumnKind::Text)
                | (Self::Date(_), ColumnKind::Date)
                | (Self::Bool(_), ColumnKind::Boolean)
        )
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Date> for Literal {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// `column <op> literal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: &'static str,
    pub op: CompareOp,
    pub value: Literal,
}

/// Untyped predicate tree.
///
/// Only logical connectives and column/literal comparisons exist here;
/// arithmetic, function calls and cross-record references have no variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Compare(Comparison),
}

/// Predicate tree bound to the record type `R`.
pub struct Predicate<R> {
    node: Node,
    _record: PhantomData<fn() -> R>,
}

impl<R> Predicate<R> {
    fn from_node(node: Node) -> Self {
        Self {
            node,
            _record: PhantomData,
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::from_node(Node::And(Box::new(self.node), Box::new(other.node)))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::from_node(Node::Or(Box::new(self.node), Box::new(other.node)))
    }
}

impl<R> Clone for Predicate<R> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<R> PartialEq for Predicate<R> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<R> Debug for Predicate<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Predicate").field(&self.node).finish()
    }
}

impl<R> BitAnd for Predicate<R> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<R> BitOr for Predicate<R> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

/// Typed reference to one field of `R`.
///
/// Records expose these as associated constants, e.g. `EntryRecord::ID`.
pub struct Field<R> {
    name: &'static str,
    _record: PhantomData<fn() -> R>,
}

impl<R> Field<R> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _record: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<R> Clone for Field<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Field<R> {}

impl<R> Debug for Field<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

impl<R: Record> Field<R> {
    fn compare(self, op: CompareOp, value: impl Into<Literal>) -> Predicate<R> {
        Predicate::from_node(Node::Compare(Comparison {
            column: self.name,
            op,
            value: value.into(),
        }))
    }

    pub fn eq(self, value: impl Into<Literal>) -> Predicate<R> {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<Literal>) -> Predicate<R> {
        self.compare(CompareOp::Ne, value)
    }

    pub fn lt(self, value: impl Into<Literal>) -> Predicate<R> {
        self.compare(CompareOp::Lt, value)
    }

    pub fn gt(self, value: impl Into<Literal>) -> Predicate<R> {
        self.compare(CompareOp::Gt, value)
    }

    pub fn is_null(self) -> Predicate<R> {
        self.compare(CompareOp::Eq, Literal::Null)
    }

    pub fn is_not_null(self) -> Predicate<R> {
        self.compare(CompareOp::Ne, Literal::Null)
    }
}
