//! SQL rendering helpers for predicate fragments.
//!
//! Only PostgreSQL positional placeholders (`$1`, `$2`, ...) are emitted;
//! array filters bind one typed array per placeholder.

use crate::error::{FilterError, FilterResult};

/// Maximum number of dot-separated parts in a column expression.
const MAX_COLUMN_PARTS: usize = 3;

/// Render a positional placeholder.
pub fn placeholder(index: usize) -> String {
    format!("${}", index)
}

/// Element type of a bound array parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayType {
    /// `uuid[]`
    Uuid,
    /// `text[]`
    Text,
    /// `numeric[]`
    Numeric,
}

impl ArrayType {
    /// The SQL element type name.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::Text => "text",
            Self::Numeric => "numeric",
        }
    }
}

/// `column = ANY($n::type[])`
pub fn any_of(column: &str, index: usize, ty: ArrayType) -> String {
    format!("{} = ANY({}::{}[])", column, placeholder(index), ty.as_sql())
}

/// `column <> ALL($n::type[])`
pub fn none_of(column: &str, index: usize, ty: ArrayType) -> String {
    format!("{} <> ALL({}::{}[])", column, placeholder(index), ty.as_sql())
}

/// `column >= $i AND column <= $j`
pub fn between(column: &str, min_index: usize, max_index: usize) -> String {
    format!(
        "{} >= {} AND {} <= {}",
        column,
        placeholder(min_index),
        column,
        placeholder(max_index)
    )
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check that an expression is `column`, `alias.column` or `schema.table.column`.
pub fn is_valid_column_expr(expr: &str) -> bool {
    let parts: Vec<_> = expr.split('.').collect();
    parts.len() <= MAX_COLUMN_PARTS && parts.iter().all(|p| is_identifier(p))
}

/// Validate a column expression, returning it trimmed.
pub fn validate_column_expr(expr: &str) -> FilterResult<String> {
    let trimmed = expr.trim();
    if is_valid_column_expr(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(FilterError::invalid_column(expr))
    }
}
