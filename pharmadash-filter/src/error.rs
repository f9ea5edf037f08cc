//! Error types for predicate composition with actionable messages.
//!
//! Composition is lenient about filter *content* (empty lists, missing
//! operators) but strict about *misuse*: a wrong start index, an unknown
//! category level, or a column expression that is not a plain identifier
//! are reported here instead of producing a query that silently returns
//! the wrong rows.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: F{category}{number}
//! - 1xxx: Composition errors (start index, unmapped dimension, category level)
//! - 2xxx: Value errors (range bounds, operator tokens)
//! - 3xxx: Configuration errors (column expressions, config files)
//! - 4xxx: Input errors (filter specification payloads)
//!
//! ```rust
//! use pharmadash_filter::{ErrorCode, FilterError};
//!
//! let err = FilterError::start_index_mismatch(3, 2);
//! assert_eq!(err.code, ErrorCode::StartIndexMismatch);
//! assert_eq!(err.code.code(), "F1001");
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for composition operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Composition errors (1xxx)
    /// Start index does not follow the base parameters (F1001).
    StartIndexMismatch = 1001,
    /// Dimension has no column in the mapping (F1002).
    UnmappedDimension = 1002,
    /// Category hierarchy type is not a known level (F1003).
    UnknownCategoryLevel = 1003,

    // Value errors (2xxx)
    /// Range bounds are inverted or not finite (F2001).
    InvalidRange = 2001,
    /// Operator token is neither AND nor OR (F2002).
    InvalidOperator = 2002,
    /// Enumeration token is outside the closed vocabulary (F2003).
    InvalidEnumValue = 2003,

    // Configuration errors (3xxx)
    /// Column expression is not a plain (aliased) identifier (F3001).
    InvalidColumn = 3001,
    /// Configuration could not be read or parsed (F3002).
    InvalidConfiguration = 3002,

    // Input errors (4xxx)
    /// Filter specification payload could not be decoded (F4001).
    InvalidSpec = 4001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "F1001").
    pub fn code(&self) -> String {
        format!("F{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::StartIndexMismatch => "Start index mismatch",
            Self::UnmappedDimension => "Unmapped filter dimension",
            Self::UnknownCategoryLevel => "Unknown category level",
            Self::InvalidRange => "Invalid numeric range",
            Self::InvalidOperator => "Invalid boolean operator",
            Self::InvalidEnumValue => "Invalid enumeration value",
            Self::InvalidColumn => "Invalid column expression",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::InvalidSpec => "Invalid filter specification",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The filter dimension involved.
    pub dimension: Option<String>,
    /// The offending raw value.
    pub value: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while composing a predicate.
#[derive(Error, Debug)]
pub struct FilterError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl FilterError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the dimension.
    pub fn with_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.context.dimension = Some(dimension.into());
        self
    }

    /// Set the offending value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.context.value = Some(value.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// The caller's start index does not continue its own base parameters.
    pub fn start_index_mismatch(start_index: usize, base_len: usize) -> Self {
        Self::new(
            ErrorCode::StartIndexMismatch,
            format!(
                "start index ${} does not follow {} base parameter(s); expected ${}",
                start_index,
                base_len,
                base_len + 1
            ),
        )
        .with_suggestion("Leave the start index unset to derive it from the base parameters")
    }

    /// A dimension has no column in the mapping for this query.
    pub fn unmapped_dimension(dimension: impl Into<String>) -> Self {
        let dimension = dimension.into();
        Self::new(
            ErrorCode::UnmappedDimension,
            format!("no column is mapped for dimension `{}`", dimension),
        )
        .with_dimension(&dimension)
        .with_suggestion(format!("Map `{}` in the column mapping for this query", dimension))
        .with_help("Use UnmappedPolicy::Lenient to drop unmapped dimensions instead")
    }

    /// A category selection carries a hierarchy type outside the known levels.
    pub fn unknown_category_level(level_type: impl Into<String>) -> Self {
        let level_type = level_type.into();
        Self::new(
            ErrorCode::UnknownCategoryLevel,
            format!("unknown category hierarchy type `{}`", level_type),
        )
        .with_dimension("category")
        .with_value(&level_type)
        .with_suggestion("Expected one of level_0..level_5 or family")
    }

    /// A numeric range is inverted or has a non-finite bound.
    pub fn invalid_range(min: f64, max: f64) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("invalid range [{}, {}]", min, max),
        )
        .with_value(format!("{}..={}", min, max))
        .with_suggestion("Both bounds must be finite and min must not exceed max")
    }

    /// An operator token is neither AND nor OR.
    pub fn invalid_operator(token: impl Into<String>) -> Self {
        let token = token.into();
        Self::new(
            ErrorCode::InvalidOperator,
            format!("invalid boolean operator `{}`", token),
        )
        .with_value(&token)
        .with_suggestion("Use AND or OR")
    }

    /// An enumeration token is outside its closed vocabulary.
    pub fn invalid_enum_value(kind: &str, token: impl Into<String>) -> Self {
        let token = token.into();
        Self::new(
            ErrorCode::InvalidEnumValue,
            format!("`{}` is not a valid {}", token, kind),
        )
        .with_dimension(kind)
        .with_value(&token)
    }

    /// A column expression is not a plain identifier path.
    pub fn invalid_column(expr: impl Into<String>) -> Self {
        let expr = expr.into();
        Self::new(
            ErrorCode::InvalidColumn,
            format!("`{}` is not a valid column expression", expr),
        )
        .with_value(&expr)
        .with_suggestion("Use `column` or `alias.column` made of letters, digits and underscores")
    }

    /// Configuration could not be read or parsed.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// The filter specification payload could not be decoded.
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSpec, message)
    }

    // ============== Query Methods ==============

    /// Whether this error comes from the composition policies rather than the input values.
    pub fn is_composition_error(&self) -> bool {
        (self.code as u16) < 2000
    }

    /// Render the error with its context for display.
    pub fn display_full(&self) -> String {
        let mut out = format!("Error [{}]: {}", self.code.code(), self.message);

        if let Some(dimension) = &self.context.dimension {
            out.push_str(&format!("\n  → Dimension: {}", dimension));
        }
        if let Some(value) = &self.context.value {
            out.push_str(&format!("\n  → Value: {}", value));
        }
        for suggestion in &self.context.suggestions {
            out.push_str(&format!("\n  • {}", suggestion));
        }
        if let Some(help) = &self.context.help {
            out.push_str(&format!("\nHelp: {}", help));
        }

        out
    }
}

impl From<toml::de::Error> for FilterError {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid_config(format!("failed to parse filter configuration: {}", err.message()))
            .with_source(err)
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_spec(format!("failed to decode filter specification: {}", err))
            .with_source(err)
    }
}
