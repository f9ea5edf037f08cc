//! Closed domain enumerations rendered as SQL literals.
//!
//! These vocabularies belong to the service, not to the caller, so their
//! values are written into the fragment directly and never bound. A status
//! can only be constructed from the closed set, which is what keeps the
//! literal interpolation safe.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Literal stored for generic products.
const GENERIC_LITERAL: &str = "GÉNÉRIQUE";
/// Literal stored for reference (princeps) products.
const PRINCEPS_LITERAL: &str = "RÉFÉRENT";

/// Reimbursement status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReimbursementStatus {
    /// Reimbursed products only.
    Reimbursed,
    /// Non-reimbursed products only.
    NotReimbursed,
    /// No restriction.
    #[default]
    All,
}

impl ReimbursementStatus {
    /// Render the predicate for `column`, or `None` for [`All`](Self::All).
    pub fn predicate(&self, column: &str) -> Option<String> {
        match self {
            Self::Reimbursed => Some(format!("{} = true", column)),
            Self::NotReimbursed => Some(format!("{} = false", column)),
            Self::All => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Reimbursed => "REIMBURSED",
            Self::NotReimbursed => "NOT_REIMBURSED",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for ReimbursementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReimbursementStatus {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REIMBURSED" => Ok(Self::Reimbursed),
            "NOT_REIMBURSED" => Ok(Self::NotReimbursed),
            "ALL" | "" => Ok(Self::All),
            _ => Err(FilterError::invalid_enum_value("reimbursement status", s)),
        }
    }
}

/// Generic / princeps status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenericStatus {
    /// Generic products only.
    Generic,
    /// Reference (princeps) products only.
    Princeps,
    /// Products that belong to a generic group, on either side.
    PrincepsGeneric,
    /// No restriction.
    #[default]
    All,
}

impl GenericStatus {
    /// Render the predicate for `column`, or `None` for [`All`](Self::All).
    pub fn predicate(&self, column: &str) -> Option<String> {
        match self {
            Self::Generic => Some(format!("{} = '{}'", column, GENERIC_LITERAL)),
            Self::Princeps => Some(format!("{} = '{}'", column, PRINCEPS_LITERAL)),
            Self::PrincepsGeneric => Some(format!(
                "{} IN ('{}', '{}')",
                column, GENERIC_LITERAL, PRINCEPS_LITERAL
            )),
            Self::All => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "GENERIC",
            Self::Princeps => "PRINCEPS",
            Self::PrincepsGeneric => "PRINCEPS_GENERIC",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for GenericStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenericStatus {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GENERIC" => Ok(Self::Generic),
            "PRINCEPS" => Ok(Self::Princeps),
            "PRINCEPS_GENERIC" => Ok(Self::PrincepsGeneric),
            "ALL" | "" => Ok(Self::All),
            _ => Err(FilterError::invalid_enum_value("generic status", s)),
        }
    }
}
