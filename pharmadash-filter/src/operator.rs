//! Boolean operators placed between inclusion groups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{FilterError, FilterResult};

/// Boolean connective between two inclusion groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolOp {
    /// Both sides must hold.
    #[default]
    And,
    /// Either side may hold.
    Or,
}

impl BoolOp {
    /// The SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for BoolOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(FilterError::invalid_operator(s)),
        }
    }
}

impl<'de> Deserialize<'de> for BoolOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The caller's ordered operator tokens.
///
/// Entry `i` joins the inclusion group at operator position `i` to the one
/// after it. Positions past the end resolve to `AND`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorChain {
    ops: Vec<BoolOp>,
}

impl OperatorChain {
    /// Create a chain from already-parsed operators.
    pub fn new(ops: impl IntoIterator<Item = BoolOp>) -> Self {
        Self {
            ops: ops.into_iter().collect(),
        }
    }

    /// Parse tokens, failing on the first one that is not AND/OR.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> FilterResult<Self> {
        let ops = tokens
            .iter()
            .map(|t| t.as_ref().parse())
            .collect::<FilterResult<Vec<_>>>()?;
        Ok(Self { ops })
    }

    /// Parse tokens, treating anything that is not AND/OR as AND.
    pub fn parse_lenient<S: AsRef<str>>(tokens: &[S]) -> Self {
        let ops = tokens
            .iter()
            .enumerate()
            .map(|(position, token)| {
                token.as_ref().parse().unwrap_or_else(|_| {
                    warn!(
                        position,
                        token = token.as_ref(),
                        "Unrecognized operator token, using AND"
                    );
                    BoolOp::And
                })
            })
            .collect();
        Self { ops }
    }

    /// The operator at `position`, or `AND` when absent.
    pub fn resolve(&self, position: usize) -> BoolOp {
        self.ops.get(position).copied().unwrap_or_default()
    }

    /// Number of explicit tokens.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the chain has no explicit tokens.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl From<Vec<BoolOp>> for OperatorChain {
    fn from(ops: Vec<BoolOp>) -> Self {
        Self { ops }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_bool_op() {
        assert_eq!("AND".parse::<BoolOp>().unwrap(), BoolOp::And);
        assert_eq!(" or ".parse::<BoolOp>().unwrap(), BoolOp::Or);
        let err = "XOR".parse::<BoolOp>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOperator);
    }

    #[test]
    fn test_resolve_defaults_to_and() {
        let chain = OperatorChain::new([BoolOp::Or]);
        assert_eq!(chain.resolve(0), BoolOp::Or);
        assert_eq!(chain.resolve(1), BoolOp::And);
        assert_eq!(OperatorChain::default().resolve(0), BoolOp::And);
    }

    #[test]
    fn test_parse_strict() {
        assert_eq!(OperatorChain::parse(&["OR", "and"]).unwrap().len(), 2);
        assert!(OperatorChain::parse(&["OR", "NAND"]).is_err());
    }

    #[test]
    fn test_parse_lenient() {
        let chain = OperatorChain::parse_lenient(&["OR", "", "maybe", "OR"]);
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.resolve(0), BoolOp::Or);
        assert_eq!(chain.resolve(1), BoolOp::And);
        assert_eq!(chain.resolve(2), BoolOp::And);
        assert_eq!(chain.resolve(3), BoolOp::Or);
    }

    #[test]
    fn test_deserialize_chain() {
        let chain: OperatorChain = serde_json::from_str(r#"["OR","AND"]"#).unwrap();
        assert_eq!(chain, OperatorChain::new([BoolOp::Or, BoolOp::And]));
        assert!(serde_json::from_str::<OperatorChain>(r#"["NOR"]"#).is_err());
    }
}
