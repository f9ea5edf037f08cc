//! Column mapping context.
//!
//! Analytical queries alias the same logical dimension to different physical
//! columns depending on which tables they join (`mv.pharmacy_id` against the
//! sales view, `ip.pharmacy_id` against the inventory join, ...). A
//! [`ColumnMapping`] is the explicit, per-query answer to "which column is
//! this dimension here", and every expression in it has been validated.
//!
//! ```rust
//! use pharmadash_filter::{CategoryLevel, ColumnMapping, Dimension};
//!
//! let mapping = ColumnMapping::builder()
//!     .column(Dimension::Pharmacy, "ip.pharmacy_id")
//!     .column(Dimension::Category(CategoryLevel::Family), "po.family_code")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(mapping.column(Dimension::Pharmacy), Some("ip.pharmacy_id"));
//! assert_eq!(mapping.column(Dimension::Laboratory), Some("mv.laboratory_name"));
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{FilterError, FilterResult};
use crate::sql::{ArrayType, validate_column_expr};

/// One tier of the product category hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryLevel {
    /// Segment level 0 (broadest).
    Level0,
    /// Segment level 1.
    Level1,
    /// Segment level 2.
    Level2,
    /// Segment level 3.
    Level3,
    /// Segment level 4.
    Level4,
    /// Segment level 5 (narrowest).
    Level5,
    /// Product family.
    Family,
}

impl CategoryLevel {
    /// All levels, broadest first.
    pub const ALL: [CategoryLevel; 7] = [
        Self::Level0,
        Self::Level1,
        Self::Level2,
        Self::Level3,
        Self::Level4,
        Self::Level5,
        Self::Family,
    ];

    /// Segment level for a numeric depth.
    pub fn from_depth(depth: u8) -> Option<Self> {
        match depth {
            0 => Some(Self::Level0),
            1 => Some(Self::Level1),
            2 => Some(Self::Level2),
            3 => Some(Self::Level3),
            4 => Some(Self::Level4),
            5 => Some(Self::Level5),
            _ => None,
        }
    }

    /// Parse a hierarchy type token.
    ///
    /// Accepts `family`, a bare depth (`"3"`), or a depth prefixed with
    /// `level`/`segment`, optionally separated by one `_` or `-`. The depth
    /// is a single digit `0`..`5`.
    pub fn parse_type(raw: &str) -> Option<Self> {
        let token = raw.trim().to_ascii_lowercase();
        if token == "family" {
            return Some(Self::Family);
        }
        let rest = token
            .strip_prefix("level")
            .or_else(|| token.strip_prefix("segment"));
        let digits = match rest {
            Some(rest) => rest.strip_prefix(['_', '-']).unwrap_or(rest),
            None => token.as_str(),
        };
        match digits.as_bytes() {
            [d @ b'0'..=b'5'] => Self::from_depth(d - b'0'),
            _ => None,
        }
    }

    /// Canonical configuration key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Level0 => "level_0",
            Self::Level1 => "level_1",
            Self::Level2 => "level_2",
            Self::Level3 => "level_3",
            Self::Level4 => "level_4",
            Self::Level5 => "level_5",
            Self::Family => "family",
        }
    }
}

impl fmt::Display for CategoryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A logical filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Pharmacy identifier.
    Pharmacy,
    /// Laboratory (brand owner) name.
    Laboratory,
    /// Product code.
    Product,
    /// TVA (VAT) rate.
    TvaRate,
    /// Reimbursement flag.
    Reimbursable,
    /// Generic/princeps status.
    GenericStatus,
    /// A category hierarchy level.
    Category(CategoryLevel),
}

impl Dimension {
    /// Canonical configuration key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Pharmacy => "pharmacy",
            Self::Laboratory => "laboratory",
            Self::Product => "product",
            Self::TvaRate => "tva_rate",
            Self::Reimbursable => "reimbursable",
            Self::GenericStatus => "generic_status",
            Self::Category(level) => level.key(),
        }
    }

    /// Element type used when binding this dimension as an array.
    pub fn array_type(&self) -> ArrayType {
        match self {
            Self::Pharmacy => ArrayType::Uuid,
            Self::TvaRate => ArrayType::Numeric,
            _ => ArrayType::Text,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pharmacy" => Ok(Self::Pharmacy),
            "laboratory" => Ok(Self::Laboratory),
            "product" => Ok(Self::Product),
            "tva_rate" | "tva" => Ok(Self::TvaRate),
            "reimbursable" => Ok(Self::Reimbursable),
            "generic_status" => Ok(Self::GenericStatus),
            other => CategoryLevel::parse_type(other)
                .map(Self::Category)
                .ok_or_else(|| FilterError::unmapped_dimension(s)),
        }
    }
}

/// Immutable dimension → column expression table for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: IndexMap<Dimension, String>,
    ranges: IndexMap<String, String>,
}

impl ColumnMapping {
    /// The preset for queries over the `mv` sales materialized view.
    pub fn standard() -> Self {
        let mut columns = IndexMap::new();
        columns.insert(Dimension::Pharmacy, "mv.pharmacy_id".to_string());
        columns.insert(Dimension::Laboratory, "mv.laboratory_name".to_string());
        columns.insert(Dimension::Product, "mv.code_13_ref".to_string());
        columns.insert(Dimension::TvaRate, "mv.tva_percentage".to_string());
        columns.insert(Dimension::Reimbursable, "mv.is_reimbursable".to_string());
        columns.insert(Dimension::GenericStatus, "mv.generic_status".to_string());
        for level in CategoryLevel::ALL {
            let column = match level {
                CategoryLevel::Family => "mv.family".to_string(),
                other => format!("mv.segment_l{}", &other.key()["level_".len()..]),
            };
            columns.insert(Dimension::Category(level), column);
        }

        let mut ranges = IndexMap::new();
        ranges.insert("price".to_string(), "mv.sell_price".to_string());
        ranges.insert("purchase_price".to_string(), "mv.purchase_price".to_string());
        ranges.insert("stock".to_string(), "mv.stock".to_string());

        Self { columns, ranges }
    }

    /// Start from the standard preset.
    pub fn builder() -> ColumnMappingBuilder {
        ColumnMappingBuilder {
            mapping: Self::standard(),
            pending: Vec::new(),
        }
    }

    /// Start from an empty table.
    pub fn empty_builder() -> ColumnMappingBuilder {
        ColumnMappingBuilder {
            mapping: Self {
                columns: IndexMap::new(),
                ranges: IndexMap::new(),
            },
            pending: Vec::new(),
        }
    }

    /// Column expression for a dimension.
    pub fn column(&self, dimension: Dimension) -> Option<&str> {
        self.columns.get(&dimension).map(String::as_str)
    }

    /// Column expression for a named numeric range.
    pub fn range_column(&self, name: &str) -> Option<&str> {
        self.ranges.get(name).map(String::as_str)
    }

    /// Iterate over mapped dimensions.
    pub fn dimensions(&self) -> impl Iterator<Item = (Dimension, &str)> {
        self.columns.iter().map(|(d, c)| (*d, c.as_str()))
    }

    /// Iterate over named range columns.
    pub fn ranges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ranges.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug)]
enum PendingEntry {
    Column(Dimension, String),
    Range(String, String),
}

/// Builder for a [`ColumnMapping`]; validation happens in [`build`](Self::build).
#[derive(Debug)]
#[must_use]
pub struct ColumnMappingBuilder {
    mapping: ColumnMapping,
    pending: Vec<PendingEntry>,
}

impl ColumnMappingBuilder {
    /// Map a dimension to a column expression.
    pub fn column(mut self, dimension: Dimension, expr: impl Into<String>) -> Self {
        self.pending.push(PendingEntry::Column(dimension, expr.into()));
        self
    }

    /// Map a named range to a column expression.
    pub fn range_column(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
        self.pending.push(PendingEntry::Range(name.into(), expr.into()));
        self
    }

    /// Remove a dimension so it is reported as unmapped.
    pub fn without(mut self, dimension: Dimension) -> Self {
        self.pending.retain(|p| !matches!(p, PendingEntry::Column(d, _) if *d == dimension));
        self.mapping.columns.shift_remove(&dimension);
        self
    }

    /// Validate every expression and freeze the mapping.
    pub fn build(self) -> FilterResult<ColumnMapping> {
        let mut mapping = self.mapping;
        for entry in self.pending {
            match entry {
                PendingEntry::Column(dimension, expr) => {
                    let expr = validate_column_expr(&expr)
                        .map_err(|e| e.with_dimension(dimension.key()))?;
                    mapping.columns.insert(dimension, expr);
                }
                PendingEntry::Range(name, expr) => {
                    let expr = validate_column_expr(&expr).map_err(|e| e.with_dimension(&name))?;
                    mapping.ranges.insert(name, expr);
                }
            }
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_category_level() {
        assert_eq!(CategoryLevel::parse_type("0"), Some(CategoryLevel::Level0));
        assert_eq!(CategoryLevel::parse_type("level3"), Some(CategoryLevel::Level3));
        assert_eq!(CategoryLevel::parse_type("LEVEL_5"), Some(CategoryLevel::Level5));
        assert_eq!(CategoryLevel::parse_type("segment-2"), Some(CategoryLevel::Level2));
        assert_eq!(CategoryLevel::parse_type(" Family "), Some(CategoryLevel::Family));
        assert_eq!(CategoryLevel::parse_type("level_6"), None);
        assert_eq!(CategoryLevel::parse_type("brand"), None);
        assert_eq!(CategoryLevel::parse_type(""), None);
    }

    #[test]
    fn test_parse_category_level_rejects_malformed_depth() {
        for token in ["+3", "-3", "03", "level__3", "level__-3", "level_+3", "segment--1", "_2"] {
            assert_eq!(CategoryLevel::parse_type(token), None, "token {:?}", token);
        }
    }

    #[test]
    fn test_standard_mapping() {
        let mapping = ColumnMapping::standard();
        assert_eq!(mapping.column(Dimension::Pharmacy), Some("mv.pharmacy_id"));
        assert_eq!(
            mapping.column(Dimension::Category(CategoryLevel::Level0)),
            Some("mv.segment_l0")
        );
        assert_eq!(
            mapping.column(Dimension::Category(CategoryLevel::Level5)),
            Some("mv.segment_l5")
        );
        assert_eq!(mapping.column(Dimension::Category(CategoryLevel::Family)), Some("mv.family"));
        assert_eq!(mapping.range_column("price"), Some("mv.sell_price"));
        assert_eq!(mapping.dimensions().count(), 13);
    }

    #[test]
    fn test_builder_overrides() {
        let mapping = ColumnMapping::builder()
            .column(Dimension::Product, "po.code_13_ref")
            .range_column("margin", "mv.margin_rate")
            .build()
            .unwrap();
        assert_eq!(mapping.column(Dimension::Product), Some("po.code_13_ref"));
        assert_eq!(mapping.column(Dimension::Pharmacy), Some("mv.pharmacy_id"));
        assert_eq!(mapping.range_column("margin"), Some("mv.margin_rate"));
    }

    #[test]
    fn test_builder_rejects_injection() {
        let err = ColumnMapping::builder()
            .column(Dimension::Laboratory, "mv.lab) OR (1=1")
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidColumn);
        assert_eq!(err.context.dimension.as_deref(), Some("laboratory"));
    }

    #[test]
    fn test_without() {
        let mapping = ColumnMapping::builder()
            .column(Dimension::Category(CategoryLevel::Level4), "p.l4")
            .without(Dimension::Category(CategoryLevel::Level4))
            .build()
            .unwrap();
        assert_eq!(mapping.column(Dimension::Category(CategoryLevel::Level4)), None);
    }

    #[test]
    fn test_empty_builder() {
        let mapping = ColumnMapping::empty_builder()
            .column(Dimension::Pharmacy, "ip.pharmacy_id")
            .build()
            .unwrap();
        assert_eq!(mapping.dimensions().count(), 1);
        assert_eq!(mapping.range_column("price"), None);
    }

    #[test]
    fn test_dimension_from_str() {
        assert_eq!("tva".parse::<Dimension>().unwrap(), Dimension::TvaRate);
        assert_eq!(
            "level_2".parse::<Dimension>().unwrap(),
            Dimension::Category(CategoryLevel::Level2)
        );
        assert!("colour".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_array_types() {
        assert_eq!(Dimension::Pharmacy.array_type(), ArrayType::Uuid);
        assert_eq!(Dimension::TvaRate.array_type(), ArrayType::Numeric);
        assert_eq!(Dimension::Laboratory.array_type(), ArrayType::Text);
    }
}
