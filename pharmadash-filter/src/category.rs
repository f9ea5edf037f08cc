//! Category hierarchy grouping.
//!
//! Selected categories arrive as a flat list of `(code, type)` pairs. They
//! are partitioned by hierarchy level, one array parameter is bound per
//! level, and the per-level clauses are combined into a single group:
//!
//! - inclusion: `(l0 = ANY($a::text[])) OR (l1 = ANY($b::text[]))`, a
//!   product matches if it sits under any selected category at any level;
//! - exclusion: `(l0 <> ALL($a::text[])) AND (l1 <> ALL($b::text[]))`, a
//!   product must not sit under any excluded category.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use crate::composer::UnmappedPolicy;
use crate::error::{FilterError, FilterResult};
use crate::mapping::{CategoryLevel, ColumnMapping, Dimension};
use crate::sql::{self, ArrayType};
use crate::value::ParamValue;

/// Codes selected at one level; most selections hold a handful.
pub type LevelCodes = SmallVec<[String; 4]>;

/// One selected category as sent by the filter UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySelection {
    /// Category code.
    pub code: String,
    /// Raw hierarchy type token (`level_0`..`level_5`, `family`).
    #[serde(rename = "type")]
    pub level_type: String,
}

impl CategorySelection {
    /// Create a selection.
    pub fn new(code: impl Into<String>, level_type: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            level_type: level_type.into(),
        }
    }

    /// Create a selection at a known level.
    pub fn at(code: impl Into<String>, level: CategoryLevel) -> Self {
        Self::new(code, level.key())
    }
}

/// Selections partitioned by level, in first-seen level order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryGroups {
    levels: IndexMap<CategoryLevel, LevelCodes>,
    selection_count: usize,
}

impl CategoryGroups {
    /// Whether no level survived grouping.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of distinct levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Number of raw selections the groups were built from.
    pub fn logical_items(&self) -> usize {
        self.selection_count
    }

    /// Codes selected at `level`.
    pub fn codes(&self, level: CategoryLevel) -> Option<&[String]> {
        self.levels.get(&level).map(|c| c.as_slice())
    }

    /// Iterate levels in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryLevel, &[String])> {
        self.levels.iter().map(|(l, c)| (*l, c.as_slice()))
    }

    /// Resolve each level to its column, paired with the array to bind.
    ///
    /// Nothing is bound here; a strict failure therefore has no side effect.
    pub(crate) fn resolve<'m>(
        &self,
        mapping: &'m ColumnMapping,
        policy: UnmappedPolicy,
    ) -> FilterResult<Vec<(&'m str, ParamValue)>> {
        let mut resolved = Vec::with_capacity(self.levels.len());
        for (level, codes) in &self.levels {
            match mapping.column(Dimension::Category(*level)) {
                Some(column) => resolved.push((column, ParamValue::text_list(codes.as_slice()))),
                None if policy.is_strict() => {
                    return Err(FilterError::unmapped_dimension(level.key()));
                }
                None => {
                    warn!(level = %level, codes = codes.len(), "Dropping unmapped category level");
                }
            }
        }
        Ok(resolved)
    }
}

/// Render per-level clauses for already-bound arrays.
///
/// Inclusion joins levels with `OR`, exclusion with `AND`. A single level
/// is rendered without its own parentheses.
pub(crate) fn render_levels(columns: &[&str], indices: &[usize], exclude: bool) -> String {
    let clause = |column: &str, index: usize| {
        if exclude {
            sql::none_of(column, index, ArrayType::Text)
        } else {
            sql::any_of(column, index, ArrayType::Text)
        }
    };

    if let ([column], [index]) = (columns, indices) {
        return clause(*column, *index);
    }

    let joiner = if exclude { " AND " } else { " OR " };
    columns
        .iter()
        .zip(indices)
        .map(|(column, index)| format!("({})", clause(*column, *index)))
        .collect::<Vec<_>>()
        .join(joiner)
}

/// Partition selections by level.
///
/// Unknown hierarchy types fail under [`UnmappedPolicy::Strict`] and are
/// dropped with a warning under [`UnmappedPolicy::Lenient`]. Duplicate
/// codes within a level are bound once.
pub fn group_by_level(
    selections: &[CategorySelection],
    policy: UnmappedPolicy,
) -> FilterResult<CategoryGroups> {
    let mut levels: IndexMap<CategoryLevel, LevelCodes> = IndexMap::new();

    for selection in selections {
        let Some(level) = CategoryLevel::parse_type(&selection.level_type) else {
            if policy.is_strict() {
                return Err(FilterError::unknown_category_level(&selection.level_type));
            }
            warn!(
                code = %selection.code,
                level_type = %selection.level_type,
                "Dropping category with unknown hierarchy type"
            );
            continue;
        };

        let codes = levels.entry(level).or_default();
        if !codes.contains(&selection.code) {
            codes.push(selection.code.clone());
        }
    }

    Ok(CategoryGroups {
        levels,
        selection_count: selections.len(),
    })
}
