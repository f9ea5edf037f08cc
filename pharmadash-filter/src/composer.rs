//! The predicate composer.
//!
//! A [`PredicateComposer`] turns a sequence of filter dimensions into one
//! boolean fragment that an analytical query appends after its own
//! `WHERE ...` clause, plus the parameter array that goes with it.
//!
//! Inclusion groups are joined by the caller's operator tokens (missing
//! tokens mean `AND`). Exclusion groups sit outside that chain and are
//! always conjunctive:
//!
//! ```text
//! AND (((pharmacies) OR (laboratories)) AND (excluded products))
//! ```
//!
//! Groups are validated and resolved to columns as they are added; values
//! are bound when the composer is consumed by
//! [`finish`](PredicateComposer::finish), in the order the groups appear in
//! the fragment. A composer cannot be cloned or reused.
//!
//! ```rust
//! use pharmadash_filter::{ColumnMapping, OperatorChain, PredicateComposer};
//!
//! let mapping = ColumnMapping::standard();
//! let mut composer = PredicateComposer::builder(&mapping)
//!     .base_params(vec!["2024-01-01".into(), "2024-12-31".into()])
//!     .start_index(3)
//!     .operators(OperatorChain::parse_lenient(&["OR"]))
//!     .build()
//!     .unwrap();
//!
//! composer
//!     .add_pharmacies(&["P1"])
//!     .unwrap()
//!     .add_laboratories(&["LabX", "LabY"])
//!     .unwrap();
//!
//! let filter = composer.finish();
//! assert_eq!(
//!     filter.conditions(),
//!     "AND ((mv.pharmacy_id = ANY($3::uuid[])) OR (mv.laboratory_name = ANY($4::text[])))"
//! );
//! assert_eq!(filter.params().len(), 4);
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::category::{CategorySelection, group_by_level, render_levels};
use crate::error::{FilterError, FilterResult};
use crate::mapping::{ColumnMapping, Dimension};
use crate::operator::{BoolOp, OperatorChain};
use crate::params::ParamAllocator;
use crate::range::NumericRange;
use crate::sql::{self, ArrayType};
use crate::status::{GenericStatus, ReimbursementStatus};
use crate::value::ParamValue;

/// What to do with a dimension that cannot be resolved to a column.
///
/// Covers dimensions missing from the [`ColumnMapping`], unknown category
/// hierarchy types, and unknown named ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    /// Fail with an error and leave the composer unchanged.
    #[default]
    Strict,
    /// Drop the dimension and log a warning.
    Lenient,
}

impl UnmappedPolicy {
    /// Whether unresolvable dimensions are errors.
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// How far an inclusion group moves the operator position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorAdvance {
    /// Every group advances by one.
    #[default]
    PerGroup,
    /// A category group advances by its number of selections.
    ///
    /// Operator lists written against older dashboards count each selected
    /// category as its own slot.
    PerItem,
}

/// Composition policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposerOptions {
    /// Policy for unresolvable dimensions.
    pub unmapped: UnmappedPolicy,
    /// Operator position advance mode.
    pub operator_advance: OperatorAdvance,
}

impl ComposerOptions {
    /// Strict policies with per-group advance.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Drop unresolvable dimensions instead of failing.
    pub fn lenient() -> Self {
        Self {
            unmapped: UnmappedPolicy::Lenient,
            ..Self::default()
        }
    }

    /// Set the operator advance mode.
    pub fn with_operator_advance(mut self, advance: OperatorAdvance) -> Self {
        self.operator_advance = advance;
        self
    }
}

/// The finished fragment and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedFilter {
    conditions: String,
    params: Vec<ParamValue>,
}

impl ComposedFilter {
    /// `AND (...)`, or an empty string when no group was added.
    pub fn conditions(&self) -> &str {
        &self.conditions
    }

    /// Base parameters followed by every bound value, in placeholder order.
    pub fn params(&self) -> &[ParamValue] {
        &self.params
    }

    /// Whether no group was added.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Append the fragment to a query that already ends in a `WHERE` clause.
    pub fn append_to(&self, query: &str) -> String {
        if self.conditions.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query.trim_end(), self.conditions)
        }
    }

    /// Split into conditions and parameters.
    pub fn into_parts(self) -> (String, Vec<ParamValue>) {
        (self.conditions, self.params)
    }
}

/// How a group turns its placeholder indices into SQL.
enum Template<'m> {
    AnyOf { column: &'m str, ty: ArrayType },
    NoneOf { column: &'m str, ty: ArrayType },
    Between { column: Cow<'m, str> },
    Literal(String),
    Levels { columns: Vec<&'m str>, exclude: bool },
    Custom(Box<dyn FnOnce(usize) -> String + 'm>),
}

impl Template<'_> {
    fn render(self, indices: &[usize]) -> String {
        match self {
            Self::AnyOf { column, ty } => sql::any_of(column, indices[0], ty),
            Self::NoneOf { column, ty } => sql::none_of(column, indices[0], ty),
            Self::Between { column } => sql::between(&column, indices[0], indices[1]),
            Self::Literal(text) => text,
            Self::Levels { columns, exclude } => render_levels(&columns, indices, exclude),
            Self::Custom(render) => render(indices[0]),
        }
    }
}

impl fmt::Debug for Template<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyOf { column, ty } => write!(f, "AnyOf({}, {})", column, ty.as_sql()),
            Self::NoneOf { column, ty } => write!(f, "NoneOf({}, {})", column, ty.as_sql()),
            Self::Between { column } => write!(f, "Between({})", column),
            Self::Literal(text) => write!(f, "Literal({})", text),
            Self::Levels { columns, exclude } => {
                write!(f, "Levels({:?}, exclude={})", columns, exclude)
            }
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A validated group waiting for its placeholder indices.
#[derive(Debug)]
struct PendingGroup<'m> {
    values: SmallVec<[ParamValue; 2]>,
    template: Template<'m>,
}

impl<'m> PendingGroup<'m> {
    fn new(values: impl IntoIterator<Item = ParamValue>, template: Template<'m>) -> Self {
        Self {
            values: values.into_iter().collect(),
            template,
        }
    }

    fn literal(text: String) -> Self {
        Self {
            values: SmallVec::new(),
            template: Template::Literal(text),
        }
    }

    fn render(self, params: &mut ParamAllocator) -> String {
        let indices: SmallVec<[usize; 4]> =
            self.values.into_iter().map(|v| params.bind(v)).collect();
        self.template.render(&indices)
    }
}

/// Builder for a [`PredicateComposer`].
#[derive(Debug)]
#[must_use]
pub struct ComposerBuilder<'m> {
    mapping: &'m ColumnMapping,
    base_params: Vec<ParamValue>,
    start_index: Option<usize>,
    operators: OperatorChain,
    options: ComposerOptions,
}

impl<'m> ComposerBuilder<'m> {
    /// Parameters the enclosing query binds before the fragment's own.
    pub fn base_params(mut self, params: Vec<ParamValue>) -> Self {
        self.base_params = params;
        self
    }

    /// Assert the first placeholder index the fragment should use.
    ///
    /// Checked against the base parameters in [`build`](Self::build).
    pub fn start_index(mut self, index: usize) -> Self {
        self.start_index = Some(index);
        self
    }

    /// The caller's operator tokens.
    pub fn operators(mut self, operators: OperatorChain) -> Self {
        self.operators = operators;
        self
    }

    /// Composition policies.
    pub fn options(mut self, options: ComposerOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the composer.
    pub fn build(self) -> FilterResult<PredicateComposer<'m>> {
        if let Some(start_index) = self.start_index {
            if start_index != self.base_params.len() + 1 {
                return Err(FilterError::start_index_mismatch(start_index, self.base_params.len()));
            }
        }

        Ok(PredicateComposer {
            mapping: self.mapping,
            operators: self.operators,
            options: self.options,
            base_params: self.base_params,
            inclusions: Vec::new(),
            exclusions: Vec::new(),
            item_count: 0,
        })
    }
}

/// Request-scoped builder of one predicate fragment.
#[derive(Debug)]
pub struct PredicateComposer<'m> {
    mapping: &'m ColumnMapping,
    operators: OperatorChain,
    options: ComposerOptions,
    base_params: Vec<ParamValue>,
    /// Inclusion groups, each with the operator joining it to the previous one.
    inclusions: Vec<(Option<BoolOp>, PendingGroup<'m>)>,
    exclusions: Vec<PendingGroup<'m>>,
    /// Operator position counter; only inclusion groups move it.
    item_count: usize,
}

impl<'m> PredicateComposer<'m> {
    /// A composer with no base parameters, no operator tokens and strict policies.
    pub fn new(mapping: &'m ColumnMapping) -> Self {
        Self {
            mapping,
            operators: OperatorChain::default(),
            options: ComposerOptions::default(),
            base_params: Vec::new(),
            inclusions: Vec::new(),
            exclusions: Vec::new(),
            item_count: 0,
        }
    }

    /// Start configuring a composer.
    pub fn builder(mapping: &'m ColumnMapping) -> ComposerBuilder<'m> {
        ComposerBuilder {
            mapping,
            base_params: Vec::new(),
            start_index: None,
            operators: OperatorChain::default(),
            options: ComposerOptions::default(),
        }
    }

    /// The mapping this composer resolves dimensions against.
    pub fn mapping(&self) -> &'m ColumnMapping {
        self.mapping
    }

    // ============== Generic Groups ==============

    /// Add an inclusion group bound to one array parameter.
    ///
    /// `render` receives the placeholder index of the bound array. An empty
    /// `values` list is a no-op and consumes no operator position.
    pub fn add_inclusion_group<F>(&mut self, values: Vec<ParamValue>, render: F) -> &mut Self
    where
        F: FnOnce(usize) -> String + 'm,
    {
        if values.is_empty() {
            return self;
        }
        let group =
            PendingGroup::new([ParamValue::List(values)], Template::Custom(Box::new(render)));
        self.push_inclusion(group, 1);
        self
    }

    /// Add an exclusion group bound to one array parameter.
    ///
    /// Exclusions are always joined with `AND` and never consume an operator.
    pub fn add_exclusion_group<F>(&mut self, values: Vec<ParamValue>, render: F) -> &mut Self
    where
        F: FnOnce(usize) -> String + 'm,
    {
        if values.is_empty() {
            return self;
        }
        let group =
            PendingGroup::new([ParamValue::List(values)], Template::Custom(Box::new(render)));
        self.exclusions.push(group);
        self
    }

    // ============== Inclusions ==============

    /// Restrict to the given pharmacy identifiers.
    pub fn add_pharmacies<S: AsRef<str>>(&mut self, ids: &[S]) -> FilterResult<&mut Self> {
        self.add_array(Dimension::Pharmacy, ParamValue::text_list(ids), ids.len(), false)
    }

    /// Restrict to the given laboratories.
    pub fn add_laboratories<S: AsRef<str>>(&mut self, names: &[S]) -> FilterResult<&mut Self> {
        self.add_array(Dimension::Laboratory, ParamValue::text_list(names), names.len(), false)
    }

    /// Restrict to the given product codes.
    pub fn add_products<S: AsRef<str>>(&mut self, codes: &[S]) -> FilterResult<&mut Self> {
        self.add_array(Dimension::Product, ParamValue::text_list(codes), codes.len(), false)
    }

    /// Restrict to the given TVA rates.
    pub fn add_tva_rates(&mut self, rates: &[f64]) -> FilterResult<&mut Self> {
        self.add_array(Dimension::TvaRate, ParamValue::float_list(rates), rates.len(), false)
    }

    /// Restrict to products under any of the selected categories.
    pub fn add_categories(&mut self, selections: &[CategorySelection]) -> FilterResult<&mut Self> {
        self.add_category_group(selections, false)
    }

    /// Restrict by reimbursement status; binds no parameter.
    pub fn add_reimbursement_status(
        &mut self,
        status: ReimbursementStatus,
    ) -> FilterResult<&mut Self> {
        if status == ReimbursementStatus::All {
            return Ok(self);
        }
        let Some(column) = self.column_for(Dimension::Reimbursable)? else {
            return Ok(self);
        };
        if let Some(predicate) = status.predicate(column) {
            debug!(status = %status, "Adding reimbursement status group");
            self.push_inclusion(PendingGroup::literal(predicate), 1);
        }
        Ok(self)
    }

    /// Restrict by generic/princeps status; binds no parameter.
    pub fn add_generic_status(&mut self, status: GenericStatus) -> FilterResult<&mut Self> {
        if status == GenericStatus::All {
            return Ok(self);
        }
        let Some(column) = self.column_for(Dimension::GenericStatus)? else {
            return Ok(self);
        };
        if let Some(predicate) = status.predicate(column) {
            debug!(status = %status, "Adding generic status group");
            self.push_inclusion(PendingGroup::literal(predicate), 1);
        }
        Ok(self)
    }

    /// Restrict `column` to a closed interval.
    ///
    /// Binds two parameters (min, then max) and consumes one operator
    /// position. The column must be a plain (aliased) identifier.
    pub fn add_range(
        &mut self,
        range: Option<NumericRange>,
        column: &str,
    ) -> FilterResult<&mut Self> {
        let Some(range) = range else {
            return Ok(self);
        };
        range.validate()?;
        let column = sql::validate_column_expr(column)?;
        debug!(column = %column, min = range.min, max = range.max, "Adding range group");
        self.push_range(range, Cow::Owned(column));
        Ok(self)
    }

    /// Restrict a named range resolved through the column mapping.
    pub fn add_named_range(
        &mut self,
        name: &str,
        range: Option<NumericRange>,
    ) -> FilterResult<&mut Self> {
        let Some(range) = range else {
            return Ok(self);
        };
        range.validate()?;
        let mapping: &'m ColumnMapping = self.mapping;
        let column = match mapping.range_column(name) {
            Some(column) => column,
            None if self.options.unmapped.is_strict() => {
                return Err(FilterError::unmapped_dimension(name));
            }
            None => {
                warn!(range = name, "Dropping unmapped range");
                return Ok(self);
            }
        };
        debug!(range = name, min = range.min, max = range.max, "Adding range group");
        self.push_range(range, Cow::Borrowed(column));
        Ok(self)
    }

    // ============== Exclusions ==============

    /// Exclude the given pharmacy identifiers.
    pub fn add_excluded_pharmacies<S: AsRef<str>>(&mut self, ids: &[S]) -> FilterResult<&mut Self> {
        self.add_array(Dimension::Pharmacy, ParamValue::text_list(ids), ids.len(), true)
    }

    /// Exclude the given laboratories.
    pub fn add_excluded_laboratories<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> FilterResult<&mut Self> {
        self.add_array(Dimension::Laboratory, ParamValue::text_list(names), names.len(), true)
    }

    /// Exclude the given product codes.
    pub fn add_excluded_products<S: AsRef<str>>(&mut self, codes: &[S]) -> FilterResult<&mut Self> {
        self.add_array(Dimension::Product, ParamValue::text_list(codes), codes.len(), true)
    }

    /// Exclude the given TVA rates.
    pub fn add_excluded_tva_rates(&mut self, rates: &[f64]) -> FilterResult<&mut Self> {
        self.add_array(Dimension::TvaRate, ParamValue::float_list(rates), rates.len(), true)
    }

    /// Exclude products under any of the selected categories.
    pub fn add_excluded_categories(
        &mut self,
        selections: &[CategorySelection],
    ) -> FilterResult<&mut Self> {
        self.add_category_group(selections, true)
    }

    // ============== Retrieval ==============

    /// Number of groups added.
    pub fn group_count(&self) -> usize {
        self.inclusions.len() + self.exclusions.len()
    }

    /// Whether no group was added.
    pub fn is_empty(&self) -> bool {
        self.group_count() == 0
    }

    /// Number of parameters the fragment will bind beyond the base.
    pub fn pending_param_count(&self) -> usize {
        self.inclusions
            .iter()
            .map(|(_, g)| g.values.len())
            .chain(self.exclusions.iter().map(|g| g.values.len()))
            .sum()
    }

    /// Bind every value and render the fragment.
    ///
    /// Placeholders are numbered from the start index in the order they
    /// appear: the inclusion chain first, then each exclusion.
    pub fn finish(self) -> ComposedFilter {
        let mut params = ParamAllocator::new(self.base_params);
        let has_exclusions = !self.exclusions.is_empty();
        let inclusion_count = self.inclusions.len();
        let mut terms = Vec::with_capacity(1 + self.exclusions.len());

        if inclusion_count > 0 {
            let mut chain = String::new();
            for (op, group) in self.inclusions {
                if let Some(op) = op {
                    chain.push(' ');
                    chain.push_str(op.as_sql());
                    chain.push(' ');
                }
                chain.push('(');
                chain.push_str(&group.render(&mut params));
                chain.push(')');
            }
            // Keep a user OR chain from absorbing the exclusions.
            if inclusion_count > 1 && has_exclusions {
                terms.push(format!("({})", chain));
            } else {
                terms.push(chain);
            }
        }
        for group in self.exclusions {
            terms.push(format!("({})", group.render(&mut params)));
        }

        let conditions = if terms.is_empty() {
            String::new()
        } else {
            format!("AND ({})", terms.join(" AND "))
        };
        trace!(
            groups = terms.len(),
            bound = params.bound_count(),
            conditions = %conditions,
            "Predicate composed"
        );

        ComposedFilter {
            conditions,
            params: params.into_params(),
        }
    }

    // ============== Internals ==============

    fn column_for(&self, dimension: Dimension) -> FilterResult<Option<&'m str>> {
        let mapping: &'m ColumnMapping = self.mapping;
        match mapping.column(dimension) {
            Some(column) => Ok(Some(column)),
            None if self.options.unmapped.is_strict() => {
                Err(FilterError::unmapped_dimension(dimension.key()))
            }
            None => {
                warn!(dimension = %dimension, "Dropping unmapped dimension");
                Ok(None)
            }
        }
    }

    fn add_array(
        &mut self,
        dimension: Dimension,
        values: ParamValue,
        len: usize,
        exclude: bool,
    ) -> FilterResult<&mut Self> {
        if len == 0 {
            return Ok(self);
        }
        let Some(column) = self.column_for(dimension)? else {
            return Ok(self);
        };

        let ty = dimension.array_type();
        if exclude {
            debug!(dimension = %dimension, values = len, "Adding exclusion group");
            self.exclusions.push(PendingGroup::new([values], Template::NoneOf { column, ty }));
        } else {
            debug!(dimension = %dimension, values = len, "Adding inclusion group");
            self.push_inclusion(PendingGroup::new([values], Template::AnyOf { column, ty }), 1);
        }
        Ok(self)
    }

    fn add_category_group(
        &mut self,
        selections: &[CategorySelection],
        exclude: bool,
    ) -> FilterResult<&mut Self> {
        if selections.is_empty() {
            return Ok(self);
        }
        let policy = self.options.unmapped;
        let groups = group_by_level(selections, policy)?;
        let resolved = groups.resolve(self.mapping, policy)?;
        if resolved.is_empty() {
            return Ok(self);
        }

        debug!(
            levels = resolved.len(),
            selections = groups.logical_items(),
            exclude,
            "Adding category group"
        );
        let (columns, values): (Vec<&'m str>, Vec<ParamValue>) = resolved.into_iter().unzip();
        let group = PendingGroup::new(values, Template::Levels { columns, exclude });
        if exclude {
            self.exclusions.push(group);
        } else {
            let items = match self.options.operator_advance {
                OperatorAdvance::PerGroup => 1,
                OperatorAdvance::PerItem => groups.logical_items(),
            };
            self.push_inclusion(group, items);
        }
        Ok(self)
    }

    fn push_range(&mut self, range: NumericRange, column: Cow<'m, str>) {
        let group = PendingGroup::new(range.bounds(), Template::Between { column });
        self.push_inclusion(group, 1);
    }

    fn push_inclusion(&mut self, group: PendingGroup<'m>, items: usize) {
        let op = if self.inclusions.is_empty() {
            None
        } else {
            Some(self.operators.resolve(self.item_count.saturating_sub(1)))
        };
        self.inclusions.push((op, group));
        self.item_count += items;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::mapping::CategoryLevel;
    use pretty_assertions::assert_eq;

    fn composer_with_ops<'m>(mapping: &'m ColumnMapping, ops: &[&str]) -> PredicateComposer<'m> {
        PredicateComposer::builder(mapping)
            .operators(OperatorChain::parse_lenient(ops))
            .build()
            .unwrap()
    }

    fn placeholders(conditions: &str) -> Vec<usize> {
        conditions
            .split('$')
            .skip(1)
            .map(|rest| {
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_empty_composer() {
        let mapping = ColumnMapping::standard();
        let composer = PredicateComposer::builder(&mapping)
            .base_params(vec!["2024-01-01".into()])
            .build()
            .unwrap();
        assert!(composer.is_empty());
        let filter = composer.finish();
        assert!(filter.is_empty());
        assert_eq!(filter.conditions(), "");
        assert_eq!(filter.params(), &[ParamValue::from("2024-01-01")]);
    }

    #[test]
    fn test_empty_lists_are_noops() {
        let mapping = ColumnMapping::standard();
        let mut composer = composer_with_ops(&mapping, &["OR"]);
        let none: &[&str] = &[];
        composer
            .add_pharmacies(none)
            .unwrap()
            .add_categories(&[])
            .unwrap()
            .add_tva_rates(&[])
            .unwrap()
            .add_range(None, "price")
            .unwrap()
            .add_named_range("price", None)
            .unwrap()
            .add_reimbursement_status(ReimbursementStatus::All)
            .unwrap()
            .add_generic_status(GenericStatus::All)
            .unwrap()
            .add_excluded_products(none)
            .unwrap()
            .add_excluded_categories(&[])
            .unwrap();
        assert!(composer.is_empty());
        assert_eq!(composer.pending_param_count(), 0);
        assert!(composer.finish().params().is_empty());
    }

    #[test]
    fn test_single_group() {
        let mapping = ColumnMapping::standard();
        let mut composer = PredicateComposer::new(&mapping);
        composer.add_products(&["3400930000001"]).unwrap();
        assert_eq!(
            composer.finish().conditions(),
            "AND ((mv.code_13_ref = ANY($1::text[])))"
        );
    }

    #[test]
    fn test_operator_applied_between_inclusions() {
        let mapping = ColumnMapping::standard();
        let mut composer = composer_with_ops(&mapping, &["OR"]);
        composer
            .add_laboratories(&["LabX"])
            .unwrap()
            .add_products(&["P"])
            .unwrap();
        assert_eq!(
            composer.finish().conditions(),
            "AND ((mv.laboratory_name = ANY($1::text[])) OR (mv.code_13_ref = ANY($2::text[])))"
        );
    }

    #[test]
    fn test_missing_operator_defaults_to_and() {
        let mapping = ColumnMapping::standard();
        let mut composer = composer_with_ops(&mapping, &["OR"]);
        composer
            .add_laboratories(&["LabX"])
            .unwrap()
            .add_products(&["P"])
            .unwrap()
            .add_tva_rates(&[5.5])
            .unwrap();
        assert_eq!(
            composer.finish().conditions(),
            "AND ((mv.laboratory_name = ANY($1::text[])) OR (mv.code_13_ref = ANY($2::text[])) \
             AND (mv.tva_percentage = ANY($3::numeric[])))"
        );
    }

    #[test]
    fn test_skipped_dimension_does_not_consume_operator() {
        let mapping = ColumnMapping::standard();
        let mut composer = composer_with_ops(&mapping, &["OR", "AND"]);
        let none: &[&str] = &[];
        composer
            .add_pharmacies(&["P1"])
            .unwrap()
            .add_laboratories(none)
            .unwrap()
            .add_products(&["C1"])
            .unwrap();
        assert!(composer.finish().conditions().contains("$1::uuid[])) OR (mv.code_13_ref"));
    }

    #[test]
    fn test_exclusion_always_and() {
        let mapping = ColumnMapping::standard();
        let mut composer = composer_with_ops(&mapping, &["OR"]);
        composer
            .add_pharmacies(&["P1"])
            .unwrap()
            .add_excluded_laboratories(&["LabZ"])
            .unwrap();
        assert_eq!(
            composer.finish().conditions(),
            "AND ((mv.pharmacy_id = ANY($1::uuid[])) AND (mv.laboratory_name <> ALL($2::text[])))"
        );
    }

    #[test]
    fn test_exclusion_outside_or_chain() {
        let mapping = ColumnMapping::standard();
        let mut composer = composer_with_ops(&mapping, &["OR", "OR"]);
        composer
            .add_excluded_products(&["X"])
            .unwrap()
            .add_pharmacies(&["P1"])
            .unwrap()
            .add_laboratories(&["LabX"])
            .unwrap();
        let filter = composer.finish();
        assert_eq!(
            filter.conditions(),
            "AND (((mv.pharmacy_id = ANY($1::uuid[])) OR (mv.laboratory_name = ANY($2::text[]))) \
             AND (mv.code_13_ref <> ALL($3::text[])))"
        );
        assert_eq!(filter.params()[2], ParamValue::from(vec!["X"]));
    }

    #[test]
    fn test_exclusions_only() {
        let mapping = ColumnMapping::standard();
        let mut composer = composer_with_ops(&mapping, &["OR"]);
        composer
            .add_excluded_pharmacies(&["P9"])
            .unwrap()
            .add_excluded_tva_rates(&[20.0])
            .unwrap();
        assert_eq!(
            composer.finish().conditions(),
            "AND ((mv.pharmacy_id <> ALL($1::uuid[])) \
             AND (mv.tva_percentage <> ALL($2::numeric[])))"
        );
    }

    #[test]
    fn test_category_group_per_group_advance() {
        let mapping = ColumnMapping::standard();
        let mut composer = composer_with_ops(&mapping, &["AND", "OR"]);
        composer
            .add_pharmacies(&["P1"])
            .unwrap()
            .add_categories(&[
                CategorySelection::at("A", CategoryLevel::Level0),
                CategorySelection::at("B", CategoryLevel::Level1),
            ])
            .unwrap()
            .add_products(&["C1"])
            .unwrap();
        assert_eq!(
            composer.finish().conditions(),
            "AND ((mv.pharmacy_id = ANY($1::uuid[])) \
             AND ((mv.segment_l0 = ANY($2::text[])) OR (mv.segment_l1 = ANY($3::text[]))) \
             OR (mv.code_13_ref = ANY($4::text[])))"
        );
    }

    #[test]
    fn test_category_group_per_item_advance() {
        let mapping = ColumnMapping::standard();
        let mut composer = PredicateComposer::builder(&mapping)
            .operators(OperatorChain::parse_lenient(&["OR", "AND", "OR"]))
            .options(ComposerOptions::default().with_operator_advance(OperatorAdvance::PerItem))
            .build()
            .unwrap();
        composer
            .add_categories(&[
                CategorySelection::at("A", CategoryLevel::Level0),
                CategorySelection::at("B", CategoryLevel::Level0),
                CategorySelection::at("C", CategoryLevel::Level2),
            ])
            .unwrap()
            .add_products(&["C1"])
            .unwrap();
        let filter = composer.finish();
        // Three selections move the operator position to index 2.
        assert_eq!(
            filter.conditions(),
            "AND (((mv.segment_l0 = ANY($1::text[])) OR (mv.segment_l2 = ANY($2::text[]))) \
             OR (mv.code_13_ref = ANY($3::text[])))"
        );
        assert_eq!(filter.params()[0], ParamValue::from(vec!["A", "B"]));
    }

    #[test]
    fn test_range_and_enums() {
        let mapping = ColumnMapping::standard();
        let mut composer = PredicateComposer::builder(&mapping)
            .base_params(vec!["from".into(), "to".into()])
            .start_index(3)
            .build()
            .unwrap();
        composer
            .add_reimbursement_status(ReimbursementStatus::Reimbursed)
            .unwrap()
            .add_range(Some(NumericRange { min: 10.0, max: 20.0 }), "price")
            .unwrap()
            .add_generic_status(GenericStatus::Generic)
            .unwrap();
        assert_eq!(composer.pending_param_count(), 2);
        let filter = composer.finish();
        assert_eq!(
            filter.conditions(),
            "AND ((mv.is_reimbursable = true) AND (price >= $3 AND price <= $4) \
             AND (mv.generic_status = 'GÉNÉRIQUE'))"
        );
        assert_eq!(filter.params()[2], ParamValue::Float(10.0));
        assert_eq!(filter.params()[3], ParamValue::Float(20.0));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mapping = ColumnMapping::standard();
        let mut composer = PredicateComposer::new(&mapping);
        let err = composer
            .add_range(Some(NumericRange { min: 20.0, max: 10.0 }), "price")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRange);
        let err = composer
            .add_range(Some(NumericRange { min: 1.0, max: 2.0 }), "price) OR (TRUE")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidColumn);
        assert!(composer.is_empty());
    }

    #[test]
    fn test_named_range() {
        let mapping = ColumnMapping::standard();
        let mut composer = PredicateComposer::new(&mapping);
        composer
            .add_named_range("stock", Some(NumericRange { min: 0.0, max: 5.0 }))
            .unwrap();
        let err = composer
            .add_named_range("velocity", Some(NumericRange { min: 0.0, max: 1.0 }))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnmappedDimension);
        assert_eq!(
            composer.finish().conditions(),
            "AND ((mv.stock >= $1 AND mv.stock <= $2))"
        );
    }

    #[test]
    fn test_start_index_mismatch() {
        let mapping = ColumnMapping::standard();
        let err = PredicateComposer::builder(&mapping)
            .base_params(vec![ParamValue::Null])
            .start_index(3)
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StartIndexMismatch);
    }

    #[test]
    fn test_unmapped_strict_and_lenient() {
        let mapping = ColumnMapping::builder()
            .without(Dimension::Laboratory)
            .build()
            .unwrap();

        let mut strict = PredicateComposer::new(&mapping);
        let err = strict.add_laboratories(&["LabX"]).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnmappedDimension);
        assert!(strict.is_empty());

        let mut lenient = PredicateComposer::builder(&mapping)
            .options(ComposerOptions::lenient())
            .build()
            .unwrap();
        lenient
            .add_laboratories(&["LabX"])
            .unwrap()
            .add_products(&["C"])
            .unwrap();
        assert_eq!(
            lenient.finish().conditions(),
            "AND ((mv.code_13_ref = ANY($1::text[])))"
        );
    }

    #[test]
    fn test_unknown_category_strict_leaves_composer_unchanged() {
        let mapping = ColumnMapping::standard();
        let mut composer = PredicateComposer::new(&mapping);
        composer.add_pharmacies(&["P1"]).unwrap();
        let err = composer
            .add_categories(&[
                CategorySelection::at("A", CategoryLevel::Level0),
                CategorySelection::new("Z", "brand"),
            ])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownCategoryLevel);
        assert_eq!(composer.group_count(), 1);
        assert_eq!(composer.pending_param_count(), 1);
    }

    #[test]
    fn test_lenient_all_categories_dropped() {
        let mapping = ColumnMapping::standard();
        let mut composer = PredicateComposer::builder(&mapping)
            .options(ComposerOptions::lenient())
            .build()
            .unwrap();
        composer.add_categories(&[CategorySelection::new("Z", "brand")]).unwrap();
        assert!(composer.is_empty());
    }

    #[test]
    fn test_placeholders_match_params() {
        let mapping = ColumnMapping::standard();
        let mut composer = PredicateComposer::builder(&mapping)
            .base_params(vec!["a".into(), "b".into(), "c".into()])
            .operators(OperatorChain::parse_lenient(&["OR", "OR", "AND"]))
            .build()
            .unwrap();
        composer
            .add_excluded_laboratories(&["LabQ"])
            .unwrap()
            .add_pharmacies(&["P1", "P2"])
            .unwrap()
            .add_categories(&[
                CategorySelection::at("A", CategoryLevel::Level0),
                CategorySelection::at("F", CategoryLevel::Family),
            ])
            .unwrap()
            .add_reimbursement_status(ReimbursementStatus::NotReimbursed)
            .unwrap()
            .add_excluded_categories(&[CategorySelection::at("Q", CategoryLevel::Level3)])
            .unwrap()
            .add_range(Some(NumericRange { min: 1.0, max: 9.0 }), "mv.margin")
            .unwrap();

        let filter = composer.finish();
        let indices = placeholders(filter.conditions());
        assert_eq!(indices, (4..=filter.params().len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_append_to() {
        let mapping = ColumnMapping::standard();
        let mut composer = PredicateComposer::builder(&mapping)
            .base_params(vec!["2024-01-01".into()])
            .build()
            .unwrap();
        composer.add_pharmacies(&["P1"]).unwrap();
        let filter = composer.finish();
        assert_eq!(
            filter.append_to("SELECT 1 FROM mv WHERE mv.date >= $1 "),
            "SELECT 1 FROM mv WHERE mv.date >= $1 AND ((mv.pharmacy_id = ANY($2::uuid[])))"
        );
        let empty = PredicateComposer::new(&mapping).finish();
        assert_eq!(empty.append_to("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_generic_group_seams() {
        let mapping = ColumnMapping::standard();
        let mut composer = composer_with_ops(&mapping, &["OR"]);
        composer
            .add_exclusion_group(vec![ParamValue::Int(7)], |i| {
                format!("o.id <> ALL(${}::int[])", i)
            })
            .add_inclusion_group(vec!["x".into()], |i| format!("o.kind = ANY(${}::text[])", i))
            .add_inclusion_group(Vec::new(), |_| unreachable!());
        let (conditions, params) = composer.finish().into_parts();
        assert_eq!(
            conditions,
            "AND ((o.kind = ANY($1::text[])) AND (o.id <> ALL($2::int[])))"
        );
        assert_eq!(params[0], ParamValue::List(vec!["x".into()]));
    }
}
