//! The filter payload sent by the dashboard.
//!
//! A [`FilterSpec`] is decoded from the request body and fed to a
//! [`PredicateComposer`] in a fixed order, so that the same payload always
//! produces the same fragment and the operator tokens line up with the
//! groups the UI displays.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::category::CategorySelection;
use crate::composer::PredicateComposer;
use crate::error::FilterResult;
use crate::operator::OperatorChain;
use crate::range::NumericRange;
use crate::status::{GenericStatus, ReimbursementStatus};

/// Every filter dimension the dashboard can send.
///
/// All fields are optional in the JSON payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    /// Pharmacy identifiers.
    pub pharmacies: Vec<String>,
    /// Laboratory names.
    pub laboratories: Vec<String>,
    /// Product codes.
    pub products: Vec<String>,
    /// TVA rates.
    pub tva_rates: Vec<f64>,
    /// Selected categories at any hierarchy level.
    pub categories: Vec<CategorySelection>,
    /// Reimbursement status.
    pub reimbursement_status: ReimbursementStatus,
    /// Generic/princeps status.
    pub generic_status: GenericStatus,
    /// Named ranges, applied in payload order.
    pub ranges: IndexMap<String, NumericRange>,
    /// Pharmacies to exclude.
    pub excluded_pharmacies: Vec<String>,
    /// Laboratories to exclude.
    pub excluded_laboratories: Vec<String>,
    /// Products to exclude.
    pub excluded_products: Vec<String>,
    /// Categories to exclude.
    pub excluded_categories: Vec<CategorySelection>,
    /// TVA rates to exclude.
    pub excluded_tva_rates: Vec<f64>,
    /// Operator tokens joining consecutive inclusion groups.
    pub operators: Vec<String>,
}

impl FilterSpec {
    /// Decode a JSON payload.
    pub fn from_json(json: &str) -> FilterResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Operator tokens as a lenient chain; unknown tokens read as `AND`.
    pub fn operator_chain(&self) -> OperatorChain {
        OperatorChain::parse_lenient(&self.operators)
    }

    /// Whether the payload selects nothing.
    pub fn is_empty(&self) -> bool {
        self.pharmacies.is_empty()
            && self.laboratories.is_empty()
            && self.products.is_empty()
            && self.tva_rates.is_empty()
            && self.categories.is_empty()
            && self.reimbursement_status == ReimbursementStatus::All
            && self.generic_status == GenericStatus::All
            && self.ranges.is_empty()
            && self.excluded_pharmacies.is_empty()
            && self.excluded_laboratories.is_empty()
            && self.excluded_products.is_empty()
            && self.excluded_categories.is_empty()
            && self.excluded_tva_rates.is_empty()
    }

    /// Feed every dimension to `composer`.
    ///
    /// Inclusions go first (pharmacies, laboratories, categories, products,
    /// TVA rates, reimbursement, generic status, named ranges), then the
    /// exclusions in the same order. The composer is handed back only when
    /// every dimension was accepted; on error it is dropped, so a rejected
    /// payload never yields a partial predicate.
    pub fn apply<'m>(
        &self,
        mut composer: PredicateComposer<'m>,
    ) -> FilterResult<PredicateComposer<'m>> {
        composer
            .add_pharmacies(&self.pharmacies)?
            .add_laboratories(&self.laboratories)?
            .add_categories(&self.categories)?
            .add_products(&self.products)?
            .add_tva_rates(&self.tva_rates)?
            .add_reimbursement_status(self.reimbursement_status)?
            .add_generic_status(self.generic_status)?;

        for (name, range) in &self.ranges {
            composer.add_named_range(name, Some(*range))?;
        }

        composer
            .add_excluded_pharmacies(&self.excluded_pharmacies)?
            .add_excluded_laboratories(&self.excluded_laboratories)?
            .add_excluded_categories(&self.excluded_categories)?
            .add_excluded_products(&self.excluded_products)?
            .add_excluded_tva_rates(&self.excluded_tva_rates)?;

        Ok(composer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::mapping::ColumnMapping;
    use pretty_assertions::assert_eq;

    const PAYLOAD: &str = r#"{
        "pharmacies": ["P1"],
        "laboratories": ["LabX", "LabY"],
        "categories": [{"code": "A01", "type": "level_0"}, {"code": "F3", "type": "family"}],
        "reimbursementStatus": "REIMBURSED",
        "ranges": {"price": {"min": 5, "max": 50}},
        "excludedProducts": ["3400930000001"],
        "operators": ["OR", "AND", "or"]
    }"#;

    #[test]
    fn test_from_json() {
        let spec = FilterSpec::from_json(PAYLOAD).unwrap();
        assert_eq!(spec.laboratories, vec!["LabX", "LabY"]);
        assert_eq!(spec.categories[1], CategorySelection::new("F3", "family"));
        assert_eq!(spec.reimbursement_status, ReimbursementStatus::Reimbursed);
        assert_eq!(spec.generic_status, GenericStatus::All);
        assert_eq!(spec.ranges["price"], NumericRange { min: 5.0, max: 50.0 });
        assert_eq!(spec.operator_chain().len(), 3);
        assert!(!spec.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let spec = FilterSpec::from_json("{}").unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec, FilterSpec::default());
    }

    #[test]
    fn test_invalid_payload() {
        let err = FilterSpec::from_json(r#"{"genericStatus": "BIOSIMILAR"}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSpec);
        assert!(FilterSpec::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_apply_order() {
        let spec = FilterSpec::from_json(PAYLOAD).unwrap();
        let mapping = ColumnMapping::standard();
        let composer = PredicateComposer::builder(&mapping)
            .base_params(vec!["2024-01-01".into(), "2024-12-31".into()])
            .operators(spec.operator_chain())
            .build()
            .unwrap();
        let composer = spec.apply(composer).unwrap();
        assert_eq!(composer.group_count(), 6);

        let filter = composer.finish();
        assert_eq!(
            filter.conditions(),
            "AND (((mv.pharmacy_id = ANY($3::uuid[])) \
             OR (mv.laboratory_name = ANY($4::text[])) \
             AND ((mv.segment_l0 = ANY($5::text[])) OR (mv.family = ANY($6::text[]))) \
             OR (mv.is_reimbursable = true) \
             AND (mv.sell_price >= $7 AND mv.sell_price <= $8)) \
             AND (mv.code_13_ref <> ALL($9::text[])))"
        );
        assert_eq!(filter.params().len(), 9);
    }

    #[test]
    fn test_apply_stops_on_unknown_range() {
        let spec =
            FilterSpec::from_json(r#"{"ranges": {"velocity": {"min": 0, "max": 1}}}"#).unwrap();
        let mapping = ColumnMapping::standard();
        let err = spec.apply(PredicateComposer::new(&mapping)).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnmappedDimension);
    }

    #[test]
    fn test_rejected_payload_leaves_no_partial_predicate() {
        let spec = FilterSpec::from_json(
            r#"{
                "pharmacies": ["P1"],
                "laboratories": ["LabX"],
                "categories": [{"code": "Z", "type": "+3"}]
            }"#,
        )
        .unwrap();
        let mapping = ColumnMapping::standard();
        let err = spec.apply(PredicateComposer::new(&mapping)).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownCategoryLevel);

        // The same payload without the bad selection composes normally.
        let spec = FilterSpec {
            categories: Vec::new(),
            ..spec
        };
        let composer = spec.apply(PredicateComposer::new(&mapping)).unwrap();
        let filter = composer.finish();
        assert_eq!(filter.params().len(), 2);
    }
}
