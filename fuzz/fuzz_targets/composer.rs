//! Fuzz target for placeholder/parameter correspondence.
//!
//! Drives the composer with arbitrary call sequences and checks that the
//! fragment's placeholders run from the start index to the last parameter,
//! each exactly once, in order of appearance.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_composer
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pharmadash_filter::{
    CategorySelection, ColumnMapping, ComposerOptions, GenericStatus, NumericRange,
    OperatorAdvance, OperatorChain, ParamValue, PredicateComposer, ReimbursementStatus,
};

#[derive(Debug, Arbitrary)]
enum FuzzCall {
    Pharmacies(Vec<String>),
    Laboratories(Vec<String>),
    Products(Vec<String>),
    TvaRates(Vec<f64>),
    Categories(Vec<(String, u8)>),
    Reimbursement(u8),
    Generic(u8),
    Range(f64, f64),
    NamedRange(bool, f64, f64),
    ExcludedPharmacies(Vec<String>),
    ExcludedLaboratories(Vec<String>),
    ExcludedProducts(Vec<String>),
    ExcludedTvaRates(Vec<f64>),
    ExcludedCategories(Vec<(String, u8)>),
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    base_len: u8,
    operators: Vec<String>,
    lenient: bool,
    per_item: bool,
    calls: Vec<FuzzCall>,
}

const LEVEL_TYPES: [&str; 9] = [
    "level_0", "level_1", "level_2", "level_3", "level_4", "level_5", "family", "brand", "",
];

fn selections(raw: &[(String, u8)]) -> Vec<CategorySelection> {
    raw.iter()
        .map(|(code, t)| {
            CategorySelection::new(code.clone(), LEVEL_TYPES[*t as usize % LEVEL_TYPES.len()])
        })
        .collect()
}

fn placeholders(sql: &str) -> Vec<usize> {
    sql.split('$')
        .skip(1)
        .filter_map(|rest| {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
        .collect()
}

fuzz_target!(|input: FuzzInput| {
    let mapping = ColumnMapping::standard();
    let base_len = input.base_len as usize % 8;
    let options = if input.lenient {
        ComposerOptions::lenient()
    } else {
        ComposerOptions::strict()
    };
    let options = if input.per_item {
        options.with_operator_advance(OperatorAdvance::PerItem)
    } else {
        options
    };

    let Ok(mut composer) = PredicateComposer::builder(&mapping)
        .base_params(vec![ParamValue::Null; base_len])
        .start_index(base_len + 1)
        .operators(OperatorChain::parse_lenient(&input.operators))
        .options(options)
        .build()
    else {
        panic!("start index equal to base length + 1 must be accepted");
    };

    for call in &input.calls {
        // Errors leave the composer unchanged; keep going.
        let _ = match call {
            FuzzCall::Pharmacies(v) => composer.add_pharmacies(v).map(|_| ()),
            FuzzCall::Laboratories(v) => composer.add_laboratories(v).map(|_| ()),
            FuzzCall::Products(v) => composer.add_products(v).map(|_| ()),
            FuzzCall::TvaRates(v) => composer.add_tva_rates(v).map(|_| ()),
            FuzzCall::Categories(v) => composer.add_categories(&selections(v)).map(|_| ()),
            FuzzCall::Reimbursement(n) => {
                let status = match n % 3 {
                    0 => ReimbursementStatus::Reimbursed,
                    1 => ReimbursementStatus::NotReimbursed,
                    _ => ReimbursementStatus::All,
                };
                composer.add_reimbursement_status(status).map(|_| ())
            }
            FuzzCall::Generic(n) => {
                let status = match n % 4 {
                    0 => GenericStatus::Generic,
                    1 => GenericStatus::Princeps,
                    2 => GenericStatus::PrincepsGeneric,
                    _ => GenericStatus::All,
                };
                composer.add_generic_status(status).map(|_| ())
            }
            FuzzCall::Range(min, max) => composer
                .add_range(Some(NumericRange { min: *min, max: *max }), "mv.sell_price")
                .map(|_| ()),
            FuzzCall::NamedRange(known, min, max) => {
                let name = if *known { "stock" } else { "velocity" };
                composer
                    .add_named_range(name, Some(NumericRange { min: *min, max: *max }))
                    .map(|_| ())
            }
            FuzzCall::ExcludedPharmacies(v) => composer.add_excluded_pharmacies(v).map(|_| ()),
            FuzzCall::ExcludedLaboratories(v) => composer.add_excluded_laboratories(v).map(|_| ()),
            FuzzCall::ExcludedProducts(v) => composer.add_excluded_products(v).map(|_| ()),
            FuzzCall::ExcludedTvaRates(v) => composer.add_excluded_tva_rates(v).map(|_| ()),
            FuzzCall::ExcludedCategories(v) => {
                composer.add_excluded_categories(&selections(v)).map(|_| ())
            }
        };
    }

    let filter = composer.finish();
    let expected: Vec<usize> = (base_len + 1..=filter.params().len()).collect();
    assert_eq!(placeholders(filter.conditions()), expected);
});
