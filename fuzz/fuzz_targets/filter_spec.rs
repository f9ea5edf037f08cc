//! Fuzz target for filter payload decoding.
//!
//! Arbitrary bytes are decoded as a `FilterSpec` and, when they decode,
//! applied to a lenient composer. Nothing here may panic, and every accepted
//! payload must yield placeholders `$1..$n` in order, one per parameter.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_filter_spec
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use pharmadash_filter::{ColumnMapping, ComposerOptions, FilterSpec, PredicateComposer};

fn placeholders(sql: &str) -> Vec<usize> {
    sql.split('$')
        .skip(1)
        .filter_map(|rest| {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(spec) = FilterSpec::from_json(json) else {
        return;
    };

    let mapping = ColumnMapping::standard();
    let Ok(composer) = PredicateComposer::builder(&mapping)
        .operators(spec.operator_chain())
        .options(ComposerOptions::lenient())
        .build()
    else {
        return;
    };

    let Ok(composer) = spec.apply(composer) else {
        return;
    };
    let filter = composer.finish();
    let expected: Vec<usize> = (1..=filter.params().len()).collect();
    assert_eq!(placeholders(filter.conditions()), expected);
});
