//! Fuzz target for filter configuration parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use pharmadash_filter::FilterConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(config) = FilterConfig::from_str(content) {
            // Any mapping that builds only holds validated identifiers.
            if let Ok(mapping) = config.column_mapping() {
                for (_, column) in mapping.dimensions() {
                    assert!(pharmadash_filter::sql::is_valid_column_expr(column));
                }
            }
        }
    }
});
