//! # Pharmadash
//!
//! Query building blocks for the pharmacy network analytics dashboard.
//!
//! Analytical endpoints share one filter vocabulary: pharmacies,
//! laboratories, products, category hierarchy levels, TVA rates,
//! reimbursement and generic status, numeric ranges, and the exclusion
//! mirror of each. The [`filter`] module composes them into a parameterized
//! SQL fragment that an endpoint appends to its own query.
//!
//! ## Quick Start
//!
//! ```rust
//! use pharmadash::prelude::*;
//!
//! let mapping = ColumnMapping::standard();
//! let spec = FilterSpec::from_json(
//!     r#"{"pharmacies": ["P1"], "laboratories": ["LabX"], "operators": ["OR"]}"#,
//! )?;
//!
//! let composer = PredicateComposer::builder(&mapping)
//!     .base_params(vec!["2024-01-01".into(), "2024-12-31".into()])
//!     .start_index(3)
//!     .operators(spec.operator_chain())
//!     .build()?;
//!
//! let filter = spec.apply(composer)?.finish();
//! let sql = filter.append_to("SELECT SUM(mv.quantity) FROM mv WHERE mv.day BETWEEN $1 AND $2");
//! assert!(sql.ends_with("OR (mv.laboratory_name = ANY($4::text[])))"));
//! # Ok::<(), pharmadash::FilterError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Predicate composition.
pub mod filter {
    pub use pharmadash_filter::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use pharmadash_filter::prelude::*;
}

// Re-export key types at the crate root
pub use filter::{
    ColumnMapping, FilterConfig, FilterError, FilterResult, FilterSpec, PredicateComposer,
};
