//! # pharmadash-filter
//!
//! Dynamic predicate composition for the pharmacy analytics dashboard.
//!
//! Every analytical query receives the same family of optional filters
//! (pharmacies, laboratories, products, category hierarchy levels, TVA
//! rates, reimbursement and generic status, numeric ranges) along with
//! exclusion mirrors and a list of boolean operators. This crate turns
//! them into a single SQL fragment with PostgreSQL positional placeholders,
//! ready to append after the query's own `WHERE` clause:
//!
//! - one array parameter per list filter (`col = ANY($n::text[])`);
//! - exclusions rendered as `col <> ALL($n::text[])` and always `AND`-joined;
//! - categories grouped per hierarchy level into one `OR`ed group;
//! - enum filters rendered as literals from a closed set, never bound.
//!
//! ## Composing
//!
//! ```rust
//! use pharmadash_filter::prelude::*;
//!
//! let mapping = ColumnMapping::standard();
//! let spec = FilterSpec::from_json(r#"{
//!     "laboratories": ["LabX"],
//!     "categories": [{"code": "A01", "type": "level_0"}],
//!     "excludedProducts": ["3400930000001"],
//!     "operators": ["OR"]
//! }"#).unwrap();
//!
//! let composer = PredicateComposer::builder(&mapping)
//!     .base_params(vec!["2024-01-01".into()])
//!     .start_index(2)
//!     .operators(spec.operator_chain())
//!     .build()
//!     .unwrap();
//!
//! let filter = spec.apply(composer).unwrap().finish();
//! assert_eq!(
//!     filter.conditions(),
//!     "AND (((mv.laboratory_name = ANY($2::text[])) OR (mv.segment_l0 = ANY($3::text[]))) \
//!      AND (mv.code_13_ref <> ALL($4::text[])))"
//! );
//! assert_eq!(filter.params().len(), 4);
//! ```
//!
//! ## Configuration
//!
//! Column expressions and policies can be loaded from TOML, see
//! [`config::FilterConfig`].
//!
//! ## Logging
//!
//! Events go through `tracing`; [`logging::init`] installs a subscriber
//! when the `tracing-subscriber` feature is enabled.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod category;
pub mod composer;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod operator;
pub mod params;
pub mod range;
pub mod spec;
pub mod sql;
pub mod status;
pub mod value;

pub use category::{CategoryGroups, CategorySelection, group_by_level};
pub use composer::{
    ComposedFilter, ComposerBuilder, ComposerOptions, OperatorAdvance, PredicateComposer,
    UnmappedPolicy,
};
pub use config::{EnvironmentOverride, FilterConfig, MappingPreset};
pub use error::{ErrorCode, ErrorContext, FilterError, FilterResult};
pub use mapping::{CategoryLevel, ColumnMapping, ColumnMappingBuilder, Dimension};
pub use operator::{BoolOp, OperatorChain};
pub use params::ParamAllocator;
pub use range::NumericRange;
pub use spec::FilterSpec;
pub use sql::ArrayType;
pub use status::{GenericStatus, ReimbursementStatus};
pub use value::ParamValue;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::category::CategorySelection;
    pub use crate::composer::{ComposedFilter, ComposerOptions, PredicateComposer};
    pub use crate::config::FilterConfig;
    pub use crate::error::{FilterError, FilterResult};
    pub use crate::mapping::{CategoryLevel, ColumnMapping, Dimension};
    pub use crate::operator::{BoolOp, OperatorChain};
    pub use crate::range::NumericRange;
    pub use crate::spec::FilterSpec;
    pub use crate::status::{GenericStatus, ReimbursementStatus};
    pub use crate::value::ParamValue;
}
