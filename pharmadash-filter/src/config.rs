//! Filter configuration loaded from TOML.
//!
//! ```toml
//! preset = "standard"
//!
//! [columns]
//! pharmacy = "ip.pharmacy_id"
//! level_0 = "p.segment_l0"
//!
//! [ranges]
//! price = "mv.price_ttc"
//!
//! [options]
//! unmapped = "lenient"
//! operator_advance = "per_item"
//!
//! [environments.staging.columns]
//! laboratory = "stg.laboratory_name"
//! ```
//!
//! `${VAR}` references are replaced with the environment value before
//! parsing; unset variables are left as written.

use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::composer::ComposerOptions;
use crate::error::{FilterError, FilterResult};
use crate::mapping::{ColumnMapping, ColumnMappingBuilder, Dimension};

/// Mapping the configured columns are layered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingPreset {
    /// Start from [`ColumnMapping::standard`].
    #[default]
    Standard,
    /// Start from an empty mapping; only configured columns exist.
    Empty,
}

/// Root of a filter configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Base mapping.
    pub preset: MappingPreset,

    /// Dimension key → column expression overrides.
    pub columns: IndexMap<String, String>,

    /// Named range → column expression.
    pub ranges: IndexMap<String, String>,

    /// Composition policies.
    pub options: ComposerOptions,

    /// Per-environment overrides.
    pub environments: IndexMap<String, EnvironmentOverride>,
}

/// Overrides applied by [`FilterConfig::with_environment`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Column overrides, merged over the base ones.
    pub columns: IndexMap<String, String>,
    /// Range overrides, merged over the base ones.
    pub ranges: IndexMap<String, String>,
    /// Replacement policies.
    pub options: Option<ComposerOptions>,
}

impl FilterConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> FilterResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FilterError::invalid_config(format!("failed to read {}", path.display()))
                .with_value(path.display().to_string())
                .with_source(e)
        })?;

        debug!(path = %path.display(), "Loading filter configuration");
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> FilterResult<Self> {
        let expanded = expand_env_vars(content)?;
        Ok(toml::from_str(&expanded)?)
    }

    /// Merge the overrides of `env` into the base configuration.
    ///
    /// Unknown environments leave the configuration unchanged.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.shift_remove(env) {
            self.columns.extend(overrides.columns);
            self.ranges.extend(overrides.ranges);
            if let Some(options) = overrides.options {
                self.options = options;
            }
        }
        self
    }

    /// Build the column mapping described by this configuration.
    ///
    /// Unknown dimension keys and invalid column expressions are errors.
    pub fn column_mapping(&self) -> FilterResult<ColumnMapping> {
        let mut builder: ColumnMappingBuilder = match self.preset {
            MappingPreset::Standard => ColumnMapping::builder(),
            MappingPreset::Empty => ColumnMapping::empty_builder(),
        };

        for (key, expr) in &self.columns {
            let dimension = Dimension::from_str(key).map_err(|_| {
                FilterError::invalid_config(format!("unknown dimension `{}` in [columns]", key))
                    .with_value(key)
                    .with_help(
                        "Use pharmacy, laboratory, product, tva_rate, reimbursable, \
                         generic_status, level_0..level_5 or family",
                    )
            })?;
            builder = builder.column(dimension, expr);
        }
        for (name, expr) in &self.ranges {
            builder = builder.range_column(name, expr);
        }

        builder.build()
    }

    /// Composition policies.
    pub fn composer_options(&self) -> ComposerOptions {
        self.options
    }
}

/// Replace `${VAR}` with the value of `VAR` when it is set.
fn expand_env_vars(content: &str) -> FilterResult<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| FilterError::invalid_config("invalid variable pattern").with_source(e))?;

    Ok(re
        .replace_all(content, |caps: &regex_lite::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned())
}
