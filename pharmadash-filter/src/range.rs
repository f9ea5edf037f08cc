//! Closed numeric interval filters.

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::value::ParamValue;

/// A closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    /// Lower bound, inclusive.
    pub min: f64,
    /// Upper bound, inclusive.
    pub max: f64,
}

impl NumericRange {
    /// Create a validated range.
    pub fn new(min: f64, max: f64) -> FilterResult<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Reject non-finite bounds and inverted intervals.
    pub fn validate(&self) -> FilterResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(FilterError::invalid_range(self.min, self.max));
        }
        Ok(())
    }

    /// Whether `value` lies inside the interval.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Bound values in binding order: `min`, then `max`.
    pub(crate) fn bounds(&self) -> [ParamValue; 2] {
        [ParamValue::Float(self.min), ParamValue::Float(self.max)]
    }
}
