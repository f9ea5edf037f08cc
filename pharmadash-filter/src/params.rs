//! Positional parameter allocation.
//!
//! Every value that ends up behind a `$n` placeholder goes through a
//! [`ParamAllocator`], so the emitted indices and the parameter array
//! always agree.

use crate::value::ParamValue;

/// Owns the ordered parameter array and the next free placeholder index.
///
/// The counter continues after the enclosing query's own fixed parameters,
/// which are passed in as `base` and kept at the front of the array.
#[derive(Debug)]
pub struct ParamAllocator {
    params: Vec<ParamValue>,
    base_len: usize,
}

impl ParamAllocator {
    /// Create an allocator whose first placeholder follows `base`.
    pub fn new(base: Vec<ParamValue>) -> Self {
        let base_len = base.len();
        Self {
            params: base,
            base_len,
        }
    }

    /// Bind a value and return its placeholder index.
    pub fn bind(&mut self, value: impl Into<ParamValue>) -> usize {
        self.params.push(value.into());
        self.params.len()
    }

    /// The index the next bound value will receive.
    pub fn next_index(&self) -> usize {
        self.params.len() + 1
    }

    /// All parameters, base first.
    pub fn params(&self) -> &[ParamValue] {
        &self.params
    }

    /// Total number of parameters, base included.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if there are no parameters at all.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of values bound after the base parameters.
    pub fn bound_count(&self) -> usize {
        self.params.len() - self.base_len
    }

    /// Number of base parameters supplied by the enclosing query.
    pub fn base_len(&self) -> usize {
        self.base_len
    }

    /// Consume the allocator, returning the parameter array.
    pub fn into_params(self) -> Vec<ParamValue> {
        self.params
    }
}

impl Default for ParamAllocator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
