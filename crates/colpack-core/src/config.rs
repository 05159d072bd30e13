//! Container configuration.

use smallvec::SmallVec;

use crate::align::{Alignment, DEFAULT_ALIGNMENT};
use crate::error::ArraysError;

/// How `append` and `insert_at` grow a full container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrowthPolicy {
    /// Reserve exactly one more slot. Every append into a full container
    /// replaces the buffer.
    #[default]
    Exact,
    /// Reserve `max(len + 1, 2 * capacity, MIN_NON_ZERO_CAPACITY)` slots.
    Doubling,
}

impl GrowthPolicy {
    /// Smallest capacity the doubling policy allocates.
    pub const MIN_NON_ZERO_CAPACITY: usize = 4;

    /// Capacity to reserve so that `required` slots fit, starting from
    /// `capacity`. Returns `capacity` unchanged if `required` already fits.
    pub fn next_capacity(self, capacity: usize, required: usize) -> usize {
        if required <= capacity {
            return capacity;
        }
        match self {
            Self::Exact => required,
            Self::Doubling => required
                .max(capacity.saturating_mul(2))
                .max(Self::MIN_NON_ZERO_CAPACITY),
        }
    }
}

/// Configuration for a packed-column container.
///
/// Alignment values are stored raw and validated by
/// [`ArraysConfig::validate`] when the container is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArraysConfig {
    /// Alignment for columns without an override. Default: 4 bytes.
    pub default_alignment: usize,

    /// Per-column `(column, bytes)` overrides. When a column appears more
    /// than once the last entry wins.
    pub column_alignments: SmallVec<[(usize, usize); 4]>,

    /// Growth strategy for `append`/`insert_at`.
    pub growth: GrowthPolicy,
}

impl ArraysConfig {
    /// Default configuration: 4-byte alignment, exact growth.
    pub fn new() -> Self {
        Self {
            default_alignment: DEFAULT_ALIGNMENT,
            column_alignments: SmallVec::new(),
            growth: GrowthPolicy::Exact,
        }
    }

    /// Override the alignment of one column.
    pub fn with_alignment(mut self, column: usize, bytes: usize) -> Self {
        self.column_alignments.push((column, bytes));
        self
    }

    /// Set the alignment used by columns without an override.
    pub fn with_default_alignment(mut self, bytes: usize) -> Self {
        self.default_alignment = bytes;
        self
    }

    /// Set the growth policy.
    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Check this configuration against a container with `columns` columns.
    pub fn validate(&self, columns: usize) -> Result<(), ArraysError> {
        self.resolve_alignments(columns).map(|_| ())
    }

    /// Validate and return the requested alignment of each column, in
    /// column order.
    pub fn resolve_alignments(
        &self,
        columns: usize,
    ) -> Result<SmallVec<[Alignment; 8]>, ArraysError> {
        let default =
            Alignment::new(self.default_alignment).ok_or(ArraysError::InvalidAlignment {
                column: None,
                align: self.default_alignment,
            })?;
        let mut resolved: SmallVec<[Alignment; 8]> = SmallVec::from_elem(default, columns);
        for &(column, bytes) in &self.column_alignments {
            let slot = resolved
                .get_mut(column)
                .ok_or(ArraysError::UnknownColumn { column, columns })?;
            *slot = Alignment::new(bytes).ok_or(ArraysError::InvalidAlignment {
                column: Some(column),
                align: bytes,
            })?;
        }
        Ok(resolved)
    }
}

impl Default for ArraysConfig {
    fn default() -> Self {
        Self::new()
    }
}
