//! Power-of-two column alignment.

use std::fmt;

/// Alignment applied to a column when no override is configured.
pub const DEFAULT_ALIGNMENT: usize = 4;

/// A byte alignment that is always a non-zero power of two.
///
/// Constructed through [`Alignment::new`], which rejects every other value,
/// so code holding an `Alignment` never re-checks the invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alignment(usize);

impl Alignment {
    /// The default column alignment ([`DEFAULT_ALIGNMENT`] bytes).
    pub const DEFAULT: Alignment = Alignment(DEFAULT_ALIGNMENT);

    /// Single-byte alignment.
    pub const ONE: Alignment = Alignment(1);

    /// Validate `bytes` as an alignment. Returns `None` unless it is a
    /// power of two.
    pub const fn new(bytes: usize) -> Option<Self> {
        if bytes.is_power_of_two() {
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// The natural alignment of `T`.
    pub const fn of<T>() -> Self {
        Self(std::mem::align_of::<T>())
    }

    /// Alignment in bytes.
    pub const fn get(self) -> usize {
        self.0
    }

    /// Round `addr` up to the next multiple of this alignment.
    ///
    /// Returns `None` if the rounded address does not fit in `usize`.
    pub const fn align_up(self, addr: usize) -> Option<usize> {
        let mask = self.0 - 1;
        match addr.checked_add(mask) {
            Some(bumped) => Some(bumped & !mask),
            None => None,
        }
    }

    /// Whether `addr` is a multiple of this alignment.
    pub const fn is_aligned(self, addr: usize) -> bool {
        addr & (self.0 - 1) == 0
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.0)
    }
}
