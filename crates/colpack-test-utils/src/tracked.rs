//! Drop-tracking element values.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Shared record of which [`Tracked`] values have been dropped.
///
/// Cloning yields another handle onto the same record.
#[derive(Clone, Debug, Default)]
pub struct DropTally {
    drops: Arc<Mutex<BTreeMap<u64, usize>>>,
}

impl DropTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a value that reports to this tally when dropped.
    pub fn track(&self, id: u64) -> Tracked {
        Tracked {
            id,
            tally: self.clone(),
        }
    }

    /// Total drops recorded.
    pub fn total(&self) -> usize {
        self.drops
            .lock()
            .map(|drops| drops.values().sum())
            .unwrap_or(0)
    }

    /// How many times value `id` was dropped.
    pub fn drops_of(&self, id: u64) -> usize {
        self.drops
            .lock()
            .map(|drops| drops.get(&id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Ids dropped more than once, ascending.
    pub fn double_drops(&self) -> Vec<u64> {
        self.drops
            .lock()
            .map(|drops| {
                drops
                    .iter()
                    .filter(|&(_, &count)| count > 1)
                    .map(|(&id, _)| id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn record(&self, id: u64) {
        if let Ok(mut drops) = self.drops.lock() {
            *drops.entry(id).or_insert(0) += 1;
        }
    }
}

/// A value with drop glue that reports its own drop to a [`DropTally`].
///
/// Equality compares ids only.
#[derive(Debug)]
pub struct Tracked {
    pub id: u64,
    tally: DropTally,
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tracked {}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.tally.record(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_each_drop() {
        let tally = DropTally::new();
        let a = tally.track(1);
        let b = tally.track(2);
        drop(a);
        assert_eq!(tally.drops_of(1), 1);
        assert_eq!(tally.drops_of(2), 0);
        drop(b);
        assert_eq!(tally.total(), 2);
        assert!(tally.double_drops().is_empty());
    }

    #[test]
    fn tracked_equality_uses_id() {
        let tally = DropTally::new();
        assert_eq!(tally.track(3), tally.track(3));
        assert_ne!(tally.track(3), tally.track(4));
    }
}
