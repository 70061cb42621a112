//! Per-decision transposition table

use rustc_hash::FxHashMap;

/// How a stored score relates to the true value of the node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Search completed inside the window: the score is exact
    Exact,
    /// Fail-high: the true value is at least this score
    Lower,
    /// Fail-low: the true value is at most this score
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub depth: u32,
    pub score: f32,
    pub bound: Bound,
}

/// Memo of searched positions, keyed by position fingerprint. Scoped to a
/// single decision: [`TranspositionTable::clear`] runs before every
/// top-level search so stale cross-decision entries can never leak in.
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: FxHashMap<u64, Entry>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a result, keeping whichever entry searched deeper
    pub fn store(&mut self, key: u64, depth: u32, score: f32, bound: Bound) {
        match self.entries.get(&key) {
            Some(existing) if existing.depth > depth => {}
            _ => {
                self.entries.insert(key, Entry { depth, score, bound });
            }
        }
    }

    /// Look up a usable score for a node searched to at least `depth`,
    /// honoring bound semantics against the current alpha-beta window.
    pub fn probe(&self, key: u64, depth: u32, alpha: f32, beta: f32) -> Option<f32> {
        let entry = self.entries.get(&key)?;
        if entry.depth < depth {
            return None;
        }
        match entry.bound {
            Bound::Exact => Some(entry.score),
            Bound::Lower if entry.score >= beta => Some(entry.score),
            Bound::Upper if entry.score <= alpha => Some(entry.score),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_entries_always_usable() {
        let mut tt = TranspositionTable::new();
        tt.store(1, 3, 42.0, Bound::Exact);
        assert_eq!(tt.probe(1, 3, -100.0, 100.0), Some(42.0));
        assert_eq!(tt.probe(1, 2, -100.0, 100.0), Some(42.0));
        // Deeper requirement than what was searched: not usable
        assert_eq!(tt.probe(1, 4, -100.0, 100.0), None);
        assert_eq!(tt.probe(2, 1, -100.0, 100.0), None);
    }

    #[test]
    fn test_bound_semantics() {
        let mut tt = TranspositionTable::new();
        tt.store(1, 3, 50.0, Bound::Lower);
        // A lower bound only cuts when it already beats beta
        assert_eq!(tt.probe(1, 3, 0.0, 40.0), Some(50.0));
        assert_eq!(tt.probe(1, 3, 0.0, 60.0), None);

        tt.store(2, 3, -50.0, Bound::Upper);
        // An upper bound only cuts when it cannot reach alpha
        assert_eq!(tt.probe(2, 3, -40.0, 0.0), Some(-50.0));
        assert_eq!(tt.probe(2, 3, -60.0, 0.0), None);
    }

    #[test]
    fn test_deeper_entry_wins() {
        let mut tt = TranspositionTable::new();
        tt.store(1, 5, 10.0, Bound::Exact);
        tt.store(1, 2, 99.0, Bound::Exact);
        assert_eq!(tt.probe(1, 4, -100.0, 100.0), Some(10.0));

        tt.store(1, 6, 11.0, Bound::Exact);
        assert_eq!(tt.probe(1, 6, -100.0, 100.0), Some(11.0));
    }

    #[test]
    fn test_clear_between_decisions() {
        let mut tt = TranspositionTable::new();
        tt.store(1, 1, 1.0, Bound::Exact);
        assert!(!tt.is_empty());
        tt.clear();
        assert!(tt.is_empty());
        assert_eq!(tt.probe(1, 0, -1.0, 1.0), None);
    }
}
