//! The transposition table.
//!
//! The search keeps running into positions it has already seen through a
//! different move order. Keyed by the position's zobrist hash, the table
//! remembers what the previous visit concluded: the score, how deep the
//! search below it went, whether that score was exact or just a bound, and
//! which move was best.
//!
//! The key is truncated to index into the table, so unrelated positions can
//! collide; the full hash is stored alongside the entry and checked on every
//! probe.

use crate::evaluate::Score;
use shakmaty::Move;

/// A flag that stores whether the entry corresponds to a PV, fail-high or
/// fail-low node. Or, equivalently, whether the score saved in the entry is
/// exact, an upper bound, or a lower bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeType {
    Exact,
    Upper,
    Lower,
}

/// A single TT entry.
#[derive(Debug, Clone)]
pub struct TTEntry {
    /// The full hash of the position the entry is for, to filter out
    /// colliding probes
    hash: u64,

    /// The best move found on the previous visit, if any improved alpha
    best_move: Option<Move>,

    /// The score of the previous search from this position
    score: Score,

    /// The remaining depth that score was searched to
    depth: i32,

    /// Whether `score` is exact or a bound
    node_type: NodeType,
}

impl TTEntry {
    pub fn new(
        hash: u64,
        best_move: Option<Move>,
        score: Score,
        depth: i32,
        node_type: NodeType,
    ) -> Self {
        Self {
            hash,
            best_move,
            score,
            depth,
            node_type,
        }
    }

    pub fn best_move(&self) -> Option<&Move> {
        self.best_move.as_ref()
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Try to use the stored score at a node searching to `depth` with the
    /// window `[alpha, beta]`. The score is only reusable when it was
    /// searched at least as deep as we're about to, and its bound type is
    /// conclusive for the current window.
    pub fn usable_score(&self, depth: i32, alpha: Score, beta: Score) -> Option<Score> {
        if self.depth < depth {
            return None;
        }

        match self.node_type {
            NodeType::Exact => Some(self.score),
            NodeType::Lower if self.score >= beta => Some(self.score),
            NodeType::Upper if self.score <= alpha => Some(self.score),
            _ => None,
        }
    }
}

/// The table itself: a fixed number of single-entry buckets.
pub struct TTable {
    entries: Vec<Option<TTEntry>>,
}

impl TTable {
    /// Create a table with the given number of entry slots.
    pub fn with_capacity(count: usize) -> Self {
        Self {
            entries: vec![None; count.max(1)],
        }
    }

    fn index(&self, hash: u64) -> usize {
        (hash % self.entries.len() as u64) as usize
    }

    /// Look up the entry for a position, if we stored one.
    pub fn probe(&self, hash: u64) -> Option<&TTEntry> {
        self.entries[self.index(hash)]
            .as_ref()
            .filter(|entry| entry.hash == hash)
    }

    /// Store an entry. Replacement prefers deeper searches; an incoming
    /// entry of equal depth wins the slot because it's more recent.
    pub fn insert(&mut self, entry: TTEntry) {
        let index = self.index(entry.hash);
        let slot = &mut self.entries[index];

        let keep_existing =
            matches!(slot, Some(existing) if entry.depth < existing.depth);

        if !keep_existing {
            *slot = Some(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_returns_what_was_inserted() {
        let mut table = TTable::with_capacity(16);

        table.insert(TTEntry::new(42, None, 100, 3, NodeType::Exact));

        let entry = table.probe(42).unwrap();
        assert_eq!(entry.usable_score(3, -1000, 1000), Some(100));
        assert_eq!(table.probe(43).map(|e| e.depth()), None);
    }

    #[test]
    fn colliding_hashes_do_not_alias() {
        let mut table = TTable::with_capacity(16);

        // 7 and 23 share a bucket in a 16-entry table
        table.insert(TTEntry::new(7, None, 100, 3, NodeType::Exact));

        assert!(table.probe(7).is_some());
        assert!(table.probe(23).is_none());
    }

    #[test]
    fn replacement_prefers_deeper_entries() {
        let mut table = TTable::with_capacity(16);

        table.insert(TTEntry::new(7, None, 100, 5, NodeType::Exact));
        table.insert(TTEntry::new(23, None, 200, 3, NodeType::Exact));

        // The shallower entry didn't evict the deeper one
        assert!(table.probe(7).is_some());
        assert!(table.probe(23).is_none());

        // An equally deep entry is more recent and takes the slot
        table.insert(TTEntry::new(23, None, 200, 5, NodeType::Exact));
        assert!(table.probe(23).is_some());
        assert!(table.probe(7).is_none());
    }

    #[test]
    fn bounds_are_respected() {
        let entry = TTEntry::new(1, None, 150, 4, NodeType::Lower);

        // A lower bound of 150 only cuts off when beta is below it
        assert_eq!(entry.usable_score(4, 0, 100), Some(150));
        assert_eq!(entry.usable_score(4, 0, 200), None);

        // Stored depth must cover the requested depth
        assert_eq!(entry.usable_score(5, 0, 100), None);

        let entry = TTEntry::new(1, None, -20, 4, NodeType::Upper);
        assert_eq!(entry.usable_score(4, 0, 100), Some(-20));
        assert_eq!(entry.usable_score(4, -50, 100), None);
    }
}
