//! The search-local tables that carry move-ordering knowledge between
//! branches of a single search: killer moves per ply, and the history
//! counters for quiet moves. Both are created fresh for every `go` command.

use crate::search::params::MAX_DEPTH;
use killers::Killers;
use shakmaty::Move;
use shakmaty::Piece;
use shakmaty::Square;

pub mod history;
pub mod killers;
pub mod pv;

use history::HistoryTable;

pub struct History {
    killers: Vec<Killers>,
    table: HistoryTable,
}

impl History {
    pub fn new() -> Self {
        Self {
            killers: (0..MAX_DEPTH).map(|_| Killers::new()).collect(),
            table: HistoryTable::new(),
        }
    }

    /// Record a quiet move that caused a beta cutoff at the given ply.
    pub fn add_killer(&mut self, ply: usize, mv: Move) {
        if let Some(killers) = self.killers.get_mut(ply) {
            killers.add(mv);
        }
    }

    /// Where the move ranks among this ply's killers, if at all.
    pub fn killer_index(&self, ply: usize, mv: &Move) -> Option<usize> {
        self.killers.get(ply).and_then(|killers| killers.index_of(mv))
    }

    /// Credit a quiet cutoff move with `depth^2` history points.
    pub fn add_cutoff(&mut self, piece: Piece, to: Square, depth: i32) {
        self.table.add(piece, to, depth);
    }

    /// The accumulated history score for moving this piece to this square.
    pub fn score(&self, piece: Piece, to: Square) -> i32 {
        self.table.get(piece, to)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
