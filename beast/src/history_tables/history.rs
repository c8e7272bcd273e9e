use shakmaty::Color;
use shakmaty::Piece;
use shakmaty::Role;
use shakmaty::Square;

/// The history heuristic: a counter per (piece, target square) pair, bumped
/// by `depth^2` whenever a quiet move by that piece to that square causes a
/// beta cutoff. Quiet moves with no other claim to fame get ordered by it.
pub struct HistoryTable {
    scores: [[i32; 64]; 12],
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            scores: [[0; 64]; 12],
        }
    }

    pub fn add(&mut self, piece: Piece, to: Square, depth: i32) {
        self.scores[piece_index(piece)][to as usize] += depth * depth;
    }

    pub fn get(&self, piece: Piece, to: Square) -> i32 {
        self.scores[piece_index(piece)][to as usize]
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

fn piece_index(piece: Piece) -> usize {
    let role = match piece.role {
        Role::Pawn => 0,
        Role::Knight => 1,
        Role::Bishop => 2,
        Role::Rook => 3,
        Role::Queen => 4,
        Role::King => 5,
    };

    match piece.color {
        Color::White => role,
        Color::Black => role + 6,
    }
}
