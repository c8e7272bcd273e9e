//! The classical, hand-crafted evaluation.
//!
//! A sum of material values and positional bonuses, derived from human
//! knowledge: pawns want to advance and stay central, pieces want to occupy
//! the center and crowd the enemy king, rooks want central files, and kings
//! want shelter until the queens come off.

use crate::evaluate::piece_value;
use crate::evaluate::Score;
use crate::position::Position;
use shakmaty::Color;
use shakmaty::Role;
use shakmaty::Square;

// Parameter weights for the positional bonuses
const PAWN_RANK_WEIGHT: Score = 7;
const PAWN_FILE_WEIGHT: Score = 5;
const PAWN_CENTER_WEIGHT: Score = 5;
const PAWN_DISTANCE_WEIGHT: Score = 5;

const KNIGHT_CENTER_WEIGHT: Score = 7;
const KNIGHT_DISTANCE_WEIGHT: Score = 8;

const BISHOP_CENTER_WEIGHT: Score = 5;
const BISHOP_DISTANCE_WEIGHT: Score = 8;

const ROOK_CENTER_WEIGHT: Score = 8;
const ROOK_DISTANCE_WEIGHT: Score = 5;

const QUEEN_CENTER_WEIGHT: Score = 2;
const QUEEN_DISTANCE_WEIGHT: Score = 8;

const KING_CENTER_WEIGHT: Score = 8;
const KING_DISTANCE_WEIGHT: Score = 5;

/// Evaluate the position, from the side to move's perspective.
pub fn evaluate(pos: &Position) -> Score {
    use Color::*;

    let (Some(white_king), Some(black_king)) = (pos.king(White), pos.king(Black)) else {
        return Score::default();
    };

    let evaluation = material(pos, White) - material(pos, Black)
        + side_bonus(pos, White, black_king)
        - side_bonus(pos, Black, white_king);

    if pos.turn() == Black {
        -evaluation
    } else {
        evaluation
    }
}

/// The summed material value of one side's pieces.
fn material(pos: &Position, color: Color) -> Score {
    use Role::*;

    [Pawn, Knight, Bishop, Rook, Queen]
        .into_iter()
        .map(|role| pos.pieces(role, color).count() as Score * piece_value(role))
        .sum()
}

/// The positional bonuses for all of one side's pieces.
fn side_bonus(pos: &Position, color: Color, enemy_king: Square) -> Score {
    use Role::*;

    let mut bonus = 0;

    for pawn in pos.pieces(Pawn, color) {
        bonus += pawn_bonus(pawn, color, enemy_king);
    }

    for knight in pos.pieces(Knight, color) {
        bonus += center_bonus(knight, KNIGHT_CENTER_WEIGHT);
        bonus += king_distance_bonus(knight, enemy_king, KNIGHT_DISTANCE_WEIGHT);
    }

    for bishop in pos.pieces(Bishop, color) {
        bonus += center_bonus(bishop, BISHOP_CENTER_WEIGHT);
        bonus += king_distance_bonus(bishop, enemy_king, BISHOP_DISTANCE_WEIGHT);
    }

    for rook in pos.pieces(Rook, color) {
        bonus += rook_file_bonus(rook);
        bonus += king_distance_bonus(rook, enemy_king, ROOK_DISTANCE_WEIGHT);
    }

    for queen in pos.pieces(Queen, color) {
        bonus += center_bonus(queen, QUEEN_CENTER_WEIGHT);
        bonus += king_distance_bonus(queen, enemy_king, QUEEN_DISTANCE_WEIGHT);
    }

    if let Some(king) = pos.king(color) {
        bonus += king_bonus(pos, king, enemy_king, color);
    }

    bonus
}

/// Bonuses for a single pawn: advancement, file centrality, center
/// occupation, and proximity to the enemy king.
fn pawn_bonus(pawn: Square, color: Color, enemy_king: Square) -> Score {
    let rank = pawn.rank() as Score;
    let file = pawn.file() as Score;
    let mut bonus = 0;

    // Rank bonus: the further forward the pawn, the bigger the bonus
    if color == Color::White {
        bonus += (rank - 1) * PAWN_RANK_WEIGHT;
    } else {
        bonus += (6 - rank) * PAWN_RANK_WEIGHT;
    }

    // File penalty: central files take none, the closer to the rim the less
    // the pawn is worth
    if file < 3 {
        bonus -= (3 - file) * PAWN_FILE_WEIGHT;
    } else if file > 4 {
        bonus -= (file - 4) * PAWN_FILE_WEIGHT;
    }

    bonus += center_bonus(pawn, PAWN_CENTER_WEIGHT);
    bonus += king_distance_bonus(pawn, enemy_king, PAWN_DISTANCE_WEIGHT);

    bonus
}

/// Rooks get a stepwise bonus for file centrality.
fn rook_file_bonus(rook: Square) -> Score {
    let file = rook.file() as Score;
    let mut bonus = 0;

    if (3..5).contains(&file) {
        bonus += ROOK_CENTER_WEIGHT;
    }
    if (2..6).contains(&file) {
        bonus += ROOK_CENTER_WEIGHT;
    }
    if (1..7).contains(&file) {
        bonus += ROOK_CENTER_WEIGHT;
    }

    bonus
}

/// The king only wants the center once the opposing queens are gone;
/// otherwise centralizing is a liability.
fn king_bonus(pos: &Position, king: Square, enemy_king: Square, color: Color) -> Score {
    let enemy_queens = pos.pieces(Role::Queen, color.other());

    let center_weight = if enemy_queens.is_empty() {
        KING_CENTER_WEIGHT
    } else {
        -KING_CENTER_WEIGHT
    };

    center_bonus(king, center_weight) + king_distance_bonus(king, enemy_king, KING_DISTANCE_WEIGHT)
}

/// Bonus for occupying squares close to the center, in three concentric
/// rings: the inner four squares count triple, the next ring double, the
/// ring inside the rim single.
fn center_bonus(square: Square, weight: Score) -> Score {
    let rank = square.rank() as Score;
    let file = square.file() as Score;

    if (3..5).contains(&rank) && (3..5).contains(&file) {
        3 * weight
    } else if (2..6).contains(&rank) && (2..6).contains(&file) {
        2 * weight
    } else if (1..7).contains(&rank) && (1..7).contains(&file) {
        weight
    } else {
        0
    }
}

/// Bonus for being close to the opposing king, scaled hyperbolically with
/// the manhattan distance: touching the king yields `13 * weight`, maximum
/// distance yields nothing.
fn king_distance_bonus(square: Square, king: Square, weight: Score) -> Score {
    let distance = (square.rank() as Score - king.rank() as Score).abs()
        + (square.file() as Score - king.file() as Score).abs();

    14 * weight / distance - weight
}
