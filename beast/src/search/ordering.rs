//! Move ordering.
//!
//! Alpha-beta pruning lives and dies by trying the best move first. Each
//! legal move gets a heuristic score and the list is searched in descending
//! order: the transposition table's move, then captures by MVV-LVA, then
//! checks, killers, and finally quiet moves ranked by their history
//! counters. Ties keep the generator's move order.

use crate::evaluate::piece_value;
use crate::history_tables::History;
use crate::position::Position;
use crate::search::params::*;
use itertools::Itertools;
use shakmaty::Move;
use shakmaty::Role;
use std::cmp::Reverse;

/// All legal moves, best candidates first.
pub fn order_moves(
    pos: &Position,
    tt_move: Option<&Move>,
    ply: usize,
    history: &History,
) -> Vec<Move> {
    pos.legal_moves()
        .into_iter()
        .map(|mv| {
            let score = score_move(pos, &mv, tt_move, ply, history);
            (mv, score)
        })
        .sorted_by_key(|&(_, score)| Reverse(score))
        .map(|(mv, _)| mv)
        .collect()
}

/// Captures and checking moves only, for the quiescence search, ordered by
/// MVV-LVA with small bonuses for promotions and checks.
pub fn tactical_moves(pos: &Position) -> Vec<Move> {
    pos.legal_moves()
        .into_iter()
        .filter_map(|mv| {
            let capture = pos.is_capture(&mv);
            let check = pos.gives_check(&mv);

            if !capture && !check {
                return None;
            }

            let mut score = 0;

            if capture {
                score += 100 * victim_value(&mv) - piece_value(mv.role());

                if let Some(promotion) = mv.promotion() {
                    score += piece_value(promotion);
                }
            }

            if check {
                score += QUIESCENCE_CHECK_BONUS;
            }

            Some((mv, score))
        })
        .sorted_by_key(|&(_, score)| Reverse(score))
        .map(|(mv, _)| mv)
        .collect()
}

fn score_move(
    pos: &Position,
    mv: &Move,
    tt_move: Option<&Move>,
    ply: usize,
    history: &History,
) -> i32 {
    // 1. The move that was best the last time we saw this position
    if tt_move == Some(mv) {
        return TT_MOVE_SCORE;
    }

    // 2. Captures, most valuable victim first, least valuable attacker as
    //    the tie break; promotions on top
    if pos.is_capture(mv) {
        let mut score =
            CAPTURE_BASE_SCORE + 100 * victim_value(mv) - piece_value(mv.role());

        if let Some(promotion) = mv.promotion() {
            score += piece_value(promotion);
        }

        return score;
    }

    // 3. Checking moves
    if pos.gives_check(mv) {
        return CHECK_SCORE;
    }

    // 4. Killer moves at this ply
    if let Some(index) = history.killer_index(ply, mv) {
        return KILLER_BASE_SCORE - index as i32 * KILLER_STEP;
    }

    // 5. Everything else goes by history counters; a bare promotion still
    //    gets its piece value
    let mut score = mv.promotion().map(piece_value).unwrap_or(0);

    if let Some(piece) = pos.piece_at(mv.from().unwrap_or(mv.to())) {
        score += history.score(piece, mv.to());
    }

    score
}

/// The value of the piece a capture wins. A capture square without a piece
/// on it is an en-passant capture, which wins a pawn.
fn victim_value(mv: &Move) -> i32 {
    mv.capture().map(piece_value).unwrap_or(piece_value(Role::Pawn))
}
