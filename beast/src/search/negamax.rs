//! The negamax recursion: a depth-first alpha-beta search over a single
//! mutable board, with the pruning and extension set layered on top.

use crate::evaluate::Score;
use crate::evaluate::ScoreExt;
use crate::history_tables::pv::PVTable;
use crate::position::Position;
use crate::transpositions::NodeType;
use crate::transpositions::TTEntry;
use shakmaty::Move;
use shakmaty::Role;

use super::ordering;
use super::params::*;
use super::Search;

impl Search<'_> {
    /// The main negamax function of the search routine.
    ///
    /// Returns the score of the position from the side to move's point of
    /// view, and fills `pv` with the line that produced it. `depth` is the
    /// remaining nominal depth, `ply` the distance from the root.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn negamax(
        &mut self,
        pos: &mut Position,
        mut depth: i32,
        mut alpha: Score,
        mut beta: Score,
        ply: usize,
        pv: &mut PVTable,
        is_pv: bool,
    ) -> Score {
        if !self.should_continue() {
            return Score::MINUS_INF;
        }

        self.nodes += 1;

        let in_root = ply == 0;

        ////////////////////////////////////////////////////////////////////////
        //
        // Terminal positions
        //
        // Don't return early in the root: even a drawn or dead position
        // needs a best move to report.
        //
        ////////////////////////////////////////////////////////////////////////

        if !in_root {
            if pos.is_repetition(2) {
                return Score::DRAW;
            }

            if pos.is_game_over() {
                return self.evaluator.evaluate_result(pos, ply);
            }

            if self.evaluator.fifty_moves_rule() && pos.is_fifty_move_claimable() {
                return Score::DRAW;
            }
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // Mate distance pruning
        //
        // Bound the window by the best and worst conceivable outcomes from
        // this ply, so lines longer than an already-found mate drop out.
        //
        ////////////////////////////////////////////////////////////////////////

        alpha = alpha.max(-Score::WIN + ply as Score);
        beta = beta.min(Score::WIN - ply as Score - 1);

        if alpha >= beta {
            return alpha;
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // Transposition table
        //
        // Reuse the score from a previous visit when its depth and bound
        // type allow it; otherwise at least remember its best move as the
        // first move to try.
        //
        ////////////////////////////////////////////////////////////////////////

        let hash = pos.key();
        let mut tt_move: Option<Move> = None;

        if let Some(entry) = self.tt.probe(hash) {
            tt_move = entry.best_move().cloned();

            if !is_pv {
                if let Some(score) = entry.usable_score(depth, alpha, beta) {
                    return score;
                }
            }
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // Check extension
        //
        // When the side to move is in check, search one ply deeper so the
        // horizon doesn't cut the line off in the middle of the storm.
        //
        ////////////////////////////////////////////////////////////////////////

        let in_check = pos.in_check();

        if in_check {
            depth += 1;
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // Quiescence at the leaves
        //
        ////////////////////////////////////////////////////////////////////////

        if depth <= 0 || ply >= MAX_DEPTH {
            return if self.evaluator.needs_quiescence() {
                self.quiescence(pos, alpha, beta, ply)
            } else {
                self.evaluator.evaluate_position(pos)
            };
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // Null move pruning
        //
        // Hand the opponent a free move and search shallow with a null
        // window. If the position still clears beta, a real move certainly
        // will, and the node can fail high immediately. Skipped whenever
        // zugzwang is a realistic possibility.
        //
        ////////////////////////////////////////////////////////////////////////

        if depth >= NULL_MOVE_MIN_DEPTH
            && !in_check
            && !is_pv
            && null_move_safe(pos)
            && pos.push_null()
        {
            let reduction = NULL_MOVE_BASE_REDUCTION + depth / NULL_MOVE_DEPTH_DIV;

            let score = -self.negamax(
                pos,
                depth - 1 - reduction,
                -beta,
                -beta + 1,
                ply + 1,
                &mut PVTable::new(),
                false,
            );

            pos.pop();

            if self.aborted {
                return Score::MINUS_INF;
            }

            if score >= beta {
                return beta;
            }
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // The main move loop
        //
        ////////////////////////////////////////////////////////////////////////

        let ordered = ordering::order_moves(pos, tt_move.as_ref(), ply, self.history);
        let mut local_pv = PVTable::new();
        let mut best_move: Option<Move> = None;
        let mut node_type = NodeType::Upper;
        let mut moves_searched: usize = 0;

        for mv in ordered {
            local_pv.clear();

            let is_capture = pos.is_capture(&mv);

            pos.push(&mv);

            let gives_check = pos.in_check();
            let mut score;

            ////////////////////////////////////////////////////////////////////
            //
            // Late move reductions
            //
            // With decent ordering, the later quiet moves rarely matter.
            // Search them shallower with a null window, and only pay full
            // price when one surprises us.
            //
            ////////////////////////////////////////////////////////////////////

            let reducible = moves_searched >= LMR_MOVE_THRESHOLD
                && depth >= LMR_MIN_DEPTH
                && !is_pv
                && !in_check
                && !gives_check
                && !is_capture;

            if reducible {
                let reduction =
                    1 + (moves_searched / LMR_MOVE_DIV) as i32 + depth / LMR_DEPTH_DIV;

                score = -self.negamax(
                    pos,
                    depth - 1 - reduction,
                    -alpha - 1,
                    -alpha,
                    ply + 1,
                    &mut local_pv,
                    false,
                );

                if score > alpha && !self.aborted {
                    local_pv.clear();
                    score = -self.negamax(
                        pos,
                        depth - 1,
                        -beta,
                        -alpha,
                        ply + 1,
                        &mut local_pv,
                        false,
                    );
                }
            } else if moves_searched == 0 || !is_pv {
                score = -self.negamax(
                    pos,
                    depth - 1,
                    -beta,
                    -alpha,
                    ply + 1,
                    &mut local_pv,
                    is_pv && moves_searched == 0,
                );
            } else {
                ////////////////////////////////////////////////////////////////
                //
                // Principal variation search
                //
                // Try to prove the remaining moves are worse than the best
                // one with a cheap null-window probe; re-search in full on
                // the rare miss.
                //
                ////////////////////////////////////////////////////////////////

                score = -self.negamax(
                    pos,
                    depth - 1,
                    -alpha - 1,
                    -alpha,
                    ply + 1,
                    &mut local_pv,
                    false,
                );

                if alpha < score && score < beta && !self.aborted {
                    local_pv.clear();
                    score = -self.negamax(
                        pos,
                        depth - 1,
                        -beta,
                        -alpha,
                        ply + 1,
                        &mut local_pv,
                        true,
                    );
                }
            }

            pos.pop();
            moves_searched += 1;

            if self.aborted {
                return Score::MINUS_INF;
            }

            if score >= beta {
                // Quiet refutations feed the ordering tables for the
                // sibling branches
                if !is_capture {
                    if let Some(piece) = mv.from().and_then(|from| pos.piece_at(from)) {
                        self.history.add_cutoff(piece, mv.to(), depth);
                    }

                    self.history.add_killer(ply, mv.clone());
                }

                self.tt
                    .insert(TTEntry::new(hash, Some(mv), beta, depth, NodeType::Lower));

                return beta;
            }

            if score > alpha {
                alpha = score;
                node_type = NodeType::Exact;
                best_move = Some(mv.clone());
                pv.add_to_front(mv, &local_pv);
            }
        }

        self.tt
            .insert(TTEntry::new(hash, best_move, alpha, depth, node_type));

        alpha
    }
}

/// Whether null-move pruning can be trusted here: zugzwang positions, where
/// any move loses but passing would hold, fool the null-move probe. Those
/// live almost exclusively in low-material and pawn-only endgames.
fn null_move_safe(pos: &Position) -> bool {
    use Role::*;

    if pos.piece_count() < NULL_MOVE_MIN_PIECES {
        return false;
    }

    let us = pos.turn();
    let sliders_and_minors = pos.pieces(Knight, us)
        | pos.pieces(Bishop, us)
        | pos.pieces(Rook, us)
        | pos.pieces(Queen, us);

    !sliders_and_minors.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_move_is_safe_in_the_middlegame() {
        assert!(null_move_safe(&Position::new()));
    }

    #[test]
    fn null_move_is_unsafe_with_few_pieces() {
        let endgame = Position::from_fen("4k3/4p3/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();

        assert!(!null_move_safe(&endgame));
    }

    #[test]
    fn null_move_is_unsafe_for_a_pawn_only_side() {
        // Twelve pieces on the board, but the side to move has nothing but
        // king and pawns
        let fen = "3qkq2/rrrr4/8/8/8/8/PPPP4/4K3";

        let white = Position::from_fen(&format!("{fen} w - - 0 1")).unwrap();
        let black = Position::from_fen(&format!("{fen} b - - 0 1")).unwrap();

        assert!(!null_move_safe(&white));
        assert!(null_move_safe(&black));
    }
}
