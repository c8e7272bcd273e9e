//! Static evaluation for Beast.
//!
//! The evaluator answers one question: from the point of view of the side to
//! move, how good is this position, in centipawns? The search doesn't care
//! how that number is produced, so the different evaluation strategies live
//! behind a single `Evaluator` type: the classical hand-crafted evaluation,
//! an ONNX network, or a random number generator for smoke testing.
//!
//! Terminal positions and tablebase-covered endgames are scored here as well,
//! before any of the strategies get a say.

use crate::position::Position;
use rand::Rng;
use shakmaty::Role;
use std::path::PathBuf;

pub mod classical;
pub mod network;
mod tablebase;

pub use network::Network;

pub type Score = i32;

/// Extension trait hanging the score-domain constants and helpers off the
/// plain integer type.
pub trait ScoreExt {
    /// Sentinel values safe to negate, used to open the alpha-beta window
    const MINUS_INF: Self;
    const PLUS_INF: Self;

    /// The score of a won, lost, and drawn position
    const WIN: Self;
    const LOSS: Self;
    const DRAW: Self;

    /// The base magnitude of mate scores found by the search. A mate `n`
    /// plies from the root scores `MATE - n` for the mating side, so mate
    /// scores stay clearly separated from any static evaluation while
    /// shorter mates always compare better than longer ones.
    const MATE: Self;

    /// Whether the score can only have come from a forced mate
    fn is_mate(self) -> bool;

    /// Convert a mate score into full moves until mate. Negative means the
    /// side to move is the one getting mated.
    fn mate_fullmoves(self) -> i32;
}

impl ScoreExt for Score {
    const MINUS_INF: Score = -i32::MAX;
    const PLUS_INF: Score = i32::MAX;
    const WIN: Score = 30_000;
    const LOSS: Score = -Self::WIN;
    const DRAW: Score = 0;
    const MATE: Score = 29_000;

    fn is_mate(self) -> bool {
        self.abs() >= Self::MATE - crate::search::params::MAX_DEPTH as Score
    }

    fn mate_fullmoves(self) -> i32 {
        // The gap below MATE is the length of the mating line in plies
        let plies = (Self::MATE - self.abs()).max(0);
        let fullmoves = ((plies + 1) / 2).max(1);

        if self > 0 {
            fullmoves
        } else {
            -fullmoves
        }
    }
}

/// The material value of a piece, in centipawns.
pub fn piece_value(role: Role) -> Score {
    match role {
        Role::Pawn => 100,
        Role::Knight => 350,
        Role::Bishop => 370,
        Role::Rook => 550,
        Role::Queen => 950,
        Role::King => 0,
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Evaluator
//
////////////////////////////////////////////////////////////////////////////////

/// A static evaluator: one of the evaluation strategies, plus the draw-rule
/// and tablebase configuration shared by all of them.
pub struct Evaluator {
    variant: Variant,
    fifty_moves_rule: bool,
    syzygy_path: Option<PathBuf>,
    syzygy_probe_limit: usize,
}

enum Variant {
    Classical,
    NeuralNetwork(Network),
    Random,
}

impl Evaluator {
    pub fn classical(
        fifty_moves_rule: bool,
        syzygy_path: Option<PathBuf>,
        syzygy_probe_limit: usize,
    ) -> Self {
        Self {
            variant: Variant::Classical,
            fifty_moves_rule,
            syzygy_path,
            syzygy_probe_limit,
        }
    }

    pub fn neural_network(
        network: Network,
        fifty_moves_rule: bool,
        syzygy_path: Option<PathBuf>,
        syzygy_probe_limit: usize,
    ) -> Self {
        Self {
            variant: Variant::NeuralNetwork(network),
            fifty_moves_rule,
            syzygy_path,
            syzygy_probe_limit,
        }
    }

    pub fn random() -> Self {
        Self {
            variant: Variant::Random,
            fifty_moves_rule: true,
            syzygy_path: None,
            syzygy_probe_limit: 0,
        }
    }

    /// Whether a search using this evaluator should resolve tactics with a
    /// quiescence extension before trusting the static score.
    pub fn needs_quiescence(&self) -> bool {
        !matches!(self.variant, Variant::Random)
    }

    pub fn fifty_moves_rule(&self) -> bool {
        self.fifty_moves_rule
    }

    /// The static score of the position, from the side to move's perspective.
    ///
    /// Terminal positions are scored directly (a mated side to move scores
    /// `LOSS`, any kind of draw scores `DRAW`), tablebase endgames are probed
    /// when configured, and everything else goes to the selected strategy.
    pub fn evaluate_position(&self, pos: &Position) -> Score {
        if pos.is_checkmate() {
            return Score::LOSS;
        }

        if pos.is_stalemate() || pos.is_insufficient_material() {
            return Score::DRAW;
        }

        if self.fifty_moves_rule && pos.is_fifty_move_claimable() {
            return Score::DRAW;
        }

        if let Some(path) = &self.syzygy_path {
            if pos.piece_count() <= self.syzygy_probe_limit {
                if let Some(score) = tablebase::probe(path, self.fifty_moves_rule, pos) {
                    return score;
                }
            }
        }

        match &self.variant {
            Variant::Classical => classical::evaluate(pos),

            // An inference failure after a successful model load shouldn't
            // take the search down with it.
            Variant::NeuralNetwork(network) => network
                .evaluate(pos)
                .unwrap_or_else(|_| classical::evaluate(pos)),

            Variant::Random => rand::thread_rng().gen_range(Score::LOSS..=Score::WIN),
        }
    }

    /// The score of a position the search has already established as game
    /// over, `ply` half-moves from the root. Mates closer to the root score
    /// strictly worse for the mated side, so the search prefers the shortest
    /// mate it can find.
    pub fn evaluate_result(&self, pos: &Position, ply: usize) -> Score {
        if pos.is_checkmate() {
            -(Score::MATE - ply as Score)
        } else {
            Score::DRAW
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mated_side_to_move_scores_loss() {
        let evaluator = Evaluator::classical(true, None, 7);
        let mate =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();

        assert_eq!(evaluator.evaluate_position(&mate), Score::LOSS);
    }

    #[test]
    fn stalemate_scores_draw() {
        let evaluator = Evaluator::classical(true, None, 7);
        let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();

        assert_eq!(evaluator.evaluate_position(&stalemate), Score::DRAW);
    }

    #[test]
    fn shorter_mates_score_worse_for_the_mated_side() {
        let evaluator = Evaluator::classical(true, None, 7);
        let mate =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();

        let near = evaluator.evaluate_result(&mate, 1);
        let far = evaluator.evaluate_result(&mate, 4);

        assert!(near < far);
        assert!(near.is_mate());
        assert!(far.is_mate());

        // Negated up the tree, the nearer mate wins the comparison for the
        // mating side
        assert!(-near > -far);
    }

    #[test]
    fn fifty_move_claim_is_gated_on_the_option() {
        let claimable = Position::from_fen("8/8/4k3/8/4K3/8/8/4R3 w - - 100 80").unwrap();

        let enforcing = Evaluator::classical(true, None, 7);
        let ignoring = Evaluator::classical(false, None, 7);

        assert_eq!(enforcing.evaluate_position(&claimable), Score::DRAW);
        assert_ne!(ignoring.evaluate_position(&claimable), Score::DRAW);
    }

    #[test]
    fn mate_fullmoves_conversion() {
        // Mate delivered one ply from the root
        assert_eq!((Score::MATE - 1).mate_fullmoves(), 1);

        // Getting mated on the opponent's next move
        assert_eq!((-(Score::MATE - 2)).mate_fullmoves(), -1);

        // Mate in two: three plies from the root
        assert_eq!((Score::MATE - 3).mate_fullmoves(), 2);

        // An ordinary score is not a mate
        assert!(!(500 as Score).is_mate());
        assert!((Score::MATE - 1).is_mate());
    }

    #[test]
    fn random_evaluation_stays_in_the_score_domain() {
        let evaluator = Evaluator::random();
        let pos = Position::new();

        assert!(!evaluator.needs_quiescence());

        for _ in 0..100 {
            let score = evaluator.evaluate_position(&pos);
            assert!((Score::LOSS..=Score::WIN).contains(&score));
        }
    }
}
