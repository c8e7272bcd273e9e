//! The search logic for Beast
//!
//! This is the meat and bones of the engine, and along with the evaluation
//! it's one of the two main pillars: an iterative-deepening negamax search
//! with alpha-beta pruning.
//!
//! Iterative deepening sounds wasteful (every iteration redoes all the work
//! of the previous one), but the shallower iterations populate the move
//! ordering tables and the transposition table, which makes the deeper ones
//! vastly cheaper than they would be cold. It also means there's always a
//! completed iteration to answer with when the clock runs out mid-search.
//!
//! The per-node logic lives in the `negamax` and `quiescence` submodules;
//! this module drives the iterations, carries the search state, and handles
//! the cooperative cancellation checks.

use crate::evaluate::Evaluator;
use crate::evaluate::Score;
use crate::evaluate::ScoreExt;
use crate::history_tables::pv::PVTable;
use crate::history_tables::History;
use crate::position::Position;
use crate::time_control::TimeController;
use crate::transpositions::TTable;
use crate::uci::EngineCommand;
use rand::seq::SliceRandom;
use shakmaty::CastlingMode;
use shakmaty::Move;
use std::io::Write;
use std::sync::mpsc::Receiver;
use std::time::Duration;
use uci::engine::UciEngineMessage;
use uci::search_info::Score as UciScore;
use uci::search_info::SearchInfo;

mod negamax;
pub(crate) mod ordering;
pub mod params;
mod quiescence;

/// A Search holds both the parameters and the mutable state of a single
/// search: one `go` command maps to one `Search`.
pub struct Search<'a> {
    /// The time controller for the search, owning the stop flag
    pub tc: TimeController,

    /// The evaluator selected for this search
    evaluator: &'a Evaluator,

    /// The transposition table, fresh for this search
    tt: &'a mut TTable,

    /// Killer moves and history counters, fresh for this search
    history: &'a mut History,

    /// The command queue, polled for stop/quit while searching. Absent when
    /// the search is driven outside the engine worker (e.g. in tests).
    commands: Option<&'a Receiver<EngineCommand>>,

    /// The total number of nodes searched so far, across iterations
    pub nodes: u64,

    /// Whether the search was aborted half-way
    aborted: bool,

    /// Whether the abort was caused by a `quit` command
    quit: bool,
}

impl<'a> Search<'a> {
    pub fn new(
        tc: TimeController,
        evaluator: &'a Evaluator,
        tt: &'a mut TTable,
        history: &'a mut History,
        commands: Option<&'a Receiver<EngineCommand>>,
    ) -> Self {
        Self {
            tc,
            evaluator,
            tt,
            history,
            commands,
            nodes: 0,
            aborted: false,
            quit: false,
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Iterative deepening
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Search the position at increasing depths until a limit trips, and
    /// return the result of the last fully-completed iteration.
    pub fn run(&mut self, pos: &mut Position) -> SearchReport {
        // Start from any legal move, so there's always a best move to report
        // even if we get cancelled before depth 1 completes.
        let safety_move = pos
            .legal_moves()
            .choose(&mut rand::thread_rng())
            .cloned();

        let mut report = SearchReport::new(safety_move);
        let mut depth = 1;

        while self.tc.should_deepen(depth) && !self.aborted {
            let mut pv = PVTable::new();

            let score = self.negamax(
                pos,
                depth as i32,
                Score::MINUS_INF,
                Score::PLUS_INF,
                0,
                &mut pv,
                true,
            );

            // A half-finished iteration can't be trusted; the previous one
            // stands.
            if self.aborted {
                break;
            }

            report.update(depth, score, self.nodes, self.tc.elapsed(), &pv);

            println!("{}", UciEngineMessage::Info(report.to_info()));
            std::io::stdout().flush().ok();

            // No point searching past a forced mate
            if score.is_mate() {
                break;
            }

            depth += 1;
        }

        report
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Cancellation
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Polled at the top of every node: keep going unless the timer fired,
    /// a limit was hit, or the command queue holds a stop/quit.
    pub(crate) fn should_continue(&mut self) -> bool {
        if self.aborted {
            return false;
        }

        if self.tc.stopped() || self.tc.node_limit_reached(self.nodes) {
            self.aborted = true;
            return false;
        }

        if let Some(commands) = self.commands {
            match commands.try_recv() {
                Ok(EngineCommand::Stop) => {
                    self.tc.stop();
                    self.aborted = true;
                    return false;
                }

                Ok(EngineCommand::Quit) => {
                    self.tc.stop();
                    self.aborted = true;
                    self.quit = true;
                    return false;
                }

                // A `go` sent while we're already searching is dropped
                _ => {}
            }
        }

        true
    }

    /// Whether the search was cancelled by a `quit` command, in which case
    /// the worker should shut down after reporting the best move.
    pub fn saw_quit(&self) -> bool {
        self.quit
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Search Reports
//
////////////////////////////////////////////////////////////////////////////////

/// Aggregated data concerning the search, used for reporting in various
/// places
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// The depth of the last completed iteration
    pub depth: usize,

    /// The best score found in the search
    pub score: Score,

    /// The number of nodes searched
    pub nodes: u64,

    /// The total duration of the search
    pub duration: Duration,

    /// The best move found so far
    pub best_move: Option<Move>,

    /// The principal variation compiled by the search
    pub pv: Vec<Move>,
}

impl SearchReport {
    fn new(safety_move: Option<Move>) -> Self {
        Self {
            depth: 0,
            score: Score::DRAW,
            nodes: 0,
            duration: Duration::ZERO,
            best_move: safety_move,
            pv: Vec::new(),
        }
    }

    fn update(
        &mut self,
        depth: usize,
        score: Score,
        nodes: u64,
        duration: Duration,
        pv: &PVTable,
    ) {
        self.depth = depth;
        self.score = score;
        self.nodes = nodes;
        self.duration = duration;

        if let Some(best) = pv.pv_move() {
            self.best_move = Some(best.clone());
            self.pv = pv.moves().to_vec();
        }
    }

    fn to_info(&self) -> SearchInfo {
        let millis = self.duration.as_millis() as u64;
        let nps = 1000 * self.nodes / millis.max(1);

        let score = if self.score.is_mate() {
            UciScore::Mate(self.score.mate_fullmoves())
        } else {
            UciScore::Cp(self.score)
        };

        SearchInfo {
            depth: Some(self.depth as u32),
            time: Some(millis),
            nodes: Some(self.nodes),
            nps: Some(nps),
            score: Some(score),
            pv: self
                .pv
                .iter()
                .map(|mv| shakmaty::uci::UciMove::from_move(mv, CastlingMode::Standard))
                .collect(),
            string: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::params::DEFAULT_TT_ENTRIES;
    use uci::time_control::TimeControl;

    fn search(pos: &mut Position, limits: TimeControl) -> SearchReport {
        let evaluator = Evaluator::classical(true, None, 7);
        let mut tt = TTable::with_capacity(DEFAULT_TT_ENTRIES);
        let mut history = History::new();
        let tc = TimeController::new(limits, pos.turn());

        Search::new(tc, &evaluator, &mut tt, &mut history, None).run(pos)
    }

    fn search_depth(pos: &mut Position, depth: usize) -> SearchReport {
        search(
            pos,
            TimeControl {
                depth: Some(depth),
                ..TimeControl::default()
            },
        )
    }

    fn uci(mv: &Move) -> String {
        shakmaty::uci::UciMove::from_move(mv, CastlingMode::Standard).to_string()
    }

    #[test]
    fn finds_mate_in_one() {
        let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();

        let report = search_depth(&mut pos, 3);

        assert_eq!(uci(report.best_move.as_ref().unwrap()), "a1a8");
        assert!(report.score.is_mate());
        assert_eq!(report.score.mate_fullmoves(), 1);
    }

    #[test]
    fn the_pv_starts_with_the_best_move() {
        let mut pos = Position::new();

        let report = search_depth(&mut pos, 3);

        assert!(!report.pv.is_empty());
        assert_eq!(report.pv[0], report.best_move.unwrap());
    }

    #[test]
    fn depth_one_returns_a_legal_move() {
        let mut pos = Position::new();
        let legal = pos.legal_moves();

        let report = search_depth(&mut pos, 1);

        assert_eq!(report.depth, 1);
        assert!(legal.contains(report.best_move.as_ref().unwrap()));
        assert!(report.nodes > 0);
    }

    #[test]
    fn a_stopped_search_still_reports_a_legal_move() {
        let mut pos = Position::new();
        let legal = pos.legal_moves();

        let evaluator = Evaluator::classical(true, None, 7);
        let mut tt = TTable::with_capacity(DEFAULT_TT_ENTRIES);
        let mut history = History::new();
        let tc = TimeController::new(TimeControl::default(), pos.turn());
        tc.stop();

        let report = Search::new(tc, &evaluator, &mut tt, &mut history, None).run(&mut pos);

        assert_eq!(report.depth, 0);
        assert!(legal.contains(report.best_move.as_ref().unwrap()));
    }

    #[test]
    fn cornered_king_runs_with_the_only_legal_move() {
        // Black has exactly one legal move; the score is grim either way
        let mut pos = Position::from_fen("7k/8/8/8/8/8/8/6QK b - - 0 1").unwrap();

        let report = search_depth(&mut pos, 4);

        assert_eq!(uci(report.best_move.as_ref().unwrap()), "h8h7");
        assert!(report.score < 0);
    }

    #[test]
    fn node_counts_grow_with_depth() {
        let mut pos = Position::new();

        let shallow = search_depth(&mut pos, 2);

        let mut pos = Position::new();
        let deep = search_depth(&mut pos, 4);

        assert!(deep.nodes > shallow.nodes);
        assert!(deep.depth > shallow.depth);
    }

    #[test]
    fn a_timed_search_terminates() {
        let mut pos = Position::new();

        let report = search(
            &mut pos,
            TimeControl {
                movetime: Some(Duration::from_millis(50)),
                ..TimeControl::default()
            },
        );

        assert!(report.best_move.is_some());
        assert!(report.duration < Duration::from_secs(5));
    }

    #[test]
    fn prefers_the_shorter_mate() {
        // White mates in one with Ra8; slower mating lines exist
        let mut pos =
            Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();

        let report = search_depth(&mut pos, 5);

        assert_eq!(uci(report.best_move.as_ref().unwrap()), "a1a8");
        assert_eq!(report.score.mate_fullmoves(), 1);
    }
}
