//! Time management for a single search.
//!
//! The `go` command's constraints get collapsed into a single time budget up
//! front. If there is one, a one-shot timer thread is armed that flips the
//! shared stop flag when the budget runs out; the search polls that flag
//! cooperatively at every node. The same flag is flipped when a `stop` or
//! `quit` command arrives mid-search, so "out of time" and "told to stop"
//! unwind through the identical path.

use crate::search::params::BASE_TIME_FRAC;
use crate::search::params::MAX_DEPTH;
use crate::search::params::NO_INC_TIME_FRAC;
use crate::search::params::TIME_FLEX;
use shakmaty::Color;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;
use uci::time_control::TimeControl;

/// The time controller is in charge of determining when a search should
/// continue or stop in order not to violate the requested time control.
pub struct TimeController {
    /// The constraints this search was started with
    limits: TimeControl,

    /// The instant the search was started
    start: Instant,

    /// The highest depth the iterative deepening loop may reach
    max_depth: usize,

    /// A thread-safe stop flag. Set by the timer thread on expiry, or by the
    /// search itself when a stop/quit command comes in. Setting it is
    /// monotonic: once raised it stays raised for the rest of the search.
    stop: Arc<AtomicBool>,
}

impl TimeController {
    /// Create a controller for the given constraints and arm the timer, if
    /// the constraints imply a time budget.
    pub fn new(limits: TimeControl, side: Color) -> Self {
        let stop = Arc::new(AtomicBool::new(false));

        if let Some(budget) = Self::budget(&limits, side) {
            let flag = Arc::clone(&stop);

            std::thread::spawn(move || {
                std::thread::sleep(budget);
                flag.store(true, Ordering::SeqCst);
            });
        }

        let max_depth = limits.depth.unwrap_or(MAX_DEPTH).min(MAX_DEPTH);

        Self {
            limits,
            start: Instant::now(),
            max_depth,
            stop,
        }
    }

    /// Collapse the time options into a single budget for this move.
    /// The first matching rule wins:
    ///
    /// 1. No time options at all: no budget, no timer.
    /// 2. An explicit `movetime`: use it, minus the safety margin.
    /// 3. Clock and increment: a fraction of the remaining clock plus the
    ///    increment, but never more than the clock itself.
    /// 4. Clock only: a smaller fraction of the remaining clock.
    fn budget(limits: &TimeControl, side: Color) -> Option<Duration> {
        if !limits.has_time_options() {
            return None;
        }

        if let Some(movetime) = limits.movetime.filter(|time| !time.is_zero()) {
            return Some(movetime.saturating_sub(TIME_FLEX));
        }

        let (time, inc) = limits.clock(side == Color::White);
        let time = time.filter(|time| !time.is_zero())?;

        match inc.filter(|inc| !inc.is_zero()) {
            Some(inc) => {
                let budget = (time / BASE_TIME_FRAC + inc).saturating_sub(TIME_FLEX);
                Some(budget.min(time.saturating_sub(TIME_FLEX)))
            }

            None => Some(time.saturating_sub(TIME_FLEX) / NO_INC_TIME_FRAC),
        }
    }

    /// Check whether the search has been stopped, by the timer or a command.
    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Raise the stop flag. Idempotent.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether the node budget, if any, has been exhausted.
    pub fn node_limit_reached(&self, nodes: u64) -> bool {
        self.limits.nodes.is_some_and(|limit| nodes >= limit)
    }

    /// Whether a new iterative deepening iteration may start.
    pub fn should_deepen(&self, depth: usize) -> bool {
        depth <= self.max_depth && !self.stopped()
    }

    /// Return the time that's elapsed since the start of the search.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(ms: u64) -> Option<Duration> {
        Some(Duration::from_millis(ms))
    }

    #[test]
    fn no_time_options_means_no_budget() {
        let limits = TimeControl {
            depth: Some(6),
            ..TimeControl::default()
        };

        assert_eq!(TimeController::budget(&limits, Color::White), None);
    }

    #[test]
    fn movetime_minus_flex() {
        let limits = TimeControl {
            movetime: millis(1000),
            ..TimeControl::default()
        };

        assert_eq!(TimeController::budget(&limits, Color::White), millis(990));
    }

    #[test]
    fn clock_with_increment() {
        let limits = TimeControl {
            wtime: millis(60_000),
            btime: millis(60_000),
            winc: millis(2_000),
            binc: millis(2_000),
            ..TimeControl::default()
        };

        // min(60000/10 + 2000 - 10, 60000 - 10)
        assert_eq!(TimeController::budget(&limits, Color::White), millis(7_990));
        assert_eq!(TimeController::budget(&limits, Color::Black), millis(7_990));
    }

    #[test]
    fn increment_budget_is_capped_by_the_clock() {
        let limits = TimeControl {
            wtime: millis(100),
            winc: millis(2_000),
            ..TimeControl::default()
        };

        // 100/10 + 2000 - 10 would exceed the clock; cap at 100 - 10
        assert_eq!(TimeController::budget(&limits, Color::White), millis(90));
    }

    #[test]
    fn clock_without_increment() {
        let limits = TimeControl {
            btime: millis(30_000),
            ..TimeControl::default()
        };

        // (30000 - 10) / 20
        assert_eq!(
            TimeController::budget(&limits, Color::Black),
            Some(Duration::from_micros(1_499_500))
        );
    }

    #[test]
    fn the_timer_raises_the_stop_flag() {
        let limits = TimeControl {
            movetime: millis(20),
            ..TimeControl::default()
        };

        let tc = TimeController::new(limits, Color::White);
        assert!(!tc.stopped());

        std::thread::sleep(Duration::from_millis(60));
        assert!(tc.stopped());
    }

    #[test]
    fn stopping_is_monotonic() {
        let tc = TimeController::new(TimeControl::default(), Color::White);

        tc.stop();
        tc.stop();
        assert!(tc.stopped());
    }

    #[test]
    fn depth_limit_bounds_deepening() {
        let limits = TimeControl {
            depth: Some(3),
            ..TimeControl::default()
        };

        let tc = TimeController::new(limits, Color::White);

        assert!(tc.should_deepen(1));
        assert!(tc.should_deepen(3));
        assert!(!tc.should_deepen(4));
    }

    #[test]
    fn node_limits() {
        let limits = TimeControl {
            nodes: Some(1000),
            ..TimeControl::default()
        };

        let tc = TimeController::new(limits, Color::White);

        assert!(!tc.node_limit_reached(999));
        assert!(tc.node_limit_reached(1000));
    }
}
