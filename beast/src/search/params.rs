use crate::evaluate::Score;
use std::time::Duration;

// Search parameters
pub const MAX_DEPTH: usize = 128;
pub const DEFAULT_DEPTH: usize = 2;
pub const DEFAULT_TT_ENTRIES: usize = 1 << 20;

// Time management. The remaining-clock fractions are divisors: spend a tenth
// of the clock (plus the increment) when playing with increment, a twentieth
// without one. The flex is a safety margin against I/O latency.
pub const TIME_FLEX: Duration = Duration::from_millis(10);
pub const BASE_TIME_FRAC: u32 = 10;
pub const NO_INC_TIME_FRAC: u32 = 20;

// Null-move pruning. Unsafe in positions where being forced to move is the
// real problem, so it's switched off for low piece counts and pawn-only
// sides.
pub const NULL_MOVE_MIN_DEPTH: i32 = 3;
pub const NULL_MOVE_BASE_REDUCTION: i32 = 2;
pub const NULL_MOVE_DEPTH_DIV: i32 = 6;
pub const NULL_MOVE_MIN_PIECES: usize = 11;

// Late move reductions
pub const LMR_MOVE_THRESHOLD: usize = 3;
pub const LMR_MIN_DEPTH: i32 = 3;
pub const LMR_MOVE_DIV: usize = 6;
pub const LMR_DEPTH_DIV: i32 = 8;

// Quiescence delta pruning
pub const DELTA_PRUNE_MIN_PIECES: usize = 9;
pub const DELTA_MARGIN: Score = 200;

// Move ordering scores
pub const TT_MOVE_SCORE: i32 = 20_000;
pub const CAPTURE_BASE_SCORE: i32 = 10_000;
pub const CHECK_SCORE: i32 = 9_000;
pub const KILLER_BASE_SCORE: i32 = 8_000;
pub const KILLER_STEP: i32 = 1_000;
pub const QUIESCENCE_CHECK_BONUS: i32 = 50;
