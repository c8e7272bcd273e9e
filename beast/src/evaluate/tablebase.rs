//! Syzygy tablebase probing.
//!
//! When the position is down to few enough pieces and a tablebase directory
//! has been configured, the evaluator can short-circuit to a perfect-play
//! win/draw/loss verdict instead of guessing. The tables are opened scoped
//! to the probe and released again, so no handle outlives a search.

use crate::evaluate::Score;
use crate::evaluate::ScoreExt;
use crate::position::Position;
use shakmaty::Chess;
use shakmaty_syzygy::Tablebase;
use shakmaty_syzygy::Wdl;
use std::path::Path;

/// Probe the tablebases for the position. Returns `None` when the directory
/// can't be opened or no table covers this material, in which case the
/// caller falls back to static evaluation.
pub(crate) fn probe(path: &Path, fifty_moves_rule: bool, pos: &Position) -> Option<Score> {
    let mut tables: Tablebase<Chess> = Tablebase::new();
    tables.add_directory(path).ok()?;

    let wdl = tables.probe_wdl_after_zeroing(pos.board()).ok()?;

    // With the fifty-move rule in force only outright wins and losses count;
    // without it, the cursed/blessed values are the decisive ones.
    let score = match (fifty_moves_rule, wdl) {
        (true, Wdl::Win) => Score::WIN,
        (true, Wdl::Loss) => Score::LOSS,
        (false, Wdl::CursedWin) => Score::WIN,
        (false, Wdl::BlessedLoss) => Score::LOSS,
        _ => Score::DRAW,
    };

    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_a_probe_miss() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();

        assert_eq!(
            probe(Path::new("/does/not/exist"), true, &pos),
            None
        );
    }

    #[test]
    fn empty_directory_is_a_probe_miss() {
        let dir = std::env::temp_dir();
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();

        assert_eq!(probe(&dir, true, &pos), None);
    }
}
