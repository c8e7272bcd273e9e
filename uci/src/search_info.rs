use shakmaty::uci::UciMove;
use std::fmt::Display;

/// Information we might want to print in a UCI `info` message
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchInfo {
  /// The nominal search depth
  pub depth: Option<u32>,

  /// The total duration of the search so far, in milliseconds
  pub time: Option<u64>,

  /// The number of nodes searched so far
  pub nodes: Option<u64>,

  /// The number of nodes searched per second
  pub nps: Option<u64>,

  /// The best score we've obtained so far
  pub score: Option<Score>,

  /// The current principal variation
  pub pv: Vec<UciMove>,

  /// A free-form diagnostic payload. When set, the other fields are omitted
  /// and the message renders as `info string ...`.
  pub string: Option<String>,
}

impl SearchInfo {
  /// A bare `info string` diagnostic message.
  pub fn message(text: impl Into<String>) -> Self {
    Self {
      string: Some(text.into()),
      ..Self::default()
    }
  }
}

impl Display for SearchInfo {
  /// Format the SearchInfo as a UCI compliant log message
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if let Some(string) = &self.string {
      return write!(f, "string {string}");
    }

    let mut parts: Vec<String> = Vec::new();

    if let Some(depth) = self.depth {
      parts.push(format!("depth {depth}"));
    }

    if let Some(score) = self.score {
      parts.push(format!("score {score}"));
    }

    if let Some(nodes) = self.nodes {
      parts.push(format!("nodes {nodes}"));
    }

    if let Some(nps) = self.nps {
      parts.push(format!("nps {nps}"));
    }

    if let Some(time) = self.time {
      parts.push(format!("time {time}"));
    }

    if !self.pv.is_empty() {
      let moves = self
        .pv
        .iter()
        .map(|mv| mv.to_string())
        .collect::<Vec<_>>()
        .join(" ");

      parts.push(format!("pv {moves}"));
    }

    write!(f, "{}", parts.join(" "))
  }
}

/// A search score, either a plain centipawn value or a forced mate in a
/// number of full moves (negative when the engine is getting mated).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Score {
  Cp(i32),
  Mate(i32),
}

impl Display for Score {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Cp(score) => write!(f, "cp {score}"),
      Self::Mate(score) => write!(f, "mate {score}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn format_full_info_line() {
    let info = SearchInfo {
      depth: Some(4),
      time: Some(123),
      nodes: Some(4242),
      nps: Some(34000),
      score: Some(Score::Cp(25)),
      pv: vec!["e2e4".parse().unwrap(), "e7e5".parse().unwrap()],
      string: None,
    };

    assert_eq!(
      info.to_string(),
      "depth 4 score cp 25 nodes 4242 nps 34000 time 123 pv e2e4 e7e5"
    );
  }

  #[test]
  fn format_mate_score() {
    let info = SearchInfo {
      depth: Some(3),
      score: Some(Score::Mate(1)),
      ..SearchInfo::default()
    };

    assert_eq!(info.to_string(), "depth 3 score mate 1");
  }

  #[test]
  fn format_diagnostic_string() {
    let info = SearchInfo::message("Invalid model file.");

    assert_eq!(info.to_string(), "string Invalid model file.");
  }
}
