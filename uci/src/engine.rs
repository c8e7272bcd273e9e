use crate::options::UciOption;
use crate::search_info::SearchInfo;
use shakmaty::uci::UciMove;
use std::fmt::Display;

/// Messages that can be sent from the engine back to the client
#[derive(Debug, Clone)]
pub enum UciEngineMessage {
  Id(IdType),
  UciOk,
  ReadyOk,

  /// The best move found by the search. `None` means the position had no
  /// legal moves to begin with, rendered as the customary `(none)`.
  BestMove(Option<UciMove>),

  Info(SearchInfo),
  UciOption(UciOption),
}

impl Display for UciEngineMessage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    use UciEngineMessage::*;

    match self {
      Id(id_option) => write!(f, "id {id_option}"),
      UciOk => write!(f, "uciok"),
      ReadyOk => write!(f, "readyok"),
      BestMove(Some(mv)) => write!(f, "bestmove {mv}"),
      BestMove(None) => write!(f, "bestmove (none)"),
      Info(info) => write!(f, "info {info}"),
      UciOption(option) => write!(f, "option {option}"),
    }
  }
}

////////////////////////////////////////////////////////////////////////////////
//
// ID Information
//
////////////////////////////////////////////////////////////////////////////////

/// A type of identifying information to output to the user
#[derive(Debug, Clone)]
pub enum IdType {
  /// The name and version of the engine
  Name(String),

  /// The author of the engine
  Author(String),
}

impl Display for IdType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    use IdType::*;

    match self {
      Name(name) => write!(f, "name {name}"),
      Author(author) => write!(f, "author {author}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn format_handshake_messages() {
    let name = UciEngineMessage::Id(IdType::Name("Beast 2.1.0".to_string()));

    assert_eq!(name.to_string(), "id name Beast 2.1.0");
    assert_eq!(UciEngineMessage::UciOk.to_string(), "uciok");
    assert_eq!(UciEngineMessage::ReadyOk.to_string(), "readyok");
  }

  #[test]
  fn format_bestmove() {
    let mv: UciMove = "e2e4".parse().unwrap();

    assert_eq!(
      UciEngineMessage::BestMove(Some(mv)).to_string(),
      "bestmove e2e4"
    );
    assert_eq!(
      UciEngineMessage::BestMove(None).to_string(),
      "bestmove (none)"
    );
  }
}
