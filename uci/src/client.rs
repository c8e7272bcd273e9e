use crate::time_control::TimeControl;
use anyhow::anyhow;
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use std::fmt::Display;
use std::str::FromStr;

/// Messages that can be sent from the client to the engine
#[derive(Debug, Clone)]
pub enum UciClientMessage {
  Uci,
  Debug(bool),
  IsReady,
  SetOption(String, String),
  UciNewGame,

  /// A position, either the standard starting position (`None`) or a FEN,
  /// followed by a list of moves to apply to it.
  Position(Option<Fen>, Vec<UciMove>),

  Go(TimeControl),
  Stop,
  Quit,
}

impl Display for UciClientMessage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    use UciClientMessage::*;

    match self {
      Uci => write!(f, "uci"),
      Debug(flag) => write!(f, "debug {}", if *flag { "on" } else { "off" }),
      IsReady => write!(f, "isready"),
      SetOption(opt, val) => write!(f, "setoption name {opt} value {val}"),
      UciNewGame => write!(f, "ucinewgame"),
      Position(fen, moves) => {
        match fen {
          Some(fen) => write!(f, "position fen {fen}")?,
          None => write!(f, "position startpos")?,
        }

        if !moves.is_empty() {
          write!(f, " moves")?;
          for mv in moves {
            write!(f, " {mv}")?;
          }
        }

        std::fmt::Result::Ok(())
      }
      Go(tc) => write!(f, "go {tc}"),
      Stop => write!(f, "stop"),
      Quit => write!(f, "quit"),
    }
  }
}

impl FromStr for UciClientMessage {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> anyhow::Result<Self> {
    use UciClientMessage::*;
    let s = s.trim();
    let (msg, remainder) = s.split_once(' ').unwrap_or((s, ""));

    match msg {
      "uci" => Ok(Uci),

      "isready" => Ok(IsReady),

      "debug" => match remainder.split_whitespace().next() {
        Some("on") => Ok(Debug(true)),
        Some("off") => Ok(Debug(false)),
        _ => Err(anyhow!("Invalid UCI message: {s}")),
      },

      "setoption" => {
        let mut parts = remainder.split_whitespace();

        if parts.next() != Some("name") {
          Err(anyhow!("Invalid UCI message: {s}"))?;
        }

        let name = parts
          .by_ref()
          .take_while(|&word| word != "value")
          .collect::<Vec<_>>()
          .join(" ");

        if name.is_empty() {
          Err(anyhow!("Invalid UCI message: {s}"))?;
        }

        // Everything after `value` belongs to the value, spaces included
        // (think file paths).
        let value = parts.collect::<Vec<_>>().join(" ");

        Ok(SetOption(name, value))
      }

      "ucinewgame" => Ok(UciNewGame),

      "position" => {
        let mut parts = remainder.split_whitespace().peekable();

        let fen = match parts.next() {
          Some("startpos") => None,

          Some("fen") => {
            let mut fen_fields = Vec::new();

            while let Some(&word) = parts.peek() {
              if word == "moves" {
                break;
              }

              fen_fields.push(word);
              parts.next();
            }

            Some(fen_fields.join(" ").parse::<Fen>()?)
          }

          _ => Err(anyhow!("Invalid UCI message: {s}"))?,
        };

        let mut moves = Vec::new();

        if let Some("moves") = parts.next() {
          for mv in parts {
            moves.push(mv.parse::<UciMove>()?);
          }
        }

        Ok(Position(fen, moves))
      }

      "go" => {
        let tc = remainder.parse()?;
        Ok(Go(tc))
      }

      "stop" => Ok(Stop),
      "quit" => Ok(Quit),

      _ => Err(anyhow!("Invalid UCI message: {s}")),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_simple_commands() {
    assert!(matches!("uci".parse(), Ok(UciClientMessage::Uci)));
    assert!(matches!("isready".parse(), Ok(UciClientMessage::IsReady)));
    assert!(matches!("stop".parse(), Ok(UciClientMessage::Stop)));
    assert!(matches!("quit".parse(), Ok(UciClientMessage::Quit)));
    assert!(matches!(
      "ucinewgame".parse(),
      Ok(UciClientMessage::UciNewGame)
    ));
  }

  #[test]
  fn parse_position_startpos_with_moves() {
    let msg: UciClientMessage =
      "position startpos moves e2e4 e7e5 g1f3".parse().unwrap();

    let UciClientMessage::Position(fen, moves) = msg else {
      panic!("expected a position message");
    };

    assert!(fen.is_none());
    assert_eq!(moves.len(), 3);
    assert_eq!(moves[0].to_string(), "e2e4");
    assert_eq!(moves[2].to_string(), "g1f3");
  }

  #[test]
  fn parse_position_fen() {
    let msg: UciClientMessage =
      "position fen 6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1 moves a1a8"
        .parse()
        .unwrap();

    let UciClientMessage::Position(fen, moves) = msg else {
      panic!("expected a position message");
    };

    assert!(fen.is_some());
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].to_string(), "a1a8");
  }

  #[test]
  fn parse_position_rejects_bad_fen() {
    let msg = "position fen not a real fen".parse::<UciClientMessage>();

    assert!(msg.is_err());
  }

  #[test]
  fn parse_setoption_with_spaces_in_value() {
    let msg: UciClientMessage =
      "setoption name SyzygyPath value /tb/path with spaces"
        .parse()
        .unwrap();

    let UciClientMessage::SetOption(name, value) = msg else {
      panic!("expected a setoption message");
    };

    assert_eq!(name, "SyzygyPath");
    assert_eq!(value, "/tb/path with spaces");
  }

  #[test]
  fn parse_go_with_options() {
    let msg: UciClientMessage = "go depth 4 movetime 250".parse().unwrap();

    let UciClientMessage::Go(tc) = msg else {
      panic!("expected a go message");
    };

    assert_eq!(tc.depth, Some(4));
    assert_eq!(tc.movetime, Some(std::time::Duration::from_millis(250)));
  }

  #[test]
  fn unknown_commands_are_rejected() {
    assert!("xyzzy".parse::<UciClientMessage>().is_err());
  }

  #[test]
  fn messages_roundtrip_through_display() {
    for line in [
      "position startpos moves e2e4 e7e5",
      "go depth 6 movetime 1000",
      "setoption name Heuristic value classical",
      "stop",
      "quit",
    ] {
      let msg: UciClientMessage = line.parse().unwrap();
      assert_eq!(msg.to_string(), line);
    }
  }
}
