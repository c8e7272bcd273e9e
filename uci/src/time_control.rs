use anyhow::anyhow;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// The search constraints attached to a `go` command.
///
/// Unlike the UCI spec suggests, these are not mutually exclusive: a client is
/// free to send `go depth 6 movetime 1000`, and the engine is expected to
/// respect whichever limit trips first. Absent fields are unset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimeControl {
  /// Cutoff search depth, in plies
  pub depth: Option<usize>,

  /// Cutoff node count
  pub nodes: Option<u64>,

  /// Search for a fixed amount of time
  pub movetime: Option<Duration>,

  /// White's remaining time on the clock
  pub wtime: Option<Duration>,

  /// Black's remaining time on the clock
  pub btime: Option<Duration>,

  /// White's per-move increment
  pub winc: Option<Duration>,

  /// Black's per-move increment
  pub binc: Option<Duration>,

  /// Moves remaining until the next time control (informational)
  pub movestogo: Option<u32>,

  /// Keep going until we get an explicit `stop` signal
  pub infinite: bool,

  /// The client asked us to ponder. Pondering is not supported, so a `go`
  /// that carries this flag returns immediately.
  pub ponder: bool,
}

impl TimeControl {
  /// Whether any clock-related option was provided at all. If not, no timer
  /// should be armed and the search runs until another limit stops it.
  pub fn has_time_options(&self) -> bool {
    self.movetime.is_some()
      || self.wtime.is_some()
      || self.btime.is_some()
      || self.winc.is_some()
      || self.binc.is_some()
  }

  /// The remaining time and increment for the given side (white = true).
  pub fn clock(&self, white: bool) -> (Option<Duration>, Option<Duration>) {
    if white {
      (self.wtime, self.winc)
    } else {
      (self.btime, self.binc)
    }
  }
}

impl Display for TimeControl {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut parts: Vec<String> = Vec::new();

    if let Some(depth) = self.depth {
      parts.push(format!("depth {depth}"));
    }

    if let Some(nodes) = self.nodes {
      parts.push(format!("nodes {nodes}"));
    }

    if let Some(movetime) = self.movetime {
      parts.push(format!("movetime {}", movetime.as_millis()));
    }

    if let Some(wtime) = self.wtime {
      parts.push(format!("wtime {}", wtime.as_millis()));
    }

    if let Some(btime) = self.btime {
      parts.push(format!("btime {}", btime.as_millis()));
    }

    if let Some(winc) = self.winc {
      parts.push(format!("winc {}", winc.as_millis()));
    }

    if let Some(binc) = self.binc {
      parts.push(format!("binc {}", binc.as_millis()));
    }

    if let Some(movestogo) = self.movestogo {
      parts.push(format!("movestogo {movestogo}"));
    }

    if self.infinite {
      parts.push("infinite".to_string());
    }

    if self.ponder {
      parts.push("ponder".to_string());
    }

    write!(f, "{}", parts.join(" "))
  }
}

impl FromStr for TimeControl {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> anyhow::Result<Self> {
    let mut tc = TimeControl::default();
    let mut parts = s.split_whitespace();

    while let Some(keyword) = parts.next() {
      match keyword {
        "depth" => tc.depth = Some(next_value(&mut parts, s)?),
        "nodes" => tc.nodes = Some(next_value(&mut parts, s)?),
        "movetime" => tc.movetime = Some(next_millis(&mut parts, s)?),
        "wtime" => tc.wtime = Some(next_millis(&mut parts, s)?),
        "btime" => tc.btime = Some(next_millis(&mut parts, s)?),
        "winc" => tc.winc = Some(next_millis(&mut parts, s)?),
        "binc" => tc.binc = Some(next_millis(&mut parts, s)?),
        "movestogo" => tc.movestogo = Some(next_value(&mut parts, s)?),
        "infinite" => tc.infinite = true,
        "ponder" => tc.ponder = true,

        // Skip anything we don't recognize and keep going
        _ => continue,
      }
    }

    Ok(tc)
  }
}

fn next_value<'a, T: FromStr>(
  parts: &mut impl Iterator<Item = &'a str>,
  original: &str,
) -> anyhow::Result<T> {
  parts
    .next()
    .ok_or(anyhow!("Invalid time control: {original}"))?
    .parse()
    .map_err(|_| anyhow!("Invalid time control: {original}"))
}

fn next_millis<'a>(
  parts: &mut impl Iterator<Item = &'a str>,
  original: &str,
) -> anyhow::Result<Duration> {
  // Some GUIs send negative clock values when a player has flagged. Clamp
  // those to zero instead of failing the whole command.
  let millis: i64 = next_value(parts, original)?;
  Ok(Duration::from_millis(millis.max(0) as u64))
}
