//! Beast's UCI interface.
//!
//! Two halves live here. The `UciController` owns stdin and the sticky
//! engine options: it parses client messages, keeps the current position up
//! to date, and forwards commands to the engine. The `EngineThread` is a
//! long-lived worker that consumes those commands from a channel: `go`
//! starts a search, `stop` and `quit` abort one, and everything the worker
//! has to say goes to stdout as UCI messages.
//!
//! While a search is running the worker never blocks on the channel; the
//! search polls it between nodes, which is what makes `stop` and `quit`
//! responsive mid-search.

use crate::evaluate::Evaluator;
use crate::evaluate::Network;
use crate::history_tables::History;
use crate::position::Position;
use crate::search::params::DEFAULT_DEPTH;
use crate::search::params::DEFAULT_TT_ENTRIES;
use crate::search::Search;
use crate::time_control::TimeController;
use crate::transpositions::TTable;
use anyhow::anyhow;
use colored::Colorize;
use shakmaty::CastlingMode;
use shakmaty::uci::UciMove;
use std::fmt::Display;
use std::io::BufRead;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use uci::client::UciClientMessage;
use uci::engine::IdType;
use uci::engine::UciEngineMessage;
use uci::options::OptionType;
use uci::options::UciOption;
use uci::search_info::SearchInfo;
use uci::time_control::TimeControl;

const NAME: &str = "Beast";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

////////////////////////////////////////////////////////////////////////////////
//
// Search options
//
////////////////////////////////////////////////////////////////////////////////

/// The evaluation strategies the client can pick from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HeuristicType {
    #[default]
    Classical,
    NeuralNetwork,
    Random,
}

impl Display for HeuristicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classical => write!(f, "classical"),
            Self::NeuralNetwork => write!(f, "neural_network"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl FromStr for HeuristicType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "classical" => Ok(Self::Classical),
            "neural_network" => Ok(Self::NeuralNetwork),
            "random" => Ok(Self::Random),
            _ => Err(anyhow!("Invalid heuristic type: {s}")),
        }
    }
}

/// Everything a single search needs to know: the position to search, the
/// `go` constraints, and the sticky options set via `setoption`.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub position: Position,
    pub limits: TimeControl,
    pub heuristic: HeuristicType,
    pub model_file: Option<PathBuf>,
    pub syzygy_path: Option<PathBuf>,
    pub syzygy_probe_limit: usize,
    pub fifty_moves_rule: bool,
    pub threads: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            position: Position::new(),
            limits: TimeControl::default(),
            heuristic: HeuristicType::default(),
            model_file: None,
            syzygy_path: None,
            syzygy_probe_limit: 7,
            fifty_moves_rule: true,
            threads: 1,
        }
    }
}

/// Messages from the controller to the engine worker.
pub enum EngineCommand {
    Go(Box<SearchOptions>),
    Stop,
    Quit,
}

////////////////////////////////////////////////////////////////////////////////
//
// The UCI controller
//
////////////////////////////////////////////////////////////////////////////////

/// A wrapper that spins up the engine thread and wires the stdin of the
/// process up to it.
pub struct UciController {
    options: SearchOptions,
    debug: bool,
    engine: EngineThread,
}

impl UciController {
    pub fn new() -> Self {
        Self {
            options: SearchOptions::default(),
            debug: false,
            engine: EngineThread::new(),
        }
    }

    /// Start from a given position instead of the standard starting one.
    pub fn from_fen(fen: &str) -> anyhow::Result<Self> {
        let mut controller = Self::new();
        controller.options.position = Position::from_fen(fen)?;

        Ok(controller)
    }

    /// Listen on stdin and dispatch any valid UCI messages until `quit`.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let stdin = std::io::stdin().lock();

        for input in stdin.lines() {
            let input = input?;

            match input.trim().parse::<UciClientMessage>() {
                Ok(command) => {
                    let done = self.dispatch(command)?;

                    if done {
                        break;
                    }
                }

                // Unknown or malformed lines are skipped; mention them when
                // the client asked for debug output
                Err(err) => {
                    if self.debug {
                        eprintln!("{}", err.to_string().red());
                    }
                }
            }

            std::io::stdout().flush()?;
        }

        // Reached on `quit` or when stdin closes; either way the worker gets
        // told to shut down before we wait on it.
        self.engine.quit();
        self.engine.join();
        Ok(())
    }

    /// Handle a single client message. Returns true when the engine should
    /// shut down.
    fn dispatch(&mut self, command: UciClientMessage) -> anyhow::Result<bool> {
        match command {
            // Print identifying information
            UciClientMessage::Uci => {
                println!("{}", UciEngineMessage::Id(IdType::Name(format!("{NAME} {VERSION}"))));
                println!("{}", UciEngineMessage::Id(IdType::Author(AUTHOR.to_string())));

                for option in self.declared_options() {
                    println!("{}", UciEngineMessage::UciOption(option));
                }

                println!("{}", UciEngineMessage::UciOk);
            }

            // Let the client know we're ready
            UciClientMessage::IsReady => println!("{}", UciEngineMessage::ReadyOk),

            // Print additional debug information
            UciClientMessage::Debug(debug) => self.debug = debug,

            // Reset the board; sticky options persist across games
            UciClientMessage::UciNewGame => {
                self.options.position = Position::new();
                self.options.limits = TimeControl::default();
            }

            // Set up the provided position by applying the moves to the
            // provided board state. An invalid FEN never reaches us (the
            // parse already failed); an illegal move leaves the current
            // position untouched.
            UciClientMessage::Position(fen, moves) => {
                match self.build_position(fen, &moves) {
                    Ok(position) => self.options.position = position,
                    Err(err) => self.diagnostic(format!("Invalid position: {err}")),
                }
            }

            // Start a search on the current board position with the
            // requested constraints
            UciClientMessage::Go(limits) => {
                if limits.ponder {
                    // Pondering is unsupported; the go returns immediately
                    return Ok(false);
                }

                let mut options = self.options.clone();
                options.limits = limits;

                // A bare `go` searches at the engine's default depth
                if options.limits == TimeControl::default() {
                    options.limits.depth = Some(DEFAULT_DEPTH);
                }

                self.engine.go(options);
            }

            // Abort the currently running search
            UciClientMessage::Stop => self.engine.stop(),

            UciClientMessage::SetOption(name, value) => self.set_option(&name, &value),

            UciClientMessage::Quit => return Ok(true),
        }

        Ok(false)
    }

    fn build_position(
        &self,
        fen: Option<shakmaty::fen::Fen>,
        moves: &[UciMove],
    ) -> anyhow::Result<Position> {
        let mut position = match fen {
            Some(fen) => Position::from_fen(&fen.to_string())?,
            None => Position::new(),
        };

        for mv in moves {
            position.push_uci(mv)?;
        }

        Ok(position)
    }

    /// Update a sticky option. Unknown names are ignored silently, invalid
    /// values with a diagnostic.
    fn set_option(&mut self, name: &str, value: &str) {
        match name.to_lowercase().as_str() {
            "heuristic" => match value.to_lowercase().parse() {
                Ok(heuristic) => self.options.heuristic = heuristic,
                Err(err) => self.diagnostic(err.to_string()),
            },

            "modelfile" => {
                let path = PathBuf::from(value.replace('\\', "/"));

                if path.exists() {
                    self.options.model_file = Some(path);
                } else {
                    self.diagnostic("Invalid model file.");
                }
            }

            "syzygypath" => {
                let path = PathBuf::from(value.replace('\\', "/"));

                if path.exists() {
                    self.options.syzygy_path = Some(path);
                } else {
                    self.diagnostic("Invalid syzygy path.");
                }
            }

            "syzygyprobelimit" => match value.parse::<usize>() {
                Ok(limit) if limit <= 7 => self.options.syzygy_probe_limit = limit,
                _ => self.diagnostic("Invalid syzygy probe limit."),
            },

            "syzygy50moverule" => match value.to_lowercase().as_str() {
                "true" => self.options.fifty_moves_rule = true,
                "false" => self.options.fifty_moves_rule = false,
                _ => self.diagnostic("Invalid syzygy 50 move rule."),
            },

            // The searcher is single-threaded; the option is accepted for
            // GUI compatibility
            "threads" => match value.parse::<usize>() {
                Ok(threads) if threads >= 1 => self.options.threads = threads,
                _ => self.diagnostic("Invalid thread count."),
            },

            _ => {}
        }
    }

    /// The options advertised in response to `uci`.
    fn declared_options(&self) -> Vec<UciOption> {
        vec![
            UciOption {
                name: "Heuristic",
                option_type: OptionType::Combo {
                    default: HeuristicType::default().to_string(),
                    allowed: vec![
                        HeuristicType::Classical.to_string(),
                        HeuristicType::NeuralNetwork.to_string(),
                        HeuristicType::Random.to_string(),
                    ],
                },
            },
            UciOption {
                name: "ModelFile",
                option_type: OptionType::String {
                    default: self
                        .options
                        .model_file
                        .as_ref()
                        .map(|path| path.display().to_string())
                        .unwrap_or_else(|| "<empty>".to_string()),
                },
            },
            UciOption {
                name: "Syzygy50MoveRule",
                option_type: OptionType::Check {
                    default: self.options.fifty_moves_rule,
                },
            },
            UciOption {
                name: "SyzygyPath",
                option_type: OptionType::String {
                    default: self
                        .options
                        .syzygy_path
                        .as_ref()
                        .map(|path| path.display().to_string())
                        .unwrap_or_else(|| "<empty>".to_string()),
                },
            },
            UciOption {
                name: "SyzygyProbeLimit",
                option_type: OptionType::Spin {
                    min: 0,
                    max: 7,
                    default: self.options.syzygy_probe_limit as i32,
                },
            },
            UciOption {
                name: "Threads",
                option_type: OptionType::Spin {
                    min: 1,
                    max: num_cpus::get() as i32,
                    default: self.options.threads as i32,
                },
            },
        ]
    }

    fn diagnostic(&self, message: impl Into<String>) {
        println!("{}", UciEngineMessage::Info(SearchInfo::message(message)));
    }
}

impl Default for UciController {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// The engine thread
//
////////////////////////////////////////////////////////////////////////////////

/// A handle to the long-running thread in charge of searching for the best
/// move, given a position and search constraints.
struct EngineThread {
    tx: Sender<EngineCommand>,
    handle: Option<JoinHandle<()>>,
}

impl EngineThread {
    /// Spawn the engine thread and return a handle to it.
    fn new() -> Self {
        let (tx, rx) = std::sync::mpsc::channel::<EngineCommand>();
        let handle = std::thread::spawn(move || engine_loop(rx));

        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Initiate a new search.
    fn go(&self, options: SearchOptions) {
        self.tx.send(EngineCommand::Go(Box::new(options))).ok();
    }

    /// Abort the current search, if one is running.
    fn stop(&self) {
        self.tx.send(EngineCommand::Stop).ok();
    }

    /// Abort any running search and shut the thread down.
    fn quit(&self) {
        self.tx.send(EngineCommand::Quit).ok();
    }

    /// Wait for the thread to finish. Called after `quit`.
    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

/// The worker loop: idle until a command arrives, search on `go`, shut down
/// on `quit`.
fn engine_loop(rx: Receiver<EngineCommand>) {
    loop {
        let Ok(command) = rx.recv() else { break };

        match command {
            EngineCommand::Quit => break,

            // A stop with no search running is a no-op
            EngineCommand::Stop => continue,

            EngineCommand::Go(options) => {
                let quit = run_search(*options, &rx);

                if quit {
                    break;
                }
            }
        }
    }
}

/// Run a single search to completion and report its best move. Returns true
/// when the search was aborted by a `quit`.
fn run_search(mut options: SearchOptions, rx: &Receiver<EngineCommand>) -> bool {
    let mut position = options.position.clone();

    // A finished position has no move to search for
    if position.legal_moves().is_empty() {
        println!(
            "{}",
            UciEngineMessage::Info(SearchInfo::message("No legal moves in this position."))
        );
        println!("{}", UciEngineMessage::BestMove(None));
        std::io::stdout().flush().ok();
        return false;
    }

    let evaluator = choose_evaluator(&mut options);
    let tc = TimeController::new(options.limits.clone(), position.turn());

    // All search-local state starts fresh on every go
    let mut tt = TTable::with_capacity(DEFAULT_TT_ENTRIES);
    let mut history = History::new();

    let mut search = Search::new(tc, &evaluator, &mut tt, &mut history, Some(rx));
    let report = search.run(&mut position);

    let best_move = report
        .best_move
        .as_ref()
        .map(|mv| UciMove::from_move(mv, CastlingMode::Standard));

    println!("{}", UciEngineMessage::BestMove(best_move));
    std::io::stdout().flush().ok();

    search.saw_quit()
}

/// Initialize the evaluator the search options ask for, falling back to the
/// classical evaluation (with a diagnostic) when a model can't be loaded.
fn choose_evaluator(options: &mut SearchOptions) -> Evaluator {
    let classical = |options: &SearchOptions| {
        Evaluator::classical(
            options.fifty_moves_rule,
            options.syzygy_path.clone(),
            options.syzygy_probe_limit,
        )
    };

    match options.heuristic {
        HeuristicType::Classical => classical(options),

        // The random evaluator answers instantly and deeper search adds
        // nothing; clamp the depth
        HeuristicType::Random => {
            options.limits.depth = Some(1);
            Evaluator::random()
        }

        HeuristicType::NeuralNetwork => {
            let Some(model_file) = options.model_file.clone() else {
                warn("Warning: incorrect model file.");
                return classical(options);
            };

            match Network::load(&model_file) {
                Ok(network) => Evaluator::neural_network(
                    network,
                    options.fifty_moves_rule,
                    options.syzygy_path.clone(),
                    options.syzygy_probe_limit,
                ),

                Err(err) => {
                    warn(format!("Warning: failed to load model: {err:#}"));
                    classical(options)
                }
            }
        }
    }
}

fn warn(message: impl Into<String>) {
    println!("{}", UciEngineMessage::Info(SearchInfo::message(message)));
    std::io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_types_roundtrip() {
        for heuristic in [
            HeuristicType::Classical,
            HeuristicType::NeuralNetwork,
            HeuristicType::Random,
        ] {
            let parsed: HeuristicType = heuristic.to_string().parse().unwrap();
            assert_eq!(parsed, heuristic);
        }

        assert!("minimax".parse::<HeuristicType>().is_err());
    }

    #[test]
    fn random_heuristic_clamps_the_search_depth() {
        let mut options = SearchOptions {
            heuristic: HeuristicType::Random,
            limits: TimeControl {
                depth: Some(6),
                ..TimeControl::default()
            },
            ..SearchOptions::default()
        };

        let evaluator = choose_evaluator(&mut options);

        assert_eq!(options.limits.depth, Some(1));
        assert!(!evaluator.needs_quiescence());
    }

    #[test]
    fn a_missing_model_falls_back_to_classical() {
        let mut options = SearchOptions {
            heuristic: HeuristicType::NeuralNetwork,
            model_file: Some(PathBuf::from("/does/not/exist.onnx")),
            ..SearchOptions::default()
        };

        let evaluator = choose_evaluator(&mut options);

        // The classical fallback still wants quiescence
        assert!(evaluator.needs_quiescence());
    }

    #[test]
    fn go_and_quit_drive_a_full_search() {
        let (tx, rx) = std::sync::mpsc::channel::<EngineCommand>();

        let options = SearchOptions {
            limits: TimeControl {
                depth: Some(2),
                ..TimeControl::default()
            },
            ..SearchOptions::default()
        };

        tx.send(EngineCommand::Go(Box::new(options))).unwrap();
        tx.send(EngineCommand::Quit).unwrap();

        let handle = std::thread::spawn(move || engine_loop(rx));

        handle.join().unwrap();
    }

    #[test]
    fn a_finished_position_reports_no_best_move() {
        let (_tx, rx) = std::sync::mpsc::channel::<EngineCommand>();

        let options = SearchOptions {
            position: Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap(),
            ..SearchOptions::default()
        };

        // Stalemate: the search must return without hanging
        assert!(!run_search(options, &rx));
    }
}
