use beast::uci::UciController;
use clap::Parser;
use colored::Colorize;

const BANNER: &str = r"
 ____  ____   __    ___  ____
(  _ \(  __) / _\  / __)(_  _)
 ) _ ( ) _) /    \ \__ \  )(
(____/(____)\_/\_/ (___/ (__)
";

const NAME: &str = "Beast";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

#[derive(Debug, Parser)]
#[command(author, version, about = "A UCI chess engine")]
struct Cli {
    /// Start from a FEN string instead of the standard starting position
    #[arg(short, long)]
    fen: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    eprintln!("{}", BANNER.blue());
    eprintln!("{}: {NAME} {VERSION}", "Engine".blue());
    eprintln!("{}: {AUTHOR}", "Author".blue());
    eprintln!();

    let mut controller = match cli.fen {
        Some(fen) => UciController::from_fen(&fen)?,
        None => UciController::new(),
    };

    controller.run()
}
