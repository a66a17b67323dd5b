// Host tooling crate: unwrap/expect/panic acceptable outside embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod board;
mod check;
mod doc;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Peripheral HAL development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the HAL for the embedded target and the simulator for the host
    Check,
    /// Run all tests (unit, integration, and doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
        /// Board table the simulator tests load (sets HAL_NATIVE_BOARD)
        #[arg(long)]
        board: Option<std::path::PathBuf>,
    },
    /// Build and optionally open documentation
    Doc {
        /// Open documentation in browser
        #[arg(long)]
        open: bool,
    },
    /// Validate a JSON board table and list the devices it declares
    Board {
        /// Board table file; the built-in default board when omitted
        path: Option<std::path::PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test {
            unit,
            integration,
            board,
        } => test::run(unit, integration, board.as_deref()),
        Commands::Doc { open } => doc::run(open),
        Commands::Board { path } => board::run(path.as_deref()),
    }
}
