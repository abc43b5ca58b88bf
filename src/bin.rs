//! The thin CLI surface (C12, `spec.md` §6): enough of a runnable binary to drive
//! autofill and inspect a puzzle file by hand.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use xword_core::{io, AutofillParams, Engine, FillOutcome};

#[derive(Parser)]
#[command(name = "xword", about = "Crossword construction engine CLI")]
struct Cli {
    /// Suppress informational log output.
    #[arg(long, global = true)]
    quiet: bool,

    /// Dictionary source file to load before running a command.
    #[arg(long, value_name = "PATH", global = true)]
    dictionary: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a puzzle file, autofill it, and print the result.
    Solve { puzzle_file: PathBuf },
    /// Print a puzzle file's dimensions, slot count, and pattern validity.
    Inspect { puzzle_file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet { log::LevelFilter::Warn } else { log::LevelFilter::Info };
    env_logger::Builder::new().filter_level(level).init();

    let grid = match &cli.command {
        Command::Solve { puzzle_file } | Command::Inspect { puzzle_file } => {
            match io::load_puzzle_from_file(puzzle_file) {
                Ok(grid) => grid,
                Err(err) => {
                    eprintln!("failed to load puzzle file {puzzle_file:?}: {err}");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let mut engine = Engine::new(grid.height(), grid.width());
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let coord = xword_core::Coord::new(row, col);
            if grid.get(coord).is_barrier() {
                engine.set_barrier(coord, true, false);
            }
        }
    }
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let coord = xword_core::Coord::new(row, col);
            if !grid.get(coord).is_barrier() && grid.is_filled(coord) {
                engine.set(coord, grid.get(coord).contents());
            }
        }
    }

    if let Some(path) = &cli.dictionary {
        if let Err(err) = engine.load_from_file(path) {
            eprintln!("failed to load dictionary {path:?}: {err}");
            return ExitCode::FAILURE;
        }
    }

    match cli.command {
        Command::Inspect { .. } => {
            println!("dimensions: {}x{}", engine.height(), engine.width());
            println!("slots: {}", engine.slots().len());
            println!("valid pattern: {}", engine.is_valid_pattern());
            ExitCode::SUCCESS
        }
        Command::Solve { .. } => {
            if !engine.is_loaded() {
                eprintln!("no dictionary loaded; pass --dictionary <PATH>");
                return ExitCode::FAILURE;
            }
            let outcome = engine.autofill(AutofillParams::default());
            match outcome {
                FillOutcome::Solved => {
                    println!("solved");
                    ExitCode::SUCCESS
                }
                FillOutcome::ExhaustedWithoutSolution => {
                    println!("no solution found");
                    ExitCode::FAILURE
                }
                FillOutcome::Cancelled => {
                    println!("cancelled");
                    ExitCode::FAILURE
                }
                FillOutcome::DeadlineReached => {
                    println!("deadline reached before a solution was found");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
