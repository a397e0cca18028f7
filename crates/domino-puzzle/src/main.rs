//! CLI entry point for the domino puzzle tools.
//!
//! Usage:
//!   domino-puzzle analyse <board.txt> --variant capture [options]
//!   domino-puzzle analyse --stdin --variant slide [options]
//!   domino-puzzle fill --width 4 --height 3 [options]
//!
//! Set `RUST_LOG=debug` to see walk and fill progress on stderr.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use domino_puzzle::{
    AddingRules, Board, BoardAnalysis, CaptureRules, DriveRules, FillConfig, FillOutcome,
    LadderRules, MoveGenerator, RandomChooser, Result, SlideRules, WalkConfig,
    DEFAULT_CYCLE_BUDGET, DEFAULT_MAX_PIPS,
};

/// Fills abandoned for running out of budget before giving up.
const FILL_ATTEMPTS: usize = 100;

#[derive(Parser)]
#[command(name = "domino-puzzle")]
#[command(about = "Generate domino tilings and solve domino puzzles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Slide,
    Capture,
    Adding,
    Ladder,
    /// Ladder where a marker may step onto any value
    LadderAny,
    Drive,
}

impl Variant {
    fn rules(self) -> Box<dyn MoveGenerator> {
        match self {
            Variant::Slide => Box::new(SlideRules),
            Variant::Capture => Box::new(CaptureRules),
            Variant::Adding => Box::new(AddingRules),
            Variant::Ladder => Box::new(LadderRules::new(false)),
            Variant::LadderAny => Box::new(LadderRules::new(true)),
            Variant::Drive => Box::new(DriveRules),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Explore every state of a board and print its solution as JSON
    Analyse {
        /// Path to the board text (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read the board from stdin instead of a file
        #[arg(long)]
        stdin: bool,

        /// Puzzle rules to apply
        #[arg(long, value_enum)]
        variant: Variant,

        /// Most states to explore before giving up
        #[arg(long)]
        size_limit: Option<usize>,

        /// Fall back to the closest state when nothing is solved
        #[arg(long)]
        partial: bool,
    },
    /// Tile an empty board with random dominoes
    Fill {
        #[arg(long)]
        width: usize,

        #[arg(long)]
        height: usize,

        /// Highest pip value in the domino set
        #[arg(long, default_value_t = DEFAULT_MAX_PIPS)]
        max_pips: u8,

        /// Forbid equal pips touching across dominoes
        #[arg(long)]
        no_matches: bool,

        /// Seed for a reproducible tiling
        #[arg(long)]
        seed: Option<u64>,

        /// Candidate attempts per fill
        #[arg(long, default_value_t = DEFAULT_CYCLE_BUDGET)]
        cycle_budget: usize,
    },
}

/// Parse `text` and analyse it under `variant`.
fn analyse(
    text: &str,
    variant: Variant,
    config: &WalkConfig,
    partial: bool,
) -> Result<BoardAnalysis> {
    let board = Board::create(text, 0, None)?;
    let analysis = BoardAnalysis::new(&board, variant.rules(), config, partial)?;
    Ok(analysis)
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyse {
            file,
            stdin,
            variant,
            size_limit,
            partial,
        } => {
            let text = if stdin {
                let mut buffer = String::new();
                if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
                buffer
            } else if let Some(path) = file {
                match fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(e) => {
                        eprintln!("Error reading file {:?}: {}", path, e);
                        std::process::exit(1);
                    }
                }
            } else {
                eprintln!("Error: Must provide either a file path or --stdin");
                std::process::exit(1);
            };

            let mut config = WalkConfig::default();
            if let Some(limit) = size_limit {
                config.size_limit = limit;
            }

            let analysis = match analyse(&text, variant, &config, partial) {
                Ok(analysis) => analysis,
                Err(e) => {
                    eprintln!("Error analysing board: {}", e);
                    std::process::exit(1);
                }
            };

            match serde_json::to_string_pretty(&analysis) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error writing analysis: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Fill {
            width,
            height,
            max_pips,
            no_matches,
            seed,
            cycle_budget,
        } => {
            let config = FillConfig {
                matches_allowed: !no_matches,
                cycle_budget,
            };
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut chooser = RandomChooser::new(rng);

            for _ in 0..FILL_ATTEMPTS {
                let mut board = Board::new(width, height, Some(max_pips));
                match board.fill(&mut chooser, &config) {
                    FillOutcome::Filled => {
                        print!("{}", board.display(false));
                        return;
                    }
                    FillOutcome::BudgetExhausted => continue,
                    FillOutcome::Impossible => {
                        eprintln!("Error: No tiling exists for a {}x{} board", width, height);
                        std::process::exit(1);
                    }
                }
            }
            eprintln!("Error: Gave up after {} fill attempts", FILL_ATTEMPTS);
            std::process::exit(1);
        }
    }
}
