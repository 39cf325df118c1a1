#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for Laser Maze: generates, solves, simulates and
//! converts levels.

mod board;
mod level_io;
mod share_code;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use laser_maze_core::LevelDescriptor;
use laser_maze_system_generator::{Difficulty, GeneratorConfig, Tuning};
use laser_maze_system_optics::{headless::trace_headless, simulate};
use laser_maze_system_solver::{Config, Solver, DEFAULT_SOLUTION_CAP};
use laser_maze_world::{query, World};

#[derive(Parser, Debug)]
#[command(name = "laser-maze", author, version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a solvable level and print it.
    Generate(GenerateArgs),
    /// Search for placements that light every receiver.
    Solve {
        /// Level JSON file, inline share code, or "-" for stdin.
        level: String,
        /// Stop after this many solutions.
        #[arg(long, default_value_t = DEFAULT_SOLUTION_CAP)]
        max_solutions: usize,
        /// Give up after simulating this many boards.
        #[arg(long)]
        max_evaluations: Option<u64>,
    },
    /// Trace the beams of a level as laid out and draw the board.
    Simulate {
        /// Level JSON file, inline share code, or "-" for stdin.
        level: String,
    },
    /// Convert a level into a share code.
    Encode {
        /// Level JSON file, inline share code, or "-" for stdin.
        level: String,
    },
    /// Convert a share code into pretty JSON.
    Decode {
        /// Share code, or "-" for stdin.
        code: String,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Difficulty tier. Rolled from the seed when omitted.
    #[arg(short, long, value_enum)]
    difficulty: Option<DifficultyArg>,
    /// Seed for the generator. Random when omitted.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Board width override.
    #[arg(short = 'W', long)]
    width: Option<u32>,
    /// Board height override.
    #[arg(short = 'H', long)]
    height: Option<u32>,
    /// TOML file with generator tuning overrides.
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Print a share code instead of JSON.
    #[arg(long)]
    share_code: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(value: DifficultyArg) -> Self {
        match value {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

/// Entry point for the Laser Maze command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Generate(args) => generate(args),
        Command::Solve {
            level,
            max_solutions,
            max_evaluations,
        } => solve(&level, Config::new(max_solutions, max_evaluations)),
        Command::Simulate { level } => simulate_level(&level),
        Command::Encode { level } => {
            let level = level_io::load_level(&level)?;
            println!("{}", share_code::encode(&level)?);
            Ok(())
        }
        Command::Decode { code } => {
            let text = level_io::read_source(&code)?;
            let level = share_code::decode(&text).context("failed to decode share code")?;
            print_json(&level)
        }
    }
}

fn init_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn generate(args: GenerateArgs) -> Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("generating with seed {seed}");

    let mut config = GeneratorConfig::new(seed);
    config.difficulty = args.difficulty.map(Difficulty::from);
    config.width = args.width;
    config.height = args.height;
    if let Some(path) = &args.tuning {
        config.tuning = load_tuning(path)?;
    }

    let generated = laser_maze_system_generator::generate(&config)
        .with_context(|| format!("could not generate a level from seed {seed}"))?;
    log::info!(
        "{} level accepted after {} attempts",
        generated.difficulty.label(),
        generated.attempts
    );

    if args.share_code {
        println!("{}", share_code::encode(&generated.level)?);
        Ok(())
    } else {
        print_json(&generated.level)
    }
}

fn load_tuning(path: &Path) -> Result<Tuning> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file '{}'", path.display()))?;
    toml::from_str(&text)
        .with_context(|| format!("failed to parse tuning file '{}'", path.display()))
}

fn solve(source: &str, config: Config) -> Result<()> {
    let level = level_io::load_level(source)?;
    let report = Solver::new(config).solve(&level);

    let verdict = if report.solvable() {
        "solvable"
    } else if report.search_completed() {
        "unsolvable"
    } else {
        "unknown (evaluation budget hit)"
    };
    println!(
        "{verdict}: {} solution(s), {} receiver(s), {} candidate cell(s), {} evaluation(s)",
        report.solution_count(),
        report.total_receivers(),
        report.candidate_cells(),
        report.evaluations()
    );
    for (index, solution) in report.solutions().iter().enumerate() {
        println!("solution {}:", index + 1);
        for placement in solution.placements() {
            println!(
                "  {} rotation {} at ({}, {})",
                placement.kind.label(),
                placement.rotation,
                placement.cell.column(),
                placement.cell.row()
            );
        }
    }
    Ok(())
}

fn simulate_level(source: &str) -> Result<()> {
    let level = level_io::load_level(source)?;
    let world = World::from_level(&level).context("level could not be loaded")?;
    let grid = query::grid(&world);
    let emitters = query::emitters(&world);

    let simulation = simulate(grid, emitters);
    let trace = trace_headless(grid, emitters);
    let active = simulation.active_receivers();

    if let Some(name) = &level.name {
        println!("{name}");
    }
    print!("{}", board::render(grid, emitters, &trace.lit_cells, active));
    println!(
        "active receivers: {}/{}",
        active.len(),
        query::receivers(&world).len()
    );
    for cell in active {
        println!("  ({}, {})", cell.column(), cell.row());
    }
    println!("segments: {}", simulation.segments().len());
    println!(
        "solved: {}",
        if query::is_solved(&world, active) {
            "yes"
        } else {
            "no"
        }
    );
    Ok(())
}

fn print_json(level: &LevelDescriptor) -> Result<()> {
    let json = serde_json::to_string_pretty(level).context("failed to serialise level")?;
    println!("{json}");
    Ok(())
}
