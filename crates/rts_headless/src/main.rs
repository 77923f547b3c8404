//! Headless RTS match driver.
//!
//! This binary runs matches without a front-end, controlled via JSON on
//! stdin/stdout or played by the scripted policy.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p rts_headless
//!
//! # Auto-play one match, print the final map and summary
//! cargo run -p rts_headless -- play --seed 7 --ticks 3000 --summary summary.json
//!
//! # Run a batch of mirrored matches
//! cargo run -p rts_headless -- batch --count 200 --output results/batch.json
//!
//! # Check that a seed replays identically
//! cargo run -p rts_headless -- verify --seed 7 --runs 5
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rts_core::rules::GameRules;
use rts_core::simulation::Simulation;
use rts_headless::{
    ascii_visualizer::{render_ascii, AsciiConfig},
    batch::{run_batch, verify_determinism, BatchConfig},
    error::{HeadlessError, Result},
    metrics::GameMetrics,
    runner::{HeadlessConfig, HeadlessRunner},
};

#[derive(Parser)]
#[command(name = "rts_headless")]
#[command(about = "Headless tile RTS driver for scripted control and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Rules file (RON); defaults are used when absent
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Copy)]
struct SeedArg {
    /// Map and opponent seed
    #[arg(short, long, default_value = "0")]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session over stdin/stdout
    Run {
        #[command(flatten)]
        seed: SeedArg,

        /// Output state after every step
        #[arg(long)]
        auto_state: bool,

        /// Let the scripted policy play the player side too
        #[arg(long)]
        scripted_player: bool,
    },

    /// Auto-play one match and print the map and summary
    Play {
        #[command(flatten)]
        seed: SeedArg,

        /// Maximum ticks to play
        #[arg(short, long, default_value = "3000")]
        ticks: u64,

        /// Leave the player side idle instead of mirroring the scripted policy
        #[arg(long)]
        no_mirror: bool,

        /// Write the summary JSON here instead of stdout
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Disable ANSI colors in the map
        #[arg(long)]
        no_color: bool,
    },

    /// Run a batch of matches for balance testing
    Batch {
        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Results file
        #[arg(short, long, default_value = "results/batch.json")]
        output: PathBuf,

        /// Seed of the first match
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit per match
        #[arg(long, default_value = "6000")]
        max_ticks: u64,
    },

    /// Verify that a seed plays out identically across runs
    Verify {
        #[command(flatten)]
        seed: SeedArg,

        /// Number of runs
        #[arg(short, long, default_value = "3")]
        runs: u32,

        /// Ticks per run
        #[arg(long, default_value = "3000")]
        ticks: u64,
    },

    /// Print the effective rules as RON
    Rules,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = load_rules(cli.rules.as_deref()).and_then(|rules| match cli.command {
        Some(Commands::Run {
            seed,
            auto_state,
            scripted_player,
        }) => cmd_run(rules, seed.seed, auto_state, scripted_player),
        Some(Commands::Play {
            seed,
            ticks,
            no_mirror,
            summary,
            no_color,
        }) => cmd_play(rules, seed.seed, ticks, !no_mirror, summary, no_color),
        Some(Commands::Batch {
            count,
            parallel,
            output,
            seed,
            max_ticks,
        }) => cmd_batch(rules, count, parallel, &output, seed, max_ticks),
        Some(Commands::Verify { seed, runs, ticks }) => cmd_verify(&rules, seed.seed, runs, ticks),
        Some(Commands::Rules) => cmd_rules(&rules),
        None => {
            // Default: interactive mode
            cmd_run(rules, 0, false, false)
        }
    });

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_rules(path: Option<&Path>) -> Result<GameRules> {
    match path {
        Some(path) => {
            let rules = GameRules::load(path)?;
            tracing::info!(path = %path.display(), "Loaded rules");
            Ok(rules)
        }
        None => Ok(GameRules::default()),
    }
}

/// Run an interactive session
fn cmd_run(rules: GameRules, seed: u64, auto_state: bool, scripted_player: bool) -> Result<()> {
    tracing::info!("Starting interactive session");

    let config = HeadlessConfig {
        auto_state_output: auto_state,
        seed,
        scripted_player,
        rules,
    };
    let mut runner = HeadlessRunner::new(config)?;
    runner.run(io::stdin().lock(), io::stdout().lock())
}

/// Auto-play a single match
fn cmd_play(
    rules: GameRules,
    seed: u64,
    ticks: u64,
    mirrored: bool,
    summary_path: Option<PathBuf>,
    no_color: bool,
) -> Result<()> {
    let mut sim = Simulation::new(rules, seed)?;
    if mirrored {
        sim = sim.with_scripted_player(seed);
    }
    let outcome = sim.run_until_decided(ticks);
    tracing::info!(seed, tick = sim.tick(), ?outcome, "Match finished");

    let config = AsciiConfig {
        use_color: !no_color,
        ..Default::default()
    };
    eprint!("{}", render_ascii(&sim.snapshot(), &config));

    let metrics = GameMetrics::collect(seed, &sim);
    for (faction, m) in &metrics.factions {
        eprintln!(
            "{faction}: earned {} spent {} produced {} kills {} losses {}",
            m.gold_earned,
            m.gold_spent,
            m.total_units_produced(),
            m.kills.values().sum::<u32>(),
            m.losses.values().sum::<u32>()
        );
    }

    let json = sim.summary().to_json_pretty()?;
    match summary_path {
        Some(path) => {
            std::fs::write(&path, json).map_err(|source| HeadlessError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), "Summary written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Run a batch of matches
fn cmd_batch(
    rules: GameRules,
    count: u32,
    parallel: u32,
    output: &Path,
    seed: u64,
    max_ticks: u64,
) -> Result<()> {
    let config = BatchConfig {
        game_count: count,
        parallel_games: parallel,
        seed_start: seed,
        max_ticks,
        mirrored: true,
        rules,
    };
    let results = run_batch(config);
    results.save(output)?;

    let summary = &results.summary;
    eprintln!("\n=== Batch Results ===");
    eprintln!("Games:    {}", summary.total_games);
    for (faction, rate) in &summary.win_rates {
        eprintln!("{faction:<9} {:.1}% wins", rate * 100.0);
    }
    eprintln!("Draws:    {}", summary.draws);
    eprintln!("Open:     {}", summary.undecided);
    eprintln!("Avg len:  {:.0} ticks", summary.avg_duration_ticks);
    eprintln!("Results:  {}", output.display());

    if !results.errors.is_empty() {
        tracing::warn!(errors = results.errors.len(), "Some matches failed to start");
    }
    Ok(())
}

/// Verify determinism
fn cmd_verify(rules: &GameRules, seed: u64, runs: u32, ticks: u64) -> Result<()> {
    tracing::info!(seed, runs, ticks, "Verifying determinism");
    let hashes = verify_determinism(rules, seed, runs, ticks)?;
    eprintln!(
        "PASS: All {} runs produced identical results (hash {:016x})",
        runs,
        hashes.first().copied().unwrap_or_default()
    );
    Ok(())
}

/// Print the effective rules
fn cmd_rules(rules: &GameRules) -> Result<()> {
    println!("{}", rules.to_ron_string()?);
    Ok(())
}
