//! Firestorm out-of-order simulator CLI.
//!
//! This binary provides a single entry point for all simulation modes. It performs:
//! 1. **Trace run:** Execute a JSON micro-op trace (one stream per hardware thread).
//! 2. **Synthetic run:** Generate a workload of a known shape and execute it.
//! 3. **Config dump:** Print the default (or a loaded) configuration as JSON.
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` (e.g. `RUST_LOG=debug`) or pass
//! `-v` / `-vv` to see squashes, traps, and per-stage detail.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use firestorm_core::common::SimResult;
use firestorm_core::config::Config;
use firestorm_core::isa::{InstSource, SyntheticWorkload, TraceProgram, generate};
use firestorm_core::sim::Simulator;
use firestorm_core::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "firestorm",
    author,
    version,
    about = "Cycle-level out-of-order core simulator (Apple M1 Firestorm model)",
    long_about = "Run a micro-op trace or a synthetic workload through the out-of-order core and its memory hierarchy.\n\nExamples:\n  firestorm run trace.json\n  firestorm run trace.json --config m1.json --stats summary,memory\n  firestorm synth independent-alu --len 100000\n  firestorm config > m1.json"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct RunOptions {
    /// JSON configuration file (missing fields keep their defaults).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many cycles.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Statistics sections to print, comma separated (default: all).
    #[arg(long, value_delimiter = ',', value_parser = clap::builder::PossibleValuesParser::new(STATS_SECTIONS.iter().copied()))]
    stats: Vec<String>,

    /// Print statistics as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a JSON micro-op trace.
    Run {
        /// Trace file.
        trace: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Run a generated workload.
    Synth {
        /// Workload shape.
        #[arg(value_enum)]
        kind: Workload,

        /// Micro-ops per thread.
        #[arg(short, long, default_value_t = 10_000)]
        len: usize,

        /// Hardware threads, each running its own copy of the workload.
        #[arg(short, long)]
        threads: Option<usize>,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Print the configuration as JSON.
    Config {
        /// Configuration file to load and validate instead of the defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Workload {
    IndependentAlu,
    DependentChain,
    Memory,
    Branchy,
    Mixed,
}

impl From<Workload> for SyntheticWorkload {
    fn from(w: Workload) -> Self {
        match w {
            Workload::IndependentAlu => Self::IndependentAlu,
            Workload::DependentChain => Self::DependentChain,
            Workload::Memory => Self::Memory,
            Workload::Branchy => Self::Branchy,
            Workload::Mixed => Self::Mixed,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { trace, options } => cmd_run(&trace, &options),
        Commands::Synth {
            kind,
            len,
            threads,
            options,
        } => cmd_synth(kind, len, threads, &options),
        Commands::Config { config } => cmd_config(config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> SimResult<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn cmd_run(trace: &Path, options: &RunOptions) -> SimResult<()> {
    let config = load_config(options.config.as_deref())?;
    let program = TraceProgram::from_file(trace)?;
    simulate(config, program, options)
}

fn cmd_synth(
    kind: Workload,
    len: usize,
    threads: Option<usize>,
    options: &RunOptions,
) -> SimResult<()> {
    let mut config = load_config(options.config.as_deref())?;
    if let Some(threads) = threads {
        config.general.num_threads = threads;
    }
    let stream = generate(kind.into(), len);
    let program = TraceProgram::new(vec![stream; config.general.num_threads]);
    simulate(config, program, options)
}

fn cmd_config(path: Option<&Path>) -> SimResult<()> {
    let config = load_config(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn simulate(mut config: Config, source: impl InstSource, options: &RunOptions) -> SimResult<()> {
    if let Some(max) = options.max_cycles {
        config.general.max_cycles = max;
    }
    let mut sim = Simulator::new(&config, source)?;
    let stats = sim.run()?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        stats.print_sections(&options.stats);
    }
    Ok(())
}
