//! Self-Stabilization Simulator
//!
//! Builds a network, runs it under the central daemon until it stabilises
//! or the move bound is hit, and reports what happened.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use selfstab_core::algorithms::{centroid, reset};
use selfstab_core::config::DEFAULT_CONFIG_PATH;
use selfstab_core::setup;
use selfstab_core::{
    Algorithm, EngineError, MoveLogger, Network, SimConfig, StatsCollector,
};

/// Shape of the simulated network
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Topology {
    /// The seven-node weighted tree
    Fixture,
    /// A random tree over `--nodes` nodes
    RandomTree,
}

/// Command line arguments for the simulator
#[derive(Parser, Debug)]
#[command(name = "stabsim")]
#[command(about = "Simulates self-stabilizing algorithms under a central daemon")]
struct Args {
    /// Random seed for reproducibility (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Moves allowed before giving up (overrides the config file)
    #[arg(long)]
    max_moves: Option<u64>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Network topology
    #[arg(long, value_enum, default_value_t = Topology::Fixture)]
    topology: Topology,

    /// Node count for random topologies
    #[arg(long, default_value_t = 10)]
    nodes: u64,

    /// Program to run on every node
    #[arg(long, default_value_t = Algorithm::Centroid)]
    algorithm: Algorithm,

    /// Write every move as JSONL to this file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<SimConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            SimConfig::from_file(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(max_moves) = args.max_moves {
        config.simulation.max_moves = max_moves;
    }
    Ok(config)
}

fn build_network(args: &Args, config: &SimConfig) -> Result<Network, EngineError> {
    match (args.algorithm, args.topology) {
        (Algorithm::Centroid, Topology::Fixture) => setup::centroid_fixture(config),
        (Algorithm::Centroid, Topology::RandomTree) => {
            setup::random_weighted_tree(config, args.nodes.max(1))
        }
        (Algorithm::Reset, topology) => {
            let program = Arc::new(reset::program(&config.random)?);
            let n = match topology {
                Topology::Fixture => setup::FIXTURE_WEIGHTS.len() as u64,
                Topology::RandomTree => args.nodes.max(1),
            };
            let mut network = Network::new(config.simulation.seed);
            setup::random_tree(&mut network, &program, n)?;
            Ok(network)
        }
    }
}

/// Runs one simulation. Returns whether the network stabilised.
fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(true);
    }

    let mut network = build_network(&args, &config)?;
    info!(
        algorithm = %args.algorithm,
        seed = config.simulation.seed,
        nodes = network.len(),
        network = %network.id(),
        "network built"
    );
    for node in network.nodes() {
        debug!(node = %node.id(), state = ?node.state(), "initial state");
    }

    let mut logger = match &args.log {
        Some(path) => MoveLogger::new(path)?,
        None => MoveLogger::null(),
    };
    let mut stats = StatsCollector::new();

    let max_moves = config.simulation.max_moves;
    for record in network.run().take(max_moves as usize) {
        let record = record?;
        info!("{}", record);
        logger.log(&record)?;
        stats.record(&record);
    }
    logger.flush()?;

    let stabilised = network.is_stabilised();
    let centroid = match args.algorithm {
        Algorithm::Centroid if stabilised => centroid::elected_centroid(&network),
        _ => None,
    };
    if stabilised {
        info!(moves = network.steps(), "network stabilised");
        if let Some(id) = centroid {
            info!(centroid = %id, "centroid elected");
        }
    } else {
        warn!(max_moves, "network did not stabilise within the move bound");
    }

    let summary = stats.finish(
        args.algorithm.to_string(),
        config.simulation.seed,
        network.len(),
        stabilised,
        centroid,
    );
    println!("{}", summary.to_json()?);
    Ok(stabilised)
}
