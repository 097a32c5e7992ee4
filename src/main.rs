//! # nsetmine CLI
//!
//! Mines closed error-tolerant n-sets from a noisy relation file.
//!
//! ## Usage
//!
//! ```bash
//! nsetmine relation.fuzzy --epsilon 0,0.5 --sizes 2,2 --output patterns
//! nsetmine graph --clique 0,1 --epsilon 1,1 --sizes 3,3
//! nsetmine relation.fuzzy --reduction-only
//! ```
//!
//! Options given on the command line override the configuration file
//! (`--config`, default `nsetmine.toml`) and the `NSETMINE_*` environment.

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nsetmine::{error::MiningError, run, MiningConfig};

#[derive(Parser, Debug)]
#[command(
    name = "nsetmine",
    version,
    about = "Mine closed error-tolerant n-sets from a noisy n-dimensional relation"
)]
struct Cli {
    /// Input relation ("-" or absent reads standard input)
    input: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Pattern output file (standard output by default)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Per-dimension noise tolerances in [0, 1]
    #[arg(short, long, value_delimiter = ',')]
    epsilon: Vec<f64>,

    /// Per-dimension minimal sizes
    #[arg(short, long, value_delimiter = ',')]
    sizes: Vec<usize>,

    /// Per-dimension maximal sizes
    #[arg(short = 'S', long, value_delimiter = ',')]
    max_sizes: Vec<usize>,

    /// Minimal area of a pattern
    #[arg(short = 'a', long)]
    min_area: Option<usize>,

    /// Maximal area of a pattern
    #[arg(short = 'A', long)]
    max_area: Option<usize>,

    /// Per-dimension tau for almost-contiguous dimensions
    #[arg(short, long, value_delimiter = ',')]
    tau: Vec<f64>,

    /// The two dimensions sharing a symmetric element domain
    #[arg(long, value_delimiter = ',')]
    clique: Vec<usize>,

    /// Dimensions whose closedness is not required
    #[arg(long, value_delimiter = ',')]
    unclosed: Vec<usize>,

    /// Print the reduced relation and exit
    #[arg(long)]
    reduction_only: bool,

    /// Agglomerate overlapping patterns
    #[arg(long)]
    agglomerate: bool,

    /// Append the pattern sizes to each line
    #[arg(long)]
    print_sizes: bool,

    /// Append the pattern area to each line
    #[arg(long)]
    print_area: bool,

    /// Tube occupancy ratio for the dense representation
    #[arg(long)]
    density_threshold: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => MiningConfig::from_file(path)?,
        None => MiningConfig::load()?,
    };
    apply_cli(&mut config, &cli);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let input_name = cli
        .input
        .as_ref()
        .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
    info!(input = %input_name, "mining starts");

    let stats = match &config.input.path.clone() {
        Some(path) if path.as_os_str() != "-" => {
            let file =
                File::open(path).with_context(|| format!("cannot read {}", path.display()))?;
            with_output(&config, |out| {
                run(&config, BufReader::new(file), &input_name, out)
            })?
        }
        _ => {
            let stdin = io::stdin();
            with_output(&config, |out| run(&config, stdin.lock(), &input_name, out))?
        }
    };

    info!(
        closed_n_sets = stats.closed_n_sets,
        left_nodes = stats.left_nodes,
        parse_seconds = stats.parse_seconds,
        reduce_seconds = stats.reduce_seconds,
        mine_seconds = stats.mine_seconds,
        agglomerate_seconds = stats.agglomerate_seconds,
        noise_precision = stats.noise_precision,
        "done"
    );
    Ok(())
}

fn with_output<T>(
    config: &MiningConfig,
    body: impl FnOnce(&mut dyn Write) -> Result<T, MiningError>,
) -> Result<T, MiningError> {
    match &config.output.file {
        Some(path) => {
            let file = File::create(path).map_err(|_| MiningError::NoFile(path.clone()))?;
            let mut writer = BufWriter::new(file);
            let result = body(&mut writer)?;
            writer.flush()?;
            Ok(result)
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            let result = body(&mut writer)?;
            writer.flush()?;
            Ok(result)
        }
    }
}

fn apply_cli(config: &mut MiningConfig, cli: &Cli) {
    if let Some(input) = &cli.input {
        config.input.path = Some(input.clone());
    }
    if let Some(output) = &cli.output {
        config.output.file = Some(output.clone());
    }
    if !cli.epsilon.is_empty() {
        config.constraints.epsilon = cli.epsilon.clone();
    }
    if !cli.sizes.is_empty() {
        config.constraints.min_sizes = cli.sizes.clone();
    }
    if !cli.max_sizes.is_empty() {
        config.constraints.max_sizes = cli.max_sizes.clone();
    }
    if let Some(min_area) = cli.min_area {
        config.constraints.min_area = min_area;
    }
    if let Some(max_area) = cli.max_area {
        config.constraints.max_area = max_area;
    }
    if !cli.tau.is_empty() {
        config.constraints.tau = cli.tau.clone();
    }
    if !cli.clique.is_empty() {
        config.constraints.clique_dimensions = cli.clique.clone();
    }
    if !cli.unclosed.is_empty() {
        config.constraints.unclosed_dimensions = cli.unclosed.clone();
    }
    if cli.reduction_only {
        config.engine.reduction_only = true;
    }
    if cli.agglomerate {
        config.agglomeration.enabled = true;
    }
    if cli.print_sizes {
        config.output.print_sizes = true;
    }
    if cli.print_area {
        config.output.print_area = true;
    }
    if let Some(density_threshold) = cli.density_threshold {
        config.engine.density_threshold = density_threshold;
    }
}
