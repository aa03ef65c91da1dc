use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use perceptron::{evaluate, load_patterns, Logging, Result, TrainingConfig};

/// Trains a multi-layer perceptron on a pair of pattern files.
#[derive(Parser, Debug)]
#[command(name = "train", version, about, long_about = None)]
struct Args {
    /// TOML file describing the network and training parameters
    #[arg(short, long)]
    config: PathBuf,

    /// Training samples, one `;` separated pattern per line
    #[arg(long)]
    samples: PathBuf,

    /// Training targets, matched to the samples line by line
    #[arg(long)]
    targets: PathBuf,

    /// Test samples to evaluate the trained network on
    #[arg(long, requires = "test_targets")]
    test_samples: Option<PathBuf>,

    /// Test targets, matched to the test samples line by line
    #[arg(long, requires = "test_samples")]
    test_targets: Option<PathBuf>,

    /// Only read this many patterns from each file
    #[arg(long)]
    limit: Option<usize>,

    /// Log a summary every N epochs
    #[arg(long, default_value_t = 1)]
    log_every: usize,

    /// Write the per-epoch history as JSON to this file
    #[arg(long)]
    history: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = TrainingConfig::load_from_file(&args.config)?;
    let mut options = config.load_options();
    if let Some(limit) = args.limit {
        options = options.limit(limit);
    }

    let training = load_patterns(&args.samples, &args.targets, &options)?;
    info!(patterns = training.len(), "loaded training set");

    let mut network = config.build_network()?;
    let report = config
        .trainer()
        .logging(Logging::Iterations(args.log_every))
        .record_history(args.history.is_some())
        .train(&mut network, &training)?;
    println!("{}", report.state);
    println!(
        "{} epochs in {:.2} second(s)",
        report.epochs,
        report.duration.as_secs_f32()
    );

    if let (Some(samples), Some(targets)) = (&args.test_samples, &args.test_targets) {
        let test = load_patterns(samples, targets, &options)?;
        let mse = evaluate(&mut network, &test)?;
        println!("test MSE over {} patterns: {:.4}", test.len(), mse);
    }

    if let (Some(path), Some(history)) = (&args.history, &report.history) {
        history.write_json(path)?;
        info!(path = %path.display(), "wrote history");
    }
    Ok(())
}
