//! Train command - fit the vectorizer and classifier and save the bundle.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use folio_core::corpus::load_dataset;
use folio_core::{ArtifactStore, Dataset, Trainer};

use super::extract::{apply_overrides, build_corpus, print_report};
use super::load_config;

/// Arguments for the train command.
#[derive(Args)]
pub struct TrainArgs {
    /// Dataset CSV produced by `folio extract`
    #[arg(short, long, conflicts_with = "corpus", required_unless_present = "corpus")]
    dataset: Option<PathBuf>,

    /// Corpus root to extract before training
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Artifact bundle directory
    #[arg(short, long)]
    artifacts: Option<PathBuf>,

    /// Seed for the split and solver
    #[arg(long)]
    seed: Option<u64>,

    /// SVM regularization parameter
    #[arg(long = "svm-c")]
    svm_c: Option<f64>,

    /// Number of parallel extraction workers (with --corpus)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Skip OCR when extracting (with --corpus)
    #[arg(long)]
    text_only: bool,

    /// Write the evaluation report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

pub async fn run(args: TrainArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.jobs, None, args.text_only);
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }
    if let Some(c) = args.svm_c {
        config.training.c = c;
    }

    let dataset: Dataset = match (&args.dataset, &args.corpus) {
        (Some(path), _) => {
            let (dataset, dropped) = load_dataset(path)?;
            if dropped > 0 {
                warn!("Dropped {} rows with empty text or label", dropped);
            }
            println!(
                "{} Loaded {} rows from {}",
                style("ℹ").blue(),
                dataset.len(),
                path.display()
            );
            dataset
        }
        (None, Some(root)) => {
            let output = build_corpus(root, &config)?;
            print_report(&output.report);
            output.dataset
        }
        (None, None) => anyhow::bail!("Either --dataset or --corpus is required"),
    };

    for (label, count) in dataset.label_counts() {
        info!("{}: {} rows", label, count);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message("Training classifier...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let trainer = Trainer::new(config.training.clone());
    let outcome = tokio::task::spawn_blocking(move || trainer.train(&dataset)).await?;
    spinner.finish_and_clear();
    let outcome = outcome?;

    println!(
        "{} Trained on {} rows, evaluated on {} held-out rows",
        style("✓").green(),
        outcome.train_rows,
        outcome.test_rows
    );
    println!();
    println!("Accuracy: {:.4}", outcome.report.accuracy);
    println!();
    print!("{}", outcome.report);

    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_string_pretty(&outcome.report)?)?;
    }

    let dir = args.artifacts.unwrap_or_else(|| config.artifacts.dir.clone());
    ArtifactStore::new(&dir).save(&outcome.bundle)?;

    println!();
    println!(
        "{} Saved bundle {} to {} in {:?}",
        style("✓").green(),
        outcome.bundle.run_id(),
        dir.display(),
        start.elapsed()
    );

    Ok(())
}
