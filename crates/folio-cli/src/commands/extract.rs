//! Extract command - build the page dataset CSV from a labeled corpus.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use folio_core::corpus::save_records;
use folio_core::models::config::FolioConfig;
use folio_core::{CorpusBuilder, CorpusOutput, CorpusReport, LopdfSource, Taxonomy};

use super::{load_config, ocr_engine};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Corpus root; each subdirectory is one label
    #[arg(required = true)]
    corpus: PathBuf,

    /// Output CSV path
    #[arg(short, long, default_value = "dataset.csv")]
    output: PathBuf,

    /// Number of parallel workers
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only PDF text extraction
    #[arg(long)]
    text_only: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.jobs, args.model_dir.clone(), args.text_only);

    let output = build_corpus(&args.corpus, &config)?;
    save_records(&args.output, &output.records)?;

    print_report(&output.report);
    println!(
        "{} Wrote {} rows ({} usable) to {} in {:?}",
        style("✓").green(),
        output.records.len(),
        output.dataset.len(),
        args.output.display(),
        start.elapsed()
    );

    Ok(())
}

/// Fold command-line flags into the loaded configuration.
pub fn apply_overrides(
    config: &mut FolioConfig,
    jobs: Option<usize>,
    model_dir: Option<PathBuf>,
    text_only: bool,
) {
    if let Some(jobs) = jobs {
        config.corpus.workers = jobs;
    }
    if let Some(dir) = model_dir {
        config.ocr.model_dir = dir;
    }
    config.extraction.text_only |= text_only;
}

/// Discover the taxonomy under `root` and extract every page with a progress bar.
pub fn build_corpus(root: &std::path::Path, config: &FolioConfig) -> anyhow::Result<CorpusOutput> {
    let taxonomy = Taxonomy::discover(root, &config.corpus.extensions)?;
    if taxonomy.document_count() == 0 {
        anyhow::bail!(
            "No documents found under {} (expected one subdirectory per label)",
            root.display()
        );
    }

    println!(
        "{} Found {} documents in {} categories",
        style("ℹ").blue(),
        taxonomy.document_count(),
        taxonomy.categories().len()
    );

    let pb = ProgressBar::new(taxonomy.document_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")?
            .progress_chars("=>-"),
    );

    let builder = CorpusBuilder::new(LopdfSource)
        .with_render_dpi(config.extraction.render_dpi)
        .with_text_only(config.extraction.text_only)
        .with_workers(config.corpus.workers);

    let ocr_config = &config.ocr;
    let text_only = config.extraction.text_only;
    let output = builder.build_parallel(
        &taxonomy,
        || ocr_engine(ocr_config, text_only),
        |doc| {
            pb.set_message(doc.document_name());
            pb.inc(1);
        },
    );
    pb.finish_and_clear();

    info!(
        "Extracted {} pages, {} kept",
        output.report.pages_attempted,
        output.report.pages_kept()
    );
    Ok(output)
}

pub fn print_report(report: &CorpusReport) {
    println!();
    println!(
        "{} {} pages from {} documents ({} via OCR)",
        style("ℹ").blue(),
        report.pages_attempted,
        report.documents_attempted,
        report.pages_ocr
    );
    println!(
        "   {} kept, {} dropped (empty text)",
        style(report.pages_kept()).green(),
        style(report.pages_dropped).yellow()
    );

    for (label, kept) in &report.kept_per_label {
        println!("   {:<24} {}", label, kept);
    }

    for label in report.empty_labels() {
        println!(
            "{} Category '{}' has no usable pages",
            style("!").yellow(),
            label
        );
    }

    if !report.documents_failed.is_empty() {
        println!();
        println!("{}", style("Failed documents:").red());
        for (path, error) in &report.documents_failed {
            println!("  - {}: {}", path.display(), error);
        }
    }
}
