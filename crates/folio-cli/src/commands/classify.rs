//! Classify command - label every page of one or more documents.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use folio_core::pdf::DocumentSource;
use folio_core::{ArtifactStore, LopdfSource, PageClassifier, PageExtractor, PagePrediction};

use super::extract::apply_overrides;
use super::{load_config, ocr_engine};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Input file or glob pattern
    #[arg(required = true)]
    input: String,

    /// Artifact bundle directory
    #[arg(short, long)]
    artifacts: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only PDF text extraction
    #[arg(long)]
    text_only: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// Page predictions for one input file.
#[derive(Debug, Serialize)]
struct DocumentResult {
    file: String,
    pages: Vec<PagePrediction>,
}

pub async fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, None, args.model_dir.clone(), args.text_only);

    let dir = args
        .artifacts
        .clone()
        .unwrap_or_else(|| config.artifacts.dir.clone());
    let bundle = ArtifactStore::new(&dir)
        .load()
        .map_err(|e| anyhow::anyhow!("Failed to load bundle from {}: {}", dir.display(), e))?;
    debug!("Loaded bundle {}", bundle.run_id());

    let files = resolve_inputs(&args.input, &config.corpus.extensions)?;

    let extractor = PageExtractor::new(ocr_engine(&config.ocr, config.extraction.text_only))
        .with_render_dpi(config.extraction.render_dpi)
        .with_text_only(config.extraction.text_only);
    let classifier = PageClassifier::new(&bundle);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );
    if files.len() < 2 {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let mut results = Vec::with_capacity(files.len());
    let mut failed = Vec::new();
    for path in &files {
        let name = display_name(path);
        match LopdfSource.open(path) {
            Ok(doc) => {
                let pages = classifier.classify_document(&extractor, &doc, &name).pages().collect();
                results.push(DocumentResult { file: name, pages });
            }
            Err(e) if args.continue_on_error => {
                warn!("Failed to process {}: {}", path.display(), e);
                failed.push((path.clone(), e.to_string()));
            }
            Err(e) => anyhow::bail!("Failed to process {}: {}", path.display(), e),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let content = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&results)?,
        OutputFormat::Csv => format_csv(&results)?,
        OutputFormat::Text => format_text(&results),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &content)?;
            eprintln!("{} Output written to {}", style("✓").green(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for (path, error) in &failed {
            eprintln!("  - {}: {}", path.display(), error);
        }
    }

    Ok(())
}

/// A single existing file is used as-is; anything else is a glob pattern.
fn resolve_inputs(input: &str, extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let direct = Path::new(input);
    if direct.is_file() {
        return Ok(vec![direct.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = glob(input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && has_extension(p, extensions))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", input);
    }
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_csv(results: &[DocumentResult]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["file_name", "page_number", "label", "confidence", "ocr_used"])?;

    for result in results {
        for page in &result.pages {
            wtr.write_record([
                result.file.as_str(),
                &page.page_index.to_string(),
                &page.label,
                &format!("{:.4}", page.confidence),
                if page.method.is_ocr() { "true" } else { "false" },
            ])?;
        }
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(results: &[DocumentResult]) -> String {
    let mut output = String::new();

    for result in results {
        output.push_str(&format!("{} ({} pages)\n", result.file, result.pages.len()));
        for page in &result.pages {
            output.push_str(&format!(
                "  page {:>4}  {:<24} {:>6.1}%  [{}]\n",
                page.page_index,
                page.label,
                page.confidence * 100.0,
                page.method
            ));
        }
    }

    output
}
