//! Core library for page-level document topic classification.
//!
//! This crate provides:
//! - PDF processing (per-page text layer and page raster)
//! - Two-tier extraction with an OCR fallback for scanned pages
//! - Labeled corpus building and the page dataset CSV
//! - Text normalization, TF-IDF features and a one-vs-rest linear SVM
//! - Versioned artifact bundles and per-page inference

pub mod error;
pub mod models;
pub mod pdf;
pub mod ocr;
pub mod extraction;
pub mod text;
pub mod corpus;
pub mod learn;
pub mod artifact;
pub mod inference;

#[cfg(test)]
mod testing;

pub use error::{FolioError, Result};
pub use models::{Dataset, Example, ExtractionMethod, FolioConfig, PageRecord};
pub use pdf::{DocumentSource, LopdfSource, PdfExtractor, PdfProcessor};
pub use ocr::{NoOcr, OcrAdapter};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use extraction::{ExtractedPage, PageExtractor};
pub use text::{normalize, NormalizerSpec};
pub use corpus::{CorpusBuilder, CorpusOutput, CorpusReport, LabeledDocument, Taxonomy};
pub use learn::{ClassificationReport, LabelOrdering, Trainer, TrainingOutcome};
pub use artifact::{ArtifactBundle, ArtifactStore, Manifest, Prediction};
pub use inference::{DocumentPages, PageClassifier, PagePrediction};
