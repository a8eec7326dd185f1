//! Configuration structures for the extraction and training pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FolioError, Result};

/// Main configuration for the folio pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Page extraction configuration.
    pub extraction: ExtractionConfig,

    /// OCR model configuration.
    pub ocr: OcrConfig,

    /// Corpus discovery configuration.
    pub corpus: CorpusConfig,

    /// Training configuration.
    pub training: TrainingConfig,

    /// Artifact bundle configuration.
    pub artifacts: ArtifactConfig,
}

/// Page extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// DPI for rendering PDF pages to images before OCR.
    pub render_dpi: u32,

    /// Skip the OCR tier and use only embedded text.
    pub text_only: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            text_only: false,
        }
    }
}

/// OCR model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }
}

/// Corpus discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// File extensions treated as documents (case-insensitive, no dot).
    pub extensions: Vec<String>,

    /// Number of extraction workers (1 = sequential).
    pub workers: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".to_string()],
            workers: 1,
        }
    }
}

/// Training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation.
    pub test_size: f64,

    /// Seed for the split shuffle and the solver.
    pub seed: u64,

    /// SVM regularization parameter.
    pub c: f64,

    /// Solver passes over the training split.
    pub epochs: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            c: 1.0,
            epochs: 50,
        }
    }
}

/// Artifact bundle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding the trained bundle.
    pub dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
        }
    }
}

impl FolioConfig {
    /// Load configuration from a JSON file.
    ///
    /// A file that exists but does not describe a valid configuration is a
    /// [`FolioError::Config`] error.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| FolioError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
