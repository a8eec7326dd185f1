//! Error types for the folio-core library.

use thiserror::Error;

/// Main error type for the folio library.
#[derive(Error, Debug)]
pub enum FolioError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Vectorizer or classifier error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Artifact bundle error.
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// The corpus produced no usable rows.
    #[error("empty corpus: {0}")]
    EmptyCorpus(String),

    /// Dataset CSV error.
    #[error("dataset error: {0}")]
    Dataset(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("unreadable document: {0}")]
    UnreadableDocument(String),

    /// Failed to extract text from a page.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to produce a raster image for a page.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// OCR is not available in this build or configuration.
    #[error("OCR unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the vectorizer, the classifier and training.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Transform was requested before any vocabulary was fit.
    #[error("vectorizer has no fitted vocabulary")]
    UnfittedVectorizer,

    /// Fitting found no terms at all.
    #[error("empty vocabulary: training texts contain no terms")]
    EmptyVocabulary,

    /// Training needs at least two categories.
    #[error("need at least 2 distinct labels, found {0}")]
    InsufficientClasses(usize),

    /// Feature or label arrays disagree in length.
    #[error("dimension mismatch: {0}")]
    Dimension(String),

    /// The train/test split cannot be made.
    #[error("invalid split: {0}")]
    InvalidSplit(String),

    /// A label is not part of the label ordering.
    #[error("unknown label: {0}")]
    UnknownLabel(String),
}

/// Errors raised when loading or saving an artifact bundle.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// A sub-artifact is missing, unreadable, or from another training run.
    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// Label ordering cardinality differs from the classifier class count.
    #[error("label ordering has {labels} labels but classifier was trained on {classes} classes")]
    LabelOrderingMismatch { labels: usize, classes: usize },

    /// The save target holds files that are not part of a bundle.
    #[error("refusing to replace {dir}: it contains {entry}, which is not a bundle file")]
    ForeignContent { dir: String, entry: String },

    /// The bundle was trained with a different text normalizer.
    #[error("bundle normalizer {found} does not match {expected}")]
    NormalizerMismatch { expected: String, found: String },
}

/// Result type for the folio library.
pub type Result<T> = std::result::Result<T, FolioError>;
