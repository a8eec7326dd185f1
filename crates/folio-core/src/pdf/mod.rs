//! PDF processing module.

mod extractor;

pub use extractor::{LopdfSource, PdfExtractor};

use std::path::Path;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// An opened document that exposes its pages.
pub trait PdfProcessor {
    /// Get the number of pages in the document.
    fn page_count(&self) -> u32;

    /// Extract embedded text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Render a page as an image at the specified DPI.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}

/// Opens documents by path.
pub trait DocumentSource {
    /// Handle type of an opened document.
    type Document: PdfProcessor;

    /// Open a document, failing with [`PdfError::UnreadableDocument`] when it cannot be read.
    fn open(&self, path: &Path) -> Result<Self::Document>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for &S {
    type Document = S::Document;

    fn open(&self, path: &Path) -> Result<Self::Document> {
        (**self).open(path)
    }
}
