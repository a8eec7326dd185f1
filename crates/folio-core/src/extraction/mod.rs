//! Per-page text extraction with an OCR fallback.

mod orchestrator;

pub use orchestrator::{ExtractedPage, PageExtractor};
