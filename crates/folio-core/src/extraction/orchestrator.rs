//! Two-tier page extraction: embedded text first, OCR on the rendered page second.

use tracing::{debug, warn};

use crate::models::record::{ExtractionMethod, PageRecord};
use crate::ocr::OcrAdapter;
use crate::pdf::PdfProcessor;

/// Text recovered from one page and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub text: String,
    pub method: ExtractionMethod,
}

impl ExtractedPage {
    fn direct(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
            method: ExtractionMethod::Direct,
        }
    }

    fn ocr(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
            method: ExtractionMethod::Ocr,
        }
    }
}

/// Applies the direct-then-OCR fallback policy to every page independently.
pub struct PageExtractor<O> {
    ocr: O,
    render_dpi: u32,
    text_only: bool,
}

impl<O: OcrAdapter> PageExtractor<O> {
    /// Create an extractor using the given OCR adapter.
    pub fn new(ocr: O) -> Self {
        Self {
            ocr,
            render_dpi: 300,
            text_only: false,
        }
    }

    /// Set the DPI used when rendering pages for OCR.
    pub fn with_render_dpi(mut self, dpi: u32) -> Self {
        self.render_dpi = dpi;
        self
    }

    /// Disable the OCR tier.
    pub fn with_text_only(mut self, text_only: bool) -> Self {
        self.text_only = text_only;
        self
    }

    /// Extract one page (1-indexed). Never fails; total failure yields empty text.
    pub fn extract_page<D>(&self, doc: &D, document_name: &str, page: u32) -> ExtractedPage
    where
        D: PdfProcessor + ?Sized,
    {
        match doc.extract_page_text(page) {
            Ok(text) if !text.trim().is_empty() => return ExtractedPage::direct(&text),
            Ok(_) => debug!("{} page {}: no embedded text", document_name, page),
            Err(e) => warn!(
                "{} page {}: direct extraction failed: {}",
                document_name, page, e
            ),
        }

        if self.text_only {
            warn!(
                "{} page {}: no embedded text and OCR disabled",
                document_name, page
            );
            return ExtractedPage::direct("");
        }

        warn!("{} page {}: falling back to OCR", document_name, page);

        let image = match doc.render_page(page, self.render_dpi) {
            Ok(image) => image,
            Err(e) => {
                warn!("{} page {}: render failed: {}", document_name, page, e);
                return ExtractedPage::ocr("");
            }
        };

        match self.ocr.recognize(&image) {
            Ok(text) => ExtractedPage::ocr(&text),
            Err(e) => {
                warn!("{} page {}: OCR failed: {}", document_name, page, e);
                ExtractedPage::ocr("")
            }
        }
    }

    /// Extract every page in order as unlabeled records.
    pub fn extract_document<D>(&self, doc: &D, document_name: &str) -> Vec<PageRecord>
    where
        D: PdfProcessor + ?Sized,
    {
        (1..=doc.page_count())
            .map(|page| {
                let extracted = self.extract_page(doc, document_name, page);
                PageRecord {
                    document_name: document_name.to_string(),
                    page_index: page,
                    text: extracted.text,
                    extraction_method: extracted.method,
                    label: None,
                }
            })
            .collect()
    }
}
