//! In-memory document and OCR fakes shared by unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, GrayImage};

use crate::error::{OcrError, PdfError};
use crate::ocr::OcrAdapter;
use crate::pdf::{DocumentSource, PdfProcessor};

/// One fake page: its embedded text layer and, if scanned, the text the raster carries.
#[derive(Debug, Clone)]
pub struct FakePage {
    text: Result<String, String>,
    scan: Option<String>,
}

impl FakePage {
    pub fn text(text: &str) -> Self {
        Self {
            text: Ok(text.to_string()),
            scan: None,
        }
    }

    pub fn scanned(text_layer: &str, scan: &str) -> Self {
        Self {
            text: Ok(text_layer.to_string()),
            scan: Some(scan.to_string()),
        }
    }

    pub fn broken_text(scan: &str) -> Self {
        Self {
            text: Err("corrupt content stream".to_string()),
            scan: Some(scan.to_string()),
        }
    }

    pub fn blank() -> Self {
        Self {
            text: Ok(String::new()),
            scan: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeDocument {
    pages: Vec<FakePage>,
}

impl FakeDocument {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self { pages }
    }

    fn page(&self, page: u32) -> Result<&FakePage, PdfError> {
        (page as usize)
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .ok_or(PdfError::InvalidPage(page))
    }
}

impl PdfProcessor for FakeDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn extract_page_text(&self, page: u32) -> Result<String, PdfError> {
        self.page(page)?
            .text
            .clone()
            .map_err(PdfError::TextExtraction)
    }

    // The scan text travels as the raw bytes of a one-row grayscale image.
    fn render_page(&self, page: u32, _dpi: u32) -> Result<DynamicImage, PdfError> {
        let scan = self.page(page)?.scan.clone().ok_or_else(|| {
            PdfError::Render(format!("page {} has no image", page))
        })?;
        let bytes = scan.into_bytes();
        let width = bytes.len().max(1) as u32;
        let mut raw = bytes;
        raw.resize(width as usize, b' ');
        GrayImage::from_raw(width, 1, raw)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| PdfError::Render("bad fake raster".to_string()))
    }
}

/// OCR fake that reads back the text encoded by [`FakeDocument::render_page`].
#[derive(Debug, Default)]
pub struct FakeOcr {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeOcr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrAdapter for FakeOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(OcrError::Recognition("engine crashed".to_string()));
        }
        String::from_utf8(image.to_luma8().into_raw())
            .map_err(|e| OcrError::Recognition(e.to_string()))
    }
}

/// Document source backed by a path -> document map.
#[derive(Debug, Default)]
pub struct FakeSource {
    documents: HashMap<PathBuf, FakeDocument>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<PathBuf>, doc: FakeDocument) -> Self {
        self.documents.insert(path.into(), doc);
        self
    }
}

impl DocumentSource for FakeSource {
    type Document = FakeDocument;

    fn open(&self, path: &Path) -> Result<FakeDocument, PdfError> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| PdfError::UnreadableDocument(path.display().to_string()))
    }
}
