//! Per-page classification of unseen documents against a loaded bundle.

use serde::Serialize;
use tracing::debug;

use crate::artifact::{ArtifactBundle, Prediction};
use crate::extraction::PageExtractor;
use crate::models::record::ExtractionMethod;
use crate::ocr::OcrAdapter;
use crate::pdf::PdfProcessor;

/// Predicted topic for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePrediction {
    /// 1-indexed page number.
    pub page_index: u32,
    pub label: String,
    pub class_index: usize,
    pub confidence: f64,
    pub method: ExtractionMethod,
}

/// Classifies pages with a shared, read-only bundle.
#[derive(Debug, Clone, Copy)]
pub struct PageClassifier<'a> {
    bundle: &'a ArtifactBundle,
}

impl<'a> PageClassifier<'a> {
    pub fn new(bundle: &'a ArtifactBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &'a ArtifactBundle {
        self.bundle
    }

    /// Classify raw page text. Empty text still gets a prediction.
    pub fn classify_text(&self, text: &str) -> Prediction {
        self.bundle.predict(text)
    }

    /// Pages of `doc`, classified lazily in page order.
    pub fn classify_document<'d, O, D>(
        &self,
        extractor: &'d PageExtractor<O>,
        doc: &'d D,
        document_name: &'d str,
    ) -> DocumentPages<'a, 'd, O, D>
    where
        O: OcrAdapter,
        D: PdfProcessor + ?Sized,
    {
        DocumentPages {
            classifier: *self,
            extractor,
            doc,
            document_name,
        }
    }
}

/// A document bound to a classifier; each call to [`pages`](Self::pages) starts over.
pub struct DocumentPages<'a, 'd, O, D: ?Sized> {
    classifier: PageClassifier<'a>,
    extractor: &'d PageExtractor<O>,
    doc: &'d D,
    document_name: &'d str,
}

impl<O, D> DocumentPages<'_, '_, O, D>
where
    O: OcrAdapter,
    D: PdfProcessor + ?Sized,
{
    pub fn page_count(&self) -> u32 {
        self.doc.page_count()
    }

    pub fn pages(&self) -> impl Iterator<Item = PagePrediction> + '_ {
        (1..=self.doc.page_count()).map(move |page| {
            let extracted = self.extractor.extract_page(self.doc, self.document_name, page);
            let prediction = self.classifier.classify_text(&extracted.text);
            debug!(
                "{} page {}: {} ({:.3})",
                self.document_name, page, prediction.label, prediction.confidence
            );
            PagePrediction {
                page_index: page,
                label: prediction.label,
                class_index: prediction.class_index,
                confidence: prediction.confidence,
                method: extracted.method,
            }
        })
    }
}
