//! Corpus building: extract every page of every labeled document.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::thread;

use tracing::{debug, info, warn};

use super::taxonomy::{LabeledDocument, Taxonomy};
use crate::extraction::PageExtractor;
use crate::models::record::{Dataset, PageRecord};
use crate::ocr::OcrAdapter;
use crate::pdf::DocumentSource;

/// Statistics of a corpus build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusReport {
    /// Documents the builder tried to open.
    pub documents_attempted: usize,
    /// Documents that could not be opened, with the reason.
    pub documents_failed: Vec<(PathBuf, String)>,
    /// Pages extracted across all opened documents.
    pub pages_attempted: usize,
    /// Pages excluded from the dataset.
    pub pages_dropped: usize,
    /// Pages whose text came from OCR.
    pub pages_ocr: usize,
    /// Usable pages per label, including labels with zero usable pages.
    pub kept_per_label: BTreeMap<String, usize>,
}

impl CorpusReport {
    /// Usable pages across all labels.
    pub fn pages_kept(&self) -> usize {
        self.pages_attempted - self.pages_dropped
    }

    /// Labels that ended up without any usable page.
    pub fn empty_labels(&self) -> Vec<&str> {
        self.kept_per_label
            .iter()
            .filter(|(_, kept)| **kept == 0)
            .map(|(label, _)| label.as_str())
            .collect()
    }
}

/// Result of a corpus build.
#[derive(Debug, Clone)]
pub struct CorpusOutput {
    /// Every extracted page, including unusable ones.
    pub records: Vec<PageRecord>,
    /// Usable pages only.
    pub dataset: Dataset,
    pub report: CorpusReport,
}

enum DocumentOutcome {
    Extracted(Vec<PageRecord>),
    Failed(String),
}

/// Extracts labeled page records from a taxonomy of documents.
pub struct CorpusBuilder<S> {
    source: S,
    render_dpi: u32,
    text_only: bool,
    workers: usize,
}

impl<S: DocumentSource> CorpusBuilder<S> {
    /// Create a sequential builder reading documents from `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            render_dpi: 300,
            text_only: false,
            workers: 1,
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

    /// Set the number of extraction workers used by [`Self::build_parallel`].
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    fn extractor<O: OcrAdapter>(&self, ocr: O) -> PageExtractor<O> {
        PageExtractor::new(ocr)
            .with_render_dpi(self.render_dpi)
            .with_text_only(self.text_only)
    }

    /// Build the corpus one document at a time.
    pub fn build<O: OcrAdapter>(&self, taxonomy: &Taxonomy, ocr: O) -> CorpusOutput {
        self.build_observed(taxonomy, ocr, |_| {})
    }

    /// Like [`Self::build`], calling `on_document` after each document.
    pub fn build_observed<O, F>(&self, taxonomy: &Taxonomy, ocr: O, on_document: F) -> CorpusOutput
    where
        O: OcrAdapter,
        F: Fn(&LabeledDocument),
    {
        let extractor = self.extractor(ocr);
        let documents = taxonomy.documents();
        let outcomes = documents
            .iter()
            .map(|doc| {
                let outcome = self.process_document(&extractor, doc);
                on_document(doc);
                outcome
            })
            .collect();

        assemble(taxonomy, documents, outcomes)
    }

    /// Build the corpus on up to `workers` threads.
    ///
    /// Documents are split into contiguous partitions, each worker builds its own
    /// OCR adapter with `make_ocr` and returns its partition's outcomes, and the
    /// partitions are concatenated in order at the join.
    pub fn build_parallel<O, M, F>(
        &self,
        taxonomy: &Taxonomy,
        make_ocr: M,
        on_document: F,
    ) -> CorpusOutput
    where
        S: Sync,
        O: OcrAdapter,
        M: Fn() -> O + Sync,
        F: Fn(&LabeledDocument) + Sync,
    {
        let documents = taxonomy.documents();
        if self.workers <= 1 || documents.len() <= 1 {
            return self.build_observed(taxonomy, make_ocr(), on_document);
        }

        let chunk_size = documents.len().div_ceil(self.workers);
        debug!(
            "Building corpus of {} documents on {} workers",
            documents.len(),
            documents.len().div_ceil(chunk_size)
        );

        let outcomes: Vec<DocumentOutcome> = thread::scope(|scope| {
            let handles: Vec<_> = documents
                .chunks(chunk_size)
                .map(|partition| {
                    let make_ocr = &make_ocr;
                    let on_document = &on_document;
                    scope.spawn(move || {
                        let extractor = self.extractor(make_ocr());
                        partition
                            .iter()
                            .map(|doc| {
                                let outcome = self.process_document(&extractor, doc);
                                on_document(doc);
                                outcome
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(partition) => partition,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        assemble(taxonomy, documents, outcomes)
    }

    fn process_document<O: OcrAdapter>(
        &self,
        extractor: &PageExtractor<O>,
        doc: &LabeledDocument,
    ) -> DocumentOutcome {
        let handle = match self.source.open(&doc.path) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Failed to process {}: {}", doc.path.display(), e);
                return DocumentOutcome::Failed(e.to_string());
            }
        };

        let name = doc.document_name();
        let mut records = extractor.extract_document(&handle, &name);
        for record in &mut records {
            record.label = Some(doc.label.clone());
        }

        info!(
            "Processed: {} (label: {}, {} pages)",
            name,
            doc.label,
            records.len()
        );
        DocumentOutcome::Extracted(records)
    }
}

fn assemble(
    taxonomy: &Taxonomy,
    documents: Vec<LabeledDocument>,
    outcomes: Vec<DocumentOutcome>,
) -> CorpusOutput {
    let mut report = CorpusReport {
        documents_attempted: documents.len(),
        kept_per_label: taxonomy
            .labels()
            .into_iter()
            .map(|label| (label.to_string(), 0))
            .collect(),
        ..CorpusReport::default()
    };

    let mut records = Vec::new();
    for (doc, outcome) in documents.into_iter().zip(outcomes) {
        match outcome {
            DocumentOutcome::Extracted(pages) => records.extend(pages),
            DocumentOutcome::Failed(reason) => report.documents_failed.push((doc.path, reason)),
        }
    }

    report.pages_attempted = records.len();
    report.pages_ocr = records
        .iter()
        .filter(|r| r.extraction_method.is_ocr())
        .count();

    let (dataset, dropped) = Dataset::from_records(records.iter().cloned());
    report.pages_dropped = dropped;
    for (label, count) in dataset.label_counts() {
        report.kept_per_label.insert(label, count);
    }

    if dropped > 0 {
        warn!(
            "Dropped {} of {} pages with empty text or label",
            dropped, report.pages_attempted
        );
    }
    for label in report.empty_labels() {
        warn!("Category {} has no usable pages", label);
    }
    info!(
        "Corpus: {} usable pages from {} documents ({} failed to open)",
        report.pages_kept(),
        report.documents_attempted,
        report.documents_failed.len()
    );

    CorpusOutput {
        records,
        dataset,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ExtractionMethod;
    use crate::ocr::NoOcr;
    use crate::testing::{FakeDocument, FakeOcr, FakePage, FakeSource};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn filtering_fixture() -> (FakeSource, Taxonomy) {
        let source = FakeSource::new()
            .with_document(
                "A/one.pdf",
                FakeDocument::new(vec![
                    FakePage::text("first usable page"),
                    FakePage::blank(),
                    FakePage::text("second usable page"),
                ]),
            )
            .with_document(
                "A/two.pdf",
                FakeDocument::new(vec![FakePage::scanned("  ", "third usable page")]),
            )
            .with_document(
                "B/three.pdf",
                FakeDocument::new(vec![FakePage::text("b one"), FakePage::text("b two")]),
            );
        let taxonomy = Taxonomy::new()
            .with_category("A", ["A/one.pdf", "A/two.pdf"])
            .with_category("B", ["B/three.pdf"]);
        (source, taxonomy)
    }

    #[test]
    fn test_corpus_filtering() {
        let (source, taxonomy) = filtering_fixture();
        let output = CorpusBuilder::new(source).build(&taxonomy, FakeOcr::new());

        assert_eq!(output.dataset.len(), 5);
        assert_eq!(
            output.dataset.label_counts(),
            vec![("A".to_string(), 3), ("B".to_string(), 2)]
        );
        assert_eq!(output.records.len(), 6);
        assert_eq!(output.report.pages_attempted, 6);
        assert_eq!(output.report.pages_dropped, 1);
        assert_eq!(output.report.pages_ocr, 2);
    }

    #[test]
    fn test_records_carry_labels_and_provenance() {
        let (source, taxonomy) = filtering_fixture();
        let output = CorpusBuilder::new(source).build(&taxonomy, FakeOcr::new());

        let scanned = &output.records[3];
        assert_eq!(scanned.document_name, "two.pdf");
        assert_eq!(scanned.page_index, 1);
        assert_eq!(scanned.text, "third usable page");
        assert_eq!(scanned.extraction_method, ExtractionMethod::Ocr);
        assert_eq!(scanned.label.as_deref(), Some("A"));
    }

    #[test]
    fn test_unreadable_document_is_skipped() {
        let source = FakeSource::new().with_document(
            "ok/good.pdf",
            FakeDocument::new(vec![FakePage::text("fine")]),
        );
        let taxonomy = Taxonomy::new()
            .with_category("ok", ["ok/good.pdf"])
            .with_category("bad", ["bad/missing.pdf"]);

        let output = CorpusBuilder::new(source).build(&taxonomy, NoOcr);

        assert_eq!(output.dataset.len(), 1);
        assert_eq!(output.report.documents_attempted, 2);
        assert_eq!(output.report.documents_failed.len(), 1);
        assert_eq!(output.report.documents_failed[0].0, PathBuf::from("bad/missing.pdf"));
        assert_eq!(output.report.empty_labels(), vec!["bad"]);
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let (source, taxonomy) = filtering_fixture();
        let builder = CorpusBuilder::new(source).with_workers(2);

        let sequential = builder.build(&taxonomy, FakeOcr::new());
        let seen = AtomicUsize::new(0);
        let parallel = builder.build_parallel(&taxonomy, FakeOcr::new, |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(parallel.records, sequential.records);
        assert_eq!(parallel.dataset, sequential.dataset);
        assert_eq!(parallel.report, sequential.report);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
