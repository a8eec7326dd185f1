//! Per-page extraction records and the training dataset.

use serde::{Deserialize, Serialize};

/// How the text of a page was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Embedded text layer.
    Direct,
    /// Optical character recognition on the rendered page.
    Ocr,
}

impl ExtractionMethod {
    /// Whether OCR produced the text.
    pub fn is_ocr(self) -> bool {
        matches!(self, Self::Ocr)
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Ocr => write!(f, "ocr"),
        }
    }
}

/// Text extracted from one page of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// File name of the source document.
    pub document_name: String,
    /// Page number (1-indexed).
    pub page_index: u32,
    /// Extracted text; empty when nothing usable was recovered.
    pub text: String,
    /// Extraction tier that produced `text`.
    pub extraction_method: ExtractionMethod,
    /// Category label, present only for training records.
    pub label: Option<String>,
}

impl PageRecord {
    /// Whether the record can be used for training.
    pub fn is_usable(&self) -> bool {
        !self.text.trim().is_empty()
            && self
                .label
                .as_deref()
                .is_some_and(|label| !label.trim().is_empty())
    }
}

/// A labeled training example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub text: String,
    pub label: String,
}

/// Ordered training examples with non-empty text and label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    examples: Vec<Example>,
}

impl Dataset {
    /// Keep the usable records, returning the dataset and the number dropped.
    pub fn from_records<I>(records: I) -> (Self, usize)
    where
        I: IntoIterator<Item = PageRecord>,
    {
        let mut examples = Vec::new();
        let mut dropped = 0;

        for record in records {
            if !record.is_usable() {
                dropped += 1;
                continue;
            }
            if let Some(label) = record.label {
                examples.push(Example {
                    text: record.text,
                    label,
                });
            }
        }

        (Self { examples }, dropped)
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Rows per label, in sorted label order.
    pub fn label_counts(&self) -> Vec<(String, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.label.clone()).or_insert(0usize) += 1;
        }
        counts.into_iter().collect()
    }
}
