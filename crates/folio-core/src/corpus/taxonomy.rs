//! Category taxonomy: which documents belong to which label.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// A document path tagged with its category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledDocument {
    pub label: String,
    pub path: PathBuf,
}

impl LabeledDocument {
    /// File name used as the record's document name.
    pub fn document_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// One category and the documents filed under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub label: String,
    pub documents: Vec<PathBuf>,
}

/// Explicit mapping from labels to documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Create an empty taxonomy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category with its documents.
    pub fn with_category<I, P>(mut self, label: impl Into<String>, documents: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.categories.push(Category {
            label: label.into(),
            documents: documents.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Build a taxonomy from a root whose immediate subdirectories are labels.
    ///
    /// Only files directly inside each subdirectory with one of `extensions`
    /// (case-insensitive) are included. Hidden entries are skipped and both
    /// categories and documents come out sorted by name.
    pub fn discover(root: &Path, extensions: &[String]) -> Result<Self> {
        let mut categories = Vec::new();

        for dir in sorted_entries(root)? {
            if !dir.is_dir() {
                continue;
            }
            let Some(label) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };

            let documents: Vec<PathBuf> = sorted_entries(&dir)?
                .into_iter()
                .filter(|p| p.is_file() && has_extension(p, extensions))
                .collect();

            debug!("Category {}: {} documents", label, documents.len());
            categories.push(Category { label, documents });
        }

        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category labels in taxonomy order.
    pub fn labels(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.label.as_str()).collect()
    }

    /// All documents, category by category.
    pub fn documents(&self) -> Vec<LabeledDocument> {
        self.categories
            .iter()
            .flat_map(|c| {
                c.documents.iter().map(|path| LabeledDocument {
                    label: c.label.clone(),
                    path: path.clone(),
                })
            })
            .collect()
    }

    pub fn document_count(&self) -> usize {
        self.categories.iter().map(|c| c.documents.len()).sum()
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if !hidden {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}
