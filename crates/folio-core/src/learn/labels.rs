//! Mapping between class indices and category names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Sorted distinct labels; position `i` names class index `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOrdering {
    labels: Vec<String>,
}

impl LabelOrdering {
    /// Collect the distinct labels in sorted order.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        Self {
            labels: unique.into_iter().collect(),
        }
    }

    /// Check that the stored labels are non-empty, unique and sorted.
    pub fn validate(&self) -> Result<(), ModelError> {
        if let Some(empty) = self.labels.iter().position(|l| l.is_empty()) {
            return Err(ModelError::UnknownLabel(format!("empty label at index {}", empty)));
        }
        if self.labels.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ModelError::UnknownLabel(
                "labels are not sorted and distinct".to_string(),
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Encode labels as class indices.
    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, ModelError> {
        labels
            .iter()
            .map(|l| {
                self.index_of(l.as_ref())
                    .ok_or_else(|| ModelError::UnknownLabel(l.as_ref().to_string()))
            })
            .collect()
    }
}
