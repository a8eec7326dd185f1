//! TF-IDF vectorizer with a frozen vocabulary after fitting.
//!
//! [`TfidfVectorizer`] can only fit; fitting consumes it and yields a
//! [`FittedVectorizer`], which can only transform. Feature vectors produced
//! while fitting are computed by the fitted vectorizer itself, so training and
//! inference share one projection.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lazy_static::lazy_static;
use ndarray::ArrayView1;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;

lazy_static! {
    /// Runs of two or more word characters.
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").unwrap();
}

/// Lower-case and split text into vectorizer terms.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Sparse feature vector as `(feature index, value)` pairs sorted by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector(Vec<(usize, f64)>);

impl SparseVector {
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest feature index plus one, or zero for an empty vector.
    pub fn min_dimension(&self) -> usize {
        self.0.last().map(|(i, _)| i + 1).unwrap_or(0)
    }

    /// Dot product with a dense vector.
    pub fn dot(&self, dense: ArrayView1<'_, f64>) -> f64 {
        self.0.iter().map(|&(i, v)| v * dense[i]).sum()
    }

    pub fn norm(&self) -> f64 {
        self.0.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }
}

/// Index and inverse document frequency of one vocabulary term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub index: usize,
    pub idf: f64,
}

/// Term -> weight mapping built once from the training texts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: BTreeMap<String, TermWeight>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<&TermWeight> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermWeight)> {
        self.terms.iter().map(|(t, w)| (t.as_str(), w))
    }

    /// Check that indices are exactly `0..len` and weights are positive.
    fn validate(&self) -> Result<(), ModelError> {
        let mut seen = vec![false; self.terms.len()];
        for (term, weight) in &self.terms {
            match seen.get_mut(weight.index) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(ModelError::Dimension(format!(
                        "term {:?} has duplicate or out-of-range index {}",
                        term, weight.index
                    )));
                }
            }
            if !weight.idf.is_finite() || weight.idf <= 0.0 {
                return Err(ModelError::Dimension(format!(
                    "term {:?} has invalid idf {}",
                    term, weight.idf
                )));
            }
        }
        Ok(())
    }
}

/// Unfitted TF-IDF vectorizer; supports only fit-and-transform.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    _private: (),
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the vocabulary from `documents` and return their feature vectors.
    ///
    /// Terms are indexed in sorted order and weighted with the smoothed idf
    /// `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit_transform<S: AsRef<str>>(
        self,
        documents: &[S],
    ) -> Result<(FittedVectorizer, Vec<SparseVector>), ModelError> {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: BTreeSet<String> = tokenize(doc.as_ref()).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(ModelError::EmptyVocabulary);
        }

        let n = documents.len() as f64;
        let terms = document_frequency
            .into_iter()
            .enumerate()
            .map(|(index, (term, df))| {
                let idf = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (term, TermWeight { index, idf })
            })
            .collect();

        let fitted = FittedVectorizer::new(Vocabulary { terms })?;
        debug!(
            "Fitted vocabulary of {} terms on {} documents",
            fitted.n_features(),
            documents.len()
        );

        let vectors = fitted.transform_all(documents);
        Ok((fitted, vectors))
    }
}

/// Vectorizer with a frozen vocabulary; supports only transform.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedVectorizer {
    vocabulary: Vocabulary,
}

impl FittedVectorizer {
    /// Wrap a vocabulary, failing with [`ModelError::UnfittedVectorizer`] if it is empty.
    pub fn new(vocabulary: Vocabulary) -> Result<Self, ModelError> {
        if vocabulary.is_empty() {
            return Err(ModelError::UnfittedVectorizer);
        }
        vocabulary.validate()?;
        Ok(Self { vocabulary })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Dimension of the feature space.
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Project text into the frozen feature space; unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, (f64, f64)> = HashMap::new();
        for term in tokenize(text) {
            if let Some(weight) = self.vocabulary.get(&term) {
                counts.entry(weight.index).or_insert((0.0, weight.idf)).0 += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, (tf, idf))| (index, tf * idf))
            .collect();
        entries.sort_by_key(|&(index, _)| index);

        let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in &mut entries {
                *v /= norm;
            }
        }

        SparseVector(entries)
    }

    pub fn transform_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SparseVector> {
        texts.iter().map(|t| self.transform(t.as_ref())).collect()
    }
}
