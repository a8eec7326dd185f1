//! The trained classifier, vocabulary and label ordering as one unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::learn::labels::LabelOrdering;
use crate::learn::svm::LinearSvm;
use crate::learn::vectorizer::{FittedVectorizer, SparseVector};
use crate::text::{normalize, NormalizerSpec};

/// Version of the on-disk bundle layout.
pub const FORMAT_VERSION: u32 = 1;

/// Identity of one training run, shared by all sub-artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub run_id: String,
    pub trained_at: DateTime<Utc>,
    pub normalizer: NormalizerSpec,
    pub n_classes: usize,
    pub n_features: usize,
}

/// A prediction for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    pub label: String,
    /// Softmax probability of the predicted class.
    pub confidence: f64,
}

/// Mutually consistent classifier, vectorizer and label ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    manifest: Manifest,
    classifier: LinearSvm,
    vectorizer: FittedVectorizer,
    labels: LabelOrdering,
}

impl ArtifactBundle {
    /// Bundle the outputs of a fresh training run under a new run id.
    pub fn new(
        classifier: LinearSvm,
        vectorizer: FittedVectorizer,
        labels: LabelOrdering,
    ) -> Result<Self, ArtifactError> {
        let trained_at = Utc::now();
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            run_id: format!(
                "{}-{:08x}",
                trained_at.format("%Y%m%dT%H%M%S%.6fZ"),
                rand::random::<u32>()
            ),
            trained_at,
            normalizer: NormalizerSpec::current(),
            n_classes: classifier.n_classes(),
            n_features: classifier.n_features(),
        };
        Self::from_parts(manifest, classifier, vectorizer, labels)
    }

    /// Reassemble a bundle, checking the parts against each other and the manifest.
    pub fn from_parts(
        manifest: Manifest,
        classifier: LinearSvm,
        vectorizer: FittedVectorizer,
        labels: LabelOrdering,
    ) -> Result<Self, ArtifactError> {
        if labels.len() != classifier.n_classes() {
            return Err(ArtifactError::LabelOrderingMismatch {
                labels: labels.len(),
                classes: classifier.n_classes(),
            });
        }
        if vectorizer.n_features() != classifier.n_features() {
            return Err(ArtifactError::CorruptArtifact(format!(
                "vocabulary has {} terms but classifier expects {} features",
                vectorizer.n_features(),
                classifier.n_features()
            )));
        }
        if manifest.n_classes != classifier.n_classes()
            || manifest.n_features != classifier.n_features()
        {
            return Err(ArtifactError::CorruptArtifact(format!(
                "manifest describes {}x{} model but classifier is {}x{}",
                manifest.n_classes,
                manifest.n_features,
                classifier.n_classes(),
                classifier.n_features()
            )));
        }

        Ok(Self {
            manifest,
            classifier,
            vectorizer,
            labels,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn run_id(&self) -> &str {
        &self.manifest.run_id
    }

    pub fn classifier(&self) -> &LinearSvm {
        &self.classifier
    }

    pub fn vectorizer(&self) -> &FittedVectorizer {
        &self.vectorizer
    }

    pub fn labels(&self) -> &LabelOrdering {
        &self.labels
    }

    /// Normalize and vectorize raw text exactly as during training.
    pub fn features(&self, text: &str) -> SparseVector {
        self.vectorizer.transform(&normalize(text))
    }

    /// Classify raw (unnormalized) text.
    pub fn predict(&self, text: &str) -> Prediction {
        let features = self.features(text);
        let probabilities = self.classifier.probabilities(&features);
        let class_index = self.classifier.predict(&features);

        // from_parts guarantees one label per classifier class.
        Prediction {
            class_index,
            label: self.labels.as_slice()[class_index].clone(),
            confidence: probabilities[class_index],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learn::svm::SvmParams;
    use crate::learn::vectorizer::TfidfVectorizer;

    fn parts() -> (LinearSvm, FittedVectorizer) {
        let (vectorizer, x) = TfidfVectorizer::new()
            .fit_transform(&["ledger audit", "kernel scheduler"])
            .unwrap();
        let classifier = SvmParams::default()
            .fit(&x, &[0, 1], 2, vectorizer.n_features())
            .unwrap();
        (classifier, vectorizer)
    }

    #[test]
    fn test_new_bundle_predicts_raw_text() {
        let (classifier, vectorizer) = parts();
        let labels = LabelOrdering::from_labels(["finance", "systems"]);
        let bundle = ArtifactBundle::new(classifier, vectorizer, labels).unwrap();

        assert_eq!(bundle.manifest().normalizer, NormalizerSpec::current());
        assert_eq!(bundle.predict("The AUDIT of the ledger!").label, "finance");
        assert_eq!(bundle.predict("a kernel scheduler").label, "systems");
    }

    #[test]
    fn test_label_count_must_match_classes() {
        let (classifier, vectorizer) = parts();
        let labels = LabelOrdering::from_labels(["finance", "systems", "legal"]);

        assert!(matches!(
            ArtifactBundle::new(classifier, vectorizer, labels),
            Err(ArtifactError::LabelOrderingMismatch {
                labels: 3,
                classes: 2
            })
        ));
    }

    #[test]
    fn test_vocabulary_must_match_features() {
        let (classifier, _) = parts();
        let (other_vectorizer, _) = TfidfVectorizer::new()
            .fit_transform(&["one two three"])
            .unwrap();
        let labels = LabelOrdering::from_labels(["finance", "systems"]);

        assert!(matches!(
            ArtifactBundle::new(classifier, other_vectorizer, labels),
            Err(ArtifactError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_run_ids_differ_between_runs() {
        let (classifier, vectorizer) = parts();
        let labels = LabelOrdering::from_labels(["finance", "systems"]);
        let a = ArtifactBundle::new(classifier.clone(), vectorizer.clone(), labels.clone()).unwrap();
        let b = ArtifactBundle::new(classifier, vectorizer, labels).unwrap();
        assert_ne!(a.run_id(), b.run_id());
    }
}
