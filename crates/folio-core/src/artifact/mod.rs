//! Trained model artifacts.

mod bundle;
mod store;

pub use bundle::{ArtifactBundle, Manifest, Prediction, FORMAT_VERSION};
pub use store::{ArtifactStore, CLASSIFIER_FILE, LABELS_FILE, MANIFEST_FILE, VECTORIZER_FILE};
