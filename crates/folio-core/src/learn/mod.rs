//! TF-IDF features, the linear SVM and the training run that ties them together.

pub mod labels;
pub mod metrics;
pub mod split;
pub mod svm;
pub mod vectorizer;
mod trainer;

pub use labels::LabelOrdering;
pub use metrics::ClassificationReport;
pub use split::{train_test_split, Split};
pub use svm::{LinearSvm, SvmParams};
pub use trainer::{Trainer, TrainingOutcome};
pub use vectorizer::{FittedVectorizer, SparseVector, TfidfVectorizer, Vocabulary};
