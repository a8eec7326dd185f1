//! Training corpus construction from a labeled folder tree.

mod builder;
pub mod dataset;
mod taxonomy;

pub use builder::{CorpusBuilder, CorpusOutput, CorpusReport};
pub use dataset::{load_dataset, read_dataset, read_records, save_records, write_records};
pub use taxonomy::{Category, LabeledDocument, Taxonomy};
