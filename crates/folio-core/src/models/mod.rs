//! Data models shared across the pipeline.

pub mod config;
pub mod record;

pub use config::FolioConfig;
pub use record::{Dataset, Example, ExtractionMethod, PageRecord};
