//! Text normalization shared by training and inference.

mod normalizer;
pub mod stopwords;

pub use normalizer::{normalize, strip_punctuation, NormalizerSpec, PUNCTUATION_ID};
pub use stopwords::{is_stopword, STOPWORDS_ID};
