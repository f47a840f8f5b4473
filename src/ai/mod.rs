mod extractor;

pub use extractor::{AiSettings, Extraction, Extractor, TagSource};
