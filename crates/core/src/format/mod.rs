//! Target formats and the tag vocabularies of their containers.

mod schema;
mod types;

pub use schema::{Id3Field, Id3Vocabulary, TagSchema};
pub use types::{ParseFormatError, TargetFormat};
