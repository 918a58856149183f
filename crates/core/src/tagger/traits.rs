//! Trait definitions for the tagger module.

use std::collections::BTreeMap;
use std::path::Path;

use super::error::TagError;

/// Writes a set of tags into one tag container format.
///
/// Implementations are blocking; async callers run them on the blocking pool.
pub trait TagWriter {
    /// Returns the name of the tag container.
    fn name(&self) -> &str;

    /// Writes `tags` (lowercase keys, non-empty values) into the file at
    /// `path`, returning the number of fields stored. Keys that alias one
    /// field count once.
    fn write(&self, path: &Path, tags: &BTreeMap<String, Vec<String>>) -> Result<usize, TagError>;
}
