//! Font files, their metadata, and registration for rendering
//!
//! This module contains everything that looks at a single font:
//! - Format classification by extension
//! - Content hashing for deduplication
//! - Structural parsing and metadata extraction
//! - Registration with the render environment

pub mod extractor;
pub mod file;
pub mod format;
pub mod hasher;
pub mod metadata;
pub mod registrar;
pub mod woff;
#[cfg(test)]
pub(crate) mod testdata;

// Re-export commonly used items
pub use extractor::{MetadataExtractor, ParseOutcome};
pub use file::{DiskFile, FontFile, MemoryFile};
pub use format::FontFormat;
pub use metadata::{FontMetadata, FontRecord, FontResource};
pub use registrar::{FontRegistrar, RenderEnvironment, RenderRegistry, RenderSource};
