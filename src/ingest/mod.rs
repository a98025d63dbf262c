//! Font ingestion
//!
//! Candidate files from a drop or a file picker go through size filtering,
//! batched extraction, and error aggregation before being merged into the
//! catalog.

pub mod notify;
pub mod pipeline;

pub use notify::{Notification, Notifier, SilentNotifier};
pub use pipeline::{IngestPipeline, IngestReport};
