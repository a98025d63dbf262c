//! Batched font ingestion
//!
//! Size filter, then fixed-size batches. Every file in a batch is parsed on
//! the blocking pool and the batch is awaited in full before the next one
//! starts. One file's failure never reaches its neighbours.

use crate::catalog::{Catalog, Provider};
use crate::core::errors::ExtractError;
use crate::core::settings::{IngestSettings, OVERSIZED_NAMES_SHOWN};
use crate::font::extractor::MetadataExtractor;
use crate::font::file::FontFile;
use crate::font::format::{has_accepted_extension, FontFormat};
use crate::font::metadata::FontRecord;
use crate::ingest::notify::{oversized_notice, unsupported_notice, Notifier};
use std::any::Any;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// What happened to a set of candidate files
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Ids of records that made it into the catalog
    pub added: Vec<String>,
    /// Parsed fine but already in the catalog
    pub duplicates: usize,
    pub oversized: Vec<String>,
    pub unsupported: Vec<(String, FontFormat)>,
    /// Unexpected failures. Logged, never shown as notifications.
    pub errors: Vec<String>,
    pub cancelled: bool,
}

/// Everything a batch produced before merging
#[derive(Default)]
struct BatchOutcome {
    records: Vec<FontRecord>,
    unsupported: Vec<(String, FontFormat)>,
    errors: Vec<ExtractError>,
}

pub struct IngestPipeline {
    extractor: MetadataExtractor,
    settings: IngestSettings,
    notifier: Arc<dyn Notifier>,
    cancel: Option<Arc<AtomicBool>>,
}

impl IngestPipeline {
    pub fn new(
        extractor: MetadataExtractor,
        settings: IngestSettings,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            extractor,
            settings,
            notifier,
            cancel: None,
        }
    }

    /// Stop between batches once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Drag-and-drop entry point: only accepted extensions go through
    pub async fn ingest_dropped(
        &self,
        files: Vec<Arc<dyn FontFile>>,
        catalog: &mut Catalog,
    ) -> IngestReport {
        let total = files.len();
        let accepted: Vec<Arc<dyn FontFile>> = files
            .into_iter()
            .filter(|f| has_accepted_extension(f.name()))
            .collect();
        if accepted.len() < total {
            debug!(
                "Ignored {} dropped file(s) without a font extension",
                total - accepted.len()
            );
        }
        if accepted.is_empty() {
            return IngestReport::default();
        }
        self.load_files(accepted, catalog).await
    }

    /// File-picker entry point
    pub async fn ingest_picked(
        &self,
        files: Vec<Arc<dyn FontFile>>,
        catalog: &mut Catalog,
    ) -> IngestReport {
        self.load_files(files, catalog).await
    }

    /// Run the whole pipeline and merge the results into `catalog`
    pub async fn load_files(
        &self,
        files: Vec<Arc<dyn FontFile>>,
        catalog: &mut Catalog,
    ) -> IngestReport {
        let mut report = IngestReport::default();

        let (valid, oversized): (Vec<_>, Vec<_>) = files
            .into_iter()
            .partition(|f| f.size() <= self.settings.max_file_size);
        if !oversized.is_empty() {
            report.oversized = oversized.iter().map(|f| f.name().to_string()).collect();
            self.notifier.notify(oversized_notice(
                &report.oversized,
                OVERSIZED_NAMES_SHOWN,
                self.settings.max_file_size_mib(),
                self.settings.notice_duration,
            ));
        }

        let batch_size = self.settings.batch_size.max(1);
        let yield_between = valid.len() > self.settings.yield_threshold;
        let mut records = Vec::new();
        let mut errors = Vec::new();

        for (index, batch) in valid.chunks(batch_size).enumerate() {
            if self.is_cancelled() {
                info!("Ingestion cancelled before batch {}", index + 1);
                report.cancelled = true;
                break;
            }

            let outcome = self.run_batch(batch).await;
            debug!(
                "Batch {} settled: {} parsed, {} unsupported, {} failed",
                index + 1,
                outcome.records.len(),
                outcome.unsupported.len(),
                outcome.errors.len()
            );

            if let Some(notice) = unsupported_notice(
                &outcome.unsupported,
                self.settings.notice_names_max_chars,
                self.settings.notice_duration,
            ) {
                self.notifier.notify(notice);
            }
            report.unsupported.extend(outcome.unsupported);
            records.extend(outcome.records);
            errors.extend(outcome.errors);

            if yield_between {
                tokio::task::yield_now().await;
            }
        }

        if !errors.is_empty() {
            error!("{} font(s) failed to load", errors.len());
            for e in &errors {
                error!("  {}", e);
            }
        }
        report.errors = errors.iter().map(|e| e.to_string()).collect();

        let candidate_ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let merged = catalog.add_fonts(records);
        report.duplicates = merged.duplicates;
        if merged.added > 0 {
            let snapshot = catalog.snapshot();
            report.added = candidate_ids
                .into_iter()
                .filter(|id| snapshot.font(id).is_some())
                .collect();
            catalog.set_active_provider(Provider::Added);
        }

        info!(
            "Ingested {} font(s): {} duplicate, {} oversized, {} unsupported, {} failed",
            report.added.len(),
            report.duplicates,
            report.oversized.len(),
            report.unsupported.len(),
            report.errors.len()
        );
        report
    }

    /// Parse every file of a batch and wait for all of them
    async fn run_batch(&self, batch: &[Arc<dyn FontFile>]) -> BatchOutcome {
        let handles: Vec<_> = batch
            .iter()
            .map(|file| {
                let file = Arc::clone(file);
                let extractor = self.extractor.clone();
                tokio::task::spawn_blocking(move || extractor.extract(file.as_ref()))
            })
            .collect();

        let mut outcome = BatchOutcome::default();
        let mut unsupported_names = HashSet::new();
        for (file, handle) in batch.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(ExtractError::Internal {
                    filename: file.name().to_string(),
                    message: if join_error.is_panic() {
                        panic_message(join_error.into_panic())
                    } else {
                        join_error.to_string()
                    },
                }),
            };
            match result {
                Ok(record) => outcome.records.push(record),
                Err(ExtractError::UnsupportedFormat { filename, format }) => {
                    if unsupported_names.insert(filename.clone()) {
                        outcome.unsupported.push((filename, format));
                    }
                }
                Err(other) => outcome.errors.push(other),
            }
        }
        outcome
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "parser panicked".to_string()
    }
}
