//! Bringing a previous session back
//!
//! Stored records get their payloads back from the blob store, a fresh
//! render URL, and a new registration with the render environment. Records
//! saved before content hashing existed get a hash now if their payload is
//! still around, or the legacy sentinel if it is not.

use crate::catalog::store::Catalog;
use crate::core::errors::StorageError;
use crate::font::extractor::new_blob_url;
use crate::font::hasher::hash_bytes;
use crate::font::metadata::{is_content_hash, FontRecord, LEGACY_NO_HASH};
use crate::font::registrar::{FontRegistrar, RenderSource};
use crate::storage::{Consent, FontStore};
use std::sync::Arc;
use tracing::{debug, info};

/// What a revive restored
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReviveSummary {
    pub fonts: usize,
    pub rehashed: usize,
    pub collections: usize,
    pub skipped: usize,
}

/// Load everything stored and merge it into `catalog`.
///
/// Does nothing unless storage consent was granted. Fonts are merged by id
/// and fire the catalog hooks; collections, favorites, and settings are
/// restored quietly.
pub async fn load_from_persistence(
    store: &FontStore,
    registrar: &FontRegistrar,
    catalog: &mut Catalog,
) -> Result<ReviveSummary, StorageError> {
    if store.consent().await != Consent::Granted {
        debug!("Storage consent not granted, starting empty");
        return Ok(ReviveSummary::default());
    }

    let mut summary = ReviveSummary::default();
    let records: Vec<FontRecord> = store
        .load_all()
        .await?
        .into_iter()
        .map(|record| revive_record(record, registrar, &mut summary))
        .collect();

    let outcome = catalog.merge_by_id(records);
    summary.fonts = outcome.added;
    summary.skipped = outcome.duplicates;

    let collections = store.load_collections().await?;
    summary.collections = collections.len();
    let settings = store.load_settings().await?;
    let favorites = FontStore::favorites_from(&settings);
    catalog.restore(collections, favorites, &settings);

    info!(
        "Restored {} font(s) and {} collection(s) from {:?}",
        summary.fonts,
        summary.collections,
        store.root()
    );
    Ok(summary)
}

fn revive_record(
    mut record: FontRecord,
    registrar: &FontRegistrar,
    summary: &mut ReviveSummary,
) -> FontRecord {
    let Some(bytes) = record.resource.as_ref().map(|r| Arc::clone(r.bytes())) else {
        if record.content_hash.is_empty() {
            record.content_hash = LEGACY_NO_HASH.to_string();
        }
        return record;
    };

    if !is_content_hash(&record.content_hash) {
        record.content_hash = hash_bytes(&bytes);
        summary.rehashed += 1;
    }
    record.render_url = new_blob_url();

    let face_name = if record.metadata.full_name.is_empty() {
        record.metadata.family.clone()
    } else {
        record.metadata.full_name.clone()
    };
    registrar.register(
        &face_name,
        RenderSource {
            url: record.render_url.clone(),
            bytes: Some(bytes),
        },
    );
    record
}
