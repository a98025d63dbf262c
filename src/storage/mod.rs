//! On-disk persistence for the catalog
//!
//! Layout under the data directory:
//! - `fonts.json`: font records, each naming its payload blob
//! - `blobs/<hash>.bin`: raw font payloads
//! - `collections.json`: user collections
//! - `userdata.json`: settings and favorites as a key/value map
//! - `consent`: `granted` or `denied`
//!
//! Nothing is written until the user grants consent. Denying consent
//! wipes everything.

pub mod revive;
pub mod sync;

use crate::catalog::collection::Collection;
use crate::catalog::settings::KEY_FAVORITES;
use crate::core::errors::StorageError;
use crate::font::metadata::{FontRecord, FontResource, TAG_LOCAL};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

pub use revive::{load_from_persistence, ReviveSummary};
pub use sync::PersistenceWorker;

const FONTS_FILE: &str = "fonts.json";
const COLLECTIONS_FILE: &str = "collections.json";
const USERDATA_FILE: &str = "userdata.json";
const CONSENT_FILE: &str = "consent";
const BLOBS_DIR: &str = "blobs";

/// The user's answer to the storage question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consent {
    Granted,
    Denied,
    Unknown,
}

impl Consent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Consent::Granted => "granted",
            Consent::Denied => "denied",
            Consent::Unknown => "unknown",
        }
    }
}

/// A record as written to `fonts.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFont {
    #[serde(flatten)]
    record: FontRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blob: Option<String>,
}

/// JSON-file persistence store
#[derive(Debug, Clone)]
pub struct FontStore {
    root: PathBuf,
}

impl FontStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.local/share/fontshelf` or the platform equivalent
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("fontshelf")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn blob_path(&self, blob: &str) -> PathBuf {
        self.root.join(BLOBS_DIR).join(format!("{}.bin", blob))
    }

    pub async fn consent(&self) -> Consent {
        match fs::read_to_string(self.path(CONSENT_FILE)).await {
            Ok(value) => match value.trim() {
                "granted" => Consent::Granted,
                "denied" => Consent::Denied,
                _ => Consent::Unknown,
            },
            Err(_) => Consent::Unknown,
        }
    }

    /// Record the user's answer. Denial clears all stored data.
    pub async fn set_consent(&self, consent: Consent) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))?;
        let path = self.path(CONSENT_FILE);
        fs::write(&path, consent.as_str())
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        if consent == Consent::Denied {
            self.clear_all().await?;
        }
        Ok(())
    }

    async fn writes_allowed(&self) -> bool {
        let allowed = self.consent().await == Consent::Granted;
        if !allowed {
            debug!("Storage consent not granted, skipping write");
        }
        allowed
    }

    /// Every stored record, with its payload attached when the blob exists
    pub async fn load_all(&self) -> Result<Vec<FontRecord>, StorageError> {
        let stored: Vec<StoredFont> = self.read_json(FONTS_FILE).await?.unwrap_or_default();
        let mut records = Vec::with_capacity(stored.len());
        for StoredFont { mut record, blob } in stored {
            if let Some(blob) = blob {
                let path = self.blob_path(&blob);
                match fs::read(&path).await {
                    Ok(bytes) => record.resource = Some(FontResource::new(Arc::from(bytes))),
                    Err(e) => warn!("Payload for {} unavailable at {:?}: {}", record.id, path, e),
                }
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Replace the stored font list with `records`.
    ///
    /// Only records that can be brought back are kept: those with a payload,
    /// a render URL, or the `local` tag. Payloads of fonts installed on this
    /// machine are not copied.
    pub async fn save_all(&self, records: &[FontRecord]) -> Result<(), StorageError> {
        if !self.writes_allowed().await {
            return Ok(());
        }
        let blobs_dir = self.path(BLOBS_DIR);
        fs::create_dir_all(&blobs_dir)
            .await
            .map_err(|e| StorageError::io(&blobs_dir, e))?;

        let mut stored = Vec::new();
        let mut kept_blobs = HashSet::new();
        for record in records {
            let persistable = record.resource.is_some()
                || !record.render_url.is_empty()
                || record.has_tag(TAG_LOCAL);
            if !persistable {
                continue;
            }
            let blob = match &record.resource {
                Some(resource) if !record.has_tag(TAG_LOCAL) => {
                    let name = record
                        .dedup_key()
                        .map(str::to_string)
                        .unwrap_or_else(|| crate::font::hasher::hash_bytes(resource.bytes()));
                    let path = self.blob_path(&name);
                    if fs::metadata(&path).await.is_err() {
                        self.write_atomic(&path, resource.bytes().to_vec()).await?;
                    }
                    kept_blobs.insert(format!("{}.bin", name));
                    Some(name)
                }
                _ => None,
            };
            stored.push(StoredFont {
                record: record.clone(),
                blob,
            });
        }

        self.write_json(FONTS_FILE, "fonts", &stored).await?;
        self.prune_blobs(&kept_blobs).await?;
        debug!("Saved {} font record(s)", stored.len());
        Ok(())
    }

    async fn prune_blobs(&self, keep: &HashSet<String>) -> Result<(), StorageError> {
        let blobs_dir = self.path(BLOBS_DIR);
        let mut dir = match fs::read_dir(&blobs_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::io(&blobs_dir, e)),
        };
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&blobs_dir, e))?
        {
            let file_name = entry.file_name();
            if !keep.contains(file_name.to_string_lossy().as_ref()) {
                if let Err(e) = fs::remove_file(entry.path()).await {
                    warn!("Failed to remove stale blob {:?}: {}", entry.path(), e);
                }
            }
        }
        Ok(())
    }

    pub async fn load_collections(&self) -> Result<Vec<Collection>, StorageError> {
        Ok(self.read_json(COLLECTIONS_FILE).await?.unwrap_or_default())
    }

    /// Replace all stored collections
    pub async fn save_collections(&self, collections: &[Collection]) -> Result<(), StorageError> {
        if !self.writes_allowed().await {
            return Ok(());
        }
        self.write_json(COLLECTIONS_FILE, "collections", &collections)
            .await
    }

    pub async fn load_settings(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        Ok(self.read_json(USERDATA_FILE).await?.unwrap_or_default())
    }

    pub async fn save_setting(&self, key: &str, value: Value) -> Result<(), StorageError> {
        if !self.writes_allowed().await {
            return Ok(());
        }
        let mut settings = self.load_settings().await?;
        settings.insert(key.to_string(), value);
        self.write_json(USERDATA_FILE, "settings", &settings).await
    }

    pub async fn save_favorites(&self, favorites: &BTreeSet<String>) -> Result<(), StorageError> {
        let value = serde_json::to_value(favorites).map_err(|source| StorageError::Encode {
            what: "favorites",
            source,
        })?;
        self.save_setting(KEY_FAVORITES, value).await
    }

    /// Favorites stored in the settings map, if any
    pub fn favorites_from(settings: &BTreeMap<String, Value>) -> Option<BTreeSet<String>> {
        serde_json::from_value(settings.get(KEY_FAVORITES)?.clone()).ok()
    }

    /// Remove fonts, blobs, collections, and settings. The consent answer
    /// itself is kept.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        for name in [FONTS_FILE, COLLECTIONS_FILE, USERDATA_FILE] {
            let path = self.path(name);
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(&path, e)),
            }
        }
        let blobs_dir = self.path(BLOBS_DIR);
        match fs::remove_dir_all(&blobs_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::io(&blobs_dir, e)),
        }
        debug!("Cleared stored data in {:?}", self.root);
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StorageError> {
        let path = self.path(name);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StorageError::Corrupt { path, source })
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        what: &'static str,
        value: &T,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|source| StorageError::Encode { what, source })?;
        self.write_atomic(&self.path(name), json).await
    }

    /// Write through a temp file in the same directory, then rename
    async fn write_atomic(&self, path: &Path, contents: Vec<u8>) -> Result<(), StorageError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
            let mut file =
                tempfile::NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
            file.write_all(&contents)
                .map_err(|e| StorageError::io(file.path(), e))?;
            file.persist(&path)
                .map_err(|e| StorageError::io(&path, e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}
