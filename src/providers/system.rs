//! Fonts installed on this machine
//!
//! Scans the usual font directories, parses everything renderable through
//! the regular extractor, and retags the results as `local`. Payloads are
//! not kept in memory; the render URL points back at the file.

use crate::catalog::store::{Catalog, MergeOutcome};
use crate::font::extractor::MetadataExtractor;
use crate::font::file::{walk_files, DiskFile, FontFile};
use crate::font::format::FontFormat;
use crate::font::metadata::{FontRecord, TAG_LOCAL};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Platform font directories that exist on this machine
pub fn font_directories() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = dirs::font_dir() {
        candidates.push(dir);
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".fonts"));
    }
    candidates.extend(
        [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/Library/Fonts",
            "/System/Library/Fonts",
            "C:\\Windows\\Fonts",
        ]
        .into_iter()
        .map(PathBuf::from),
    );

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|dir| dir.is_dir() && seen.insert(dir.clone()))
        .collect()
}

pub struct SystemFontProvider {
    extractor: MetadataExtractor,
    max_file_size: u64,
    directories: Vec<PathBuf>,
}

impl SystemFontProvider {
    pub fn new(extractor: MetadataExtractor, max_file_size: u64) -> Self {
        Self {
            extractor,
            max_file_size,
            directories: font_directories(),
        }
    }

    /// Scan these directories instead of the platform ones
    pub fn with_directories(mut self, directories: Vec<PathBuf>) -> Self {
        self.directories = directories;
        self
    }

    /// Parse every installed font. Runs on the blocking pool.
    pub async fn scan(&self) -> anyhow::Result<Vec<FontRecord>> {
        let extractor = self.extractor.clone();
        let directories = self.directories.clone();
        let max_file_size = self.max_file_size;
        let records = tokio::task::spawn_blocking(move || {
            directories
                .iter()
                .flat_map(|dir| scan_directory(&extractor, dir, max_file_size))
                .collect::<Vec<_>>()
        })
        .await?;
        info!("Found {} system font(s)", records.len());
        Ok(records)
    }

    /// Scan and merge into the catalog by id
    pub async fn load_into(&self, catalog: &mut Catalog) -> anyhow::Result<MergeOutcome> {
        let records = self.scan().await?;
        Ok(catalog.merge_by_id(records))
    }
}

fn scan_directory(extractor: &MetadataExtractor, dir: &Path, max_file_size: u64) -> Vec<FontRecord> {
    let paths = match walk_files(dir) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Cannot read font directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    let mut ids = HashSet::new();
    for path in paths {
        if !FontFormat::from_filename(&path.to_string_lossy()).is_renderable() {
            continue;
        }
        let file = match DiskFile::open(&path) {
            Ok(file) if file.size() <= max_file_size => file,
            Ok(_) => {
                debug!("Skipping oversized system font {}", path.display());
                continue;
            }
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let bytes = match file.read_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        match extractor.describe_bytes(file.name(), &bytes) {
            Ok(record) => {
                let record = into_system_record(record, &path);
                if ids.insert(record.id.clone()) {
                    extractor.register_record(&record, file.name(), bytes);
                    records.push(record);
                }
            }
            Err(e) => debug!("Skipping system font {}: {}", path.display(), e),
        }
    }
    records
}

fn into_system_record(mut record: FontRecord, path: &Path) -> FontRecord {
    let stable = if record.metadata.postscript_name.is_empty() {
        record.metadata.full_name.clone()
    } else {
        record.metadata.postscript_name.clone()
    };
    record.id = format!("sys-{}", stable);
    record.tags = BTreeSet::from([TAG_LOCAL.to_string()]);
    record.metadata.format = FontFormat::System;
    record.render_url = format!("file://{}", path.display());
    record
}
