//! Candidate font files
//!
//! The ingestion pipeline only needs a name, a size, and a way to pull the
//! bytes. Files on disk and buffers already in memory both qualify.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// A file handed to the ingestion pipeline
pub trait FontFile: Send + Sync {
    /// Display name, including extension
    fn name(&self) -> &str;

    /// Size in bytes as reported before reading
    fn size(&self) -> u64;

    /// Read the complete payload
    fn read_bytes(&self) -> io::Result<Arc<[u8]>>;
}

/// A font file on the local filesystem
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    size: u64,
}

impl DiskFile {
    /// Stat the file so its size is known before any bytes are read.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            path,
            name,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FontFile for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_bytes(&self) -> io::Result<Arc<[u8]>> {
        Ok(Arc::from(fs::read(&self.path)?))
    }
}

/// A font payload that is already in memory
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl FontFile for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_bytes(&self) -> io::Result<Arc<[u8]>> {
        Ok(Arc::clone(&self.bytes))
    }
}

/// Every regular file under `root`, depth first, in file-name order.
/// Symlinks are followed; entries below the root that cannot be read are
/// logged and skipped.
pub fn walk_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                debug!("Skipping entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}
