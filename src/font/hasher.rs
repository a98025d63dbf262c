//! Content hashing for deduplication
//!
//! SHA-256 over the raw payload, lowercase hex. The digest is persisted, so
//! it must never change across versions.

use crate::font::file::FontFile;
use sha2::{Digest, Sha256};
use std::io::{self, Read};

/// Hex digest of an in-memory payload
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    to_hex(&hasher.finalize())
}

/// Hex digest of a font file handle
pub fn hash_file(file: &dyn FontFile) -> io::Result<String> {
    let bytes = file.read_bytes()?;
    Ok(hash_bytes(&bytes))
}

/// Hex digest of a streamed payload
pub fn hash_reader(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(to_hex(&hasher.finalize()))
}

fn to_hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
