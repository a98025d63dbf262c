//! WOFF 1.0 unwrapping
//!
//! A WOFF file is an sfnt whose tables were individually zlib-compressed
//! behind a 44-byte header. Rebuilding the sfnt lets the regular parser read
//! names and coverage from web fonts.

use flate2::read::ZlibDecoder;
use std::io::Read;
use thiserror::Error;

const SIGNATURE: &[u8; 4] = b"wOFF";
const HEADER_LEN: usize = 44;
const DIRECTORY_ENTRY_LEN: usize = 20;
const SFNT_HEADER_LEN: usize = 12;
const SFNT_RECORD_LEN: usize = 16;

/// Upper bound on the rebuilt sfnt, guarding against inflation bombs
pub const MAX_SFNT_SIZE: usize = 64 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WoffError {
    #[error("WOFF data truncated at offset {0}")]
    Truncated(usize),

    #[error("WOFF table {tag} lies outside the file")]
    TableOutOfBounds { tag: String },

    #[error("WOFF table {tag} inflated to {actual} bytes, expected {expected}")]
    LengthMismatch { tag: String, expected: usize, actual: usize },

    #[error("WOFF table {tag} could not be inflated: {message}")]
    Inflate { tag: String, message: String },

    #[error("WOFF font would expand past 64 MiB")]
    TooLarge,
}

/// True when `bytes` carries the WOFF 1.0 signature
pub fn is_woff(bytes: &[u8]) -> bool {
    bytes.starts_with(SIGNATURE)
}

struct TableEntry {
    tag: [u8; 4],
    offset: usize,
    comp_length: usize,
    orig_length: usize,
    checksum: u32,
}

impl TableEntry {
    fn tag_name(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// Rebuild the sfnt wrapped by a WOFF 1.0 file.
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, WoffError> {
    let flavor = read_u32(bytes, 4)?;
    let num_tables = usize::from(read_u16(bytes, 12)?);

    let mut entries = Vec::with_capacity(num_tables);
    let mut total = SFNT_HEADER_LEN + SFNT_RECORD_LEN * num_tables;
    for i in 0..num_tables {
        let at = HEADER_LEN + i * DIRECTORY_ENTRY_LEN;
        let entry = TableEntry {
            tag: read_u32(bytes, at)?.to_be_bytes(),
            offset: read_u32(bytes, at + 4)? as usize,
            comp_length: read_u32(bytes, at + 8)? as usize,
            orig_length: read_u32(bytes, at + 12)? as usize,
            checksum: read_u32(bytes, at + 16)?,
        };
        total = total
            .checked_add(padded(entry.orig_length))
            .filter(|total| *total <= MAX_SFNT_SIZE)
            .ok_or(WoffError::TooLarge)?;
        entries.push(entry);
    }

    let mut out = Vec::with_capacity(total);
    push_u32(&mut out, flavor);
    push_u16(&mut out, num_tables as u16);
    let (search_range, entry_selector, range_shift) = search_params(num_tables as u16);
    push_u16(&mut out, search_range);
    push_u16(&mut out, entry_selector);
    push_u16(&mut out, range_shift);

    let mut offset = SFNT_HEADER_LEN + SFNT_RECORD_LEN * num_tables;
    for entry in &entries {
        out.extend_from_slice(&entry.tag);
        push_u32(&mut out, entry.checksum);
        push_u32(&mut out, offset as u32);
        push_u32(&mut out, entry.orig_length as u32);
        offset += padded(entry.orig_length);
    }

    for entry in &entries {
        let data = table_data(bytes, entry)?;
        out.extend_from_slice(&data);
        out.resize(padded(out.len()), 0);
    }
    Ok(out)
}

fn table_data(bytes: &[u8], entry: &TableEntry) -> Result<Vec<u8>, WoffError> {
    let raw = entry
        .offset
        .checked_add(entry.comp_length)
        .and_then(|end| bytes.get(entry.offset..end))
        .ok_or_else(|| WoffError::TableOutOfBounds {
            tag: entry.tag_name(),
        })?;

    if entry.comp_length >= entry.orig_length {
        if entry.comp_length != entry.orig_length {
            return Err(WoffError::LengthMismatch {
                tag: entry.tag_name(),
                expected: entry.orig_length,
                actual: entry.comp_length,
            });
        }
        return Ok(raw.to_vec());
    }

    let mut data = Vec::with_capacity(entry.orig_length);
    ZlibDecoder::new(raw)
        .take(entry.orig_length as u64 + 1)
        .read_to_end(&mut data)
        .map_err(|e| WoffError::Inflate {
            tag: entry.tag_name(),
            message: e.to_string(),
        })?;
    if data.len() != entry.orig_length {
        return Err(WoffError::LengthMismatch {
            tag: entry.tag_name(),
            expected: entry.orig_length,
            actual: data.len(),
        });
    }
    Ok(data)
}

fn search_params(num_tables: u16) -> (u16, u16, u16) {
    if num_tables == 0 {
        return (0, 0, 0);
    }
    let entry_selector = 15 - num_tables.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range;
    (search_range, entry_selector, range_shift)
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16, WoffError> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(WoffError::Truncated(at))
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, WoffError> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(WoffError::Truncated(at))
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::testdata::{self, woff_from_sfnt};

    #[test]
    fn test_search_params_match_table_count() {
        assert_eq!(search_params(1), (16, 0, 0));
        assert_eq!(search_params(5), (64, 2, 16));
        assert_eq!(search_params(16), (256, 4, 0));
    }

    #[test]
    fn test_compressed_tables_round_back_to_sfnt_tables() {
        let sfnt = testdata::minimal_ttf();
        let woff = woff_from_sfnt(&sfnt, true);
        assert!(is_woff(&woff));
        let compressed = (0..5).any(|i| {
            let at = HEADER_LEN + i * DIRECTORY_ENTRY_LEN;
            read_u32(&woff, at + 8).unwrap() < read_u32(&woff, at + 12).unwrap()
        });
        assert!(compressed, "at least one table is stored deflated");

        let rebuilt = decode(&woff).unwrap();
        let original = ttf_parser::RawFace::parse(&sfnt, 0).unwrap();
        let decoded = ttf_parser::RawFace::parse(&rebuilt, 0).unwrap();
        for tag in [b"cmap", b"head", b"hhea", b"maxp", b"name"] {
            let tag = ttf_parser::Tag::from_bytes(tag);
            assert_eq!(decoded.table(tag), original.table(tag));
        }
    }

    #[test]
    fn test_truncated_directory_is_rejected() {
        let woff = woff_from_sfnt(&testdata::minimal_ttf(), false);
        assert!(matches!(
            decode(&woff[..HEADER_LEN + 10]),
            Err(WoffError::Truncated(_))
        ));
    }

    #[test]
    fn test_table_past_end_of_file_is_rejected() {
        let woff = woff_from_sfnt(&testdata::minimal_ttf(), false);
        let cut = woff.len() - 8;
        assert!(matches!(
            decode(&woff[..cut]),
            Err(WoffError::TableOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_oversized_declared_length_is_rejected() {
        let mut woff = woff_from_sfnt(&testdata::minimal_ttf(), false);
        // origLength of the first directory entry
        woff[HEADER_LEN + 12..HEADER_LEN + 16].copy_from_slice(&u32::MAX.to_be_bytes());
        assert_eq!(decode(&woff), Err(WoffError::TooLarge));
    }
}
