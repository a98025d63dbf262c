//! Font records and their metadata
//!
//! A [`FontRecord`] is what the catalog stores: identity, provenance tags,
//! a content hash for deduplication, and the [`FontMetadata`] pulled out of
//! the binary (or synthesized when the binary could not be read).

use crate::font::format::FontFormat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Longest display string we keep, in characters
pub const MAX_NAME_CHARS: usize = 500;

/// Hash placeholder for remote entries that have no local payload
pub const REMOTE_NO_HASH: &str = "remote-no-hash";

/// Hash placeholder for persisted records whose payload is gone
pub const LEGACY_NO_HASH: &str = "legacy-no-hash";

/// Provenance tag for fonts installed on this machine
pub const TAG_LOCAL: &str = "local";

/// Provenance tag for fonts from the Google Fonts catalog
pub const TAG_GOOGLE: &str = "google";

/// Code points shown when a font did not tell us what it covers:
/// printable Basic Latin and Latin-1 Supplement.
const DEFAULT_PREVIEW_RANGES: [RangeInclusive<u32>; 2] = [0x20..=0x7E, 0xA0..=0xFF];

/// Strip control characters (U+0000..U+001F, U+007F), trim, and cap the
/// length at [`MAX_NAME_CHARS`].
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(*c as u32, 0..=31 | 127))
        .collect();
    cleaned.trim().chars().take(MAX_NAME_CHARS).collect()
}

/// True if a hash can be used as a deduplication key
pub fn is_content_hash(hash: &str) -> bool {
    !hash.is_empty() && hash != REMOTE_NO_HASH && hash != LEGACY_NO_HASH
}

/// Structured description of a font
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FontMetadata {
    pub family: String,
    pub subfamily: String,
    pub full_name: String,
    pub postscript_name: String,
    pub format: FontFormat,
    #[serde(default)]
    pub glyph_count: u32,
    /// Ascending, duplicate-free code points with a glyph. `None` means
    /// coverage is unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_chars: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl FontMetadata {
    /// Minimal metadata for a file we could not parse: the filename stands
    /// in for every name and coverage is left unknown.
    pub fn fallback(filename: &str, format: FontFormat) -> Self {
        let name = sanitize(filename);
        Self {
            family: name.clone(),
            subfamily: "Regular".to_string(),
            full_name: name.clone(),
            postscript_name: name,
            format,
            ..Default::default()
        }
    }

    /// Code points to preview: the known coverage, or a Latin default when
    /// coverage is unknown or empty.
    pub fn preview_chars(&self) -> Vec<u32> {
        match &self.supported_chars {
            Some(chars) if !chars.is_empty() => chars.clone(),
            _ => DEFAULT_PREVIEW_RANGES
                .iter()
                .flat_map(|range| range.clone())
                .collect(),
        }
    }

    /// True if the font is known to have a glyph for `c`
    pub fn supports(&self, c: char) -> bool {
        self.supported_chars
            .as_ref()
            .is_some_and(|chars| chars.binary_search(&(c as u32)).is_ok())
    }
}

/// Shared handle to a font's raw bytes
#[derive(Clone)]
pub struct FontResource(Arc<[u8]>);

impl FontResource {
    pub fn new(bytes: Arc<[u8]>) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for FontResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FontResource({} bytes)", self.0.len())
    }
}

/// A font known to the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontRecord {
    pub id: String,
    /// Raw payload. Persisted separately from the record itself.
    #[serde(skip)]
    pub resource: Option<FontResource>,
    pub render_url: String,
    pub metadata: FontMetadata,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub content_hash: String,
}

impl FontRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Fonts the user added themselves carry neither provenance tag
    pub fn is_user_added(&self) -> bool {
        !self.has_tag(TAG_LOCAL) && !self.has_tag(TAG_GOOGLE)
    }

    /// The hash if it is a real content digest
    pub fn dedup_key(&self) -> Option<&str> {
        is_content_hash(&self.content_hash).then_some(self.content_hash.as_str())
    }
}

/// Group fonts by family name, families in sorted order
pub fn group_by_family<'a>(fonts: &'a [FontRecord]) -> BTreeMap<&'a str, Vec<&'a FontRecord>> {
    let mut groups: BTreeMap<&str, Vec<&FontRecord>> = BTreeMap::new();
    for font in fonts {
        groups
            .entry(font.metadata.family.as_str())
            .or_default()
            .push(font);
    }
    groups
}
