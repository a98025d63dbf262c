//! Metadata extraction
//!
//! Turns a font payload into a [`FontRecord`]. The structural parse is an
//! explicit two-way outcome; when it fails, the format partition decides
//! between rejecting the file and synthesizing minimal metadata.

use crate::core::errors::ExtractError;
use crate::font::file::FontFile;
use crate::font::format::FontFormat;
use crate::font::hasher;
use crate::font::metadata::{sanitize, FontMetadata, FontRecord, FontResource};
use crate::font::registrar::{FontRegistrar, RenderSource};
use crate::font::woff;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use ttf_parser::name_id;
use ttf_parser::PlatformId;

/// Distinguishes records created within the same millisecond
static INGEST_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Result of the structural parse
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Parsed(ParsedFont),
    Failed(String),
}

/// Fields read from an sfnt binary, already sanitized
#[derive(Debug, Clone, Default)]
pub struct ParsedFont {
    pub family: String,
    pub subfamily: String,
    pub full_name: String,
    pub postscript_name: String,
    pub version: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub license: Option<String>,
    pub glyph_count: u32,
    pub supported_chars: Vec<u32>,
}

/// Parse `bytes` as an OpenType/TrueType font, unwrapping WOFF 1.0 first
pub fn parse_structure(bytes: &[u8]) -> ParseOutcome {
    let unwrapped;
    let bytes = if woff::is_woff(bytes) {
        match woff::decode(bytes) {
            Ok(sfnt) => {
                unwrapped = sfnt;
                unwrapped.as_slice()
            }
            Err(e) => return ParseOutcome::Failed(e.to_string()),
        }
    } else {
        bytes
    };

    let face = match ttf_parser::Face::parse(bytes, 0) {
        Ok(face) => face,
        Err(e) => return ParseOutcome::Failed(e.to_string()),
    };

    let names = NameLookup::new(&face);
    ParseOutcome::Parsed(ParsedFont {
        family: names.get(name_id::FAMILY),
        subfamily: names.get(name_id::SUBFAMILY),
        full_name: names.get(name_id::FULL_NAME),
        postscript_name: names.get(name_id::POST_SCRIPT_NAME),
        version: names.optional(name_id::VERSION),
        author: names.optional(name_id::DESIGNER),
        copyright: names.optional(name_id::COPYRIGHT_NOTICE),
        license: names.optional(name_id::LICENSE),
        glyph_count: u32::from(face.number_of_glyphs()),
        supported_chars: supported_chars(&face),
    })
}

/// Best name-table entry per name id: US English first, then any English,
/// then whatever came first.
struct NameLookup {
    best: HashMap<u16, (u8, String)>,
}

impl NameLookup {
    fn new(face: &ttf_parser::Face<'_>) -> Self {
        let mut best: HashMap<u16, (u8, String)> = HashMap::new();
        for name in face.names() {
            let Some(value) = name.to_string() else {
                continue;
            };
            let rank = language_rank(name.platform_id, name.language_id);
            match best.get(&name.name_id) {
                Some((existing, _)) if *existing <= rank => {}
                _ => {
                    best.insert(name.name_id, (rank, value));
                }
            }
        }
        Self { best }
    }

    fn get(&self, id: u16) -> String {
        self.best
            .get(&id)
            .map(|(_, value)| sanitize(value))
            .unwrap_or_default()
    }

    fn optional(&self, id: u16) -> Option<String> {
        Some(self.get(id)).filter(|value| !value.is_empty())
    }
}

fn language_rank(platform: PlatformId, language_id: u16) -> u8 {
    match platform {
        PlatformId::Windows if language_id == 0x0409 => 0,
        PlatformId::Macintosh if language_id == 0 => 0,
        PlatformId::Unicode => 1,
        PlatformId::Windows if language_id & 0x03FF == 0x09 => 1,
        _ => 2,
    }
}

fn supported_chars(face: &ttf_parser::Face<'_>) -> Vec<u32> {
    let Some(cmap) = face.tables().cmap else {
        return Vec::new();
    };
    let mut chars = BTreeSet::new();
    for subtable in cmap.subtables {
        if !subtable.is_unicode() {
            continue;
        }
        subtable.codepoints(|code_point| {
            if matches!(subtable.glyph_index(code_point), Some(id) if id.0 != 0) {
                chars.insert(code_point);
            }
        });
    }
    chars.into_iter().collect()
}

/// Address the display layer uses to find an in-memory payload
pub fn new_blob_url() -> String {
    format!("blob:fontshelf/{:032x}", rand::random::<u128>())
}

/// Record identity: a stable part plus the payload size, ingestion time,
/// and a process-wide sequence number.
fn record_id(stable: &str, size: usize) -> String {
    let sequence = INGEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let millis = chrono::Utc::now().timestamp_millis();
    format!("{}-{}-{}-{}", stable, size, millis, sequence)
}

/// Builds [`FontRecord`]s from font payloads and registers them for rendering
#[derive(Clone)]
pub struct MetadataExtractor {
    registrar: FontRegistrar,
}

impl MetadataExtractor {
    pub fn new(registrar: FontRegistrar) -> Self {
        Self { registrar }
    }

    pub fn registrar(&self) -> &FontRegistrar {
        &self.registrar
    }

    /// Read a file and extract it
    pub fn extract(&self, file: &dyn FontFile) -> Result<FontRecord, ExtractError> {
        let bytes = file.read_bytes().map_err(|source| ExtractError::Read {
            filename: file.name().to_string(),
            source,
        })?;
        self.extract_bytes(file.name(), bytes)
    }

    /// Extract a record from a payload that is already in memory and
    /// register it under a fresh blob URL
    pub fn extract_bytes(
        &self,
        filename: &str,
        bytes: Arc<[u8]>,
    ) -> Result<FontRecord, ExtractError> {
        let mut record = self.describe_bytes(filename, &bytes)?;
        self.register_record(&record, filename, Arc::clone(&bytes));
        record.resource = Some(FontResource::new(bytes));
        Ok(record)
    }

    /// Build a record without registering it or keeping the payload.
    ///
    /// Callers that point the record somewhere else (an installed file, for
    /// instance) adjust `render_url` and then call [`Self::register_record`].
    pub fn describe_bytes(&self, filename: &str, bytes: &[u8]) -> Result<FontRecord, ExtractError> {
        let content_hash = hasher::hash_bytes(bytes);
        let format = FontFormat::from_filename(filename);

        let metadata = match parse_structure(bytes) {
            ParseOutcome::Parsed(parsed) => {
                debug!(
                    "Parsed {} ({}, {} glyphs)",
                    filename, parsed.full_name, parsed.glyph_count
                );
                FontMetadata {
                    family: parsed.family,
                    subfamily: parsed.subfamily,
                    full_name: parsed.full_name,
                    postscript_name: parsed.postscript_name,
                    format,
                    glyph_count: parsed.glyph_count,
                    supported_chars: Some(parsed.supported_chars),
                    version: parsed.version,
                    author: parsed.author,
                    copyright: parsed.copyright,
                    license: parsed.license,
                }
            }
            ParseOutcome::Failed(_) if format.is_metadata_only() => {
                return Err(ExtractError::UnsupportedFormat {
                    filename: filename.to_string(),
                    format,
                });
            }
            ParseOutcome::Failed(reason) => {
                warn!(
                    "Structural parse of {} failed ({}), using fallback metadata",
                    filename, reason
                );
                FontMetadata::fallback(filename, format)
            }
        };

        let stable = if metadata.postscript_name.is_empty() {
            sanitize(filename)
        } else {
            metadata.postscript_name.clone()
        };
        let id = record_id(&stable, bytes.len());
        let render_url = new_blob_url();

        Ok(FontRecord {
            id,
            resource: None,
            render_url,
            metadata,
            tags: BTreeSet::new(),
            content_hash,
        })
    }

    /// Register `record` for rendering under its own `render_url`
    pub fn register_record(&self, record: &FontRecord, filename: &str, bytes: Arc<[u8]>) {
        self.registrar.register(
            &face_name(record, filename),
            RenderSource {
                url: record.render_url.clone(),
                bytes: Some(bytes),
            },
        );
    }
}

/// Registration name: the full name, or the sanitized filename without one
fn face_name(record: &FontRecord, filename: &str) -> String {
    if record.metadata.full_name.is_empty() {
        sanitize(filename)
    } else {
        record.metadata.full_name.clone()
    }
}
