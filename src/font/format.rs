//! Font format classification
//!
//! Maps a filename extension to a canonical format tag and splits the
//! known formats into the ones a display engine renders natively and the
//! ones we can only ever describe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions accepted by the drag-and-drop and file-picker entry points.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "ttf", "otf", "woff", "woff2", "afm", "fea", "pfa", "pfb", "sfd", "pt3", "t42", "tfm", "vfb",
];

/// Canonical format tag, serialized as the uppercase name (`TTF`, `WOFF2`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum FontFormat {
    Ttf,
    Otf,
    Woff,
    Woff2,
    Afm,
    Fea,
    Pfa,
    Pfb,
    Sfd,
    Pt3,
    T42,
    Tfm,
    Vfb,
    /// Fonts reported by the operating system rather than read from a file
    System,
    #[default]
    Unknown,
}

impl FontFormat {
    /// Classify by the extension after the last dot, case-insensitively.
    pub fn from_filename(filename: &str) -> Self {
        match extension(filename) {
            Some(ext) => Self::from_extension(&ext),
            None => FontFormat::Unknown,
        }
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "ttf" => FontFormat::Ttf,
            "otf" => FontFormat::Otf,
            "woff" => FontFormat::Woff,
            "woff2" => FontFormat::Woff2,
            "afm" => FontFormat::Afm,
            "fea" => FontFormat::Fea,
            "pfa" => FontFormat::Pfa,
            "pfb" => FontFormat::Pfb,
            "sfd" => FontFormat::Sfd,
            "pt3" => FontFormat::Pt3,
            "t42" => FontFormat::T42,
            "tfm" => FontFormat::Tfm,
            "vfb" => FontFormat::Vfb,
            _ => FontFormat::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FontFormat::Ttf => "TTF",
            FontFormat::Otf => "OTF",
            FontFormat::Woff => "WOFF",
            FontFormat::Woff2 => "WOFF2",
            FontFormat::Afm => "AFM",
            FontFormat::Fea => "FEA",
            FontFormat::Pfa => "PFA",
            FontFormat::Pfb => "PFB",
            FontFormat::Sfd => "SFD",
            FontFormat::Pt3 => "PT3",
            FontFormat::T42 => "T42",
            FontFormat::Tfm => "TFM",
            FontFormat::Vfb => "VFB",
            FontFormat::System => "SYSTEM",
            FontFormat::Unknown => "UNKNOWN",
        }
    }

    /// Formats the display engine can draw without any help from us
    pub fn is_renderable(&self) -> bool {
        matches!(
            self,
            FontFormat::Ttf | FontFormat::Otf | FontFormat::Woff | FontFormat::Woff2
        )
    }

    /// Source, metric, and legacy formats that carry no renderable outline
    /// data in a form the display engine understands.
    pub fn is_metadata_only(&self) -> bool {
        matches!(
            self,
            FontFormat::Afm
                | FontFormat::Fea
                | FontFormat::Pfa
                | FontFormat::Pfb
                | FontFormat::Sfd
                | FontFormat::Pt3
                | FontFormat::T42
                | FontFormat::Tfm
                | FontFormat::Vfb
        )
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if the filename ends in one of [`ACCEPTED_EXTENSIONS`].
pub fn has_accepted_extension(filename: &str) -> bool {
    match extension(filename) {
        Some(ext) => ACCEPTED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() || stem.ends_with(['/', '\\']) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
