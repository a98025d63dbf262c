//! Google Fonts catalog entries
//!
//! There is no API key, so the catalog is a short built-in list. Entries
//! carry no payload: the face is registered against its remote URL and
//! stays pending until something downloads it.

use crate::catalog::store::{Catalog, MergeOutcome};
use crate::font::format::FontFormat;
use crate::font::metadata::{FontMetadata, FontRecord, REMOTE_NO_HASH, TAG_GOOGLE};
use crate::font::registrar::{FontRegistrar, RenderSource};
use std::collections::BTreeSet;
use tracing::info;

/// One family in the remote catalog
#[derive(Debug, Clone, Copy)]
pub struct RemoteFamily {
    pub family: &'static str,
    pub category: &'static str,
    pub version: &'static str,
    pub url: &'static str,
}

pub const BUILTIN_FAMILIES: &[RemoteFamily] = &[
    RemoteFamily {
        family: "Roboto",
        category: "sans-serif",
        version: "v20",
        url: "https://fonts.gstatic.com/s/roboto/v20/KFOmCnqEu92Fr1Mu4mxK.woff2",
    },
    RemoteFamily {
        family: "Open Sans",
        category: "sans-serif",
        version: "v18",
        url: "https://fonts.gstatic.com/s/opensans/v18/mem8YaGs126MiZpBA-UFVZ0e.ttf",
    },
];

impl RemoteFamily {
    pub fn to_record(&self) -> FontRecord {
        FontRecord {
            id: format!("google-{}", self.family),
            resource: None,
            render_url: self.url.to_string(),
            metadata: FontMetadata {
                family: self.family.to_string(),
                subfamily: "Regular".to_string(),
                full_name: self.family.to_string(),
                postscript_name: self.family.to_string(),
                format: FontFormat::from_filename(self.url),
                version: Some(self.version.to_string()),
                ..Default::default()
            },
            tags: BTreeSet::from([TAG_GOOGLE.to_string(), self.category.to_string()]),
            content_hash: REMOTE_NO_HASH.to_string(),
        }
    }
}

pub struct GoogleFontsProvider {
    registrar: FontRegistrar,
    families: &'static [RemoteFamily],
}

impl GoogleFontsProvider {
    pub fn new(registrar: FontRegistrar) -> Self {
        Self {
            registrar,
            families: BUILTIN_FAMILIES,
        }
    }

    /// Records for every family, each registered against its remote URL
    pub fn fetch(&self) -> Vec<FontRecord> {
        self.families
            .iter()
            .map(|family| {
                let record = family.to_record();
                self.registrar.register(
                    &record.metadata.full_name,
                    RenderSource {
                        url: record.render_url.clone(),
                        bytes: None,
                    },
                );
                record
            })
            .collect()
    }

    /// Fetch and merge into the catalog by id
    pub fn load_into(&self, catalog: &mut Catalog) -> MergeOutcome {
        let outcome = catalog.merge_by_id(self.fetch());
        info!("Added {} Google font(s)", outcome.added);
        outcome
    }
}
