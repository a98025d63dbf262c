//! Visible-set derivation
//!
//! The catalog view is narrowed first by provider, then by search term.

use crate::catalog::collection::Collection;
use crate::font::metadata::{FontRecord, TAG_GOOGLE, TAG_LOCAL};
use std::collections::BTreeSet;
use std::fmt;

/// Top-level filter dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    #[default]
    All,
    Local,
    Google,
    /// Fonts the user ingested: neither local nor google
    Added,
    Favorites,
    /// Any other selector names a collection
    Collection(String),
}

impl Provider {
    pub fn parse(selector: &str) -> Self {
        match selector {
            "all" => Provider::All,
            "local" => Provider::Local,
            "google" => Provider::Google,
            "added" => Provider::Added,
            "favorites" => Provider::Favorites,
            other => Provider::Collection(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Provider::All => "all",
            Provider::Local => "local",
            Provider::Google => "google",
            Provider::Added => "added",
            Provider::Favorites => "favorites",
            Provider::Collection(id) => id,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the visible subset of `fonts`.
///
/// An unknown collection id yields nothing. The search term matches family
/// or subfamily as a case-insensitive substring; an empty term matches all.
pub fn filter_fonts(
    fonts: &[FontRecord],
    search_term: &str,
    provider: &Provider,
    favorites: &BTreeSet<String>,
    collections: &[Collection],
) -> Vec<FontRecord> {
    let collection = match provider {
        Provider::Collection(id) => match collections.iter().find(|c| &c.id == id) {
            Some(collection) => Some(collection),
            None => return Vec::new(),
        },
        _ => None,
    };

    let term = search_term.to_lowercase();
    fonts
        .iter()
        .filter(|font| match provider {
            Provider::All => true,
            Provider::Local => font.has_tag(TAG_LOCAL),
            Provider::Google => font.has_tag(TAG_GOOGLE),
            Provider::Added => font.is_user_added(),
            Provider::Favorites => favorites.contains(&font.id),
            Provider::Collection(_) => collection.is_some_and(|c| c.contains(&font.id)),
        })
        .filter(|font| {
            term.is_empty()
                || font.metadata.family.to_lowercase().contains(&term)
                || font.metadata.subfamily.to_lowercase().contains(&term)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::metadata::FontMetadata;

    fn font(id: &str, family: &str, subfamily: &str, tags: &[&str]) -> FontRecord {
        FontRecord {
            id: id.to_string(),
            resource: None,
            render_url: String::new(),
            metadata: FontMetadata {
                family: family.to_string(),
                subfamily: subfamily.to_string(),
                ..Default::default()
            },
            tags: tags.iter().map(|t| t.to_string()).collect(),
            content_hash: String::new(),
        }
    }

    fn catalog() -> Vec<FontRecord> {
        vec![
            font("a", "Sans", "Regular", &["local"]),
            font("b", "Serif", "Italic", &[]),
            font("c", "Sans Bold", "Bold", &["google", "sans-serif"]),
        ]
    }

    fn ids(fonts: &[FontRecord]) -> Vec<&str> {
        fonts.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_provider_round_trip() {
        for selector in ["all", "local", "google", "added", "favorites", "c0ffee"] {
            assert_eq!(Provider::parse(selector).as_str(), selector);
        }
        assert_eq!(
            Provider::parse("c0ffee"),
            Provider::Collection("c0ffee".to_string())
        );
    }

    #[test]
    fn test_favorites_then_search_scenario() {
        let fonts = catalog();
        let favorites: BTreeSet<String> = ["b".to_string()].into();

        let visible = filter_fonts(&fonts, "", &Provider::Favorites, &favorites, &[]);
        assert_eq!(ids(&visible), vec!["b"]);

        let visible = filter_fonts(&fonts, "sans", &Provider::All, &favorites, &[]);
        assert_eq!(ids(&visible), vec!["a", "c"]);
    }

    #[test]
    fn test_provenance_providers() {
        let fonts = catalog();
        let none = BTreeSet::new();
        assert_eq!(
            ids(&filter_fonts(&fonts, "", &Provider::Local, &none, &[])),
            vec!["a"]
        );
        assert_eq!(
            ids(&filter_fonts(&fonts, "", &Provider::Google, &none, &[])),
            vec!["c"]
        );
        assert_eq!(
            ids(&filter_fonts(&fonts, "", &Provider::Added, &none, &[])),
            vec!["b"]
        );
        assert_eq!(
            ids(&filter_fonts(&fonts, "", &Provider::All, &none, &[])),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_collection_provider() {
        let fonts = catalog();
        let mut collection = Collection::new("Headlines");
        collection.insert("c");
        collection.insert("a");
        let collections = vec![collection.clone()];
        let none = BTreeSet::new();

        let provider = Provider::Collection(collection.id.clone());
        assert_eq!(
            ids(&filter_fonts(&fonts, "", &provider, &none, &collections)),
            vec!["a", "c"]
        );
        assert_eq!(
            ids(&filter_fonts(&fonts, "BOLD", &provider, &none, &collections)),
            vec!["c"]
        );

        let missing = Provider::Collection("missing".to_string());
        assert!(filter_fonts(&fonts, "", &missing, &none, &collections).is_empty());
    }

    #[test]
    fn test_search_matches_subfamily() {
        let fonts = catalog();
        let visible = filter_fonts(&fonts, "ITAL", &Provider::All, &BTreeSet::new(), &[]);
        assert_eq!(ids(&visible), vec!["b"]);
    }
}
