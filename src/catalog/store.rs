//! The catalog owner
//!
//! Every state transition builds a new [`CatalogSnapshot`] with the visible
//! set already recomputed, swaps it in, and then tells the registered
//! hooks. Readers holding an older snapshot keep a consistent view.

use crate::catalog::collection::Collection;
use crate::catalog::filter::{filter_fonts, Provider};
use crate::catalog::settings::UserSettings;
use crate::font::metadata::FontRecord;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// One consistent view of the catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub fonts: Vec<FontRecord>,
    /// Derived from the five inputs below and `fonts`
    pub visible: Vec<FontRecord>,
    pub search_term: String,
    pub provider: Provider,
    pub favorites: BTreeSet<String>,
    pub collections: Vec<Collection>,
    pub settings: UserSettings,
}

impl CatalogSnapshot {
    pub fn font(&self, id: &str) -> Option<&FontRecord> {
        self.fonts.iter().find(|f| f.id == id)
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    fn refilter(&mut self) {
        self.visible = filter_fonts(
            &self.fonts,
            &self.search_term,
            &self.provider,
            &self.favorites,
            &self.collections,
        );
    }
}

/// What a transition changed
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    FontsChanged,
    FavoritesChanged,
    CollectionsChanged,
    SettingChanged { key: String, value: Value },
    /// Search term or provider; nothing worth persisting
    ViewChanged,
}

/// Called synchronously after every confirmed transition
pub type CatalogHook = Box<dyn Fn(&CatalogEvent, &CatalogSnapshot) + Send + Sync>;

/// Outcome of merging fonts into the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub duplicates: usize,
}

#[derive(Default)]
pub struct Catalog {
    snapshot: Arc<CatalogSnapshot>,
    hooks: Vec<CatalogHook>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn add_hook(&mut self, hook: CatalogHook) {
        self.hooks.push(hook);
    }

    fn commit(&mut self, mut next: CatalogSnapshot, event: CatalogEvent) {
        next.refilter();
        self.snapshot = Arc::new(next);
        for hook in &self.hooks {
            hook(&event, &self.snapshot);
        }
    }

    fn draft(&self) -> CatalogSnapshot {
        (*self.snapshot).clone()
    }

    /// Append fonts whose content hash is not in the catalog yet.
    ///
    /// Duplicates are dropped silently, including duplicates within
    /// `fonts` itself. Records without a real hash are always kept.
    pub fn add_fonts(&mut self, fonts: Vec<FontRecord>) -> MergeOutcome {
        let mut seen: HashSet<String> = self
            .snapshot
            .fonts
            .iter()
            .filter_map(|f| f.dedup_key().map(str::to_string))
            .collect();
        self.merge(fonts, |font| match font.dedup_key() {
            Some(hash) => seen.insert(hash.to_string()),
            None => true,
        })
    }

    /// Append fonts whose id is not in the catalog yet. Used when reviving
    /// persisted records; the hash rule still holds.
    pub fn merge_by_id(&mut self, fonts: Vec<FontRecord>) -> MergeOutcome {
        let mut ids: HashSet<String> = self.snapshot.fonts.iter().map(|f| f.id.clone()).collect();
        let mut hashes: HashSet<String> = self
            .snapshot
            .fonts
            .iter()
            .filter_map(|f| f.dedup_key().map(str::to_string))
            .collect();
        self.merge(fonts, |font| {
            if ids.contains(&font.id) {
                return false;
            }
            if let Some(hash) = font.dedup_key() {
                if !hashes.insert(hash.to_string()) {
                    return false;
                }
            }
            ids.insert(font.id.clone());
            true
        })
    }

    fn merge(
        &mut self,
        fonts: Vec<FontRecord>,
        mut accept: impl FnMut(&FontRecord) -> bool,
    ) -> MergeOutcome {
        let total = fonts.len();
        let unique: Vec<FontRecord> = fonts.into_iter().filter(|f| accept(f)).collect();
        let outcome = MergeOutcome {
            added: unique.len(),
            duplicates: total - unique.len(),
        };
        if outcome.duplicates > 0 {
            debug!("Discarded {} duplicate font(s)", outcome.duplicates);
        }
        if unique.is_empty() {
            return outcome;
        }
        let mut next = self.draft();
        next.fonts.extend(unique);
        self.commit(next, CatalogEvent::FontsChanged);
        outcome
    }

    pub fn set_search_term(&mut self, term: &str) {
        let mut next = self.draft();
        next.search_term = term.to_string();
        self.commit(next, CatalogEvent::ViewChanged);
    }

    pub fn set_active_provider(&mut self, provider: Provider) {
        let mut next = self.draft();
        next.provider = provider;
        self.commit(next, CatalogEvent::ViewChanged);
    }

    /// Returns whether the font is a favorite afterwards
    pub fn toggle_favorite(&mut self, font_id: &str) -> bool {
        let mut next = self.draft();
        let now_favorite = if next.favorites.remove(font_id) {
            false
        } else {
            next.favorites.insert(font_id.to_string());
            true
        };
        self.commit(next, CatalogEvent::FavoritesChanged);
        now_favorite
    }

    /// Returns the new collection's id
    pub fn create_collection(&mut self, name: &str) -> String {
        let collection = Collection::new(name);
        let id = collection.id.clone();
        let mut next = self.draft();
        next.collections.push(collection);
        self.commit(next, CatalogEvent::CollectionsChanged);
        id
    }

    /// Member fonts are left alone. Returns false for an unknown id.
    pub fn delete_collection(&mut self, collection_id: &str) -> bool {
        if self.snapshot.collection(collection_id).is_none() {
            return false;
        }
        let mut next = self.draft();
        next.collections.retain(|c| c.id != collection_id);
        self.commit(next, CatalogEvent::CollectionsChanged);
        true
    }

    /// Returns false for an unknown collection id
    pub fn add_to_collection(&mut self, collection_id: &str, font_id: &str) -> bool {
        let mut next = self.draft();
        let Some(collection) = next.collections.iter_mut().find(|c| c.id == collection_id) else {
            return false;
        };
        collection.insert(font_id);
        self.commit(next, CatalogEvent::CollectionsChanged);
        true
    }

    /// Change one user setting. Returns false if the key or value was rejected.
    pub fn set_setting(&mut self, key: &str, value: Value) -> bool {
        let mut next = self.draft();
        let Some(stored) = next.settings.apply(key, &value) else {
            return false;
        };
        self.commit(
            next,
            CatalogEvent::SettingChanged {
                key: key.to_string(),
                value: stored,
            },
        );
        true
    }

    /// Restore persisted user state in one transition. No hooks fire:
    /// this state came from storage.
    pub fn restore(
        &mut self,
        collections: Vec<Collection>,
        favorites: Option<BTreeSet<String>>,
        settings: &BTreeMap<String, Value>,
    ) {
        let mut next = self.draft();
        if !collections.is_empty() {
            next.collections = collections;
        }
        if let Some(favorites) = favorites {
            next.favorites = favorites;
        }
        next.settings.apply_map(settings);
        next.refilter();
        self.snapshot = Arc::new(next);
    }
}
