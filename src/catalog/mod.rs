//! The in-memory font catalog
//!
//! Holds every known font plus the query state (search term, provider,
//! favorites, collections) and derives the visible set from it.

pub mod collection;
pub mod filter;
pub mod settings;
pub mod store;

pub use collection::Collection;
pub use filter::{filter_fonts, Provider};
pub use settings::UserSettings;
pub use store::{Catalog, CatalogEvent, CatalogHook, CatalogSnapshot, MergeOutcome};
