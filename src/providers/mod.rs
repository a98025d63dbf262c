//! Font sources other than user files
//!
//! Both produce ordinary [`FontRecord`](crate::font::FontRecord)s tagged
//! with their provenance and merge them into the catalog by id.

pub mod google;
pub mod system;

pub use google::GoogleFontsProvider;
pub use system::SystemFontProvider;
