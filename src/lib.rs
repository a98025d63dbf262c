//! fontshelf
pub mod catalog;
pub mod core;
pub mod font;
pub mod ingest;
pub mod logging;
pub mod providers;
pub mod storage;
#[cfg(test)]
mod tests;
