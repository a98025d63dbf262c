//! Core application functionality
//!
//! This module contains the core application logic, including:
//! - CLI parsing and the user config file
//! - Ingestion limits
//! - Error types
//! - The command runner

pub mod cli;
pub mod config_file;
pub mod errors;
pub mod platform;
pub mod runner;
pub mod settings;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config_file::ConfigFile;
pub use runner::{run_app, Session};
pub use settings::IngestSettings;
