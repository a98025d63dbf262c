//! Command line interface for fontshelf
//!
//! Handles parsing command line arguments and provides
//! validation for user inputs.

use crate::core::config_file::ConfigFile;
use crate::core::settings::IngestSettings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// fontshelf CLI arguments
///
/// Examples:
///   fontshelf consent grant                 # Allow fontshelf to remember fonts
///   fontshelf add ~/Downloads/Inter.ttf     # Add one font
///   fontshelf add ~/Downloads/fonts         # Add every font in a directory
///   fontshelf list --search sans            # Fonts whose family matches "sans"
///   fontshelf list --provider favorites     # Only favorites
///   fontshelf collection create Headings    # Make a collection
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "fontshelf",
    version,
    about = "A font manager for the terminal",
    long_about = "fontshelf keeps a catalog of font files, system fonts, and Google Fonts entries. Fonts are deduplicated by content, organized into favorites and collections, and remembered between runs once storage consent is granted."
)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Option<Command>,

    /// Directory holding the stored catalog
    #[clap(
        long = "data-dir",
        global = true,
        help = "Directory holding the stored catalog",
        long_help = "Directory holding fonts.json, collections.json, userdata.json, and font payloads. Overrides data_dir from settings.json."
    )]
    pub data_dir: Option<PathBuf>,

    /// Write logs to ~/.config/fontshelf/logs instead of stderr
    #[clap(long = "log-file", global = true, help = "Write logs to the logs directory")]
    pub log_file: bool,

    /// Per-file size limit in MiB
    #[clap(
        long = "max-file-size",
        global = true,
        help = "Per-file size limit in MiB (default 20)"
    )]
    pub max_file_size_mib: Option<u64>,

    /// Files parsed concurrently per batch
    #[clap(long = "batch-size", global = true, help = "Files parsed per batch (default 10)")]
    pub batch_size: Option<usize>,

    /// Initialize user configuration directory with settings
    ///
    /// This creates the ~/.config/fontshelf directory with:
    /// - settings.json: data directory, size limit, batch size, log target
    /// - logs/: where --log-file output goes
    #[clap(
        long = "new-config",
        help = "Initialize user config directory with settings",
        long_help = "Initialize the ~/.config/fontshelf directory with a settings.json file and a logs directory."
    )]
    pub new_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add font files. Directories are searched for font files.
    Add {
        #[clap(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show the catalog grouped by family
    List {
        /// all, local, google, added, favorites, or a collection id
        #[clap(long, short)]
        provider: Option<String>,
        /// Case-insensitive match on family and style
        #[clap(long, short)]
        search: Option<String>,
    },
    /// Show everything known about one font
    Info { id: String },
    /// Toggle a font's favorite mark
    Favorite { id: String },
    /// Manage collections
    Collection {
        #[clap(subcommand)]
        action: CollectionCommand,
    },
    /// Add the fonts installed on this machine
    System,
    /// Add the built-in Google Fonts entries
    Google,
    /// Show or change a preview setting
    Set { key: String, value: Option<String> },
    /// Manage storage consent
    Consent {
        #[clap(subcommand)]
        action: ConsentCommand,
    },
    /// Delete everything stored
    Clear,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CollectionCommand {
    Create { name: String },
    Delete { id: String },
    Add { collection: String, font: String },
    List,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentCommand {
    Grant,
    Deny,
    Status,
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    ///
    /// This ensures that all paths exist before anything is read,
    /// providing clear error messages for common mistakes.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Command::Add { paths }) = &self.command {
            for path in paths {
                if !path.exists() {
                    return Err(format!(
                        "Path does not exist: {}\nMake sure the path is correct and the file exists.",
                        path.display()
                    ));
                }
            }
        }
        if self.batch_size == Some(0) {
            return Err("Batch size must be at least 1".to_string());
        }
        if self.max_file_size_mib == Some(0) {
            return Err("Maximum file size must be at least 1 MiB".to_string());
        }
        if self.command.is_none() && !self.new_config {
            return Err("No command given".to_string());
        }
        Ok(())
    }

    /// Get the data directory from CLI args, config file, or default
    ///
    /// Priority order:
    /// 1. CLI argument (--data-dir)
    /// 2. Config file setting (~/.config/fontshelf/settings.json)
    /// 3. Built-in default (platform data directory)
    pub fn get_data_dir(&self, config: Option<&ConfigFile>) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            debug!("Using data directory from CLI: {:?}", dir);
            return dir.clone();
        }
        if let Some(dir) = config.and_then(|c| c.data_dir.clone()) {
            debug!("Using data directory from config file: {:?}", dir);
            return dir;
        }
        crate::storage::FontStore::default_dir()
    }

    /// Ingestion limits from CLI args, config file, and defaults
    pub fn get_ingest_settings(&self, config: Option<&ConfigFile>) -> IngestSettings {
        let mut settings = config.map(ConfigFile::ingest_settings).unwrap_or_default();
        if let Some(mib) = self.max_file_size_mib {
            settings.set_max_file_size_mib(mib);
        }
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }
        settings
    }

    /// Whether logs go to a file
    pub fn get_log_to_file(&self, config: Option<&ConfigFile>) -> bool {
        self.log_file || config.and_then(|c| c.log_to_file).unwrap_or(false)
    }
}
