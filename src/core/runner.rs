//! Application runner logic
//!
//! Every invocation is one session: restore the stored catalog, run one
//! command against it, and let the persistence worker finish writing.

use crate::catalog::filter::Provider;
use crate::catalog::store::Catalog;
use crate::core::cli::{CliArgs, CollectionCommand, Command, ConsentCommand};
use crate::core::config_file::ConfigFile;
use crate::core::settings::IngestSettings;
use crate::font::extractor::MetadataExtractor;
use crate::font::file::{walk_files, DiskFile, FontFile};
use crate::font::metadata::{group_by_family, FontRecord};
use crate::font::registrar::{FontRegistrar, RenderRegistry};
use crate::ingest::notify::Notification;
use crate::ingest::pipeline::{IngestPipeline, IngestReport};
use crate::logging;
use crate::providers::{GoogleFontsProvider, SystemFontProvider};
use crate::storage::{load_from_persistence, Consent, FontStore, PersistenceWorker};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Create and run the application with the given CLI arguments.
/// Handles special CLI flags and delegates to the command runner.
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    if cli_args.new_config {
        ConfigFile::initialize_config_directory()
            .context("Failed to initialize config directory")?;
        if cli_args.command.is_none() {
            return Ok(());
        }
    }

    let config = ConfigFile::load();
    let _log_guard = logging::init(cli_args.get_log_to_file(config.as_ref()))?;

    let Some(command) = cli_args.command.clone() else {
        bail!("No command given");
    };
    let data_dir = cli_args.get_data_dir(config.as_ref());
    let settings = cli_args.get_ingest_settings(config.as_ref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let mut session = Session::open(data_dir, settings).await?;
        let result = session.execute(command).await;
        for notice in session.take_notifications() {
            eprintln!("[{:.0}s] {}", notice.duration.as_secs_f64(), notice.message);
        }
        session.close().await;
        print!("{}", result?);
        Ok::<(), anyhow::Error>(())
    })
}

/// One catalog, its store, and everything needed to feed it
pub struct Session {
    store: Arc<FontStore>,
    registry: Arc<RenderRegistry>,
    extractor: MetadataExtractor,
    settings: IngestSettings,
    catalog: Catalog,
    worker: PersistenceWorker,
    notices_tx: mpsc::UnboundedSender<Notification>,
    notices_rx: mpsc::UnboundedReceiver<Notification>,
}

impl Session {
    /// Restore whatever is stored under `data_dir` and start persisting
    /// changes back to it.
    pub async fn open(data_dir: PathBuf, settings: IngestSettings) -> Result<Self> {
        let store = Arc::new(FontStore::new(data_dir));
        let registry = Arc::new(RenderRegistry::new());
        let registrar = FontRegistrar::new(registry.clone());
        let extractor = MetadataExtractor::new(registrar.clone());

        let mut catalog = Catalog::new();
        let summary = load_from_persistence(&store, &registrar, &mut catalog)
            .await
            .with_context(|| format!("Failed to load catalog from {:?}", store.root()))?;
        debug!("Session restored: {:?}", summary);

        // Installed after the revive so restored state is not written back
        let worker = PersistenceWorker::spawn(Arc::clone(&store));
        catalog.add_hook(worker.hook());

        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        Ok(Self {
            store,
            registry,
            extractor,
            settings,
            catalog,
            worker,
            notices_tx,
            notices_rx,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &RenderRegistry {
        &self.registry
    }

    pub fn store(&self) -> &FontStore {
        &self.store
    }

    /// Notifications raised so far
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices_rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    /// Wait for pending writes
    pub async fn close(self) {
        self.worker.shutdown().await;
    }

    fn pipeline(&self) -> IngestPipeline {
        IngestPipeline::new(
            self.extractor.clone(),
            self.settings.clone(),
            Arc::new(self.notices_tx.clone()),
        )
    }

    /// Run one command, returning what it prints
    pub async fn execute(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Add { paths } => self.add(&paths).await,
            Command::List { provider, search } => {
                self.list(provider.as_deref(), search.as_deref().unwrap_or(""))
            }
            Command::Info { id } => self.info(&id),
            Command::Favorite { id } => {
                let id = self.resolve_font(&id)?;
                let now = self.catalog.toggle_favorite(&id);
                Ok(if now {
                    format!("Added {} to favorites\n", id)
                } else {
                    format!("Removed {} from favorites\n", id)
                })
            }
            Command::Collection { action } => self.collection(action),
            Command::System => {
                let provider = SystemFontProvider::new(
                    self.extractor.clone(),
                    self.settings.max_file_size,
                );
                let outcome = provider.load_into(&mut self.catalog).await?;
                Ok(format!("Added {} system font(s)\n", outcome.added))
            }
            Command::Google => {
                let provider = GoogleFontsProvider::new(self.extractor.registrar().clone());
                let outcome = provider.load_into(&mut self.catalog);
                Ok(format!("Added {} Google font(s)\n", outcome.added))
            }
            Command::Set { key, value } => self.set(&key, value),
            Command::Consent { action } => self.consent(action).await,
            Command::Clear => {
                self.store.clear_all().await?;
                Ok("Cleared stored fonts, collections, and settings\n".to_string())
            }
        }
    }

    async fn add(&mut self, paths: &[PathBuf]) -> Result<String> {
        let mut dropped: Vec<Arc<dyn FontFile>> = Vec::new();
        let mut picked: Vec<Arc<dyn FontFile>> = Vec::new();
        for path in paths {
            if path.is_dir() {
                let found = walk_files(path)
                    .with_context(|| format!("Failed to read directory {}", path.display()))?;
                dropped.extend(found.iter().filter_map(|p| open_file(p)));
            } else if let Some(file) = open_file(path) {
                picked.push(file);
            }
        }

        let pipeline = self.pipeline();
        let mut reports = Vec::new();
        if !dropped.is_empty() {
            reports.push(pipeline.ingest_dropped(dropped, &mut self.catalog).await);
        }
        if !picked.is_empty() {
            reports.push(pipeline.ingest_picked(picked, &mut self.catalog).await);
        }

        let mut out = String::new();
        for report in &reports {
            write_report(&mut out, report);
        }
        if self.store.consent().await != Consent::Granted {
            out.push_str("Storage consent not granted; these fonts are not remembered.\n");
            out.push_str("Run `fontshelf consent grant` to keep them.\n");
        }
        Ok(out)
    }

    fn list(&mut self, provider: Option<&str>, search: &str) -> Result<String> {
        if let Some(selector) = provider {
            let provider = match Provider::parse(selector) {
                Provider::Collection(name) => {
                    Provider::Collection(self.resolve_collection(&name).unwrap_or(name))
                }
                other => other,
            };
            self.catalog.set_active_provider(provider);
        }
        self.catalog.set_search_term(search);

        let snapshot = self.catalog.snapshot();
        let mut out = String::new();
        if snapshot.visible.is_empty() {
            out.push_str("No fonts\n");
            return Ok(out);
        }
        for (family, fonts) in group_by_family(&snapshot.visible) {
            let _ = writeln!(out, "{}", family);
            for font in fonts {
                let mark = if snapshot.is_favorite(&font.id) { "*" } else { " " };
                let _ = writeln!(
                    out,
                    " {} {:<20} {:<7} {}",
                    mark, font.metadata.subfamily, font.metadata.format, font.id
                );
            }
        }
        Ok(out)
    }

    fn info(&self, query: &str) -> Result<String> {
        let id = self.resolve_font(query)?;
        let snapshot = self.catalog.snapshot();
        let Some(font) = snapshot.font(&id) else {
            bail!("No font with id {}", id);
        };
        Ok(describe(font, snapshot.is_favorite(&id)))
    }

    fn collection(&mut self, action: CollectionCommand) -> Result<String> {
        match action {
            CollectionCommand::Create { name } => {
                let id = self.catalog.create_collection(&name);
                Ok(format!("Created collection {} ({})\n", name, id))
            }
            CollectionCommand::Delete { id } => {
                let Some(id) = self.resolve_collection(&id) else {
                    bail!("No collection named {}", id);
                };
                self.catalog.delete_collection(&id);
                Ok(format!("Deleted collection {}\n", id))
            }
            CollectionCommand::Add { collection, font } => {
                let Some(collection) = self.resolve_collection(&collection) else {
                    bail!("No collection named {}", collection);
                };
                let font = self.resolve_font(&font)?;
                self.catalog.add_to_collection(&collection, &font);
                Ok(format!("Added {} to {}\n", font, collection))
            }
            CollectionCommand::List => {
                let snapshot = self.catalog.snapshot();
                let mut out = String::new();
                for collection in &snapshot.collections {
                    let _ = writeln!(
                        out,
                        "{:<24} {} font(s)  {}",
                        collection.name,
                        collection.len(),
                        collection.id
                    );
                }
                if out.is_empty() {
                    out.push_str("No collections\n");
                }
                Ok(out)
            }
        }
    }

    fn set(&mut self, key: &str, value: Option<String>) -> Result<String> {
        let Some(raw) = value else {
            let settings = serde_json::to_value(&self.catalog.snapshot().settings)?;
            return match settings.get(key) {
                Some(current) => Ok(format!("{} = {}\n", key, current)),
                None => bail!("Unknown setting {}", key),
            };
        };
        let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
        if !self.catalog.set_setting(key, value.clone()) {
            bail!("Cannot set {} to {}", key, value);
        }
        let settings = serde_json::to_value(&self.catalog.snapshot().settings)?;
        Ok(format!("{} = {}\n", key, settings.get(key).unwrap_or(&value)))
    }

    async fn consent(&mut self, action: ConsentCommand) -> Result<String> {
        match action {
            ConsentCommand::Grant => {
                self.store.set_consent(Consent::Granted).await?;
                // Write out what this session already holds
                let snapshot = self.catalog.snapshot();
                self.store.save_all(&snapshot.fonts).await?;
                self.store.save_collections(&snapshot.collections).await?;
                Ok("Storage consent granted\n".to_string())
            }
            ConsentCommand::Deny => {
                self.store.set_consent(Consent::Denied).await?;
                Ok("Storage consent denied; stored data removed\n".to_string())
            }
            ConsentCommand::Status => Ok(format!(
                "Storage consent: {} ({})\n",
                self.store.consent().await.as_str(),
                self.store.root().display()
            )),
        }
    }

    /// An exact id, or a prefix matching exactly one font
    pub fn resolve_font(&self, query: &str) -> Result<String> {
        let snapshot = self.catalog.snapshot();
        if snapshot.font(query).is_some() {
            return Ok(query.to_string());
        }
        let matches: Vec<&FontRecord> = snapshot
            .fonts
            .iter()
            .filter(|f| f.id.starts_with(query))
            .collect();
        match matches.as_slice() {
            [font] => Ok(font.id.clone()),
            [] => bail!("No font with id {}", query),
            _ => bail!("{} fonts match {}; give more of the id", matches.len(), query),
        }
    }

    /// A collection id, or the id of the collection with that name
    fn resolve_collection(&self, query: &str) -> Option<String> {
        let snapshot = self.catalog.snapshot();
        snapshot
            .collections
            .iter()
            .find(|c| c.id == query)
            .or_else(|| snapshot.collections.iter().find(|c| c.name == query))
            .map(|c| c.id.clone())
    }
}

fn open_file(path: &Path) -> Option<Arc<dyn FontFile>> {
    match DiskFile::open(path) {
        Ok(file) => Some(Arc::new(file)),
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}

fn write_report(out: &mut String, report: &IngestReport) {
    let _ = write!(out, "Added {} font(s)", report.added.len());
    if report.duplicates > 0 {
        let _ = write!(out, ", {} already in the catalog", report.duplicates);
    }
    out.push('\n');
    for id in &report.added {
        let _ = writeln!(out, "  {}", id);
    }
    if !report.errors.is_empty() {
        let _ = writeln!(out, "{} file(s) could not be read; see the log", report.errors.len());
    }
    if report.cancelled {
        out.push_str("Cancelled before every file was read\n");
    }
}

fn describe(font: &FontRecord, favorite: bool) -> String {
    let meta = &font.metadata;
    let mut out = String::new();
    let _ = writeln!(out, "{}", meta.full_name);
    let _ = writeln!(out, "  id:          {}", font.id);
    let _ = writeln!(out, "  family:      {}", meta.family);
    let _ = writeln!(out, "  style:       {}", meta.subfamily);
    let _ = writeln!(out, "  postscript:  {}", meta.postscript_name);
    let _ = writeln!(out, "  format:      {}", meta.format);
    let _ = writeln!(out, "  glyphs:      {}", meta.glyph_count);
    let optional = [
        ("version", &meta.version),
        ("designer", &meta.author),
        ("copyright", &meta.copyright),
        ("license", &meta.license),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            let _ = writeln!(out, "  {:<12} {}", format!("{}:", label), value);
        }
    }
    if !font.tags.is_empty() {
        let tags: Vec<&str> = font.tags.iter().map(String::as_str).collect();
        let _ = writeln!(out, "  tags:        {}", tags.join(", "));
    }
    if !font.content_hash.is_empty() {
        let _ = writeln!(out, "  sha256:      {}", font.content_hash);
    }
    if favorite {
        let _ = writeln!(out, "  favorite");
    }
    let preview: String = meta
        .preview_chars()
        .into_iter()
        .filter_map(char::from_u32)
        .filter(|c| !c.is_whitespace())
        .take(64)
        .collect();
    let _ = writeln!(out, "  preview:     {}", preview);
    out
}
