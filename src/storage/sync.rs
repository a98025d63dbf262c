//! Background persistence of catalog changes
//!
//! A catalog hook turns each confirmed transition into a command on an
//! unbounded channel. One worker task applies the commands to the store in
//! order, so persistence never blocks a transition and writes never race.

use crate::catalog::collection::Collection;
use crate::catalog::store::{CatalogEvent, CatalogHook, CatalogSnapshot};
use crate::font::metadata::FontRecord;
use crate::storage::FontStore;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

#[derive(Debug)]
enum PersistCommand {
    SaveFonts(Vec<FontRecord>),
    SaveCollections(Vec<Collection>),
    SaveFavorites(BTreeSet<String>),
    SaveSetting(String, Value),
    Shutdown,
}

impl PersistCommand {
    fn from_event(event: &CatalogEvent, snapshot: &CatalogSnapshot) -> Option<Self> {
        match event {
            CatalogEvent::FontsChanged => Some(Self::SaveFonts(snapshot.fonts.clone())),
            CatalogEvent::CollectionsChanged => {
                Some(Self::SaveCollections(snapshot.collections.clone()))
            }
            CatalogEvent::FavoritesChanged => Some(Self::SaveFavorites(snapshot.favorites.clone())),
            CatalogEvent::SettingChanged { key, value } => {
                Some(Self::SaveSetting(key.clone(), value.clone()))
            }
            CatalogEvent::ViewChanged => None,
        }
    }
}

/// Owns the persistence task
pub struct PersistenceWorker {
    tx: mpsc::UnboundedSender<PersistCommand>,
    handle: JoinHandle<()>,
}

impl PersistenceWorker {
    /// Start the worker on the current runtime
    pub fn spawn(store: Arc<FontStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                if matches!(command, PersistCommand::Shutdown) {
                    break;
                }
                apply(&store, command).await;
            }
            debug!("Persistence worker stopped");
        });
        Self { tx, handle }
    }

    /// A hook to install on the catalog
    pub fn hook(&self) -> CatalogHook {
        let tx = self.tx.clone();
        Box::new(move |event, snapshot| {
            if let Some(command) = PersistCommand::from_event(event, snapshot) {
                if tx.send(command).is_err() {
                    error!("Persistence worker is gone, dropping {:?}", event);
                }
            }
        })
    }

    /// Finish every queued write, then stop
    pub async fn shutdown(self) {
        let _ = self.tx.send(PersistCommand::Shutdown);
        if let Err(e) = self.handle.await {
            error!("Persistence worker failed: {}", e);
        }
    }
}

async fn apply(store: &FontStore, command: PersistCommand) {
    let result = match command {
        PersistCommand::SaveFonts(fonts) => store.save_all(&fonts).await,
        PersistCommand::SaveCollections(collections) => {
            store.save_collections(&collections).await
        }
        PersistCommand::SaveFavorites(favorites) => store.save_favorites(&favorites).await,
        PersistCommand::SaveSetting(key, value) => store.save_setting(&key, value).await,
        PersistCommand::Shutdown => Ok(()),
    };
    if let Err(e) = result {
        error!("Failed to persist catalog change: {}", e);
    }
}
