#![allow(clippy::assertions_on_constants)]

#[cfg(test)]
mod ingest_tests {
    use crate::catalog::{Catalog, Provider};
    use crate::core::settings::IngestSettings;
    use crate::font::testdata::TestFont;
    use crate::font::{FontFile, FontRegistrar, MemoryFile, MetadataExtractor, RenderRegistry};
    use crate::ingest::IngestPipeline;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_oversized_file_is_reported_and_the_rest_loads() {
        let registry = Arc::new(RenderRegistry::new());
        let extractor = MetadataExtractor::new(FontRegistrar::new(registry.clone()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pipeline = IngestPipeline::new(extractor, IngestSettings::default(), Arc::new(tx));

        let files: Vec<Arc<dyn FontFile>> = vec![
            Arc::new(MemoryFile::new("big.ttf", vec![0u8; 25 * 1024 * 1024])),
            Arc::new(MemoryFile::new("ok.ttf", TestFont::new("Okay").build())),
        ];
        let mut catalog = Catalog::new();
        let report = pipeline.ingest_dropped(files, &mut catalog).await;

        assert_eq!(report.oversized, vec!["big.ttf"]);
        assert_eq!(report.added.len(), 1);
        let notice = rx.try_recv().expect("one oversized notice");
        assert_eq!(notice.message, "File too large (>20MB): big.ttf");
        assert!(rx.try_recv().is_err(), "no other notices");

        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.provider, Provider::Added);
        assert_eq!(snapshot.visible.len(), 1);
        assert_eq!(snapshot.visible[0].metadata.family, "Okay");
        assert!(registry.contains("Okay Regular"));
    }
}

#[cfg(test)]
mod filter_tests {
    use crate::catalog::{filter_fonts, Catalog, Provider};
    use crate::font::FontRecord;
    use std::collections::BTreeSet;

    fn font(id: &str, family: &str, tags: &[&str]) -> FontRecord {
        FontRecord {
            id: id.to_string(),
            resource: None,
            render_url: String::new(),
            metadata: crate::font::FontMetadata {
                family: family.to_string(),
                ..Default::default()
            },
            tags: tags.iter().map(|t| t.to_string()).collect(),
            content_hash: format!("{:064x}", id.as_bytes()[0]),
        }
    }

    #[test]
    fn test_favorites_and_search_compose() {
        let fonts = vec![
            font("a", "Sans", &["local"]),
            font("b", "Serif", &[]),
            font("c", "Sans Bold", &["google"]),
        ];
        let favorites: BTreeSet<String> = ["b".to_string()].into();

        let visible = filter_fonts(&fonts, "", &Provider::Favorites, &favorites, &[]);
        let ids: Vec<&str> = visible.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);

        let visible = filter_fonts(&fonts, "sans", &Provider::All, &favorites, &[]);
        let ids: Vec<&str> = visible.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_catalog_view_tracks_collection_membership() {
        let mut catalog = Catalog::new();
        catalog.add_fonts(vec![font("a", "Sans", &[]), font("b", "Serif", &[])]);
        let collection = catalog.create_collection("Picks");
        catalog.set_active_provider(Provider::Collection(collection.clone()));
        assert!(catalog.snapshot().visible.is_empty());

        catalog.add_to_collection(&collection, "b");
        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.visible.len(), 1, "membership change refilters");
        assert_eq!(snapshot.visible[0].id, "b");

        catalog.delete_collection(&collection);
        assert!(catalog.snapshot().visible.is_empty());
        assert_eq!(catalog.snapshot().fonts.len(), 2, "fonts outlive collections");
    }
}

#[cfg(test)]
mod session_tests {
    use crate::core::cli::{CollectionCommand, Command, ConsentCommand};
    use crate::core::settings::IngestSettings;
    use crate::core::Session;
    use crate::font::testdata::TestFont;
    use std::path::{Path, PathBuf};

    async fn open(data_dir: &Path) -> Session {
        Session::open(data_dir.to_path_buf(), IngestSettings::default())
            .await
            .unwrap()
    }

    fn add(paths: &[PathBuf]) -> Command {
        Command::Add {
            paths: paths.to_vec(),
        }
    }

    fn write_font(dir: &Path, name: &str, family: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, TestFont::new(family).build()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_same_file_across_sessions_is_stored_once() {
        let data = tempfile::tempdir().unwrap();
        let fonts = tempfile::tempdir().unwrap();
        let lora = write_font(fonts.path(), "Lora.ttf", "Lora");

        let mut session = open(data.path()).await;
        session
            .execute(Command::Consent {
                action: ConsentCommand::Grant,
            })
            .await
            .unwrap();
        let out = session.execute(add(&[lora.clone()])).await.unwrap();
        assert!(out.starts_with("Added 1 font(s)"), "got: {out}");
        session.close().await;

        let mut session = open(data.path()).await;
        assert_eq!(session.catalog().snapshot().fonts.len(), 1, "revived");
        assert!(session.registry().contains("Lora Regular"), "re-registered");

        let out = session.execute(add(&[lora])).await.unwrap();
        assert!(out.contains("1 already in the catalog"), "got: {out}");
        assert_eq!(session.catalog().snapshot().fonts.len(), 1);
        session.close().await;
    }

    #[tokio::test]
    async fn test_directories_only_pick_up_font_files() {
        let data = tempfile::tempdir().unwrap();
        let fonts = tempfile::tempdir().unwrap();
        write_font(fonts.path(), "A.ttf", "Alpha");
        write_font(fonts.path(), "B.otf", "Beta");
        std::fs::write(fonts.path().join("README.txt"), "not a font").unwrap();

        let mut session = open(data.path()).await;
        let out = session
            .execute(add(&[fonts.path().to_path_buf()]))
            .await
            .unwrap();
        assert!(out.starts_with("Added 2 font(s)"), "got: {out}");
        assert!(out.contains("consent not granted"));
        assert!(session.take_notifications().is_empty());

        let listing = session
            .execute(Command::List {
                provider: Some("added".to_string()),
                search: Some("alp".to_string()),
            })
            .await
            .unwrap();
        assert!(listing.starts_with("Alpha\n"), "got: {listing}");
        assert!(!listing.contains("Beta"));
        session.close().await;
    }

    #[tokio::test]
    async fn test_user_state_survives_restart() {
        let data = tempfile::tempdir().unwrap();
        let fonts = tempfile::tempdir().unwrap();
        let path = write_font(fonts.path(), "Inter.ttf", "Inter");

        let mut session = open(data.path()).await;
        session
            .execute(Command::Consent {
                action: ConsentCommand::Grant,
            })
            .await
            .unwrap();
        session.execute(add(&[path])).await.unwrap();
        let id = session.catalog().snapshot().fonts[0].id.clone();
        session
            .execute(Command::Favorite { id: "Inter".to_string() })
            .await
            .unwrap();
        session
            .execute(Command::Collection {
                action: CollectionCommand::Create {
                    name: "Body".to_string(),
                },
            })
            .await
            .unwrap();
        session
            .execute(Command::Collection {
                action: CollectionCommand::Add {
                    collection: "Body".to_string(),
                    font: id.clone(),
                },
            })
            .await
            .unwrap();
        session
            .execute(Command::Set {
                key: "preview_size".to_string(),
                value: Some("48".to_string()),
            })
            .await
            .unwrap();
        session.execute(Command::Google).await.unwrap();
        session.close().await;

        let mut session = open(data.path()).await;
        let snapshot = session.catalog().snapshot();
        assert_eq!(snapshot.fonts.len(), 3, "one file and two Google entries");
        assert!(snapshot.is_favorite(&id));
        assert!(snapshot.collections[0].contains(&id));
        assert_eq!(snapshot.settings.preview_size, 48);

        let listing = session
            .execute(Command::List {
                provider: Some("Body".to_string()),
                search: None,
            })
            .await
            .unwrap();
        assert!(listing.contains(&id), "collections resolve by name");
        session.close().await;
    }

    #[tokio::test]
    async fn test_denying_consent_forgets_everything() {
        let data = tempfile::tempdir().unwrap();
        let fonts = tempfile::tempdir().unwrap();
        let path = write_font(fonts.path(), "Gone.ttf", "Gone");

        let mut session = open(data.path()).await;
        session
            .execute(Command::Consent {
                action: ConsentCommand::Grant,
            })
            .await
            .unwrap();
        session.execute(add(&[path])).await.unwrap();
        session.close().await;

        let mut session = open(data.path()).await;
        session
            .execute(Command::Consent {
                action: ConsentCommand::Deny,
            })
            .await
            .unwrap();
        session.close().await;

        let session = open(data.path()).await;
        assert!(session.catalog().snapshot().fonts.is_empty());
        session.close().await;
    }

    #[tokio::test]
    async fn test_unknown_font_id_is_an_error() {
        let data = tempfile::tempdir().unwrap();
        let mut session = open(data.path()).await;
        let result = session
            .execute(Command::Info {
                id: "missing".to_string(),
            })
            .await;
        assert!(result.is_err());
        session.close().await;
    }
}
