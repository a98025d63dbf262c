//! Font registration with the render environment
//!
//! Registration happens in two steps. The face is added to the environment
//! right away so previews can refer to it by name, then decoded in the
//! background. A decode failure is logged and nothing else: the face stays
//! registered.

use crate::font::woff;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Where a registered face gets its data from
#[derive(Debug, Clone)]
pub struct RenderSource {
    pub url: String,
    pub bytes: Option<Arc<[u8]>>,
}

/// Something that can draw text in a registered font
pub trait RenderEnvironment: Send + Sync {
    /// Make `name` resolvable immediately
    fn add_face(&self, name: &str, source: &RenderSource);

    /// Decode the face data. May be slow.
    fn load_face(&self, name: &str, source: &RenderSource) -> anyhow::Result<()>;
}

/// Registers parsed fonts with a [`RenderEnvironment`]
#[derive(Clone)]
pub struct FontRegistrar {
    environment: Arc<dyn RenderEnvironment>,
}

impl FontRegistrar {
    pub fn new(environment: Arc<dyn RenderEnvironment>) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &Arc<dyn RenderEnvironment> {
        &self.environment
    }

    /// Register `name`, returning as soon as the face is resolvable.
    ///
    /// Decoding runs on the blocking pool when called inside a tokio
    /// runtime, and inline otherwise.
    pub fn register(&self, name: &str, source: RenderSource) {
        self.environment.add_face(name, &source);
        debug!("Registered face '{}' at {}", name, source.url);

        let environment = Arc::clone(&self.environment);
        let name = name.to_string();
        let load = move || {
            if let Err(e) = environment.load_face(&name, &source) {
                warn!("Failed to load font {}: {:#}", name, e);
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(load);
            }
            Err(_) => load(),
        }
    }
}

/// Load state of a face in the [`RenderRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceState {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RegisteredFace {
    pub url: String,
    pub state: FaceState,
}

/// In-memory render environment.
///
/// A face decodes if its payload parses as an sfnt font. Remote faces
/// without a local payload stay pending until something fetches them.
#[derive(Debug, Default)]
pub struct RenderRegistry {
    faces: RwLock<HashMap<String, RegisteredFace>>,
}

impl RenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<RegisteredFace> {
        self.faces.read().ok()?.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.faces.read().map(|faces| faces.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_state(&self, name: &str, state: FaceState) {
        if let Ok(mut faces) = self.faces.write() {
            if let Some(face) = faces.get_mut(name) {
                face.state = state;
            }
        }
    }
}

impl RenderEnvironment for RenderRegistry {
    fn add_face(&self, name: &str, source: &RenderSource) {
        if let Ok(mut faces) = self.faces.write() {
            faces.insert(
                name.to_string(),
                RegisteredFace {
                    url: source.url.clone(),
                    state: FaceState::Pending,
                },
            );
        }
    }

    fn load_face(&self, name: &str, source: &RenderSource) -> anyhow::Result<()> {
        let Some(bytes) = &source.bytes else {
            return Ok(());
        };
        match decode_face(bytes) {
            Ok(()) => {
                self.set_state(name, FaceState::Loaded);
                Ok(())
            }
            Err(e) => {
                self.set_state(name, FaceState::Failed);
                Err(e.context(format!("cannot decode {}", source.url)))
            }
        }
    }
}

fn decode_face(bytes: &[u8]) -> anyhow::Result<()> {
    if woff::is_woff(bytes) {
        let sfnt = woff::decode(bytes)?;
        ttf_parser::Face::parse(&sfnt, 0)?;
    } else {
        ttf_parser::Face::parse(bytes, 0)?;
    }
    Ok(())
}
