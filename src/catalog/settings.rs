//! User preferences that persist alongside the catalog

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

pub const DEFAULT_PREVIEW_TEXT: &str = "The quick brown fox jumps over the lazy dog";
pub const DEFAULT_PREVIEW_SIZE: u32 = 32;
pub const DEFAULT_ACCENT_COLOR: &str = "#00E676";

pub const KEY_PREVIEW_TEXT: &str = "preview_text";
pub const KEY_PREVIEW_SIZE: &str = "preview_size";
pub const KEY_ACCENT_COLOR: &str = "accent_color";
pub const KEY_LOCALE: &str = "locale";
pub const KEY_THEME: &str = "theme";
pub const KEY_SIDEBAR_COLLAPSED: &str = "sidebar_collapsed";
pub const KEY_FAVORITES: &str = "favorites";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub preview_text: String,
    pub preview_size: u32,
    pub accent_color: String,
    pub locale: Locale,
    pub theme: Theme,
    pub sidebar_collapsed: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            preview_text: DEFAULT_PREVIEW_TEXT.to_string(),
            preview_size: DEFAULT_PREVIEW_SIZE,
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            locale: Locale::default(),
            theme: Theme::default(),
            sidebar_collapsed: false,
        }
    }
}

/// `#RRGGBB`, or the default accent for anything else
pub fn validate_accent_color(color: &str) -> String {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        color.to_string()
    } else {
        DEFAULT_ACCENT_COLOR.to_string()
    }
}

impl UserSettings {
    /// Apply one stored key. Unknown keys and ill-typed values are skipped.
    /// Returns the value actually stored, which may differ after validation.
    pub fn apply(&mut self, key: &str, value: &Value) -> Option<Value> {
        match key {
            KEY_PREVIEW_TEXT => {
                self.preview_text = value.as_str()?.to_string();
                Some(Value::from(self.preview_text.clone()))
            }
            KEY_PREVIEW_SIZE => {
                self.preview_size = u32::try_from(value.as_u64()?).ok()?;
                Some(Value::from(self.preview_size))
            }
            KEY_ACCENT_COLOR => {
                self.accent_color = validate_accent_color(value.as_str()?);
                Some(Value::from(self.accent_color.clone()))
            }
            KEY_LOCALE => {
                self.locale = serde_json::from_value(value.clone()).ok()?;
                Some(value.clone())
            }
            KEY_THEME => {
                self.theme = serde_json::from_value(value.clone()).ok()?;
                Some(value.clone())
            }
            KEY_SIDEBAR_COLLAPSED => {
                self.sidebar_collapsed = value.as_bool()?;
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// Overlay every recognized key from a stored settings map
    pub fn apply_map(&mut self, map: &BTreeMap<String, Value>) {
        for (key, value) in map {
            if key == KEY_FAVORITES {
                continue;
            }
            if self.apply(key, value).is_none() {
                warn!("Ignoring stored setting {} = {}", key, value);
            }
        }
    }
}
