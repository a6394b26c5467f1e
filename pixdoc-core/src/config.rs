//! # Configuration
//!
//! Two layers:
//!
//! - [`Settings`]: a plain string key/value store, filled by hand or from the
//!   environment, with a cheap [`SettingsSnapshot`] for readers.
//! - [`EditorConfig`]: the typed surface the editor is built from.
//!
//! ```rust
//! use pixdoc_core::{EditorConfig, Settings};
//!
//! let mut settings = Settings::new();
//! settings.set("editor.collection", "cms");
//! settings.set("editor.document", "home");
//! settings.set("editor.allow_multiple", "true");
//!
//! let config = EditorConfig::from_settings(&settings.snapshot()).unwrap();
//! assert_eq!(config.field, "images");
//! assert_eq!(config.temporary_collection_name(), "cms-editor-temp");
//! ```
//!
//! Environment variables map by stripping a prefix and turning `__` into `.`:
//! `PIXDOC__EDITOR__FIELD=heroImg` becomes `editor.field = heroImg`.

use std::collections::HashMap;
use std::time::Duration;

use crate::errors::{EditorError, EditorResult};
use crate::record::DEFAULT_FIELD;

/// Default window during which repeated save clicks are ignored.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

#[derive(Debug, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Settings loaded from every env var starting with `prefix`.
    pub fn from_env(prefix: &str) -> Self {
        let mut settings = Self::new();
        settings.load_env(prefix);
        settings
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Import `PREFIX` env vars (`PIXDOC__EDITOR__FIELD` → `editor.field`).
    /// Returns how many keys were set.
    pub fn load_env(&mut self, prefix: &str) -> usize {
        let mut loaded = 0;
        for (key, value) in std::env::vars() {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
                loaded += 1;
            }
        }
        loaded
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsSnapshot {
    map: HashMap<String, String>,
}

impl SettingsSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}

/// Typed editor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Collection of the owning document.
    pub collection: String,
    /// Id of the owning document.
    pub document: String,
    /// Property of the document the file records are written to.
    pub field: String,
    pub allow_multiple: bool,
    pub show_save_button: bool,
    /// Repeated save clicks inside this window are ignored.
    pub debounce: Duration,
}

impl EditorConfig {
    pub fn new<C, D>(collection: C, document: D) -> Self
    where
        C: Into<String>,
        D: Into<String>,
    {
        Self {
            collection: collection.into(),
            document: document.into(),
            field: DEFAULT_FIELD.to_string(),
            allow_multiple: false,
            show_save_button: true,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_allow_multiple(mut self, allow: bool) -> Self {
        self.allow_multiple = allow;
        self
    }

    pub fn hide_save_button(mut self) -> Self {
        self.show_save_button = false;
        self
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Staging collection the file transfer uploads into before a save.
    pub fn temporary_collection_name(&self) -> String {
        format!("{}-editor-temp", self.collection)
    }

    /// Dotted path of one record inside the document (`images.abc123`).
    pub fn field_path(&self, name: &str) -> String {
        format!("{}.{}", self.field, name)
    }

    /// Build from `editor.*` keys. `editor.collection` and `editor.document`
    /// are required; present-but-unparsable values are rejected.
    pub fn from_settings(settings: &SettingsSnapshot) -> EditorResult<Self> {
        let collection = required(settings, "editor.collection")?;
        let document = required(settings, "editor.document")?;
        let mut config = Self::new(collection, document);

        if let Some(field) = settings.get("editor.field").map(str::trim) {
            if field.is_empty() {
                return Err(EditorError::invalid_config("editor.field must not be empty"));
            }
            config.field = field.to_string();
        }
        if let Some(allow) = parse_flag(settings, "editor.allow_multiple")? {
            config.allow_multiple = allow;
        }
        if let Some(show) = parse_flag(settings, "editor.show_save_button")? {
            config.show_save_button = show;
        }
        if settings.get("editor.debounce_ms").is_some() {
            let ms = settings.get_u64("editor.debounce_ms").ok_or_else(|| {
                EditorError::invalid_config("editor.debounce_ms must be a whole number of milliseconds")
            })?;
            config.debounce = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn required(settings: &SettingsSnapshot, key: &str) -> EditorResult<String> {
    match settings.get(key).map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(EditorError::invalid_config(format!("{key} is required"))),
    }
}

fn parse_flag(settings: &SettingsSnapshot, key: &str) -> EditorResult<Option<bool>> {
    if settings.get(key).is_none() {
        return Ok(None);
    }
    settings
        .get_bool(key)
        .map(Some)
        .ok_or_else(|| EditorError::invalid_config(format!("{key} must be true or false")))
}
