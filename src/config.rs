//! Persisted dock configuration
//!
//! Stored as pretty JSON. Loading never fails: a missing file yields the
//! defaults and a malformed one is reported and replaced by the defaults.
//! Fields this version does not know about are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::{defaults, validation};
use crate::error::{DockError, DockResult};
use crate::geometry::{Edge, WindowGeometry};

/// Option names accepted by [`ConfigUpdate::set_option`]
pub const OPTIONS: [&str; 5] = ["edge", "width", "height", "top_offset", "auto_save"];

/// User-facing dock parameters plus what is needed to restore the last session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarConfig {
    #[serde(default = "default_edge")]
    pub edge: Edge,

    /// Strip width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Strip height in pixels; unset fills the monitor below `top_offset`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(default = "default_top_offset")]
    pub top_offset: u32,

    /// Persist on every config change and dock transition
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,

    /// Where the window was last seen free-floating
    #[serde(rename = "window_geometry", default, skip_serializing_if = "Option::is_none")]
    pub last_free_geometry: Option<WindowGeometry>,

    /// Dock state at the time of the last save
    #[serde(rename = "is_embedded", default)]
    pub last_embedded: bool,

    /// Fields written by other versions, preserved on save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_edge() -> Edge {
    Edge::Left
}

fn default_width() -> u32 {
    defaults::WIDTH
}

fn default_top_offset() -> u32 {
    defaults::TOP_OFFSET
}

fn default_auto_save() -> bool {
    defaults::AUTO_SAVE
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            edge: default_edge(),
            width: default_width(),
            height: None,
            top_offset: default_top_offset(),
            auto_save: default_auto_save(),
            last_free_geometry: None,
            last_embedded: false,
            extra: Map::new(),
        }
    }
}

impl SidebarConfig {
    /// Apply a partial update. Nothing changes if any supplied value is invalid.
    pub fn apply(&mut self, update: &ConfigUpdate) -> DockResult<()> {
        update.validate()?;

        if let Some(edge) = update.edge {
            self.edge = edge;
        }
        if let Some(width) = update.width {
            self.width = width;
        }
        if let Some(height) = update.height {
            self.height = height;
        }
        if let Some(top_offset) = update.top_offset {
            self.top_offset = top_offset;
        }
        if let Some(auto_save) = update.auto_save {
            self.auto_save = auto_save;
        }
        Ok(())
    }

    /// Clamp values loaded from disk to safe ranges
    fn validate_and_clamp(&mut self) {
        use validation::*;

        if !self.edge.is_vertical() {
            warn!(edge = %self.edge, using = %default_edge(), "only left and right edges are supported, using default");
            self.edge = default_edge();
        }

        if self.width < MIN_DIMENSION {
            warn!(width = self.width, using = default_width(), "width below minimum, using default");
            self.width = default_width();
        } else if self.width > MAX_DIMENSION {
            warn!(width = self.width, max = MAX_DIMENSION, "width exceeds maximum, clamping");
            self.width = MAX_DIMENSION;
        }

        if let Some(height) = self.height {
            if height < MIN_DIMENSION {
                warn!(height = height, "height below minimum, filling monitor height instead");
                self.height = None;
            } else if height > MAX_DIMENSION {
                warn!(height = height, max = MAX_DIMENSION, "height exceeds maximum, clamping");
                self.height = Some(MAX_DIMENSION);
            }
        }

        if self.top_offset > MAX_TOP_OFFSET {
            warn!(top_offset = self.top_offset, max = MAX_TOP_OFFSET, "top_offset exceeds maximum, clamping");
            self.top_offset = MAX_TOP_OFFSET;
        }
    }
}

/// Partial config change. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub edge: Option<Edge>,
    pub width: Option<u32>,
    /// `Some(None)` switches back to full height
    pub height: Option<Option<u32>>,
    pub top_offset: Option<u32>,
    pub auto_save: Option<bool>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an update from `name=value` style pairs, rejecting the whole set
    /// on the first unknown name or bad value
    pub fn from_options<I, K, V>(options: I) -> DockResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut update = Self::new();
        for (name, value) in options {
            update.set_option(name.as_ref(), value.as_ref())?;
        }
        Ok(update)
    }

    /// Set one option by name from its textual value
    pub fn set_option(&mut self, name: &str, value: &str) -> DockResult<()> {
        let invalid = || DockError::InvalidValue {
            option: name.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();

        match name {
            "edge" => {
                let edge: Edge = value.parse().map_err(|_| invalid())?;
                self.edge = Some(edge);
            }
            "width" => self.width = Some(value.parse().map_err(|_| invalid())?),
            "height" => {
                self.height = Some(match value.to_ascii_lowercase().as_str() {
                    "full" | "none" | "" => None,
                    v => Some(v.parse().map_err(|_| invalid())?),
                });
            }
            "top_offset" => self.top_offset = Some(value.parse().map_err(|_| invalid())?),
            "auto_save" => self.auto_save = Some(parse_bool(value).ok_or_else(invalid)?),
            _ => return Err(DockError::InvalidOption(name.to_string())),
        }

        self.validate()
    }

    /// Range checks shared by the typed and the textual path
    pub fn validate(&self) -> DockResult<()> {
        use validation::*;

        if let Some(edge) = self.edge {
            if !edge.is_vertical() {
                return Err(DockError::InvalidValue {
                    option: "edge".to_string(),
                    value: edge.to_string(),
                });
            }
        }
        if let Some(width) = self.width {
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&width) {
                return Err(DockError::InvalidValue {
                    option: "width".to_string(),
                    value: width.to_string(),
                });
            }
        }
        if let Some(Some(height)) = self.height {
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&height) {
                return Err(DockError::InvalidValue {
                    option: "height".to_string(),
                    value: height.to_string(),
                });
            }
        }
        if let Some(top_offset) = self.top_offset {
            if top_offset > MAX_TOP_OFFSET {
                return Err(DockError::InvalidValue {
                    option: "top_offset".to_string(),
                    value: top_offset.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether applying this update changes where the strip lands
    pub fn moves_bar(&self) -> bool {
        self.edge.is_some() || self.width.is_some() || self.height.is_some() || self.top_offset.is_some()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads and writes a [`SidebarConfig`] at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_CONFIG_HOME/sidebar-dock/sidebar.json`, or the working directory
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> SidebarConfig {
        self.load_with_defaults(&SidebarConfig::default())
    }

    /// Load the on-disk record layered over `defaults`. The defaults go
    /// through the same clamping as the file.
    pub fn load_with_defaults(&self, defaults: &SidebarConfig) -> SidebarConfig {
        let mut defaults = defaults.clone();
        defaults.validate_and_clamp();
        let defaults = &defaults;

        match self.try_load(defaults) {
            Ok(Some(config)) => {
                info!(path = %self.path.display(), "Loaded sidebar config");
                config
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No config file found, using defaults");
                defaults.clone()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                defaults.clone()
            }
        }
    }

    fn try_load(&self, defaults: &SidebarConfig) -> DockResult<Option<SidebarConfig>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let on_disk: Map<String, Value> = serde_json::from_str(&contents).map_err(|e| self.io_error(e))?;
        let Value::Object(mut merged) = serde_json::to_value(defaults).map_err(|e| self.io_error(e))? else {
            return Err(self.io_error("defaults did not serialize to an object"));
        };
        merged.extend(on_disk);

        let mut config: SidebarConfig = serde_json::from_value(Value::Object(merged)).map_err(|e| self.io_error(e))?;
        config.validate_and_clamp();
        Ok(Some(config))
    }

    pub fn save(&self, config: &SidebarConfig) -> DockResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let contents = serde_json::to_string_pretty(config).map_err(|e| self.io_error(e))?;
        fs::write(&self.path, contents).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), embedded = config.last_embedded, "Saved sidebar config");
        Ok(())
    }

    fn io_error(&self, err: impl std::fmt::Display) -> DockError {
        DockError::ConfigIo {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("nested").join("sidebar.json"))
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let config = store_in(&dir).load();
        assert_eq!(config, SidebarConfig::default());
        assert!(config.auto_save);
        assert_eq!(config.edge, Edge::Left);
        assert_eq!(config.width, 300);
        assert_eq!(config.top_offset, 0);
    }

    #[test]
    fn test_load_malformed_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ edge: left,, }").unwrap();
        assert_eq!(store.load(), SidebarConfig::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut config = SidebarConfig::default();
        config.edge = Edge::Right;
        config.width = 420;
        config.top_offset = 32;
        config.auto_save = false;
        config.last_free_geometry = Some(WindowGeometry::new(100, 80, 800, 600));

        store.save(&config).unwrap();
        let loaded = store.load();
        assert_eq!(loaded, config);

        store.save(&loaded).unwrap();
        assert_eq!(store.load(), loaded);
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{ "edge": "right", "width": 250 }"#).unwrap();

        let config = store.load();
        assert_eq!(config.edge, Edge::Right);
        assert_eq!(config.width, 250);
        assert_eq!(config.top_offset, 0);
        assert!(config.auto_save);
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_custom_defaults_fill_missing_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{ "width": 250 }"#).unwrap();

        let defaults = SidebarConfig {
            edge: Edge::Right,
            top_offset: 24,
            ..SidebarConfig::default()
        };
        let config = store.load_with_defaults(&defaults);
        assert_eq!(config.edge, Edge::Right);
        assert_eq!(config.top_offset, 24);
        assert_eq!(config.width, 250);
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{ "edge": "left", "theme": "dark", "opacity": 0.9 }"#).unwrap();

        let config = store.load();
        assert_eq!(config.extra.get("theme"), Some(&Value::from("dark")));
        store.save(&config).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["opacity"], 0.9);
        assert_eq!(raw["edge"], "left");
    }

    #[test]
    fn test_saved_file_layout() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let config = SidebarConfig {
            last_free_geometry: Some(WindowGeometry::new(10, 20, 640, 480)),
            ..SidebarConfig::default()
        };
        store.save(&config).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["edge"], "left");
        assert_eq!(raw["width"], 300);
        assert_eq!(raw["top_offset"], 0);
        assert_eq!(raw["auto_save"], true);
        assert_eq!(raw["is_embedded"], false);
        assert_eq!(raw["window_geometry"]["x"], 10);
        assert_eq!(raw["window_geometry"]["height"], 480);
        assert!(raw.get("height").is_none());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{ "edge": "top", "width": 0, "height": 0, "top_offset": 99999 }"#).unwrap();

        let config = store.load();
        assert_eq!(config.edge, Edge::Left);
        assert_eq!(config.width, 300);
        assert_eq!(config.height, None);
        assert_eq!(config.top_offset, validation::MAX_TOP_OFFSET);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = ConfigUpdate::from_options([("color", "red")]).unwrap_err();
        assert!(matches!(err, DockError::InvalidOption(name) if name == "color"));
    }

    #[test]
    fn test_set_option_parses_values() {
        let update = ConfigUpdate::from_options([
            ("edge", "right"),
            ("width", "280"),
            ("height", "full"),
            ("top_offset", "12"),
            ("auto_save", "off"),
        ])
        .unwrap();
        assert_eq!(update.edge, Some(Edge::Right));
        assert_eq!(update.width, Some(280));
        assert_eq!(update.height, Some(None));
        assert_eq!(update.top_offset, Some(12));
        assert_eq!(update.auto_save, Some(false));
        assert!(update.moves_bar());
    }

    #[test]
    fn test_bad_values_rejected() {
        for (name, value) in [
            ("edge", "bottom"),
            ("edge", "sideways"),
            ("width", "0"),
            ("width", "-3"),
            ("height", "tall"),
            ("auto_save", "maybe"),
        ] {
            let err = ConfigUpdate::from_options([(name, value)]).unwrap_err();
            assert!(matches!(err, DockError::InvalidValue { .. }), "{name}={value}");
        }
    }

    #[test]
    fn test_apply_leaves_config_unchanged_on_invalid_update() {
        let mut config = SidebarConfig::default();
        let update = ConfigUpdate {
            edge: Some(Edge::Right),
            width: Some(0),
            ..ConfigUpdate::default()
        };
        assert!(config.apply(&update).is_err());
        assert_eq!(config, SidebarConfig::default());
    }

    #[test]
    fn test_apply_updates_only_supplied_fields() {
        let mut config = SidebarConfig::default();
        let update = ConfigUpdate {
            width: Some(360),
            auto_save: Some(false),
            ..ConfigUpdate::default()
        };
        config.apply(&update).unwrap();
        assert_eq!(config.width, 360);
        assert!(!config.auto_save);
        assert_eq!(config.edge, Edge::Left);
        assert!(update.moves_bar());
    }

    #[test]
    fn test_every_listed_option_is_settable() {
        let sample = |name: &str| match name {
            "edge" => "left",
            "auto_save" => "true",
            _ => "10",
        };
        for name in OPTIONS {
            let mut update = ConfigUpdate::new();
            update.set_option(name, sample(name)).unwrap();
            assert!(!update.is_empty(), "{name}");
        }
    }

    #[test]
    fn test_custom_defaults_are_clamped_without_file() {
        let dir = TempDir::new().unwrap();
        let defaults = SidebarConfig {
            edge: Edge::Bottom,
            width: u32::MAX,
            height: Some(0),
            ..SidebarConfig::default()
        };
        let config = store_in(&dir).load_with_defaults(&defaults);
        assert_eq!(config.edge, Edge::Left);
        assert_eq!(config.width, validation::MAX_DIMENSION);
        assert_eq!(config.height, None);
    }
}
