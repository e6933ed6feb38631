#![forbid(unsafe_code)]

//! Table configuration.
//!
//! Every field is optional when loading; missing fields take their defaults.
//!
//! ```toml
//! # treetable.toml
//! instance_id = "inventory"
//! start_expanded = false
//! remember_state = true
//! restore_pre_search_state_on_clear = true
//! search_max_level = 2
//! ```
//!
//! ```
//! use treetable_core::config::TreeTableConfig;
//!
//! let config = TreeTableConfig::from_toml_str("instance_id = \"inventory\"\nsearch_max_level = 2").unwrap();
//! assert_eq!(config.search_max_level, Some(2));
//! assert!(config.highlight_search_matches);
//! assert_eq!(config.storage_key(), "treetable-state:inventory");
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default background colour of search highlight marks.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#ffff8b";

/// Default quiet period before a queued search runs.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 200;

/// Prefix of the persistence key; the instance id follows.
pub const STORAGE_KEY_PREFIX: &str = "treetable-state:";

/// Configuration for one tree table instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeTableConfig {
    /// Stable identity of this table; also keys its persisted state.
    pub instance_id: String,
    /// Start with every row visible instead of roots only.
    pub start_expanded: bool,
    /// Persist visibility across sessions.
    pub remember_state: bool,
    /// On search clear, restore the layout from before the search started.
    pub restore_pre_search_state_on_clear: bool,
    /// Deepest depth whose rows may match a search. `None` = unlimited.
    pub search_max_level: Option<usize>,
    /// Wrap matched text in highlight marks.
    pub highlight_search_matches: bool,
    /// Background colour of highlight marks.
    pub search_highlight_color: String,
    /// Cell that hosts the row toggle button.
    pub toggle_column_index: usize,
    /// Quiet period for debounced search input, in milliseconds.
    pub search_debounce_ms: u64,
}

impl Default for TreeTableConfig {
    fn default() -> Self {
        Self {
            instance_id: "treeTable".to_owned(),
            start_expanded: false,
            remember_state: false,
            restore_pre_search_state_on_clear: false,
            search_max_level: None,
            highlight_search_matches: true,
            search_highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_owned(),
            toggle_column_index: 0,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
        }
    }
}

impl TreeTableConfig {
    #[must_use]
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_start_expanded(mut self, on: bool) -> Self {
        self.start_expanded = on;
        self
    }

    #[must_use]
    pub fn with_remember_state(mut self, on: bool) -> Self {
        self.remember_state = on;
        self
    }

    #[must_use]
    pub fn with_restore_pre_search_state_on_clear(mut self, on: bool) -> Self {
        self.restore_pre_search_state_on_clear = on;
        self
    }

    #[must_use]
    pub fn with_search_max_level(mut self, level: Option<usize>) -> Self {
        self.search_max_level = level;
        self
    }

    #[must_use]
    pub fn with_highlight_search_matches(mut self, on: bool) -> Self {
        self.highlight_search_matches = on;
        self
    }

    #[must_use]
    pub fn with_search_highlight_color(mut self, color: impl Into<String>) -> Self {
        self.search_highlight_color = color.into();
        self
    }

    #[must_use]
    pub fn with_toggle_column_index(mut self, column: usize) -> Self {
        self.toggle_column_index = column;
        self
    }

    #[must_use]
    pub fn with_search_debounce_ms(mut self, ms: u64) -> Self {
        self.search_debounce_ms = ms;
        self
    }

    /// Key under which this table's state is persisted.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}", self.instance_id)
    }

    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Load from a TOML string and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk and validate.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk and validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Check field values. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.instance_id.is_empty() {
            errors.push("instance_id must not be empty".into());
        } else if self.instance_id.chars().any(char::is_whitespace) {
            errors.push(format!(
                "instance_id must not contain whitespace, got {:?}",
                self.instance_id
            ));
        }

        if self.search_highlight_color.is_empty() {
            errors.push("search_highlight_color must not be empty".into());
        } else if self
            .search_highlight_color
            .contains(['"', ';', '<', '>'])
        {
            errors.push(format!(
                "search_highlight_color contains markup characters: {:?}",
                self.search_highlight_color
            ));
        }

        errors
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = TreeTableConfig::default();
        assert_eq!(c.instance_id, "treeTable");
        assert!(!c.start_expanded);
        assert!(!c.remember_state);
        assert!(c.highlight_search_matches);
        assert_eq!(c.search_highlight_color, "#ffff8b");
        assert_eq!(c.search_debounce(), Duration::from_millis(200));
        assert!(c.validate().is_empty());
    }

    #[test]
    fn toml_partial_override() {
        let c = TreeTableConfig::from_toml_str(
            "start_expanded = true\ntoggle_column_index = 2\n",
        )
        .unwrap();
        assert!(c.start_expanded);
        assert_eq!(c.toggle_column_index, 2);
        assert_eq!(c.instance_id, "treeTable");
    }

    #[test]
    fn json_null_max_level_means_unlimited() {
        let c = TreeTableConfig::from_json_str(r#"{"search_max_level": null}"#).unwrap();
        assert_eq!(c.search_max_level, None);
        let c = TreeTableConfig::from_json_str(r#"{"search_max_level": 0}"#).unwrap();
        assert_eq!(c.search_max_level, Some(0));
    }

    #[test]
    fn negative_max_level_is_a_parse_error() {
        let err = TreeTableConfig::from_json_str(r#"{"search_max_level": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let err = TreeTableConfig::from_toml_str(
            "instance_id = \"two words\"\nsearch_highlight_color = \"red;x\"",
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn file_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treetable.toml");
        std::fs::write(&path, "instance_id = \"orders\"\nremember_state = true\n").unwrap();
        let c = TreeTableConfig::from_toml_file(&path).unwrap();
        assert_eq!(c.storage_key(), "treetable-state:orders");
        assert!(c.remember_state);

        let missing = TreeTableConfig::from_json_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn builders_chain() {
        let c = TreeTableConfig::new("t1")
            .with_start_expanded(true)
            .with_remember_state(true)
            .with_restore_pre_search_state_on_clear(true)
            .with_search_max_level(Some(1))
            .with_highlight_search_matches(false)
            .with_search_highlight_color("#fff")
            .with_toggle_column_index(3)
            .with_search_debounce_ms(50);
        assert_eq!(c.instance_id, "t1");
        assert!(c.start_expanded && c.remember_state && c.restore_pre_search_state_on_clear);
        assert_eq!(c.search_max_level, Some(1));
        assert!(!c.highlight_search_matches);
        assert_eq!(c.toggle_column_index, 3);
        assert_eq!(c.search_debounce_ms, 50);
    }
}
