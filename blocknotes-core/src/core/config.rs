//! Store configuration: slot names and tunables.
//!
//! Defaults match the slot names the browser front-end has always used, so a
//! store written by it can be read without any configuration file.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of entries kept in the recent-pages list.
pub const DEFAULT_RECENT_PAGES_LIMIT: usize = 10;

/// Default characters of context kept on each side of a search hit.
pub const DEFAULT_SNIPPET_CONTEXT: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Slot holding the page collection.
    pub pages_key: String,
    /// Slot holding the workspace state record.
    pub workspace_key: String,
    /// Reserved slot, only ever cleared.
    pub settings_key: String,
    pub recent_pages_limit: usize,
    pub snippet_context: usize,
    /// How many recent pages [`Workspace::recent_pages`](crate::Workspace::recent_pages)
    /// returns when no explicit limit is given.
    pub recent_pages_display: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pages_key: "notion-app-pages".to_string(),
            workspace_key: "notion-app-workspace".to_string(),
            settings_key: "notion-app-settings".to_string(),
            recent_pages_limit: DEFAULT_RECENT_PAGES_LIMIT,
            snippet_context: DEFAULT_SNIPPET_CONTEXT,
            recent_pages_display: 5,
        }
    }
}

impl StoreConfig {
    /// Loads configuration from a JSON file; returns defaults if the file is missing or corrupt.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring corrupt config {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Saves configuration as pretty JSON, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Every slot this configuration names, in clearing order.
    pub fn all_keys(&self) -> [&str; 3] {
        [
            self.pages_key.as_str(),
            self.workspace_key.as_str(),
            self.settings_key.as_str(),
        ]
    }
}
