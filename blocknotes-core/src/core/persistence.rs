//! Persistence adapter: typed access to the page and workspace slots.
//!
//! The page collection is always read and written whole. Every failure is
//! logged here, at the storage boundary, and then returned to the caller, so
//! a failed save can never be mistaken for a successful one.

use crate::core::export;
use crate::core::search::{fold, match_page, PageMatches};
use crate::{
    BlocknotesError, ImportResult, ImportSummary, KeyValueStore, Page, Result, StoreConfig,
    WorkspaceState, WorkspaceStateUpdate,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Reads and writes the persisted slots of one store.
pub struct Persistence<S> {
    store: S,
    config: StoreConfig,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, StoreConfig::default())
    }

    pub fn with_config(store: S, config: StoreConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Pages ─────────────────────────────────────────────────────

    /// Replaces the stored page collection with `pages`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error (e.g. [`BlocknotesError::StorageFull`])
    /// if the write is refused. The previous collection stays in place.
    pub fn save_pages(&self, pages: &[Page]) -> Result<()> {
        self.write_slot(&self.config.pages_key, pages)?;
        log::debug!("Saved {} pages", pages.len());
        Ok(())
    }

    /// Loads the stored page collection. An empty slot yields an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`BlocknotesError::Corrupt`] if the slot cannot be parsed.
    pub fn load_pages(&self) -> Result<Vec<Page>> {
        Ok(self.read_slot(&self.config.pages_key)?.unwrap_or_default())
    }

    /// Like [`load_pages`](Self::load_pages) but degrades any failure to an
    /// empty collection. The failure has already been logged.
    pub fn load_pages_or_default(&self) -> Vec<Page> {
        self.load_pages().unwrap_or_default()
    }

    /// Raw JSON of the pages slot, if any.
    pub(crate) fn raw_pages(&self) -> Result<Option<String>> {
        self.store.get(&self.config.pages_key)
    }

    pub(crate) fn restore_raw_pages(&self, raw: Option<&str>) -> Result<()> {
        match raw {
            Some(json) => self.store.set(&self.config.pages_key, json),
            None => self.store.remove(&self.config.pages_key),
        }
    }

    // ── Workspace state ───────────────────────────────────────────

    /// Loads the workspace state, or the default record if none is stored.
    ///
    /// # Errors
    ///
    /// Returns [`BlocknotesError::Corrupt`] if the slot cannot be parsed.
    pub fn load_workspace_state(&self) -> Result<WorkspaceState> {
        Ok(self.read_slot(&self.config.workspace_key)?.unwrap_or_default())
    }

    /// Merges `update` into the stored workspace state and returns the result.
    ///
    /// A corrupt stored record is replaced rather than merged into, so the
    /// slot heals on the next write.
    pub fn save_workspace_state(&self, update: WorkspaceStateUpdate) -> Result<WorkspaceState> {
        let mut state = self.workspace_state_for_write()?;
        state.merge(update);
        self.write_slot(&self.config.workspace_key, &state)?;
        Ok(state)
    }

    /// Records a visit to `page_id` at the front of the recents list.
    ///
    /// A corrupt stored record is replaced, as in
    /// [`save_workspace_state`](Self::save_workspace_state).
    pub fn add_to_recent_pages(&self, page_id: &str) -> Result<()> {
        let mut state = self.workspace_state_for_write()?;
        state.push_recent(page_id, self.config.recent_pages_limit);
        self.write_slot(&self.config.workspace_key, &state)
    }

    // ── Search ────────────────────────────────────────────────────

    /// Case-insensitive substring search over every page title and block.
    ///
    /// Pages without a hit are left out. An empty or whitespace-only query
    /// matches nothing.
    pub fn search_content(&self, query: &str) -> Result<Vec<PageMatches>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let needle = fold(query);
        let context = self.config.snippet_context;
        let results = self
            .load_pages()?
            .into_iter()
            .filter_map(|page| {
                let matches = match_page(&page, &needle, context);
                (!matches.is_empty()).then_some(PageMatches { page, matches })
            })
            .collect();
        Ok(results)
    }

    // ── Backup ────────────────────────────────────────────────────

    /// See [`export_document`](crate::core::export::export_document).
    pub fn export_data(&self) -> Result<String> {
        export::export_document(self)
    }

    /// See [`import_document`](crate::core::export::import_document).
    pub fn import_data(&self, text: &str) -> Result<ImportResult> {
        export::import_document(self, text)
    }

    pub fn peek_import(&self, text: &str) -> Result<ImportSummary> {
        export::peek_import(text)
    }

    // ── Maintenance ───────────────────────────────────────────────

    /// Removes the pages, workspace and settings slots.
    pub fn clear_all_data(&self) -> Result<()> {
        for key in self.config.all_keys() {
            self.store.remove(key).inspect_err(|e| {
                log::error!("Failed to clear '{key}': {e}");
            })?;
        }
        log::info!("Cleared all stored data");
        Ok(())
    }

    /// The stored workspace state as the base of a read-modify-write.
    /// A corrupt record yields the default so the next write heals the slot.
    fn workspace_state_for_write(&self) -> Result<WorkspaceState> {
        match self.load_workspace_state() {
            Err(BlocknotesError::Corrupt { .. }) => {
                log::warn!("Replacing corrupt workspace state");
                Ok(WorkspaceState::default())
            }
            other => other,
        }
    }

    fn read_slot<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key).inspect_err(|e| {
            log::error!("Failed to read '{key}': {e}");
        })?
        else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| {
                log::error!("Failed to parse '{key}': {source}");
                BlocknotesError::Corrupt {
                    key: key.to_string(),
                    source,
                }
            })
    }

    fn write_slot<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json).inspect_err(|e| {
            log::error!("Failed to save '{key}' ({} bytes): {e}", json.len());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Block, BlockType, MemoryStore, SqliteStore};

    fn sample_pages() -> Vec<Page> {
        let mut parent = Page::new("Parent", None);
        let mut child = Page::new("Child", Some(parent.id.clone()));
        parent.add_child(&child.id);
        child.emoji = Some("🚀".to_string());
        child.content.push(Block::new(BlockType::Checkbox, "todo"));
        vec![parent, child]
    }

    #[test]
    fn test_pages_round_trip() {
        let persistence = Persistence::new(MemoryStore::new());
        let pages = sample_pages();
        persistence.save_pages(&pages).unwrap();
        assert_eq!(persistence.load_pages().unwrap(), pages);
    }

    #[test]
    fn test_pages_round_trip_through_sqlite() {
        let persistence = Persistence::new(SqliteStore::in_memory().unwrap());
        let pages = sample_pages();
        persistence.save_pages(&pages).unwrap();
        assert_eq!(persistence.load_pages().unwrap(), pages);
    }

    #[test]
    fn test_timestamps_stored_as_iso_strings() {
        let persistence = Persistence::new(MemoryStore::new());
        persistence.save_pages(&sample_pages()).unwrap();
        let raw = persistence.raw_pages().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let created = value[0]["createdAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
        let block_created = value[0]["content"][0]["createdAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(block_created).is_ok());
    }

    #[test]
    fn test_save_replaces_rather_than_merges() {
        let persistence = Persistence::new(MemoryStore::new());
        persistence.save_pages(&sample_pages()).unwrap();
        persistence.save_pages(&[Page::new("Only", None)]).unwrap();
        let loaded = persistence.load_pages().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Only");
    }

    #[test]
    fn test_empty_slot_loads_empty() {
        let persistence = Persistence::new(MemoryStore::new());
        assert!(persistence.load_pages().unwrap().is_empty());
        assert_eq!(
            persistence.load_workspace_state().unwrap(),
            WorkspaceState::default()
        );
    }

    #[test]
    fn test_corrupt_slot_is_reported() {
        let store = MemoryStore::new();
        store.set("notion-app-pages", "{ definitely not pages").unwrap();
        let persistence = Persistence::new(store);

        let err = persistence.load_pages().unwrap_err();
        assert!(matches!(err, BlocknotesError::Corrupt { ref key, .. } if key == "notion-app-pages"));
        assert!(persistence.load_pages_or_default().is_empty());
    }

    #[test]
    fn test_failed_save_is_surfaced_and_keeps_old_data() {
        let persistence = Persistence::new(MemoryStore::with_quota(4096));
        let pages = sample_pages();
        persistence.save_pages(&pages).unwrap();

        let mut huge = Page::new("Huge", None);
        huge.content[0].content = "x".repeat(8192);
        let err = persistence.save_pages(&[huge]).unwrap_err();
        assert!(matches!(err, BlocknotesError::StorageFull { .. }));
        assert_eq!(persistence.load_pages().unwrap(), pages);
    }

    #[test]
    fn test_workspace_state_merges() {
        let persistence = Persistence::new(MemoryStore::new());
        persistence
            .save_workspace_state(WorkspaceStateUpdate::sidebar_collapsed(true))
            .unwrap();
        let state = persistence
            .save_workspace_state(WorkspaceStateUpdate::search_query("todo"))
            .unwrap();
        assert!(state.sidebar_collapsed);
        assert_eq!(state.search_query, "todo");
        assert_eq!(persistence.load_workspace_state().unwrap(), state);
    }

    #[test]
    fn test_corrupt_workspace_state_heals_on_save() {
        let store = MemoryStore::new();
        store.set("notion-app-workspace", "{not json").unwrap();
        let persistence = Persistence::new(store);
        assert!(matches!(
            persistence.load_workspace_state(),
            Err(BlocknotesError::Corrupt { .. })
        ));

        persistence
            .save_workspace_state(WorkspaceStateUpdate::current_page(Some("p1")))
            .unwrap();
        let state = persistence.load_workspace_state().unwrap();
        assert_eq!(state.current_page_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_recent_pages_capped_at_ten() {
        let persistence = Persistence::new(MemoryStore::new());
        let ids: Vec<String> = (0..12).map(|i| format!("page-{i}")).collect();
        for id in &ids {
            persistence.add_to_recent_pages(id).unwrap();
        }
        let recent = persistence.load_workspace_state().unwrap().recent_pages;
        assert_eq!(recent.len(), 10);
        let expected: Vec<String> = ids.iter().rev().take(10).cloned().collect();
        assert_eq!(recent, expected);
    }

    #[test]
    fn test_recent_visit_heals_corrupt_workspace_state() {
        let store = MemoryStore::new();
        store.set("notion-app-workspace", "{not json").unwrap();
        let persistence = Persistence::new(store);

        persistence.add_to_recent_pages("p1").unwrap();
        let state = persistence.load_workspace_state().unwrap();
        assert_eq!(state.recent_pages, vec!["p1".to_string()]);
    }

    #[test]
    fn test_recent_limit_follows_config() {
        let config = StoreConfig {
            recent_pages_limit: 2,
            ..StoreConfig::default()
        };
        let persistence = Persistence::with_config(MemoryStore::new(), config);
        for id in ["a", "b", "c"] {
            persistence.add_to_recent_pages(id).unwrap();
        }
        assert_eq!(
            persistence.load_workspace_state().unwrap().recent_pages,
            vec!["c".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_clear_all_data_removes_every_slot() {
        let store = MemoryStore::new();
        store.set("notion-app-settings", "{}").unwrap();
        let persistence = Persistence::new(&store);
        persistence.save_pages(&sample_pages()).unwrap();
        persistence.add_to_recent_pages("x").unwrap();

        persistence.clear_all_data().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_snapshot_overwrites_newer_save() {
        let persistence = Persistence::new(MemoryStore::new());
        persistence.save_pages(&sample_pages()).unwrap();

        let stale = persistence.load_pages().unwrap();
        let mut fresh = persistence.load_pages().unwrap();
        fresh.push(Page::new("Added meanwhile", None));
        persistence.save_pages(&fresh).unwrap();

        // Whole-collection writes: the last writer wins.
        persistence.save_pages(&stale).unwrap();
        let loaded = persistence.load_pages().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|p| p.title != "Added meanwhile"));
    }

    #[test]
    fn test_search_content_skips_pages_without_hits() {
        let persistence = Persistence::new(MemoryStore::new());
        persistence.save_pages(&sample_pages()).unwrap();
        let results = persistence.search_content("TODO").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].page.title, "Child");
        assert_eq!(results[0].matches.len(), 1);
    }
}
