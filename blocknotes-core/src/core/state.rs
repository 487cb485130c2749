//! Session-level workspace state persisted beside the page collection.

use serde::{Deserialize, Deserializer, Serialize};

/// UI/session state: current page, recents, sidebar and search box.
///
/// Stored in its own slot. The page collection itself lives in the pages
/// slot and is not repeated here; a legacy `pages` field in stored records
/// is ignored on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceState {
    pub current_page_id: Option<String>,
    pub sidebar_collapsed: bool,
    pub search_query: String,
    /// Most recently visited first, no duplicates.
    pub recent_pages: Vec<String>,
}

impl WorkspaceState {
    /// Moves `page_id` to the front of the recents list, keeping at most `limit` entries.
    pub fn push_recent(&mut self, page_id: &str, limit: usize) {
        self.recent_pages.retain(|id| id != page_id);
        self.recent_pages.insert(0, page_id.to_string());
        self.recent_pages.truncate(limit);
    }

    /// Shallow-merges `update` into this record, field by field.
    pub fn merge(&mut self, update: WorkspaceStateUpdate) {
        if let Some(current_page_id) = update.current_page_id {
            self.current_page_id = current_page_id;
        }
        if let Some(sidebar_collapsed) = update.sidebar_collapsed {
            self.sidebar_collapsed = sidebar_collapsed;
        }
        if let Some(search_query) = update.search_query {
            self.search_query = search_query;
        }
        if let Some(recent_pages) = update.recent_pages {
            self.recent_pages = recent_pages;
        }
    }
}

/// A partial [`WorkspaceState`]. Absent fields keep their stored value.
///
/// `current_page_id` distinguishes "absent" (`None`) from an explicit
/// `null` (`Some(None)`), so imports can clear the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceStateUpdate {
    #[serde(default, deserialize_with = "present_or_null")]
    pub current_page_id: Option<Option<String>>,
    pub sidebar_collapsed: Option<bool>,
    pub search_query: Option<String>,
    pub recent_pages: Option<Vec<String>>,
}

impl WorkspaceStateUpdate {
    pub fn current_page(page_id: Option<&str>) -> Self {
        Self {
            current_page_id: Some(page_id.map(str::to_string)),
            ..Self::default()
        }
    }

    pub fn sidebar_collapsed(collapsed: bool) -> Self {
        Self {
            sidebar_collapsed: Some(collapsed),
            ..Self::default()
        }
    }

    pub fn search_query(query: impl Into<String>) -> Self {
        Self {
            search_query: Some(query.into()),
            ..Self::default()
        }
    }
}

impl From<WorkspaceState> for WorkspaceStateUpdate {
    fn from(state: WorkspaceState) -> Self {
        Self {
            current_page_id: Some(state.current_page_id),
            sidebar_collapsed: Some(state.sidebar_collapsed),
            search_query: Some(state.search_query),
            recent_pages: Some(state.recent_pages),
        }
    }
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_cap_after_twelve_visits() {
        let mut state = WorkspaceState::default();
        for i in 0..12 {
            state.push_recent(&format!("page-{i}"), 10);
        }
        assert_eq!(state.recent_pages.len(), 10);
        assert_eq!(state.recent_pages[0], "page-11");
        assert_eq!(state.recent_pages[9], "page-2");
    }

    #[test]
    fn test_revisit_moves_to_front_without_duplicating() {
        let mut state = WorkspaceState::default();
        state.push_recent("a", 10);
        state.push_recent("b", 10);
        state.push_recent("a", 10);
        assert_eq!(state.recent_pages, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_legacy_record_with_pages_field_parses() {
        let json = r#"{"pages":[],"currentPageId":"p1","sidebarCollapsed":true,"searchQuery":"","recentPages":["p1"]}"#;
        let state: WorkspaceState = serde_json::from_str(json).unwrap();
        assert_eq!(state.current_page_id.as_deref(), Some("p1"));
        assert!(state.sidebar_collapsed);
    }

    #[test]
    fn test_current_page_serializes_as_null() {
        let json = serde_json::to_string(&WorkspaceState::default()).unwrap();
        assert!(json.contains(r#""currentPageId":null"#));
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: WorkspaceStateUpdate = serde_json::from_str(r#"{"sidebarCollapsed":true}"#).unwrap();
        assert_eq!(absent.current_page_id, None);

        let null: WorkspaceStateUpdate = serde_json::from_str(r#"{"currentPageId":null}"#).unwrap();
        assert_eq!(null.current_page_id, Some(None));

        let mut state = WorkspaceState {
            current_page_id: Some("p1".to_string()),
            ..WorkspaceState::default()
        };
        state.merge(absent);
        assert_eq!(state.current_page_id.as_deref(), Some("p1"));
        assert!(state.sidebar_collapsed);
        state.merge(null);
        assert_eq!(state.current_page_id, None);
    }
}
