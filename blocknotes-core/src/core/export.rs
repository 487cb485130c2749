//! Backup export and import as a single JSON document.
//!
//! The document carries the whole page collection, the workspace state, the
//! export time and a format version. Import is all-or-nothing: both parts are
//! validated before anything is written, and a failed workspace write rolls
//! the pages slot back to what it held before.

use crate::{
    BlocknotesError, KeyValueStore, Page, Persistence, Result, WorkspaceState,
    WorkspaceStateUpdate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Format version written into every export.
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

/// Top-level JSON structure of a backup file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub pages: Vec<Page>,
    pub workspace: WorkspaceState,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

/// What an import actually replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// Number of pages written, or `None` if the document had no pages part.
    pub page_count: Option<usize>,
    /// Whether the workspace part was merged into the stored state.
    pub workspace_applied: bool,
}

/// Metadata of a backup document, read without touching the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub version: Option<String>,
    pub exported_at: Option<String>,
    pub page_count: Option<usize>,
    pub has_workspace: bool,
}

/// The validated parts of an import document.
struct ParsedImport {
    pages: Option<Vec<Page>>,
    workspace: Option<WorkspaceStateUpdate>,
    version: Option<String>,
    exported_at: Option<String>,
}

/// Serializes the stored pages and workspace state as a pretty-printed backup document.
///
/// # Errors
///
/// Fails if either slot is unreadable, so a corrupt store is never exported
/// as an empty backup.
pub fn export_document<S: KeyValueStore>(persistence: &Persistence<S>) -> Result<String> {
    let document = ExportDocument {
        pages: persistence.load_pages()?,
        workspace: persistence.load_workspace_state()?,
        exported_at: Utc::now(),
        version: EXPORT_FORMAT_VERSION.to_string(),
    };
    let json = serde_json::to_string_pretty(&document)?;
    log::info!(
        "Exported {} pages ({} bytes)",
        document.pages.len(),
        json.len()
    );
    Ok(json)
}

/// Validates `text` and returns its metadata without writing anything.
pub fn peek_import(text: &str) -> Result<ImportSummary> {
    let parsed = parse_import(text)?;
    Ok(ImportSummary {
        version: parsed.version,
        exported_at: parsed.exported_at,
        page_count: parsed.pages.as_ref().map(Vec::len),
        has_workspace: parsed.workspace.is_some(),
    })
}

/// Replaces the page collection and merges the workspace state from a backup document.
///
/// A missing or `null` part is skipped. Unknown fields are ignored.
///
/// # Errors
///
/// Returns [`BlocknotesError::InvalidImport`] if the document is malformed,
/// in which case the store is untouched. Storage errors are returned after
/// the pages slot has been restored.
pub fn import_document<S: KeyValueStore>(
    persistence: &Persistence<S>,
    text: &str,
) -> Result<ImportResult> {
    let parsed = parse_import(text)?;

    let previous_pages = persistence.raw_pages()?;
    let page_count = match &parsed.pages {
        Some(pages) => {
            persistence.save_pages(pages)?;
            Some(pages.len())
        }
        None => None,
    };

    let workspace_applied = match parsed.workspace {
        Some(update) => {
            if let Err(e) = persistence.save_workspace_state(update) {
                log::error!("Workspace import failed: {e}");
                if page_count.is_some() {
                    log::warn!("Restoring previous pages");
                    persistence.restore_raw_pages(previous_pages.as_deref())?;
                }
                return Err(e);
            }
            true
        }
        None => false,
    };

    log::info!(
        "Imported backup: {} pages, workspace {}",
        page_count.map_or_else(|| "no".to_string(), |n| n.to_string()),
        if workspace_applied { "merged" } else { "skipped" }
    );
    Ok(ImportResult {
        page_count,
        workspace_applied,
    })
}

fn parse_import(text: &str) -> Result<ParsedImport> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BlocknotesError::InvalidImport(format!("not valid JSON: {e}")))?;
    let Value::Object(mut object) = value else {
        return Err(BlocknotesError::InvalidImport(
            "top level must be an object".to_string(),
        ));
    };

    let pages = match take_part(&mut object, "pages") {
        None => None,
        Some(Value::Array(items)) => {
            let pages: Vec<Page> = serde_json::from_value(Value::Array(items))
                .map_err(|e| BlocknotesError::InvalidImport(format!("bad page: {e}")))?;
            check_unique_ids(&pages)?;
            Some(pages)
        }
        Some(_) => {
            return Err(BlocknotesError::InvalidImport(
                "'pages' must be an array".to_string(),
            ))
        }
    };

    let workspace = match take_part(&mut object, "workspace") {
        None => None,
        Some(part @ Value::Object(_)) => Some(
            serde_json::from_value::<WorkspaceStateUpdate>(part)
                .map_err(|e| BlocknotesError::InvalidImport(format!("bad workspace: {e}")))?,
        ),
        Some(_) => {
            return Err(BlocknotesError::InvalidImport(
                "'workspace' must be an object".to_string(),
            ))
        }
    };

    Ok(ParsedImport {
        pages,
        workspace,
        version: object
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string),
        exported_at: object
            .get("exportedAt")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Rejects page IDs repeated across the document and block IDs repeated within a page.
fn check_unique_ids(pages: &[Page]) -> Result<()> {
    let mut page_ids = HashSet::new();
    for page in pages {
        if !page_ids.insert(page.id.as_str()) {
            return Err(BlocknotesError::InvalidImport(format!(
                "duplicate page id {}",
                page.id
            )));
        }
        let mut block_ids = HashSet::new();
        if let Some(block) = page.content.iter().find(|b| !block_ids.insert(b.id.as_str())) {
            return Err(BlocknotesError::InvalidImport(format!(
                "duplicate block id {} in page {}",
                block.id, page.id
            )));
        }
    }
    Ok(())
}

/// Removes `key` from the envelope, treating an explicit `null` as absent.
fn take_part(object: &mut Map<String, Value>, key: &str) -> Option<Value> {
    object.remove(key).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    /// Fails every write to one slot and passes the rest through.
    struct RefuseKey<'a> {
        inner: &'a MemoryStore,
        key: &'static str,
    }

    impl KeyValueStore for RefuseKey<'_> {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if key == self.key {
                return Err(BlocknotesError::Storage(format!("refusing {key}")));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    fn seeded() -> Persistence<MemoryStore> {
        let persistence = Persistence::new(MemoryStore::new());
        let parent = Page::new("Parent", None);
        let mut child = Page::new("Child", Some(parent.id.clone()));
        child.emoji = Some("📝".to_string());
        let mut parent = parent;
        parent.add_child(&child.id);
        persistence.save_pages(&[parent, child]).unwrap();
        persistence.add_to_recent_pages("anything").unwrap();
        persistence
    }

    #[test]
    fn test_export_document_shape() {
        let persistence = seeded();
        let json = export_document(&persistence).unwrap();
        assert!(json.contains('\n'));

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0.0");
        assert!(value["exportedAt"].is_string());
        assert_eq!(value["pages"].as_array().unwrap().len(), 2);
        assert_eq!(value["workspace"]["recentPages"][0], "anything");
        assert!(value["workspace"].get("pages").is_none());
    }

    #[test]
    fn test_export_then_import_into_fresh_store() {
        let source = seeded();
        let json = export_document(&source).unwrap();

        let target = Persistence::new(MemoryStore::new());
        let result = import_document(&target, &json).unwrap();
        assert_eq!(result.page_count, Some(2));
        assert!(result.workspace_applied);
        assert_eq!(target.load_pages().unwrap(), source.load_pages().unwrap());
        assert_eq!(
            target.load_workspace_state().unwrap(),
            source.load_workspace_state().unwrap()
        );
    }

    #[test]
    fn test_missing_and_null_parts_are_skipped() {
        let persistence = seeded();
        let before = persistence.load_pages().unwrap();

        let result =
            import_document(&persistence, r#"{"workspace":{"sidebarCollapsed":true}}"#).unwrap();
        assert_eq!(result.page_count, None);
        assert!(result.workspace_applied);
        assert_eq!(persistence.load_pages().unwrap(), before);
        let state = persistence.load_workspace_state().unwrap();
        assert!(state.sidebar_collapsed);
        assert_eq!(state.recent_pages, vec!["anything".to_string()]);

        let result = import_document(&persistence, r#"{"pages":null,"extra":1}"#).unwrap();
        assert_eq!(result.page_count, None);
        assert!(!result.workspace_applied);
    }

    #[test]
    fn test_invalid_documents_write_nothing() {
        let persistence = seeded();
        let pages = persistence.load_pages().unwrap();
        let state = persistence.load_workspace_state().unwrap();

        for bad in [
            "not json",
            "[]",
            r#"{"pages":{}}"#,
            r#"{"pages":[{"id":"x"}]}"#,
            r#"{"pages":[],"workspace":42}"#,
        ] {
            let err = import_document(&persistence, bad).unwrap_err();
            assert!(matches!(err, BlocknotesError::InvalidImport(_)), "{bad}");
        }

        assert_eq!(persistence.load_pages().unwrap(), pages);
        assert_eq!(persistence.load_workspace_state().unwrap(), state);
    }

    #[test]
    fn test_repeated_ids_are_rejected() {
        let persistence = seeded();
        let before = persistence.load_pages().unwrap();

        let first = Page::new("First", None);
        let mut second = Page::new("Second", None);
        second.id = first.id.clone();
        let doc = serde_json::json!({ "pages": [first, second] });
        let err = import_document(&persistence, &doc.to_string()).unwrap_err();
        assert!(matches!(err, BlocknotesError::InvalidImport(ref msg) if msg.contains("page id")));

        let mut page = Page::new("Blocks", None);
        let mut twin = page.content[0].clone();
        twin.content = "twin".to_string();
        page.content.push(twin);
        let doc = serde_json::json!({ "pages": [page] });
        let err = import_document(&persistence, &doc.to_string()).unwrap_err();
        assert!(matches!(err, BlocknotesError::InvalidImport(ref msg) if msg.contains("block id")));

        assert_eq!(persistence.load_pages().unwrap(), before);
        assert!(peek_import(&doc.to_string()).is_err());
    }

    #[test]
    fn test_failed_workspace_write_restores_pages() {
        let store = MemoryStore::new();
        let original = Page::new("Original", None);
        Persistence::new(&store).save_pages(&[original.clone()]).unwrap();

        let persistence = Persistence::new(RefuseKey {
            inner: &store,
            key: "notion-app-workspace",
        });
        let incoming = Page::new("Incoming", None);
        let doc = serde_json::json!({
            "pages": [incoming],
            "workspace": { "sidebarCollapsed": true },
        });

        let err = import_document(&persistence, &doc.to_string()).unwrap_err();
        assert!(matches!(err, BlocknotesError::Storage(_)));
        assert_eq!(persistence.load_pages().unwrap(), vec![original]);
    }

    #[test]
    fn test_import_accepts_millisecond_timestamps() {
        let doc = r#"{
            "pages": [{
                "id": "p1",
                "title": "From the browser",
                "content": [{
                    "id": "b1",
                    "type": "text",
                    "content": "hello",
                    "properties": {},
                    "createdAt": "2024-01-02T03:04:05.678Z",
                    "updatedAt": "2024-01-02T03:04:05.678Z"
                }],
                "createdAt": "2024-01-02T03:04:05.678Z",
                "updatedAt": "2024-01-02T03:04:05.678Z",
                "children": []
            }],
            "workspace": {"currentPageId": null, "recentPages": [], "pages": []},
            "version": "1.0.0"
        }"#;
        let persistence = Persistence::new(MemoryStore::new());
        import_document(&persistence, doc).unwrap();
        let pages = persistence.load_pages().unwrap();
        assert_eq!(pages[0].content[0].content, "hello");
        assert_eq!(pages[0].created_at.timestamp_subsec_millis(), 678);
    }

    #[test]
    fn test_peek_import_reads_metadata_only() {
        let source = seeded();
        let json = export_document(&source).unwrap();
        let summary = peek_import(&json).unwrap();
        assert_eq!(summary.version.as_deref(), Some("1.0.0"));
        assert!(summary.exported_at.is_some());
        assert_eq!(summary.page_count, Some(2));
        assert!(summary.has_workspace);

        assert!(peek_import(r#"{"pages":"nope"}"#).is_err());
    }
}
