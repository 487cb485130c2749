//! Result type for page removal.
//!
//! Deleting a page always removes its whole subtree; the result reports how
//! many pages went and which ones, in removal order (the target first, then
//! its descendants depth-first).
//!
//! ```rust
//! use blocknotes_core::DeleteResult;
//!
//! let result = DeleteResult {
//!     deleted_count: 2,
//!     affected_ids: vec!["parent".to_string(), "child".to_string()],
//! };
//! let json = serde_json::to_string(&result).unwrap();
//! assert!(json.contains("deletedCount"));
//! assert!(json.contains("affectedIds"));
//! ```

use serde::{Deserialize, Serialize};

/// The outcome of [`Workspace::delete_page`](crate::Workspace::delete_page).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// The total number of pages that were permanently removed.
    pub deleted_count: usize,

    /// IDs of every removed page.
    pub affected_ids: Vec<String>,
}

impl DeleteResult {
    pub fn from_removed(affected_ids: Vec<String>) -> Self {
        Self {
            deleted_count: affected_ids.len(),
            affected_ids,
        }
    }

    pub fn contains(&self, page_id: &str) -> bool {
        self.affected_ids.iter().any(|id| id == page_id)
    }
}
