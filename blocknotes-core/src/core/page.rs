use crate::Block;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A titled document holding an ordered list of blocks.
///
/// `parent_id` and `children` link pages into a tree. Both sides are kept in
/// sync by [`Workspace`](crate::Workspace); they are not patchable through
/// [`PageUpdate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub title: String,
    pub content: Vec<Block>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

impl Page {
    /// Creates a page with a fresh ID, one empty text block and an empty child list.
    pub fn new(title: impl Into<String>, parent_id: Option<String>) -> Self {
        Self::with_content(title, parent_id, vec![Block::empty_text()])
    }

    pub fn with_content(
        title: impl Into<String>,
        parent_id: Option<String>,
        content: Vec<Block>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content,
            created_at: now,
            updated_at: now,
            parent_id,
            children: Some(Vec::new()),
            is_template: None,
            emoji: None,
            cover_image: None,
        }
    }

    /// Child IDs in insertion order; empty when the list is absent.
    pub fn child_ids(&self) -> &[String] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Appends `child_id` unless it is already listed. Creates the list if absent.
    pub fn add_child(&mut self, child_id: &str) {
        let children = self.children.get_or_insert_with(Vec::new);
        if !children.iter().any(|id| id == child_id) {
            children.push(child_id.to_string());
        }
    }

    /// Removes `child_id` from the child list. Returns whether it was listed.
    pub fn remove_child(&mut self, child_id: &str) -> bool {
        match self.children.as_mut() {
            Some(children) => {
                let before = children.len();
                children.retain(|id| id != child_id);
                children.len() != before
            }
            None => false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.content.iter().find(|b| b.id == block_id)
    }

    pub fn block_position(&self, block_id: &str) -> Option<usize> {
        self.content.iter().position(|b| b.id == block_id)
    }
}

/// A partial change to a page. `None` fields are left untouched.
///
/// `emoji` and `cover_image` use a nested option so they can be cleared:
/// `Some(None)` removes the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub content: Option<Vec<Block>>,
    pub emoji: Option<Option<String>>,
    pub cover_image: Option<Option<String>>,
    pub is_template: Option<bool>,
}

impl PageUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn content(content: Vec<Block>) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    pub fn emoji(emoji: impl Into<String>) -> Self {
        Self {
            emoji: Some(Some(emoji.into())),
            ..Self::default()
        }
    }

    /// Merges the update into `page` and stamps `updated_at` with `now`,
    /// whether or not any field changed.
    pub fn apply_to(self, page: &mut Page, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            page.title = title;
        }
        if let Some(content) = self.content {
            page.content = content;
        }
        if let Some(emoji) = self.emoji {
            page.emoji = emoji;
        }
        if let Some(cover_image) = self.cover_image {
            page.cover_image = cover_image;
        }
        if let Some(is_template) = self.is_template {
            page.is_template = Some(is_template);
        }
        page.touch(now);
    }
}
