//! Content blocks: the typed units that make up a page body.
//!
//! A [`Block`] carries its tag as a [`BlockType`]. The tag set is closed for
//! rendering purposes, but tags this version does not know are kept verbatim
//! in [`BlockType::Unknown`] so that data written by a newer front-end
//! survives a load/save cycle unchanged. Rendering code should match on
//! [`BlockType::render_kind`], which folds unknown tags into plain text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The type tag of a block.
///
/// Serialized as the bare camelCase tag string (`"heading1"`, `"bulletList"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    Text,
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    Checkbox,
    Divider,
    Quote,
    Code,
    /// A tag outside the known set, stored exactly as read.
    Unknown(String),
}

impl BlockType {
    /// All known block types, in the order a type picker lists them.
    pub const ALL: [BlockType; 10] = [
        BlockType::Text,
        BlockType::Heading1,
        BlockType::Heading2,
        BlockType::Heading3,
        BlockType::BulletList,
        BlockType::NumberedList,
        BlockType::Checkbox,
        BlockType::Quote,
        BlockType::Code,
        BlockType::Divider,
    ];

    /// Returns the wire tag for this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Heading1 => "heading1",
            Self::Heading2 => "heading2",
            Self::Heading3 => "heading3",
            Self::BulletList => "bulletList",
            Self::NumberedList => "numberedList",
            Self::Checkbox => "checkbox",
            Self::Divider => "divider",
            Self::Quote => "quote",
            Self::Code => "code",
            Self::Unknown(tag) => tag,
        }
    }

    /// Folds the tag into the shape a renderer has to draw.
    ///
    /// Unknown tags render as a plain paragraph.
    pub fn render_kind(&self) -> RenderKind {
        match self {
            Self::Text | Self::Unknown(_) => RenderKind::Paragraph,
            Self::Heading1 => RenderKind::Heading(1),
            Self::Heading2 => RenderKind::Heading(2),
            Self::Heading3 => RenderKind::Heading(3),
            Self::BulletList => RenderKind::ListItem { ordered: false },
            Self::NumberedList => RenderKind::ListItem { ordered: true },
            Self::Checkbox => RenderKind::Checkbox,
            Self::Quote => RenderKind::Quote,
            Self::Code => RenderKind::Code,
            Self::Divider => RenderKind::Divider,
        }
    }

    /// Properties a freshly created block of this type starts with.
    pub fn default_properties(&self) -> BlockProperties {
        match self {
            Self::Checkbox => BlockProperties {
                checked: Some(false),
                ..BlockProperties::default()
            },
            _ => BlockProperties::default(),
        }
    }
}

impl From<String> for BlockType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "text" => Self::Text,
            "heading1" => Self::Heading1,
            "heading2" => Self::Heading2,
            "heading3" => Self::Heading3,
            "bulletList" => Self::BulletList,
            "numberedList" => Self::NumberedList,
            "checkbox" => Self::Checkbox,
            "divider" => Self::Divider,
            "quote" => Self::Quote,
            "code" => Self::Code,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<&str> for BlockType {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<BlockType> for String {
    fn from(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a renderer draws for a block, independent of the stored tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Paragraph,
    /// Heading level 1 to 3.
    Heading(u8),
    ListItem { ordered: bool },
    Checkbox,
    Quote,
    Code,
    Divider,
}

impl RenderKind {
    /// Whether the block has an editable text body. Dividers do not.
    pub fn has_text(self) -> bool {
        !matches!(self, Self::Divider)
    }

    /// Bullet or number prefix drawn before list items.
    pub fn list_marker(self) -> Option<&'static str> {
        match self {
            Self::ListItem { ordered: true } => Some("1."),
            Self::ListItem { ordered: false } => Some("•"),
            _ => None,
        }
    }

    /// Hint text shown in an empty block.
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Paragraph => "Type '/' for commands",
            Self::Heading(1) => "Heading 1",
            Self::Heading(2) => "Heading 2",
            Self::Heading(_) => "Heading 3",
            Self::ListItem { ordered: true } => "Numbered list item",
            Self::ListItem { ordered: false } => "List item",
            Self::Checkbox => "To-do",
            Self::Quote => "Quote",
            Self::Code => "Code",
            Self::Divider => "",
        }
    }
}

/// Sparse formatting flags and values attached to a block.
///
/// Absent keys mean "unset"; they are omitted on serialization, never written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Checkbox state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// Code block language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl BlockProperties {
    /// True if the checkbox flag is set; unset counts as unchecked.
    pub fn is_checked(&self) -> bool {
        self.checked.unwrap_or(false)
    }
}

/// One content unit inside a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BlockProperties>,
    /// Declared for nested blocks; no operation in this crate populates it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Block {
    /// Creates a block with a fresh ID, the type's default properties and both
    /// timestamps set to now.
    pub fn new(block_type: BlockType, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            properties: Some(block_type.default_properties()),
            block_type,
            content: content.into(),
            children: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// An empty text block, the content of every new page.
    pub fn empty_text() -> Self {
        Self::new(BlockType::Text, "")
    }

    /// Returns a copy with a fresh ID and fresh timestamps.
    pub fn fresh_copy(&self) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn is_checked(&self) -> bool {
        self.properties.as_ref().is_some_and(BlockProperties::is_checked)
    }
}

/// A partial change to a block. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockUpdate {
    pub block_type: Option<BlockType>,
    pub content: Option<String>,
    /// Replaces the whole property bag when set.
    pub properties: Option<BlockProperties>,
}

impl BlockUpdate {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn properties(properties: BlockProperties) -> Self {
        Self {
            properties: Some(properties),
            ..Self::default()
        }
    }

    /// Merges the update into `block` and stamps `updated_at` with `now`.
    pub fn apply_to(self, block: &mut Block, now: DateTime<Utc>) {
        if let Some(block_type) = self.block_type {
            block.block_type = block_type;
        }
        if let Some(content) = self.content {
            block.content = content;
        }
        if let Some(properties) = self.properties {
            block.properties = Some(properties);
        }
        block.updated_at = now;
    }
}
