//! Built-in page templates.

use crate::{Block, BlockType};
use serde::{Deserialize, Serialize};

/// One block of a template: a type and its starting text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
}

/// A named block-list preset for new pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub blocks: Vec<TemplateBlock>,
}

impl Template {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        emoji: &str,
        blocks: &[(BlockType, &str)],
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            emoji: emoji.to_string(),
            blocks: blocks
                .iter()
                .map(|(block_type, content)| TemplateBlock {
                    block_type: block_type.clone(),
                    content: (*content).to_string(),
                })
                .collect(),
        }
    }

    /// Builds the template's blocks with fresh IDs, timestamps and default properties.
    pub fn instantiate(&self) -> Vec<Block> {
        self.blocks
            .iter()
            .map(|b| Block::new(b.block_type.clone(), b.content.as_str()))
            .collect()
    }
}

/// The built-in catalog: blank, meeting notes and project plan.
pub fn default_templates() -> Vec<Template> {
    use BlockType::*;
    vec![
        Template::new(
            "blank",
            "Blank Page",
            "Start with an empty page",
            "📄",
            &[(Text, "")],
        ),
        Template::new(
            "meeting-notes",
            "Meeting Notes",
            "Template for meeting notes",
            "📋",
            &[
                (Heading1, "Meeting Notes"),
                (Text, "📅 Date: "),
                (Text, "👥 Attendees: "),
                (Heading2, "Agenda"),
                (BulletList, ""),
                (Heading2, "Action Items"),
                (Checkbox, ""),
            ],
        ),
        Template::new(
            "project-plan",
            "Project Plan",
            "Template for project planning",
            "🚀",
            &[
                (Heading1, "Project Plan"),
                (Heading2, "Overview"),
                (Text, ""),
                (Heading2, "Goals"),
                (BulletList, ""),
                (Heading2, "Timeline"),
                (Text, ""),
                (Heading2, "Tasks"),
                (Checkbox, ""),
            ],
        ),
    ]
}

pub fn find_template(template_id: &str) -> Option<Template> {
    default_templates()
        .into_iter()
        .find(|t| t.id == template_id)
}
