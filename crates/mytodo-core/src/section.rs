use serde::{Deserialize, Serialize};

pub const DEFAULT_SECTION_ICON: &str = "📁";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub sort_order: i64,
    /// Active tasks (not completed, not deleted) filed under this section.
    #[serde(default)]
    pub task_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSection {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

impl CreateSection {
    pub fn icon_or_default(&self) -> &str {
        match self.icon.as_deref() {
            Some(icon) if !icon.trim().is_empty() => icon,
            _ => DEFAULT_SECTION_ICON,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl UpdateSection {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.icon.is_none() && self.sort_order.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderSections {
    #[serde(rename = "sectionIds")]
    pub section_ids: Vec<i64>,
}
