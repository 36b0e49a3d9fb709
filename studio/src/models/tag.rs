//! Tag models

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tag definition from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDefinition {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "type", default)]
    pub value_type: TagValueType,
    #[serde(default)]
    pub description: Option<String>,
    /// Allowed values for enum tags
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagValueType {
    #[default]
    String,
    Number,
    Boolean,
    Enum,
    Date,
}

/// A tag assigned to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTag {
    pub tag_name: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
}

/// A user matched by a tag query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedUser {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, serde_json::Value>,
}

/// One page of tag query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagQueryResult {
    #[serde(default)]
    pub results: Vec<TaggedUser>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

impl TagQueryResult {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit as u64)
    }

    pub fn has_next_page(&self) -> bool {
        (self.page as u64) < self.total_pages()
    }
}
