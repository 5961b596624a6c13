use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::AppError;
use crate::models::Tag;
use crate::validate::validate_name;

/// An entry as read back from storage, with its tags in attachment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Entry {
    /// The view of a name that has no stored row.
    pub fn unknown(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            tags: Vec::new(),
        }
    }

    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }
}

/// Request body for creating an entry. Also the record shape of exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl NewEntry {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)?;
        for tag in &self.tags {
            validate_name(&tag.name)?;
        }
        Ok(())
    }

    /// First tag name that appears more than once, regardless of value.
    pub fn duplicate_tag_name(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.tags
            .iter()
            .map(|t| t.name.as_str())
            .find(|name| !seen.insert(*name))
    }
}

impl From<Entry> for NewEntry {
    fn from(entry: Entry) -> Self {
        Self {
            name: entry.name,
            tags: entry.tags,
        }
    }
}
