//! Tag set algebra over the `System.Tags` field.
//!
//! Azure DevOps stores tags as a single string delimited by `;`. A [`TagSet`]
//! keeps tags trimmed, non-empty and unique, in first-seen order.

use std::fmt;

use serde::Deserialize;

/// Separator used when writing `System.Tags`.
pub const TAG_SEPARATOR: &str = "; ";

/// Add-or-remove edit requested by a caller, for tags and relations alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagOperation {
    Add,
    Remove,
}

impl TagOperation {
    /// Past-tense verb used in result text.
    pub fn past_tense(&self) -> &'static str {
        match self {
            TagOperation::Add => "added",
            TagOperation::Remove => "removed",
        }
    }
}

/// Ordered, duplicate-free set of tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    /// Parse a stored `System.Tags` value.
    pub fn parse(raw: &str) -> Self {
        Self::from_parts(raw.split(';'))
    }

    /// Parse a caller-supplied comma-separated list.
    pub fn from_list(raw: &str) -> Self {
        Self::from_parts(raw.split(','))
    }

    fn from_parts<'a>(parts: impl Iterator<Item = &'a str>) -> Self {
        let mut set = Self::default();
        for part in parts {
            set.insert(part);
        }
        set
    }

    fn insert(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() && !self.contains(tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag.trim())
    }

    /// Union with `other`, keeping existing order.
    pub fn add(&mut self, other: &TagSet) {
        for tag in &other.tags {
            self.insert(tag);
        }
    }

    /// Difference with `other`.
    pub fn remove(&mut self, other: &TagSet) {
        self.tags.retain(|t| !other.contains(t));
    }

    /// Apply `operation` with `other` as operand.
    pub fn apply(&mut self, operation: TagOperation, other: &TagSet) {
        match operation {
            TagOperation::Add => self.add(other),
            TagOperation::Remove => self.remove(other),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Value to write back to `System.Tags`.
    pub fn to_field_value(&self) -> String {
        self.tags.join(TAG_SEPARATOR)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_field_value())
    }
}
