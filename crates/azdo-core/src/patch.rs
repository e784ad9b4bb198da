//! JSON Patch documents for work item writes.
//!
//! Every work item mutation is expressed as a list of [`PatchOperation`]s
//! sent with the `application/json-patch+json` content type.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{fields, CreateWorkItemInput};

/// Content type of a patch document.
pub const CONTENT_TYPE: &str = "application/json-patch+json";

/// Path that appends to the relation list.
pub const RELATIONS_APPEND: &str = "/relations/-";

/// Patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

/// Single entry of a patch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }

    /// `add /fields/<field>`.
    pub fn add_field(field: &str, value: impl Into<Value>) -> Self {
        Self::add(field_path(field), value.into())
    }

    /// `replace /fields/<field>`.
    pub fn replace_field(field: &str, value: impl Into<Value>) -> Self {
        Self::replace(field_path(field), value.into())
    }

    /// Append a relation to `url` of type `rel`.
    pub fn add_relation(rel: &str, url: &str, attributes: Map<String, Value>) -> Self {
        Self::add(
            RELATIONS_APPEND,
            json!({
                "rel": rel,
                "url": url,
                "attributes": attributes,
            }),
        )
    }

    /// Remove the relation at `index`.
    pub fn remove_relation(index: usize) -> Self {
        Self::remove(format!("/relations/{}", index))
    }
}

/// `/fields/<field>`.
pub fn field_path(field: &str) -> String {
    format!("/fields/{}", field)
}

/// Document for a new work item: title, description, then priority if given.
pub fn create_document(input: &CreateWorkItemInput) -> Vec<PatchOperation> {
    let mut document = vec![
        PatchOperation::add_field(fields::TITLE, input.title.as_str()),
        PatchOperation::add_field(fields::DESCRIPTION, input.description.as_str()),
    ];
    if let Some(priority) = &input.priority {
        document.push(PatchOperation::add_field(fields::PRIORITY, priority.as_str()));
    }
    document
}

/// Document that seeds a new work item from merged field values.
pub fn fields_document(values: &Map<String, Value>) -> Vec<PatchOperation> {
    values
        .iter()
        .map(|(field, value)| PatchOperation::add_field(field, value.clone()))
        .collect()
}
