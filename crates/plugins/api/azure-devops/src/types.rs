//! Azure DevOps API response types.
//!
//! These types represent the raw JSON responses from the REST API.
//! Work items already match the unified shape and are decoded straight
//! into `azdo_core::WorkItem`; everything else is mapped.

use azdo_core::Timeframe;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Generic `{ count, value }` collection envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueList<T> {
    #[serde(default)]
    pub count: usize,
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

// =============================================================================
// Work item tracking
// =============================================================================

/// WIQL query response.
#[derive(Debug, Clone, Deserialize)]
pub struct WiqlResponse {
    /// Matching work item references, in result order
    #[serde(default, rename = "workItems")]
    pub work_items: Vec<WorkItemReference>,
}

/// Reference to a work item returned by WIQL.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemReference {
    pub id: u32,
    #[serde(default)]
    pub url: Option<String>,
}

/// Identity reference (comment author, assignee).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityRef {
    #[serde(default, rename = "displayName")]
    pub display_name: String,
    #[serde(default, rename = "uniqueName")]
    pub unique_name: Option<String>,
}

/// Comments page.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureCommentList {
    #[serde(default, rename = "totalCount")]
    pub total_count: usize,
    #[serde(default)]
    pub comments: Vec<AzureComment>,
}

/// A work item comment.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureComment {
    pub id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "createdBy")]
    pub created_by: Option<IdentityRef>,
    #[serde(default, rename = "createdDate")]
    pub created_date: Option<DateTime<Utc>>,
}

/// Result of an attachment upload.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentReference {
    pub id: String,
    pub url: String,
}

/// Work item template.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureTemplate {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "workItemTypeName")]
    pub work_item_type_name: String,
    /// Default field values (only present when fetched by ID)
    #[serde(default)]
    pub fields: Map<String, Value>,
}

// =============================================================================
// Iterations
// =============================================================================

/// Team iteration.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureIteration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub attributes: IterationAttributes,
}

/// Iteration dates and timeframe.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IterationAttributes {
    #[serde(default, rename = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "finishDate")]
    pub finish_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "timeFrame")]
    pub time_frame: Option<Timeframe>,
}

// =============================================================================
// Wikis
// =============================================================================

/// Wiki descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureWiki {
    pub id: String,
    pub name: String,
    /// `projectWiki` or `codeWiki`
    #[serde(default, rename = "type")]
    pub wiki_type: Option<String>,
}

/// Wiki page with optional content and children.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AzureWikiPage {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "isParentPage")]
    pub is_parent_page: bool,
    #[serde(default, rename = "subPages")]
    pub sub_pages: Vec<AzureWikiPage>,
}
