//! Unified domain types for Azure DevOps work tracking and wikis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::tags::TagSet;

/// Numeric work item identifier.
pub type WorkItemId = u32;

/// Maximum number of query matches whose details are fetched.
pub const QUERY_DETAIL_LIMIT: usize = 20;

/// Work item types offered by the create tools.
pub const WORK_ITEM_TYPES: &[&str] = &["Epic", "Feature", "User Story", "Task", "Bug"];

// =============================================================================
// Field references
// =============================================================================

/// Well-known field reference names.
pub mod fields {
    pub const ID: &str = "System.Id";
    pub const TITLE: &str = "System.Title";
    pub const DESCRIPTION: &str = "System.Description";
    pub const STATE: &str = "System.State";
    pub const WORK_ITEM_TYPE: &str = "System.WorkItemType";
    pub const ASSIGNED_TO: &str = "System.AssignedTo";
    pub const TAGS: &str = "System.Tags";
    pub const HISTORY: &str = "System.History";
    pub const PRIORITY: &str = "Microsoft.VSTS.Common.Priority";

    /// Map a batch-update alias to its field reference.
    ///
    /// Only `Title`, `Description`, `State` and `Priority` are accepted.
    pub fn from_alias(alias: &str) -> Option<&'static str> {
        match alias {
            "Title" => Some(TITLE),
            "Description" => Some(DESCRIPTION),
            "State" => Some(STATE),
            "Priority" => Some(PRIORITY),
            _ => None,
        }
    }

    /// Whether `name` can be used as a `/fields/<name>` patch path.
    pub fn is_valid_reference(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    }
}

// =============================================================================
// Work items
// =============================================================================

/// A work item with its field bag and relation list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl WorkItem {
    /// String value of a field, if present and textual.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn title(&self) -> &str {
        self.field_str(fields::TITLE).unwrap_or_default()
    }

    pub fn state(&self) -> &str {
        self.field_str(fields::STATE).unwrap_or_default()
    }

    pub fn work_item_type(&self) -> &str {
        self.field_str(fields::WORK_ITEM_TYPE).unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.field_str(fields::DESCRIPTION).unwrap_or_default()
    }

    /// Parsed `System.Tags` value.
    pub fn tags(&self) -> TagSet {
        TagSet::parse(self.field_str(fields::TAGS).unwrap_or_default())
    }
}

/// A typed link from a work item to another resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Link type reference name (e.g. `System.LinkTypes.Related`)
    pub rel: String,
    /// Target resource URL
    pub url: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Input for creating a work item.
#[derive(Debug, Clone, Default)]
pub struct CreateWorkItemInput {
    pub work_item_type: String,
    pub title: String,
    pub description: String,
    pub priority: Option<String>,
}

/// How much of a work item to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expand {
    #[default]
    None,
    Relations,
    All,
}

impl Expand {
    /// Value of the `$expand` query parameter.
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            Expand::None => None,
            Expand::Relations => Some("relations"),
            Expand::All => Some("all"),
        }
    }
}

/// Outcome of a WIQL query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Every matching ID, in result order
    pub ids: Vec<WorkItemId>,
    /// Details of the first [`QUERY_DETAIL_LIMIT`] matches, `None` when
    /// the detail fetch failed
    pub items: Option<Vec<WorkItem>>,
}

/// An attachment linked to a work item.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Attachment identifier (last URL segment)
    pub id: String,
    pub name: String,
    pub url: String,
}

// =============================================================================
// Comments
// =============================================================================

/// A discussion comment on a work item.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub text: String,
    pub author: String,
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Templates
// =============================================================================

/// Work item template summary as returned by a list call.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub work_item_type: String,
}

/// A template with its default field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub work_item_type: String,
    pub fields: Map<String, Value>,
}

// =============================================================================
// Iterations
// =============================================================================

/// Relative position of an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Past,
    Current,
    Future,
    #[serde(other)]
    Unknown,
}

impl Timeframe {
    /// Value of the `$timeframe` query parameter.
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            Timeframe::Past => Some("past"),
            Timeframe::Current => Some("current"),
            Timeframe::Future => Some("future"),
            Timeframe::Unknown => None,
        }
    }
}

/// A sprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    pub id: String,
    pub name: String,
    pub path: String,
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
    pub timeframe: Timeframe,
}

// =============================================================================
// Wikis
// =============================================================================

/// A wiki attached to the project.
#[derive(Debug, Clone, PartialEq)]
pub struct Wiki {
    pub id: String,
    pub name: String,
}

/// Rule used to pick a wiki among those the project owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikiMatch {
    /// Name contains the project name verbatim
    ProjectName,
    /// Lower-cased name contains the space-stripped project name or "documentation"
    Documentation,
}

/// Depth of a page tree fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionLevel {
    None,
    OneLevel,
    Full,
}

impl RecursionLevel {
    /// Value of the `recursionLevel` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            RecursionLevel::None => "none",
            RecursionLevel::OneLevel => "oneLevel",
            RecursionLevel::Full => "full",
        }
    }
}

/// A wiki page and, depending on recursion, its descendants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WikiPage {
    pub path: String,
    pub content: Option<String>,
    pub is_parent_page: bool,
    pub sub_pages: Vec<WikiPage>,
}

impl WikiPage {
    /// The page followed by all descendants, depth first.
    pub fn flatten(&self) -> Vec<&WikiPage> {
        let mut pages = vec![self];
        for child in &self.sub_pages {
            pages.extend(child.flatten());
        }
        pages
    }
}

/// Whether an upsert created or replaced the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageWrite {
    Created,
    Updated,
}
