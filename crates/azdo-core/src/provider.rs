//! Provider traits for Azure DevOps work tracking, sprints and wikis.
//!
//! The MCP tool handlers only talk to these traits; the HTTP-backed
//! implementation lives in the `azdo-client` crate.

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Result;
use crate::patch::PatchOperation;
use crate::relations::RelationKind;
use crate::tags::{TagOperation, TagSet};
use crate::types::{
    Comment, CreateWorkItemInput, Expand, Iteration, PageWrite, QueryResult, RecursionLevel,
    Template, TemplateSummary, Timeframe, Wiki, WikiMatch, WikiPage, WorkItem, WorkItemId,
};

/// Work item operations.
#[async_trait]
pub trait WorkItemProvider: Send + Sync {
    /// Create a work item of `input.work_item_type`.
    async fn create_work_item(&self, input: CreateWorkItemInput) -> Result<WorkItem>;

    /// Apply a patch document to an existing work item.
    async fn update_work_item(
        &self,
        id: WorkItemId,
        document: Vec<PatchOperation>,
    ) -> Result<WorkItem>;

    /// Fetch a single work item.
    async fn get_work_item(&self, id: WorkItemId, expand: Expand) -> Result<WorkItem>;

    /// Fetch several work items in one call.
    async fn get_work_items(&self, ids: &[WorkItemId], expand: Expand) -> Result<Vec<WorkItem>>;

    /// Run a WIQL query and fetch details for the leading matches.
    async fn query_work_items(&self, wiql: &str) -> Result<QueryResult>;

    /// Link `source` to `target`.
    async fn add_relation(
        &self,
        source: WorkItemId,
        target: WorkItemId,
        kind: RelationKind,
    ) -> Result<WorkItem>;

    /// Remove the link of `kind` from `source` to `target`.
    async fn remove_relation(
        &self,
        source: WorkItemId,
        target: WorkItemId,
        kind: RelationKind,
    ) -> Result<WorkItem>;

    /// Append a discussion comment.
    async fn add_comment(&self, id: WorkItemId, text: &str) -> Result<WorkItem>;

    /// List discussion comments.
    async fn get_comments(&self, id: WorkItemId) -> Result<Vec<Comment>>;

    /// Add or remove tags, returning the resulting set.
    async fn update_tags(
        &self,
        id: WorkItemId,
        operation: TagOperation,
        tags: &TagSet,
    ) -> Result<TagSet>;

    /// Templates for a work item type.
    async fn get_templates(&self, work_item_type: &str) -> Result<Vec<TemplateSummary>>;

    /// A template with its default field values.
    async fn get_template(&self, id: Uuid) -> Result<Template>;

    /// Create a work item from a template, `overrides` winning over defaults.
    async fn create_from_template(
        &self,
        id: Uuid,
        overrides: Map<String, Value>,
    ) -> Result<WorkItem>;

    /// Upload `content` and attach it to the work item.
    async fn add_attachment(
        &self,
        id: WorkItemId,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<WorkItem>;

    /// Detach the attachment whose URL contains `attachment_id`.
    async fn remove_attachment(&self, id: WorkItemId, attachment_id: &str) -> Result<WorkItem>;
}

/// Sprint (iteration) operations.
#[async_trait]
pub trait SprintProvider: Send + Sync {
    /// Team iterations, optionally restricted to a timeframe.
    async fn get_iterations(
        &self,
        team: Option<&str>,
        timeframe: Option<Timeframe>,
    ) -> Result<Vec<Iteration>>;
}

/// Wiki operations.
#[async_trait]
pub trait WikiProvider: Send + Sync {
    /// Wikis owned by the project.
    async fn list_wikis(&self) -> Result<Vec<Wiki>>;

    /// Pick one wiki according to `policy`.
    async fn resolve_wiki(&self, policy: WikiMatch) -> Result<Wiki>;

    /// Fetch a page tree rooted at `path`.
    async fn get_page(
        &self,
        wiki: &Wiki,
        path: &str,
        recursion: RecursionLevel,
        include_content: bool,
    ) -> Result<WikiPage>;

    /// Create the page or replace its content.
    async fn upsert_page(&self, wiki: &Wiki, path: &str, content: &str) -> Result<PageWrite>;
}

/// Full Azure DevOps provider.
pub trait Provider: WorkItemProvider + SprintProvider + WikiProvider {
    /// Project the provider is bound to.
    fn project(&self) -> &str;
}
