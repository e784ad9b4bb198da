//! Azure DevOps API client implementation.
//!
//! Endpoints are project scoped: `{organization}/{project}/_apis/...`, with
//! an optional team segment after the project for team settings.

use async_trait::async_trait;
use azdo_core::patch::{self, PatchOperation};
use azdo_core::relations::{self, RelationKind};
use azdo_core::{
    fields, Comment, ConnectionSettings, CreateWorkItemInput, Error, Expand, Iteration, Provider,
    QueryResult, Result, SprintProvider, TagOperation, TagSet, Template, TemplateSummary,
    Timeframe, WorkItem, WorkItemId, WorkItemProvider, QUERY_DETAIL_LIMIT,
};
use reqwest::{Method, Url};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::http::{Body, HttpClient};
use crate::types::{
    AttachmentReference, AzureComment, AzureCommentList, AzureIteration, AzureTemplate,
    ValueList, WiqlResponse,
};

/// Work item tracking API version.
pub(crate) const WIT_API_VERSION: &str = "7.1";

/// Comments API version.
const COMMENTS_API_VERSION: &str = "7.1-preview.4";

/// Wiki and iteration API version.
pub(crate) const PREVIEW_API_VERSION: &str = "7.2-preview";

/// Comment stored on relations created by the bridge.
const RELATION_COMMENT: &str = "Added via MCP";

/// Azure DevOps API client.
pub struct AzureDevOpsClient {
    pub(crate) organization_url: String,
    pub(crate) project: String,
    pub(crate) http: HttpClient,
}

impl AzureDevOpsClient {
    /// Create a client from resolved connection settings.
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        Self::with_base_url(
            settings.organization_url.as_str(),
            settings.project.as_str(),
            settings.token.as_str(),
        )
    }

    /// Create a client with explicit organization URL (also used for testing with httpmock).
    pub fn with_base_url(
        base_url: impl Into<String>,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| {
            Error::Config(format!("Invalid organization URL '{}': {}", base_url, e))
        })?;

        Ok(Self {
            organization_url: base_url,
            project: project.into(),
            http: HttpClient::new(token)?,
        })
    }

    /// Organization URL without trailing slash.
    pub fn organization_url(&self) -> &str {
        &self.organization_url
    }

    /// Project-scoped endpoint `{org}/{project}/{segments}?{query}`.
    ///
    /// Segments are percent-encoded individually, so project, team and
    /// work item type names may contain spaces.
    pub(crate) fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.organization_url).map_err(|e| {
            Error::Config(format!(
                "Invalid organization URL '{}': {}",
                self.organization_url, e
            ))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                Error::Config(format!(
                    "Organization URL cannot carry a path: {}",
                    self.organization_url
                ))
            })?
            .pop_if_empty()
            .push(&self.project)
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    fn work_item_endpoint(&self, id: WorkItemId, query: &[(&str, &str)]) -> Result<Url> {
        let id = id.to_string();
        self.endpoint(&["_apis", "wit", "workitems", &id], query)
    }

    /// POST a patch document to `workitems/$<type>`.
    async fn create_with_document(
        &self,
        work_item_type: &str,
        document: Vec<PatchOperation>,
    ) -> Result<WorkItem> {
        if work_item_type.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Work item type must not be empty".to_string(),
            ));
        }

        let type_segment = format!("${}", work_item_type);
        let url = self.endpoint(
            &["_apis", "wit", "workitems", &type_segment],
            &[("api-version", WIT_API_VERSION)],
        )?;

        debug!(
            work_item_type = work_item_type,
            operations = document.len(),
            "Creating work item"
        );

        self.http
            .call(Method::POST, url, Body::JsonPatch(document), None)
            .await?
            .json()
    }
}

#[async_trait]
impl WorkItemProvider for AzureDevOpsClient {
    async fn create_work_item(&self, input: CreateWorkItemInput) -> Result<WorkItem> {
        let document = patch::create_document(&input);
        self.create_with_document(&input.work_item_type, document)
            .await
    }

    async fn update_work_item(
        &self,
        id: WorkItemId,
        document: Vec<PatchOperation>,
    ) -> Result<WorkItem> {
        let url = self.work_item_endpoint(id, &[("api-version", WIT_API_VERSION)])?;
        debug!(id = id, operations = document.len(), "Updating work item");

        self.http
            .call(Method::PATCH, url, Body::JsonPatch(document), None)
            .await?
            .json()
    }

    async fn get_work_item(&self, id: WorkItemId, expand: Expand) -> Result<WorkItem> {
        let mut query = Vec::new();
        if let Some(expand) = expand.as_query() {
            query.push(("$expand", expand));
        }
        query.push(("api-version", WIT_API_VERSION));

        let url = self.work_item_endpoint(id, &query)?;
        self.http
            .call(Method::GET, url, Body::Empty, None)
            .await?
            .json()
    }

    async fn get_work_items(&self, ids: &[WorkItemId], expand: Expand) -> Result<Vec<WorkItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let mut query = vec![("ids", id_list.as_str())];
        if let Some(expand) = expand.as_query() {
            query.push(("$expand", expand));
        }
        query.push(("api-version", WIT_API_VERSION));

        let url = self.endpoint(&["_apis", "wit", "workitems"], &query)?;
        let list: ValueList<WorkItem> = self
            .http
            .call(Method::GET, url, Body::Empty, None)
            .await?
            .json()?;

        let mut items = list.value;
        items.sort_by_key(|item| {
            ids.iter()
                .position(|id| *id == item.id)
                .unwrap_or(usize::MAX)
        });
        Ok(items)
    }

    /// Run the query, then fetch details for at most [`QUERY_DETAIL_LIMIT`]
    /// matches in result order. A failed detail fetch is not an error: the
    /// result carries the IDs only.
    async fn query_work_items(&self, wiql: &str) -> Result<QueryResult> {
        let url = self.endpoint(
            &["_apis", "wit", "wiql"],
            &[("api-version", WIT_API_VERSION)],
        )?;

        let response: WiqlResponse = self
            .http
            .call(Method::POST, url, Body::Json(json!({ "query": wiql })), None)
            .await?
            .json()?;

        let ids: Vec<WorkItemId> = response.work_items.iter().map(|r| r.id).collect();
        debug!(matches = ids.len(), "WIQL query completed");

        if ids.is_empty() {
            return Ok(QueryResult {
                ids,
                items: Some(Vec::new()),
            });
        }

        let shown = &ids[..ids.len().min(QUERY_DETAIL_LIMIT)];
        let items = match self.get_work_items(shown, Expand::None).await {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(error = %e, "Failed to fetch details for query results");
                None
            }
        };

        Ok(QueryResult { ids, items })
    }

    async fn add_relation(
        &self,
        source: WorkItemId,
        target: WorkItemId,
        kind: RelationKind,
    ) -> Result<WorkItem> {
        let mut attributes = Map::new();
        attributes.insert("comment".to_string(), json!(RELATION_COMMENT));

        let target_url = relations::work_item_url(&self.organization_url, target);
        let op = PatchOperation::add_relation(kind.link_type(), &target_url, attributes);
        self.update_work_item(source, vec![op]).await
    }

    /// Remove a link in two steps:
    /// 1. Fetch `source` with its relations
    /// 2. Patch `remove /relations/<index>` for the first link of `kind`
    ///    whose URL is exactly the target's
    ///
    /// The steps are not atomic: a concurrent edit of the relation list
    /// between them can shift the index.
    async fn remove_relation(
        &self,
        source: WorkItemId,
        target: WorkItemId,
        kind: RelationKind,
    ) -> Result<WorkItem> {
        let item = self.get_work_item(source, Expand::Relations).await?;
        if item.relations.is_empty() {
            return Err(Error::NotFound("Work item has no relations".to_string()));
        }

        let target_url = relations::work_item_url(&self.organization_url, target);
        let index = relations::find_link(&item.relations, kind, &target_url)
            .ok_or_else(|| Error::NotFound("Specified relation not found".to_string()))?;

        debug!(
            source = source,
            target = target,
            index = index,
            "Removing relation"
        );
        self.update_work_item(source, vec![PatchOperation::remove_relation(index)])
            .await
    }

    async fn add_comment(&self, id: WorkItemId, text: &str) -> Result<WorkItem> {
        self.update_work_item(id, vec![PatchOperation::add_field(fields::HISTORY, text)])
            .await
    }

    async fn get_comments(&self, id: WorkItemId) -> Result<Vec<Comment>> {
        let id = id.to_string();
        let url = self.endpoint(
            &["_apis", "wit", "workItems", &id, "comments"],
            &[("api-version", COMMENTS_API_VERSION)],
        )?;

        let list: AzureCommentList = self
            .http
            .call(Method::GET, url, Body::Empty, None)
            .await?
            .json()?;

        Ok(list.comments.into_iter().map(map_comment).collect())
    }

    async fn update_tags(
        &self,
        id: WorkItemId,
        operation: TagOperation,
        tags: &TagSet,
    ) -> Result<TagSet> {
        let item = self.get_work_item(id, Expand::None).await?;
        let mut current = item.tags();
        current.apply(operation, tags);

        self.update_work_item(
            id,
            vec![PatchOperation::replace_field(
                fields::TAGS,
                current.to_field_value(),
            )],
        )
        .await?;

        Ok(current)
    }

    async fn get_templates(&self, work_item_type: &str) -> Result<Vec<TemplateSummary>> {
        let url = self.endpoint(
            &["_apis", "wit", "templates"],
            &[
                ("workitemtypename", work_item_type),
                ("api-version", WIT_API_VERSION),
            ],
        )?;

        let list: ValueList<AzureTemplate> = self
            .http
            .call(Method::GET, url, Body::Empty, None)
            .await?
            .json()?;

        Ok(list.value.into_iter().map(map_template_summary).collect())
    }

    async fn get_template(&self, id: Uuid) -> Result<Template> {
        let id = id.to_string();
        let url = self.endpoint(
            &["_apis", "wit", "templates", &id],
            &[("api-version", WIT_API_VERSION)],
        )?;

        let template: AzureTemplate = self
            .http
            .call(Method::GET, url, Body::Empty, None)
            .await?
            .json()?;

        Ok(map_template(template))
    }

    async fn create_from_template(
        &self,
        id: Uuid,
        overrides: Map<String, Value>,
    ) -> Result<WorkItem> {
        let template = self.get_template(id).await?;
        if template.work_item_type.is_empty() {
            return Err(Error::InvalidData(format!(
                "Template {} has no work item type",
                id
            )));
        }

        let mut values = template.fields;
        values.extend(overrides);

        self.create_with_document(&template.work_item_type, patch::fields_document(&values))
            .await
    }

    async fn add_attachment(
        &self,
        id: WorkItemId,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<WorkItem> {
        let url = self.endpoint(
            &["_apis", "wit", "attachments"],
            &[("fileName", file_name), ("api-version", WIT_API_VERSION)],
        )?;

        debug!(id = id, file_name = file_name, size = content.len(), "Uploading attachment");

        let reference: AttachmentReference = self
            .http
            .call(Method::POST, url, Body::Binary(content), None)
            .await?
            .json()?;

        let mut attributes = Map::new();
        attributes.insert("name".to_string(), json!(file_name));
        let op = PatchOperation::add_relation(relations::ATTACHED_FILE, &reference.url, attributes);
        self.update_work_item(id, vec![op]).await
    }

    /// Same read-then-patch flow as [`Self::remove_relation`]; the attachment
    /// is matched by URL substring.
    async fn remove_attachment(&self, id: WorkItemId, attachment_id: &str) -> Result<WorkItem> {
        let item = self.get_work_item(id, Expand::Relations).await?;
        if relations::attachments(&item.relations).is_empty() {
            return Err(Error::NotFound("Work item has no attachments".to_string()));
        }

        let index = relations::find_attachment(&item.relations, attachment_id)
            .ok_or_else(|| Error::NotFound("Attachment not found".to_string()))?;

        self.update_work_item(id, vec![PatchOperation::remove_relation(index)])
            .await
    }
}

#[async_trait]
impl SprintProvider for AzureDevOpsClient {
    async fn get_iterations(
        &self,
        team: Option<&str>,
        timeframe: Option<Timeframe>,
    ) -> Result<Vec<Iteration>> {
        let mut segments = Vec::new();
        if let Some(team) = team.map(str::trim).filter(|t| !t.is_empty()) {
            segments.push(team);
        }
        segments.extend(["_apis", "work", "teamsettings", "iterations"]);

        let mut query = Vec::new();
        if let Some(timeframe) = timeframe.and_then(|t| t.as_query()) {
            query.push(("$timeframe", timeframe));
        }
        query.push(("api-version", PREVIEW_API_VERSION));

        let url = self.endpoint(&segments, &query)?;
        let list: ValueList<AzureIteration> = self
            .http
            .call(Method::GET, url, Body::Empty, None)
            .await?
            .json()?;

        Ok(list.value.into_iter().map(map_iteration).collect())
    }
}

impl Provider for AzureDevOpsClient {
    fn project(&self) -> &str {
        &self.project
    }
}

// =============================================================================
// Mapping functions
// =============================================================================

fn map_comment(comment: AzureComment) -> Comment {
    Comment {
        id: comment.id,
        text: comment.text,
        author: comment
            .created_by
            .map(|u| u.display_name)
            .unwrap_or_default(),
        created_at: comment.created_date,
    }
}

fn map_template_summary(template: AzureTemplate) -> TemplateSummary {
    TemplateSummary {
        id: template.id,
        name: template.name,
        description: template.description.unwrap_or_default(),
        work_item_type: template.work_item_type_name,
    }
}

fn map_template(template: AzureTemplate) -> Template {
    Template {
        id: template.id,
        name: template.name,
        work_item_type: template.work_item_type_name,
        fields: template.fields,
    }
}

fn map_iteration(iteration: AzureIteration) -> Iteration {
    Iteration {
        id: iteration.id,
        name: iteration.name,
        path: iteration.path,
        start_date: iteration.attributes.start_date,
        finish_date: iteration.attributes.finish_date,
        timeframe: iteration
            .attributes
            .time_frame
            .unwrap_or(Timeframe::Unknown),
    }
}
