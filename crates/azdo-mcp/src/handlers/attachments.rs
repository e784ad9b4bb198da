//! File attachments.

use azdo_core::relations::attachments;
use azdo_core::{Expand, WorkItemId, WorkItemProvider};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use super::{failure, params, ToolHandler};
use crate::args;
use crate::protocol::ToolCallResult;

#[derive(Debug, Deserialize)]
struct AddAttachmentParams {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
    file_name: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ListAttachmentsParams {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
}

#[derive(Debug, Deserialize)]
struct RemoveAttachmentParams {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
    #[serde(deserialize_with = "args::text")]
    attachment_id: String,
}

impl ToolHandler {
    pub(super) async fn add_work_item_attachment(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: AddAttachmentParams = params!("add_work_item_attachment", arguments);

        let content = match STANDARD.decode(params.content.trim()) {
            Ok(bytes) => bytes,
            Err(e) => return ToolCallResult::error(format!("Invalid base64 content: {}", e)),
        };

        match self
            .provider
            .add_attachment(params.id, &params.file_name, content)
            .await
        {
            Ok(_) => ToolCallResult::text(format!(
                "Added attachment '{}' to work item #{}",
                params.file_name, params.id
            )),
            Err(e) => failure("Failed to add attachment", e),
        }
    }

    pub(super) async fn get_work_item_attachments(
        &self,
        arguments: Option<Value>,
    ) -> ToolCallResult {
        let params: ListAttachmentsParams = params!("get_work_item_attachments", arguments);

        let item = match self.provider.get_work_item(params.id, Expand::Relations).await {
            Ok(item) => item,
            Err(e) => return failure("Failed to get work item", e),
        };

        let found = attachments(&item.relations);
        if found.is_empty() {
            return ToolCallResult::text(format!(
                "No attachments found for work item #{}",
                params.id
            ));
        }

        let blocks: Vec<String> = found
            .iter()
            .map(|a| format!("ID: {}\nName: {}\nURL: {}\n---", a.id, a.name, a.url))
            .collect();

        ToolCallResult::text(blocks.join("\n"))
    }

    pub(super) async fn remove_work_item_attachment(
        &self,
        arguments: Option<Value>,
    ) -> ToolCallResult {
        let params: RemoveAttachmentParams = params!("remove_work_item_attachment", arguments);

        if params.attachment_id.trim().is_empty() {
            return ToolCallResult::error("Attachment ID must not be empty".to_string());
        }

        match self
            .provider
            .remove_attachment(params.id, params.attachment_id.trim())
            .await
        {
            Ok(_) => {
                ToolCallResult::text(format!("Removed attachment from work item #{}", params.id))
            }
            Err(e) => failure("Failed to remove attachment", e),
        }
    }
}
