//! Work item tags.

use azdo_core::{Expand, TagOperation, TagSet, WorkItemId, WorkItemProvider};
use serde::Deserialize;
use serde_json::Value;

use super::{failure, params, ToolHandler};
use crate::args;
use crate::protocol::ToolCallResult;

#[derive(Debug, Deserialize)]
struct ManageTagsParams {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
    operation: TagOperation,
    tags: String,
}

#[derive(Debug, Deserialize)]
struct GetTagsParams {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
}

impl ToolHandler {
    pub(super) async fn manage_work_item_tags(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: ManageTagsParams = params!("manage_work_item_tags", arguments);

        let tags = TagSet::from_list(&params.tags);
        if tags.is_empty() {
            return ToolCallResult::error("No tags given".to_string());
        }

        match self.provider.update_tags(params.id, params.operation, &tags).await {
            Ok(_) => ToolCallResult::text(format!(
                "Successfully {} tags for work item #{}",
                params.operation.past_tense(),
                params.id
            )),
            Err(e) => failure("Failed to update tags", e),
        }
    }

    pub(super) async fn get_work_item_tags(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: GetTagsParams = params!("get_work_item_tags", arguments);

        let item = match self.provider.get_work_item(params.id, Expand::None).await {
            Ok(item) => item,
            Err(e) => return failure("Failed to get work item", e),
        };

        let tags = item.tags();
        if tags.is_empty() {
            return ToolCallResult::text(format!("No tags found for work item #{}", params.id));
        }

        ToolCallResult::text(format!("Tags for work item #{}:\n{}", params.id, tags))
    }
}
