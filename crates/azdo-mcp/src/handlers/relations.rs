//! Links between work items.

use std::collections::BTreeSet;

use azdo_core::relations::linked_ids;
use azdo_core::{Expand, RelationKind, TagOperation, WorkItemId, WorkItemProvider};
use serde::Deserialize;
use serde_json::Value;

use super::{failure, params, ToolHandler};
use crate::args;
use crate::protocol::ToolCallResult;

#[derive(Debug, Deserialize)]
struct ManageRelationParams {
    #[serde(deserialize_with = "args::work_item_id")]
    source_id: WorkItemId,
    #[serde(deserialize_with = "args::work_item_id")]
    target_id: WorkItemId,
    relation_type: String,
    operation: TagOperation,
}

#[derive(Debug, Deserialize)]
struct RelatedParams {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
    relation_type: String,
}

impl ToolHandler {
    pub(super) async fn manage_work_item_relations(
        &self,
        arguments: Option<Value>,
    ) -> ToolCallResult {
        let params: ManageRelationParams = params!("manage_work_item_relations", arguments);

        let kind: RelationKind = match params.relation_type.parse() {
            Ok(kind) => kind,
            Err(_) => return ToolCallResult::error("Invalid relation_type".to_string()),
        };

        let outcome = match params.operation {
            TagOperation::Add => {
                self.provider
                    .add_relation(params.source_id, params.target_id, kind)
                    .await
            }
            TagOperation::Remove => {
                self.provider
                    .remove_relation(params.source_id, params.target_id, kind)
                    .await
            }
        };

        match outcome {
            Ok(_) => ToolCallResult::text(format!(
                "Successfully {} {} relationship",
                params.operation.past_tense(),
                params.relation_type
            )),
            Err(e) => failure("Failed to update work item relations", e),
        }
    }

    pub(super) async fn get_related_work_items(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: RelatedParams = params!("get_related_work_items", arguments);

        let kind = match params.relation_type.as_str() {
            "all" => None,
            other => match other.parse::<RelationKind>() {
                Ok(kind) => Some(kind),
                Err(_) => return ToolCallResult::error("Invalid relation_type".to_string()),
            },
        };

        let item = match self.provider.get_work_item(params.id, Expand::Relations).await {
            Ok(item) => item,
            Err(e) => return failure("Failed to get work item", e),
        };

        if item.relations.is_empty() {
            return ToolCallResult::text("No related items found".to_string());
        }

        let ids = linked_ids(&item.relations, kind);
        if ids.is_empty() {
            let present: BTreeSet<&str> = item.relations.iter().map(|r| r.rel.as_str()).collect();
            return ToolCallResult::text(format!(
                "No matching related items found for relation type '{}'. Relation types present: {}",
                params.relation_type,
                present.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }

        let related = match self.provider.get_work_items(&ids, Expand::None).await {
            Ok(items) => items,
            Err(e) => return failure("Failed to get related items", e),
        };

        let lines: Vec<String> = related
            .iter()
            .map(|item| format!("ID: {}, Title: {}", item.id, item.title()))
            .collect();

        ToolCallResult::text(lines.join("\n"))
    }
}
