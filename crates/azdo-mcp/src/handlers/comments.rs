//! Discussion comments.

use azdo_core::{Comment, WorkItemId, WorkItemProvider};
use serde::Deserialize;
use serde_json::Value;

use super::{failure, params, ToolHandler};
use crate::args;
use crate::protocol::ToolCallResult;

#[derive(Debug, Deserialize)]
struct AddCommentParams {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
    text: String,
}

#[derive(Debug, Deserialize)]
struct GetCommentsParams {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
}

impl ToolHandler {
    pub(super) async fn add_work_item_comment(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: AddCommentParams = params!("add_work_item_comment", arguments);

        match self.provider.add_comment(params.id, &params.text).await {
            Ok(item) => ToolCallResult::text(format!("Added comment to work item #{}", item.id)),
            Err(e) => failure("Failed to add comment", e),
        }
    }

    pub(super) async fn get_work_item_comments(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: GetCommentsParams = params!("get_work_item_comments", arguments);

        let comments = match self.provider.get_comments(params.id).await {
            Ok(comments) => comments,
            Err(e) => return failure("Failed to get comments", e),
        };

        if comments.is_empty() {
            return ToolCallResult::text(format!(
                "No comments found for work item #{}",
                params.id
            ));
        }

        let blocks: Vec<String> = comments.iter().map(format_comment).collect();
        ToolCallResult::text(blocks.join("\n"))
    }
}

fn format_comment(comment: &Comment) -> String {
    let at = comment
        .created_at
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    let author = if comment.author.is_empty() {
        "Unknown"
    } else {
        comment.author.as_str()
    };
    format!("Comment by {} at {}:\n{}\n---", author, at, comment.text)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{api, handler};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_comment_writes_history() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path(api("wit/workitems/5"))
                .json_body(json!([
                    {"op": "add", "path": "/fields/System.History", "value": "Looks good"}
                ]));
            then.status(200).json_body(json!({"id": 5, "fields": {}}));
        });

        let result = handler(&server)
            .execute(
                "add_work_item_comment",
                Some(json!({"id": 5, "text": "Looks good"})),
            )
            .await;

        mock.assert();
        assert_eq!(result.first_text(), "Added comment to work item #5");
    }

    #[tokio::test]
    async fn test_get_comments() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET)
                .path(api("wit/workItems/5/comments"))
                .query_param("api-version", "7.1-preview.4");
            then.status(200).json_body(json!({
                "totalCount": 2,
                "comments": [
                    {
                        "id": 1,
                        "text": "First",
                        "createdBy": {"displayName": "Ada"},
                        "createdDate": "2024-03-01T09:30:00Z"
                    },
                    {"id": 2, "text": "Second"}
                ]
            }));
        });

        let result = handler(&server)
            .execute("get_work_item_comments", Some(json!({"id": 5})))
            .await;

        let text = result.first_text();
        assert!(text.starts_with("Comment by Ada at 2024-03-01 09:30:00 UTC:\nFirst\n---\n"));
        assert!(text.ends_with("Comment by Unknown at unknown time:\nSecond\n---"));
    }

    #[tokio::test]
    async fn test_get_comments_empty() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path(api("wit/workItems/5/comments"));
            then.status(200).json_body(json!({"totalCount": 0, "comments": []}));
        });

        let result = handler(&server)
            .execute("get_work_item_comments", Some(json!({"id": "5"})))
            .await;

        assert!(!result.is_error());
        assert_eq!(result.first_text(), "No comments found for work item #5");
    }
}
