//! Work item creation, updates, queries and field inspection.

use azdo_core::{
    fields, CreateWorkItemInput, Expand, PatchOperation, WorkItemId, WorkItemProvider,
};
use serde::Deserialize;
use serde_json::Value;

use super::{failure, params, ToolHandler};
use crate::args;
use crate::protocol::ToolCallResult;

#[derive(Debug, Deserialize)]
struct CreateWorkItemParams {
    #[serde(rename = "type")]
    work_item_type: String,
    title: String,
    description: String,
    #[serde(default, deserialize_with = "args::optional_text")]
    priority: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateWorkItemParams {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
    field: String,
    #[serde(deserialize_with = "args::text")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct QueryParams {
    query: String,
}

#[derive(Debug, Deserialize)]
struct DetailsParams {
    ids: String,
}

#[derive(Debug, Deserialize)]
struct FieldsParams {
    #[serde(deserialize_with = "args::work_item_id")]
    work_item_id: WorkItemId,
    #[serde(default)]
    field_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchCreateParams {
    #[serde(deserialize_with = "args::embedded_json")]
    items: Vec<BatchItem>,
}

#[derive(Debug, Deserialize)]
struct BatchItem {
    #[serde(rename = "type")]
    work_item_type: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "args::optional_text")]
    priority: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateParams {
    #[serde(deserialize_with = "args::embedded_json")]
    updates: Vec<BatchUpdate>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdate {
    #[serde(deserialize_with = "args::work_item_id")]
    id: WorkItemId,
    field: String,
    #[serde(deserialize_with = "args::text")]
    value: String,
}

impl ToolHandler {
    pub(super) async fn create_work_item(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: CreateWorkItemParams = params!("create_work_item", arguments);

        let input = CreateWorkItemInput {
            work_item_type: params.work_item_type,
            title: params.title,
            description: params.description,
            priority: params.priority,
        };

        match self.provider.create_work_item(input).await {
            Ok(item) => {
                ToolCallResult::text(format!("Created work item #{}: {}", item.id, item.title()))
            }
            Err(e) => failure("Failed to create work item", e),
        }
    }

    pub(super) async fn update_work_item(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: UpdateWorkItemParams = params!("update_work_item", arguments);

        if !fields::is_valid_reference(&params.field) {
            return ToolCallResult::error(format!("Invalid field reference: {}", params.field));
        }

        let document = vec![PatchOperation::replace_field(&params.field, params.value)];
        match self.provider.update_work_item(params.id, document).await {
            Ok(item) => ToolCallResult::text(format!("Updated work item #{}", item.id)),
            Err(e) => failure("Failed to update work item", e),
        }
    }

    pub(super) async fn query_work_items(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: QueryParams = params!("query_work_items", arguments);

        let result = match self.provider.query_work_items(&params.query).await {
            Ok(result) => result,
            Err(e) => return failure("Failed to query work items", e),
        };

        if result.ids.is_empty() {
            return ToolCallResult::text("No work items found matching the query.".to_string());
        }

        let mut lines = vec![
            format!(
                "Found {} work items. Showing details for the first {}:",
                result.ids.len(),
                result.ids.len().min(azdo_core::QUERY_DETAIL_LIMIT)
            ),
            String::new(),
        ];

        match result.items.as_deref() {
            Some(items) if !items.is_empty() => {
                lines.extend(items.iter().map(|item| {
                    format!(
                        "ID: {} - [{}] {} ({})",
                        item.id,
                        item.work_item_type(),
                        item.title(),
                        item.state()
                    )
                }));
            }
            // Details unavailable: list every match by ID
            _ => lines.extend(result.ids.iter().map(|id| format!("ID: {}", id))),
        }

        ToolCallResult::text(lines.join("\n"))
    }

    pub(super) async fn get_work_item_details(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: DetailsParams = params!("get_work_item_details", arguments);

        let mut ids = Vec::new();
        for raw in params.ids.split(',') {
            match raw.trim().parse::<WorkItemId>() {
                Ok(id) => ids.push(id),
                Err(_) => {
                    return ToolCallResult::error(format!("Invalid ID format: {}", raw.trim()))
                }
            }
        }

        let items = match self.provider.get_work_items(&ids, Expand::All).await {
            Ok(items) => items,
            Err(e) => return failure("Failed to get work items", e),
        };

        let blocks: Vec<String> = items
            .iter()
            .map(|item| {
                format!(
                    "ID: {}\nTitle: {}\nState: {}\nDescription: {}\n---\n",
                    item.id,
                    item.title(),
                    item.state(),
                    item.description()
                )
            })
            .collect();

        ToolCallResult::text(blocks.join("\n"))
    }

    pub(super) async fn get_work_item_fields(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: FieldsParams = params!("get_work_item_fields", arguments);

        let item = match self
            .provider
            .get_work_item(params.work_item_id, Expand::None)
            .await
        {
            Ok(item) => item,
            Err(e) => return failure("Failed to get work item details", e),
        };

        let filter = params
            .field_name
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty());

        let mut matching: Vec<(&String, &Value)> = item
            .fields
            .iter()
            .filter(|(name, _)| match filter {
                Some(f) => name.to_lowercase().contains(&f.to_lowercase()),
                None => true,
            })
            .collect();
        matching.sort_by(|a, b| a.0.cmp(b.0));

        if matching.is_empty() {
            return ToolCallResult::text(match filter {
                Some(f) => format!("No fields found matching: {}", f),
                None => "No fields found".to_string(),
            });
        }

        let blocks: Vec<String> = matching
            .into_iter()
            .map(|(name, value)| {
                format!(
                    "Field: {}\nValue: {}\nType: {}\n---",
                    name,
                    display_value(value),
                    type_name(value)
                )
            })
            .collect();

        ToolCallResult::text(blocks.join("\n"))
    }

    pub(super) async fn batch_create_work_items(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: BatchCreateParams = params!("batch_create_work_items", arguments);

        if params.items.is_empty() {
            return ToolCallResult::text("No work items to create".to_string());
        }

        let mut lines = Vec::with_capacity(params.items.len());
        for item in params.items {
            let title = item.title.clone();
            let input = CreateWorkItemInput {
                work_item_type: item.work_item_type,
                title: item.title,
                description: item.description,
                priority: item.priority,
            };

            match self.provider.create_work_item(input).await {
                Ok(created) => lines.push(format!("Created work item #{}: {}", created.id, title)),
                Err(e) => lines.push(format!("Failed to create '{}': {}", title, e)),
            }
        }

        ToolCallResult::text(lines.join("\n"))
    }

    pub(super) async fn batch_update_work_items(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: BatchUpdateParams = params!("batch_update_work_items", arguments);

        if params.updates.is_empty() {
            return ToolCallResult::text("No updates to apply".to_string());
        }

        let mut lines = Vec::with_capacity(params.updates.len());
        for update in params.updates {
            let Some(reference) = fields::from_alias(&update.field) else {
                lines.push(format!("Invalid field for #{}: {}", update.id, update.field));
                continue;
            };

            let document = vec![PatchOperation::replace_field(reference, update.value)];
            match self.provider.update_work_item(update.id, document).await {
                Ok(item) => lines.push(format!("Updated work item #{}", item.id)),
                Err(e) => lines.push(format!("Failed to update #{}: {}", update.id, e)),
            }
        }

        ToolCallResult::text(lines.join("\n"))
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{api, handler};
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn work_item(id: u32, kind: &str, title: &str, state: &str) -> Value {
        json!({
            "id": id,
            "fields": {
                "System.WorkItemType": kind,
                "System.Title": title,
                "System.State": state
            }
        })
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&json!("a")), "string");
        assert_eq!(type_name(&json!(2)), "number");
        assert_eq!(type_name(&json!({"displayName": "x"})), "object");
        assert_eq!(display_value(&json!("Active")), "Active");
        assert_eq!(display_value(&json!(2)), "2");
    }

    #[tokio::test]
    async fn test_create_bug_reports_returned_title() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(api("wit/workitems/$Bug"))
                .json_body(json!([
                    {"op": "add", "path": "/fields/System.Title", "value": "Login fails"},
                    {"op": "add", "path": "/fields/System.Description", "value": "500 on submit"}
                ]));
            then.status(200)
                .json_body(work_item(42, "Bug", "Login fails", "New"));
        });

        let result = handler(&server)
            .execute(
                "create_work_item",
                Some(json!({
                    "type": "Bug",
                    "title": "Login fails",
                    "description": "500 on submit"
                })),
            )
            .await;

        mock.assert();
        assert!(!result.is_error());
        assert_eq!(result.first_text(), "Created work item #42: Login fails");
    }

    #[tokio::test]
    async fn test_create_failure_is_wrapped() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path(api("wit/workitems/$Task"));
            then.status(400).json_body(json!({"message": "TF401320: Rule Error"}));
        });

        let result = handler(&server)
            .execute(
                "create_work_item",
                Some(json!({"type": "Task", "title": "t", "description": "d", "priority": 2})),
            )
            .await;

        assert!(result.is_error());
        assert_eq!(
            result.first_text(),
            "Failed to create work item: API error 400: TF401320: Rule Error"
        );
    }

    #[tokio::test]
    async fn test_update_state_closed() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path(api("wit/workitems/42"))
                .json_body(json!([
                    {"op": "replace", "path": "/fields/State", "value": "Closed"}
                ]));
            then.status(200)
                .json_body(work_item(42, "Bug", "Login fails", "Closed"));
        });

        let result = handler(&server)
            .execute(
                "update_work_item",
                Some(json!({"id": "42", "field": "State", "value": "Closed"})),
            )
            .await;

        mock.assert();
        assert_eq!(result.first_text(), "Updated work item #42");
    }

    #[tokio::test]
    async fn test_update_rejects_bad_field_reference() {
        let server = MockServer::start();

        let result = handler(&server)
            .execute(
                "update_work_item",
                Some(json!({"id": 42, "field": "../relations/0", "value": "x"})),
            )
            .await;

        assert!(result.is_error());
        assert_eq!(
            result.first_text(),
            "Invalid field reference: ../relations/0"
        );
    }

    #[tokio::test]
    async fn test_update_rejects_bad_id() {
        let server = MockServer::start();

        let result = handler(&server)
            .execute(
                "update_work_item",
                Some(json!({"id": "forty-two", "field": "State", "value": "x"})),
            )
            .await;

        assert!(result.is_error());
        assert!(result
            .first_text()
            .starts_with("Invalid arguments for update_work_item: Invalid ID format"));
    }

    #[tokio::test]
    async fn test_query_renders_header_and_lines() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST)
                .path(api("wit/wiql"))
                .json_body(json!({"query": "SELECT [System.Id] FROM WorkItems"}));
            then.status(200).json_body(json!({
                "workItems": [{"id": 7, "url": "u"}, {"id": 3, "url": "u"}]
            }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path(api("wit/workitems"))
                .query_param("ids", "7,3");
            then.status(200).json_body(json!({
                "count": 2,
                "value": [
                    work_item(3, "Task", "Write docs", "Active"),
                    work_item(7, "Bug", "Crash", "New")
                ]
            }));
        });

        let result = handler(&server)
            .execute(
                "query_work_items",
                Some(json!({"query": "SELECT [System.Id] FROM WorkItems"})),
            )
            .await;

        assert_eq!(
            result.first_text(),
            "Found 2 work items. Showing details for the first 2:\n\n\
             ID: 7 - [Bug] Crash (New)\n\
             ID: 3 - [Task] Write docs (Active)"
        );
    }

    #[tokio::test]
    async fn test_query_header_states_true_total() {
        let server = MockServer::start();

        let refs: Vec<Value> = (1..=23).map(|id| json!({"id": id, "url": "u"})).collect();
        server.mock(|when, then| {
            when.method(POST).path(api("wit/wiql"));
            then.status(200).json_body(json!({"workItems": refs}));
        });
        let details: Vec<Value> = (1..=20)
            .map(|id| work_item(id, "Task", "t", "New"))
            .collect();
        server.mock(|when, then| {
            when.method(GET).path(api("wit/workitems"));
            then.status(200)
                .json_body(json!({"count": 20, "value": details}));
        });

        let result = handler(&server)
            .execute("query_work_items", Some(json!({"query": "SELECT"})))
            .await;

        let text = result.first_text();
        assert!(text.starts_with("Found 23 work items. Showing details for the first 20:"));
        assert_eq!(text.lines().filter(|l| l.starts_with("ID: ")).count(), 20);
    }

    #[tokio::test]
    async fn test_query_falls_back_to_ids() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path(api("wit/wiql"));
            then.status(200)
                .json_body(json!({"workItems": [{"id": 5, "url": "u"}, {"id": 6, "url": "u"}]}));
        });
        server.mock(|when, then| {
            when.method(GET).path(api("wit/workitems"));
            then.status(503).body("");
        });

        let result = handler(&server)
            .execute("query_work_items", Some(json!({"query": "SELECT"})))
            .await;

        assert!(!result.is_error());
        assert_eq!(
            result.first_text(),
            "Found 2 work items. Showing details for the first 2:\n\nID: 5\nID: 6"
        );
    }

    #[tokio::test]
    async fn test_query_falls_back_to_ids_when_details_are_empty() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path(api("wit/wiql"));
            then.status(200).json_body(json!({
                "workItems": [{"id": 1, "url": "u"}, {"id": 2, "url": "u"}, {"id": 3, "url": "u"}]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path(api("wit/workitems"));
            then.status(200).json_body(json!({"count": 0, "value": []}));
        });

        let result = handler(&server)
            .execute("query_work_items", Some(json!({"query": "SELECT"})))
            .await;

        assert_eq!(
            result.first_text(),
            "Found 3 work items. Showing details for the first 3:\n\nID: 1\nID: 2\nID: 3"
        );
    }

    #[tokio::test]
    async fn test_query_without_matches() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path(api("wit/wiql"));
            then.status(200).json_body(json!({"workItems": []}));
        });

        let result = handler(&server)
            .execute("query_work_items", Some(json!({"query": "SELECT"})))
            .await;

        assert_eq!(
            result.first_text(),
            "No work items found matching the query."
        );
    }

    #[tokio::test]
    async fn test_details_blocks() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET)
                .path(api("wit/workitems"))
                .query_param("ids", "1,2")
                .query_param("$expand", "all");
            then.status(200).json_body(json!({
                "count": 2,
                "value": [
                    {"id": 1, "fields": {"System.Title": "A", "System.State": "New", "System.Description": "<p>a</p>"}},
                    {"id": 2, "fields": {"System.Title": "B", "System.State": "Done"}}
                ]
            }));
        });

        let result = handler(&server)
            .execute("get_work_item_details", Some(json!({"ids": "1, 2"})))
            .await;

        assert_eq!(
            result.first_text(),
            "ID: 1\nTitle: A\nState: New\nDescription: <p>a</p>\n---\n\n\
             ID: 2\nTitle: B\nState: Done\nDescription: \n---\n"
        );
    }

    #[tokio::test]
    async fn test_details_rejects_non_numeric_id() {
        let server = MockServer::start();

        let result = handler(&server)
            .execute("get_work_item_details", Some(json!({"ids": "1,abc"})))
            .await;

        assert!(result.is_error());
        assert_eq!(result.first_text(), "Invalid ID format: abc");
    }

    #[tokio::test]
    async fn test_fields_sorted_and_filtered() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path(api("wit/workitems/9"));
            then.status(200).json_body(json!({
                "id": 9,
                "fields": {
                    "System.Title": "Crash",
                    "System.State": "New",
                    "Microsoft.VSTS.Common.Priority": 2
                }
            }));
        });

        let handler = handler(&server);

        let all = handler
            .execute("get_work_item_fields", Some(json!({"work_item_id": 9})))
            .await;
        assert_eq!(
            all.first_text(),
            "Field: Microsoft.VSTS.Common.Priority\nValue: 2\nType: number\n---\n\
             Field: System.State\nValue: New\nType: string\n---\n\
             Field: System.Title\nValue: Crash\nType: string\n---"
        );

        let filtered = handler
            .execute(
                "get_work_item_fields",
                Some(json!({"work_item_id": 9, "field_name": "title"})),
            )
            .await;
        assert_eq!(
            filtered.first_text(),
            "Field: System.Title\nValue: Crash\nType: string\n---"
        );

        let none = handler
            .execute(
                "get_work_item_fields",
                Some(json!({"work_item_id": 9, "field_name": "Effort"})),
            )
            .await;
        assert_eq!(none.first_text(), "No fields found matching: Effort");
    }

    #[tokio::test]
    async fn test_batch_create_reports_each_item() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path(api("wit/workitems/$Task"));
            then.status(200).json_body(work_item(11, "Task", "First", "New"));
        });
        server.mock(|when, then| {
            when.method(POST).path(api("wit/workitems/$Bogus"));
            then.status(404)
                .json_body(json!({"message": "Work item type Bogus does not exist"}));
        });

        let items = r#"[
            {"type": "Task", "title": "First", "description": "one"},
            {"type": "Bogus", "title": "Second", "description": "two"}
        ]"#;
        let result = handler(&server)
            .execute("batch_create_work_items", Some(json!({"items": items})))
            .await;

        assert!(!result.is_error());
        assert_eq!(
            result.first_text(),
            "Created work item #11: First\n\
             Failed to create 'Second': API error 404: Work item type Bogus does not exist"
        );
    }

    #[tokio::test]
    async fn test_batch_update_partial_failure() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(PATCH)
                .path(api("wit/workitems/1"))
                .json_body(json!([
                    {"op": "replace", "path": "/fields/System.State", "value": "Active"}
                ]));
            then.status(200).json_body(work_item(1, "Task", "a", "Active"));
        });
        server.mock(|when, then| {
            when.method(PATCH)
                .path(api("wit/workitems/3"))
                .json_body(json!([
                    {"op": "replace", "path": "/fields/Microsoft.VSTS.Common.Priority", "value": "1"}
                ]));
            then.status(200).json_body(work_item(3, "Task", "c", "New"));
        });

        let result = handler(&server)
            .execute(
                "batch_update_work_items",
                Some(json!({
                    "updates": [
                        {"id": 1, "field": "State", "value": "Active"},
                        {"id": 2, "field": "Effort", "value": "5"},
                        {"id": 3, "field": "Priority", "value": 1}
                    ]
                })),
            )
            .await;

        let text = result.first_text();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(
            text.lines().filter(|l| l.starts_with("Invalid field")).count(),
            1
        );
        assert_eq!(
            text,
            "Updated work item #1\nInvalid field for #2: Effort\nUpdated work item #3"
        );
    }

    #[tokio::test]
    async fn test_batch_update_rejects_malformed_json() {
        let server = MockServer::start();

        let result = handler(&server)
            .execute("batch_update_work_items", Some(json!({"updates": "{nope"})))
            .await;

        assert!(result.is_error());
        assert!(result.first_text().contains("Invalid JSON format"));
    }
}
