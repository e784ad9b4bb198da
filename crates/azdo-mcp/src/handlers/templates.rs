//! Work item templates.

use azdo_core::WorkItemProvider;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{failure, params, ToolHandler};
use crate::protocol::ToolCallResult;

#[derive(Debug, Deserialize)]
struct GetTemplatesParams {
    #[serde(rename = "type")]
    work_item_type: String,
}

#[derive(Debug, Deserialize)]
struct CreateFromTemplateParams {
    template_id: String,
    field_values: Value,
}

impl ToolHandler {
    pub(super) async fn get_work_item_templates(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: GetTemplatesParams = params!("get_work_item_templates", arguments);

        let templates = match self.provider.get_templates(&params.work_item_type).await {
            Ok(templates) => templates,
            Err(e) => return failure("Failed to get templates", e),
        };

        if templates.is_empty() {
            return ToolCallResult::text(format!(
                "No templates found for type: {}",
                params.work_item_type
            ));
        }

        let blocks: Vec<String> = templates
            .iter()
            .map(|t| {
                format!(
                    "Template ID: {}\nName: {}\nDescription: {}\n---",
                    t.id, t.name, t.description
                )
            })
            .collect();

        ToolCallResult::text(blocks.join("\n"))
    }

    pub(super) async fn create_from_template(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: CreateFromTemplateParams = params!("create_from_template", arguments);

        let overrides = match field_values(params.field_values) {
            Ok(values) => values,
            Err(reason) => {
                return ToolCallResult::error(format!("Invalid field values JSON: {}", reason))
            }
        };

        let id = match Uuid::parse_str(params.template_id.trim()) {
            Ok(id) => id,
            Err(e) => return ToolCallResult::error(format!("Invalid template ID format: {}", e)),
        };

        match self.provider.create_from_template(id, overrides).await {
            Ok(item) => {
                ToolCallResult::text(format!("Created work item #{} from template", item.id))
            }
            Err(e) => failure("Failed to create work item from template", e),
        }
    }
}

/// Field overrides given as a JSON object or as a string holding one.
fn field_values(value: Value) -> Result<Map<String, Value>, String> {
    let value = match value {
        Value::String(s) => serde_json::from_str(&s).map_err(|e| e.to_string())?,
        other => other,
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected an object, got {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{api, handler};
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const TEMPLATE_ID: &str = "2f0a8f3c-5b4e-4f7e-9d6c-1a2b3c4d5e6f";

    #[test]
    fn test_field_values_shapes() {
        assert_eq!(
            field_values(json!({"System.Title": "x"})).unwrap()["System.Title"],
            "x"
        );
        assert_eq!(
            field_values(json!("{\"System.Title\": \"y\"}")).unwrap()["System.Title"],
            "y"
        );
        assert!(field_values(json!("[1, 2]")).is_err());
        assert!(field_values(json!("{broken")).is_err());
    }

    #[tokio::test]
    async fn test_list_templates() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET)
                .path(api("wit/templates"))
                .query_param("workitemtypename", "Bug");
            then.status(200).json_body(json!({
                "count": 1,
                "value": [{
                    "id": TEMPLATE_ID,
                    "name": "Triage",
                    "description": "Standard triage bug",
                    "workItemTypeName": "Bug"
                }]
            }));
        });

        let result = handler(&server)
            .execute("get_work_item_templates", Some(json!({"type": "Bug"})))
            .await;

        assert_eq!(
            result.first_text(),
            format!(
                "Template ID: {}\nName: Triage\nDescription: Standard triage bug\n---",
                TEMPLATE_ID
            )
        );
    }

    #[tokio::test]
    async fn test_list_templates_empty() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path(api("wit/templates"));
            then.status(200).json_body(json!({"count": 0, "value": []}));
        });

        let result = handler(&server)
            .execute("get_work_item_templates", Some(json!({"type": "Epic"})))
            .await;

        assert_eq!(result.first_text(), "No templates found for type: Epic");
    }

    #[tokio::test]
    async fn test_create_from_template_overrides_win() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path(api(&format!("wit/templates/{}", TEMPLATE_ID)));
            then.status(200).json_body(json!({
                "id": TEMPLATE_ID,
                "name": "Triage",
                "workItemTypeName": "Bug",
                "fields": {"System.Title": "Default", "System.State": "New"}
            }));
        });
        let create = server.mock(|when, then| {
            when.method(POST)
                .path(api("wit/workitems/$Bug"))
                .body_includes(r#"{"op":"add","path":"/fields/System.Title","value":"Broken login"}"#)
                .body_includes(r#"{"op":"add","path":"/fields/System.State","value":"New"}"#);
            then.status(200)
                .json_body(json!({"id": 77, "fields": {"System.Title": "Broken login"}}));
        });

        let result = handler(&server)
            .execute(
                "create_from_template",
                Some(json!({
                    "template_id": TEMPLATE_ID,
                    "field_values": "{\"System.Title\": \"Broken login\"}"
                })),
            )
            .await;

        create.assert();
        assert_eq!(result.first_text(), "Created work item #77 from template");
    }

    #[tokio::test]
    async fn test_create_from_template_rejects_bad_input() {
        let server = MockServer::start();
        let handler = handler(&server);

        let bad_id = handler
            .execute(
                "create_from_template",
                Some(json!({"template_id": "not-a-uuid", "field_values": {}})),
            )
            .await;
        assert!(bad_id.is_error());
        assert!(bad_id.first_text().starts_with("Invalid template ID format"));

        let bad_values = handler
            .execute(
                "create_from_template",
                Some(json!({"template_id": TEMPLATE_ID, "field_values": "{oops"})),
            )
            .await;
        assert!(bad_values.is_error());
        assert!(bad_values.first_text().starts_with("Invalid field values JSON"));
    }
}
