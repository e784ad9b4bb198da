//! Prompt templates.
//!
//! Prompts are rendered locally from their arguments; none of them touch
//! the remote service.

use serde_json::{Map, Value};

use crate::protocol::{GetPromptResult, PromptArgument, PromptDefinition, PromptMessage, Role};

const BASE_FIELDS: &str =
    "[System.Id], [System.Title], [System.WorkItemType], [System.State], [System.AssignedTo]";

const WIQL_TIPS: &str = "Common WIQL Tips:\n\
- Use square brackets [] around field names\n\
- Common macros: @me, @today, @currentIteration\n\
- Date arithmetic: @today+/-n\n\
- String comparison is case-insensitive\n\
- Use 'Contains' for partial matches";

/// Query scenarios known to `wiql_query_format`.
pub const QUERY_TYPES: &[&str] = &[
    "current_sprint",
    "assigned_to_me",
    "active_bugs",
    "blocked_items",
    "recent_activity",
];

/// Registry of the prompts the server offers.
pub struct PromptRegistry {
    project: String,
}

impl PromptRegistry {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
        }
    }

    pub fn list(&self) -> Vec<PromptDefinition> {
        vec![
            PromptDefinition {
                name: "wiql_query_format".to_string(),
                description: "Helper for formatting WIQL queries for common scenarios"
                    .to_string(),
                arguments: vec![
                    argument(
                        "query_type",
                        &format!("Type of query to format ({})", QUERY_TYPES.join(", ")),
                        true,
                    ),
                    argument(
                        "additional_fields",
                        "Additional fields to include in the SELECT clause",
                        false,
                    ),
                ],
            },
            PromptDefinition {
                name: "format_work_item_description".to_string(),
                description: "Format a work item description using proper HTML for Azure DevOps"
                    .to_string(),
                arguments: vec![argument(
                    "description",
                    "The description text to format",
                    true,
                )],
            },
        ]
    }

    /// Render prompt `name`. Errors are reported as plain messages.
    pub fn get(
        &self,
        name: &str,
        arguments: Option<&Map<String, Value>>,
    ) -> Result<GetPromptResult, String> {
        let empty = Map::new();
        let arguments = arguments.unwrap_or(&empty);

        match name {
            "wiql_query_format" => self.wiql_query_format(arguments),
            "format_work_item_description" => format_description(arguments),
            _ => Err(format!("Unknown prompt: {}", name)),
        }
    }

    fn wiql_query_format(&self, arguments: &Map<String, Value>) -> Result<GetPromptResult, String> {
        let query_type = string_arg(arguments, "query_type")
            .ok_or_else(|| "query_type is required".to_string())?;

        let mut fields = BASE_FIELDS.to_string();
        if let Some(extra) = string_arg(arguments, "additional_fields") {
            let extra = extra.trim();
            if !extra.is_empty() {
                fields.push_str(", ");
                fields.push_str(extra);
            }
        }

        let (condition, explanation) = match query_type.as_str() {
            "current_sprint" => (
                format!(
                    "[System.IterationPath] = @currentIteration('{} Team')",
                    self.project
                ),
                "This query gets all work items in the current sprint. The @currentIteration macro automatically resolves to the current sprint path.",
            ),
            "assigned_to_me" => (
                "[System.AssignedTo] = @me AND [System.State] <> 'Closed'".to_string(),
                "This query gets all active work items assigned to the current user. The @me macro automatically resolves to the current user.",
            ),
            "active_bugs" => (
                "[System.WorkItemType] = 'Bug' AND [System.State] <> 'Closed' ORDER BY [Microsoft.VSTS.Common.Priority]".to_string(),
                "This query gets all active bugs, ordered by priority.",
            ),
            "blocked_items" => (
                "[System.State] <> 'Closed' AND [Microsoft.VSTS.Common.Blocked] = 'Yes'".to_string(),
                "This query gets all work items that are marked as blocked.",
            ),
            "recent_activity" => (
                "[System.ChangedDate] > @today-7 ORDER BY [System.ChangedDate] DESC".to_string(),
                "This query gets all work items modified in the last 7 days, ordered by most recent first.",
            ),
            other => {
                return Err(format!(
                    "Unknown query_type '{}'. Valid types: {}",
                    other,
                    QUERY_TYPES.join(", ")
                ))
            }
        };

        let template = format!("SELECT {} FROM WorkItems WHERE {}", fields, condition);

        Ok(GetPromptResult {
            description: "WIQL Query Format Helper".to_string(),
            messages: vec![
                PromptMessage::new(
                    Role::User,
                    "You are a WIQL query expert. Help format queries for Azure DevOps work items.",
                ),
                PromptMessage::new(
                    Role::Assistant,
                    format!(
                        "Here's a template for a {} query:\n\n```sql\n{}\n```\n\n{}\n\n{}",
                        query_type, template, explanation, WIQL_TIPS
                    ),
                ),
            ],
        })
    }
}

fn format_description(arguments: &Map<String, Value>) -> Result<GetPromptResult, String> {
    let description = string_arg(arguments, "description")
        .ok_or_else(|| "description is required".to_string())?;

    let items: Vec<String> = description
        .split('-')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| format!("<li>{}</li>", item))
        .collect();

    Ok(GetPromptResult {
        description: "Azure DevOps Work Item Description Formatter".to_string(),
        messages: vec![
            PromptMessage::new(
                Role::User,
                "You format work item descriptions for Azure DevOps. Use proper HTML formatting with <ul>, <li> for bullet points, <p> for paragraphs, and <br> for line breaks.",
            ),
            PromptMessage::new(
                Role::Assistant,
                format!(
                    "Here's your description formatted with HTML:\n\n<ul>\n{}\n</ul>",
                    items.join("\n")
                ),
            ),
        ],
    })
}

fn argument(name: &str, description: &str, required: bool) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        description: description.to_string(),
        required,
    }
}

/// Prompt arguments are strings on the wire; numbers are tolerated.
fn string_arg(arguments: &Map<String, Value>, key: &str) -> Option<String> {
    match arguments.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
