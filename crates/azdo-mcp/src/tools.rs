//! MCP tool definitions.
//!
//! The catalog is fixed: every tool the bridge offers, with the parameters
//! it accepts. Descriptors render the JSON Schema advertised by
//! `tools/list` and pre-check required and enumerated parameters before a
//! handler decodes its typed arguments.

use azdo_core::WORK_ITEM_TYPES;
use serde_json::{json, Map, Value};

use crate::protocol::ToolDefinition;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

impl ParamKind {
    fn schema_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }
}

/// One parameter of a tool.
#[derive(Debug, Clone)]
pub struct ToolParam {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub one_of: Option<&'static [&'static str]>,
    pub description: &'static str,
}

impl ToolParam {
    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::String, description)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::Number, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::Boolean, description)
    }

    fn new(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            one_of: None,
            description,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.one_of = Some(values);
        self
    }

    fn schema(&self) -> Value {
        let mut schema = json!({
            "type": self.kind.schema_type(),
            "description": self.description,
        });
        if let Some(values) = self.one_of {
            schema["enum"] = json!(values);
        }
        schema
    }

    /// Check an argument against the enumeration, if any.
    fn check(&self, value: &Value) -> Result<(), String> {
        let Some(values) = self.one_of else {
            return Ok(());
        };

        let given = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        if values.contains(&given.as_str()) {
            Ok(())
        } else {
            Err(format!(
                "{} must be one of: {} (got {})",
                self.name,
                values.join(", "),
                given
            ))
        }
    }
}

/// A tool with its parameters.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ToolParam>,
}

impl ToolDescriptor {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ToolParam) -> Self {
        self.params.push(param);
        self
    }

    /// Definition advertised by `tools/list`.
    pub fn to_definition(&self) -> ToolDefinition {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }

    /// Required parameters present and enumerated ones within range.
    pub fn validate(&self, arguments: Option<&Value>) -> Result<(), String> {
        let empty = Map::new();
        let arguments = match arguments {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => return Err("arguments must be an object".to_string()),
        };

        for param in &self.params {
            match arguments.get(param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(format!("missing required parameter '{}'", param.name));
                }
                None | Some(Value::Null) => {}
                Some(value) => param.check(value)?,
            }
        }
        Ok(())
    }
}

const PRIORITIES: &[&str] = &["1", "2", "3", "4"];
const ADD_REMOVE: &[&str] = &["add", "remove"];

/// The complete tool catalog.
pub fn catalog() -> Vec<ToolDescriptor> {
    let mut tools = work_item_tools();
    tools.extend(collaboration_tools());
    tools.extend(sprint_tools());
    tools.extend(wiki_tools());
    tools
}

fn work_item_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("create_work_item", "Create a new work item in Azure DevOps")
            .param(
                ToolParam::string("type", "Type of work item")
                    .required()
                    .one_of(WORK_ITEM_TYPES),
            )
            .param(ToolParam::string("title", "Title of the work item").required())
            .param(ToolParam::string("description", "Description of the work item").required())
            .param(
                ToolParam::string("priority", "Priority of the work item (1-4)")
                    .one_of(PRIORITIES),
            ),
        ToolDescriptor::new("update_work_item", "Update a single field of a work item")
            .param(ToolParam::number("id", "ID of the work item to update").required())
            .param(
                ToolParam::string(
                    "field",
                    "Field reference to update (e.g. System.State, Microsoft.VSTS.Common.Priority)",
                )
                .required(),
            )
            .param(ToolParam::string("value", "New value for the field").required()),
        ToolDescriptor::new("query_work_items", "Query work items using WIQL")
            .param(ToolParam::string("query", "WIQL query string").required()),
        ToolDescriptor::new(
            "get_work_item_details",
            "Get detailed information about work items",
        )
        .param(ToolParam::string("ids", "Comma-separated list of work item IDs").required()),
        ToolDescriptor::new(
            "manage_work_item_relations",
            "Add or remove relations between work items",
        )
        .param(ToolParam::number("source_id", "ID of the source work item").required())
        .param(ToolParam::number("target_id", "ID of the target work item").required())
        .param(
            ToolParam::string("relation_type", "Type of relation")
                .required()
                .one_of(&["parent", "child", "related"]),
        )
        .param(
            ToolParam::string("operation", "Operation to perform")
                .required()
                .one_of(ADD_REMOVE),
        ),
        ToolDescriptor::new("get_related_work_items", "Get work items related to a work item")
            .param(ToolParam::number("id", "ID of the work item").required())
            .param(
                ToolParam::string("relation_type", "Type of relation to follow")
                    .required()
                    .one_of(&["parent", "children", "related", "all"]),
            ),
        ToolDescriptor::new("get_work_item_fields", "Get the field values of a work item")
            .param(ToolParam::number("work_item_id", "ID of the work item").required())
            .param(ToolParam::string(
                "field_name",
                "Only show fields whose name contains this text",
            )),
        ToolDescriptor::new("batch_create_work_items", "Create several work items at once")
            .param(
                ToolParam::string(
                    "items",
                    "JSON array of {type, title, description, priority}",
                )
                .required(),
            ),
        ToolDescriptor::new("batch_update_work_items", "Update several work items at once")
            .param(
                ToolParam::string(
                    "updates",
                    "JSON array of {id, field, value}; field is one of Title, Description, State, Priority",
                )
                .required(),
            ),
    ]
}

fn collaboration_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("add_work_item_comment", "Add a comment to a work item")
            .param(ToolParam::number("id", "ID of the work item").required())
            .param(ToolParam::string("text", "Comment text").required()),
        ToolDescriptor::new("get_work_item_comments", "Get the comments of a work item")
            .param(ToolParam::number("id", "ID of the work item").required()),
        ToolDescriptor::new("manage_work_item_tags", "Add or remove tags on a work item")
            .param(ToolParam::number("id", "ID of the work item").required())
            .param(
                ToolParam::string("operation", "Operation to perform")
                    .required()
                    .one_of(ADD_REMOVE),
            )
            .param(ToolParam::string("tags", "Comma-separated list of tags").required()),
        ToolDescriptor::new("get_work_item_tags", "Get the tags of a work item")
            .param(ToolParam::number("id", "ID of the work item").required()),
        ToolDescriptor::new("get_work_item_templates", "List templates for a work item type")
            .param(ToolParam::string("type", "Work item type").required()),
        ToolDescriptor::new("create_from_template", "Create a work item from a template")
            .param(ToolParam::string("template_id", "ID of the template").required())
            .param(
                ToolParam::string("field_values", "JSON object of field values to override")
                    .required(),
            ),
        ToolDescriptor::new("add_work_item_attachment", "Attach a file to a work item")
            .param(ToolParam::number("id", "ID of the work item").required())
            .param(ToolParam::string("file_name", "Name of the file").required())
            .param(ToolParam::string("content", "Base64 encoded file content").required()),
        ToolDescriptor::new("get_work_item_attachments", "List the attachments of a work item")
            .param(ToolParam::number("id", "ID of the work item").required()),
        ToolDescriptor::new(
            "remove_work_item_attachment",
            "Remove an attachment from a work item",
        )
        .param(ToolParam::number("id", "ID of the work item").required())
        .param(ToolParam::string("attachment_id", "ID of the attachment").required()),
    ]
}

fn sprint_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("get_current_sprint", "Get the current sprint")
            .param(ToolParam::string(
                "team",
                "Team name (defaults to the project's default team)",
            )),
        ToolDescriptor::new("get_sprints", "List sprints")
            .param(ToolParam::string(
                "team",
                "Team name (defaults to the project's default team)",
            ))
            .param(ToolParam::boolean(
                "include_completed",
                "Include sprints that have already finished",
            )),
    ]
}

fn wiki_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("manage_wiki_page", "Create or update a wiki page")
            .param(ToolParam::string("path", "Path of the wiki page").required())
            .param(ToolParam::string("content", "Markdown content of the page").required()),
        ToolDescriptor::new("get_wiki_page", "Get the content of a wiki page")
            .param(ToolParam::string("path", "Path of the wiki page").required())
            .param(ToolParam::boolean(
                "include_children",
                "Also return the direct sub-pages",
            )),
        ToolDescriptor::new("list_wiki_pages", "List wiki pages")
            .param(ToolParam::string("path", "Path to list from (defaults to the root)"))
            .param(ToolParam::boolean("recursive", "List all descendants")),
        ToolDescriptor::new("search_wiki", "Search wiki pages by path and content")
            .param(ToolParam::string("query", "Text to search for").required())
            .param(ToolParam::string("path", "Limit the search to this path")),
        ToolDescriptor::new(
            "get_available_wikis",
            "List the wikis available in the project",
        ),
    ]
}
