//! Tool handlers for MCP server.
//!
//! This module implements the actual tool execution logic: each tool
//! decodes its typed params, calls the provider and folds the outcome into
//! a single text result.

mod attachments;
mod comments;
mod relations;
mod sprints;
mod tags;
mod templates;
mod wiki;
mod work_items;

use std::fmt::Display;
use std::sync::Arc;

use azdo_core::Provider;
use serde_json::Value;

use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::tools::{catalog, ToolDescriptor};

/// Tool handler that executes tools against a provider.
pub struct ToolHandler {
    provider: Arc<dyn Provider>,
    tools: Vec<ToolDescriptor>,
}

impl ToolHandler {
    /// Create a new tool handler bound to `provider`.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            tools: catalog(),
        }
    }

    /// Get available tool definitions.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolDescriptor::to_definition).collect()
    }

    /// Project the provider is bound to.
    pub fn project(&self) -> &str {
        self.provider.project()
    }

    /// Execute a tool by name with arguments.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let Some(tool) = self.tools.iter().find(|t| t.name == name) else {
            return ToolCallResult::error(format!("Unknown tool: {}", name));
        };

        if let Err(reason) = tool.validate(arguments.as_ref()) {
            return ToolCallResult::error(format!("Invalid arguments for {}: {}", name, reason));
        }

        tracing::debug!(tool = name, "Executing tool");

        match name {
            "create_work_item" => self.create_work_item(arguments).await,
            "update_work_item" => self.update_work_item(arguments).await,
            "query_work_items" => self.query_work_items(arguments).await,
            "get_work_item_details" => self.get_work_item_details(arguments).await,
            "get_work_item_fields" => self.get_work_item_fields(arguments).await,
            "batch_create_work_items" => self.batch_create_work_items(arguments).await,
            "batch_update_work_items" => self.batch_update_work_items(arguments).await,
            "manage_work_item_relations" => self.manage_work_item_relations(arguments).await,
            "get_related_work_items" => self.get_related_work_items(arguments).await,
            "add_work_item_comment" => self.add_work_item_comment(arguments).await,
            "get_work_item_comments" => self.get_work_item_comments(arguments).await,
            "manage_work_item_tags" => self.manage_work_item_tags(arguments).await,
            "get_work_item_tags" => self.get_work_item_tags(arguments).await,
            "get_work_item_templates" => self.get_work_item_templates(arguments).await,
            "create_from_template" => self.create_from_template(arguments).await,
            "add_work_item_attachment" => self.add_work_item_attachment(arguments).await,
            "get_work_item_attachments" => self.get_work_item_attachments(arguments).await,
            "remove_work_item_attachment" => self.remove_work_item_attachment(arguments).await,
            "get_current_sprint" => self.get_current_sprint(arguments).await,
            "get_sprints" => self.get_sprints(arguments).await,
            "manage_wiki_page" => self.manage_wiki_page(arguments).await,
            "get_wiki_page" => self.get_wiki_page(arguments).await,
            "list_wiki_pages" => self.list_wiki_pages(arguments).await,
            "search_wiki" => self.search_wiki(arguments).await,
            "get_available_wikis" => self.get_available_wikis().await,
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }
}

/// Error result carrying the failed operation and its cause.
fn failure(context: &str, error: impl Display) -> ToolCallResult {
    ToolCallResult::error(format!("{}: {}", context, error))
}

/// Decode params or return the error result from the enclosing handler.
macro_rules! params {
    ($tool:literal, $arguments:expr) => {
        match crate::args::parse_args($tool, $arguments) {
            Ok(params) => params,
            Err(result) => return result,
        }
    };
}
pub(crate) use params;
