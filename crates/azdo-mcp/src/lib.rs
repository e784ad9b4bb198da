//! MCP (Model Context Protocol) server for azdo-bridge.
//!
//! This crate exposes Azure DevOps work items, sprints and wikis to AI
//! assistants as MCP tools and prompts over newline-delimited JSON-RPC.

mod args;
pub mod handlers;
pub mod prompts;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use handlers::ToolHandler;
pub use prompts::PromptRegistry;
pub use server::McpServer;
pub use transport::{IncomingMessage, StdioTransport};
