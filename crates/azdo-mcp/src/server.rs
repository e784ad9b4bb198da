//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. Handle tool calls and prompt requests
//! 3. Shutdown at EOF

use std::io;
use std::sync::Arc;

use azdo_core::Provider;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::handlers::ToolHandler;
use crate::prompts::PromptRegistry;
use crate::protocol::{
    GetPromptParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, PromptsCapability, PromptsListResult, RequestId, ServerCapabilities,
    ServerInfo, ToolCallParams, ToolsCapability, ToolsListResult, MCP_VERSION,
};
use crate::transport::{IncomingMessage, StdioTransport};

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "azdo-bridge";

/// MCP server exposing Azure DevOps tools and prompts.
pub struct McpServer {
    handler: ToolHandler,
    prompts: PromptRegistry,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server bound to `provider`.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        let handler = ToolHandler::new(provider);
        let prompts = PromptRegistry::new(handler.project());
        Self {
            handler,
            prompts,
            initialized: false,
        }
    }

    /// Run the MCP server over stdin/stdout.
    pub async fn run(&mut self) -> io::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Serve requests from `transport` until EOF.
    pub async fn serve<R, W>(&mut self, transport: &mut StdioTransport<R, W>) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(project = %self.handler.project(), "Starting MCP server");

        loop {
            match transport.read_message().await {
                Ok(Some(msg)) => {
                    if let Some(response) = self.handle_message(msg).await {
                        transport.write_response(&response).await?;
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    tracing::warn!(error = %e, "Malformed message");
                    let response = JsonRpcResponse::error(
                        RequestId::Null,
                        JsonRpcError::parse_error(&e.to_string()),
                    );
                    transport.write_response(&response).await?;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Transport error");
                    return Err(e);
                }
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle an incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
        }
    }

    /// Handle a JSON-RPC request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(method = %req.method, id = ?req.id, "Handling request");

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "prompts/list" => self.handle_prompts_list(req.id),
            "prompts/get" => self.handle_prompts_get(req.id, req.params),
            method => {
                tracing::warn!(method = %method, "Unknown method");
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    /// Handle notifications (no response).
    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                tracing::info!("Client initialized");
            }
            "notifications/cancelled" => {
                tracing::debug!("Request cancelled by client");
            }
            _ => {
                tracing::debug!(method = %method, "Ignoring notification");
            }
        }
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init) => {
                    tracing::info!(
                        client = %init.client_info.name,
                        client_version = %init.client_info.version,
                        protocol = %init.protocol_version,
                        "Client connected"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse initialize params");
                }
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
                prompts: Some(PromptsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.handler.available_tools(),
        };
        JsonRpcResponse::from_result(id, &result)
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match decode_params(params) {
            Ok(params) => params,
            Err(error) => return JsonRpcResponse::error(id, error),
        };

        tracing::info!(tool = %params.name, "Calling tool");

        let result = self.handler.execute(&params.name, params.arguments).await;
        if result.is_error() {
            tracing::warn!(tool = %params.name, reason = %result.first_text(), "Tool failed");
        }

        JsonRpcResponse::from_result(id, &result)
    }

    fn handle_prompts_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = PromptsListResult {
            prompts: self.prompts.list(),
        };
        JsonRpcResponse::from_result(id, &result)
    }

    fn handle_prompts_get(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: GetPromptParams = match decode_params(params) {
            Ok(params) => params,
            Err(error) => return JsonRpcResponse::error(id, error),
        };

        match self.prompts.get(&params.name, params.arguments.as_ref()) {
            Ok(result) => JsonRpcResponse::from_result(id, &result),
            Err(reason) => JsonRpcResponse::error(id, JsonRpcError::invalid_params(&reason)),
        }
    }
}

fn decode_params<T: serde::de::DeserializeOwned>(
    params: Option<Value>,
) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(&e.to_string()))
}
