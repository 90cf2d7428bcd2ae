//! MCP surface: tool listing and dispatch onto the Kinsta client.

use crate::error::ServerError;
use crate::registry::{self, Operation};
use kinsta_api_client::classify::ErrorKind;
use kinsta_api_client::config;
use kinsta_api_client::{ClientCache, envelope};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData as McpError, Implementation, JsonObject,
    ListToolsResult, PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Zero-network probe reporting whether credentials are present.
pub const CHECK_CONFIGURATION_TOOL: &str = "kinsta_check_configuration";

const INSTRUCTIONS: &str = "Tools for managing WordPress sites hosted on Kinsta. \
Errors are prefixed with their kind in parentheses; RATE_LIMITED, SERVER_ERROR and TIMEOUT \
may be retried after a pause, other kinds will fail again unchanged. \
Long-running tools return an operation_id: poll kinsta_get_operation_status for the result.";

#[derive(Clone, Debug)]
pub struct KinstaServer {
    cache: Arc<ClientCache>,
}

impl KinstaServer {
    #[must_use]
    pub fn new(cache: Arc<ClientCache>) -> Self {
        Self { cache }
    }

    #[must_use]
    pub fn cache(&self) -> &ClientCache {
        &self.cache
    }

    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = registry::operations().iter().map(Operation::tool).collect();
        tools.push(check_configuration_tool());
        tools
    }

    /// Execute a tool call.
    ///
    /// Failures of the call itself (credentials, arguments, API errors) are rendered into the
    /// returned result.
    ///
    /// # Errors
    ///
    /// Returns an error only if `name` is not a registered tool.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ServerError> {
        if name == CHECK_CONFIGURATION_TOOL {
            return Ok(self.check_configuration());
        }

        let op = registry::find(name).ok_or_else(|| ServerError::UnknownTool(name.to_string()))?;
        let args = arguments.unwrap_or_default();

        let client = match self.cache.get_client() {
            Ok(client) => client,
            Err(message) => return Ok(envelope::auth_failure(&message)),
        };

        let req = match op.build_request(&args, client.config()) {
            Ok(req) => req,
            Err(e) => {
                warn!(tool = %name, error = %e, "rejected tool arguments");
                return Ok(envelope::validation_failure(&e.to_string()));
            }
        };

        let result = client.request(&req).await;
        match &result {
            Ok(_) => info!(tool = %name, "tool call succeeded"),
            Err(e) => {
                if e.kind() == ErrorKind::Unauthorized {
                    // Credentials were rejected; reload them on the next call.
                    self.cache.invalidate();
                }
                info!(tool = %name, kind = %e.kind(), "tool call failed");
            }
        }
        Ok(envelope::render(result, op.resource))
    }

    fn check_configuration(&self) -> CallToolResult {
        let env = self.cache.env();
        envelope::success(json!({
            "configured": config::is_configured(env),
            "baseUrl": config::base_url(env),
        }))
    }
}

fn check_configuration_tool() -> Tool {
    let schema = json!({"type": "object", "properties": {}});
    let schema = schema.as_object().cloned().unwrap_or_default();
    let mut tool = Tool::new(
        CHECK_CONFIGURATION_TOOL,
        "Report whether Kinsta credentials are configured. Makes no API calls.",
        Arc::new(schema),
    );
    let mut annotations =
        crate::semantics::annotations_for(&reqwest::Method::GET, "Check configuration");
    annotations.open_world_hint = Some(false);
    tool.annotations = Some(annotations);
    tool
}

impl ServerHandler for KinstaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Kinsta MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tools(),
            ..Default::default()
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            self.call(&request.name, request.arguments)
                .await
                .map_err(|e| McpError::invalid_params(e.to_string(), None))
        }
    }
}
