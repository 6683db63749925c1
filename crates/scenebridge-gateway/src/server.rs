//! The MCP tool surface: translates `rmcp` tool calls into bridge envelopes
//! over [`BridgeClient`], and bridge envelopes back into `CallToolResult`s.

use crate::client::BridgeClient;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

/// `execute_code` source above this length is auto-sent as base64 rather than
/// JSON-escaped inline, to avoid pathological escaping of long or quote-heavy
/// strings.
const AUTO_BASE64_THRESHOLD: usize = 4096;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetObjectInfoRequest {
    pub object_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetViewportScreenshotRequest {
    pub max_size: Option<u32>,
    pub filepath: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteCodeRequest {
    pub code: String,
    #[serde(default)]
    pub send_as_base64: bool,
    #[serde(default)]
    pub return_as_base64: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PutPersistDataRequest {
    pub key: String,
    pub data: Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPersistDataRequest {
    pub key: String,
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemovePersistDataRequest {
    pub key: String,
}

#[derive(Clone)]
pub struct GatewayServer {
    client: BridgeClient,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GatewayServer {
    pub fn new(client: BridgeClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Summarize the current scene: object count, up to 10 objects, material count.")]
    async fn get_scene_info(&self) -> Result<CallToolResult, ErrorData> {
        self.call_bridge(json!({"type": "get_scene_info"})).await
    }

    #[tool(description = "Fetch detail (transform, visibility, materials, mesh stats) for a named scene object.")]
    async fn get_object_info(
        &self,
        Parameters(req): Parameters<GetObjectInfoRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        self.call_bridge(json!({
            "type": "get_object_info",
            "params": {"object_name": req.object_name},
        }))
        .await
    }

    #[tool(description = "Capture the viewport and return it as image content. Fails in headless mode.")]
    async fn get_viewport_screenshot(
        &self,
        Parameters(req): Parameters<GetViewportScreenshotRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let mut params = serde_json::Map::new();
        if let Some(max_size) = req.max_size {
            params.insert("max_size".into(), json!(max_size));
        }
        if let Some(filepath) = req.filepath {
            params.insert("filepath".into(), json!(filepath));
        }
        // The tool surface advertises "png"|"jpeg"; the bridge's router only
        // knows "png"|"jpg", so normalize before forwarding.
        let format = match req.format.as_deref() {
            Some("jpeg") => "jpg".to_string(),
            Some(other) => other.to_string(),
            None => "png".to_string(),
        };
        params.insert("format".into(), json!(format));

        let envelope = match self
            .client
            .call(json!({"type": "get_viewport_screenshot", "params": params}))
            .await
        {
            Ok(envelope) => envelope,
            Err(e) => return Ok(CallToolResult::error(vec![Content::text(e.tool_message(&self.client))])),
        };

        if envelope["status"] != "success" {
            let message = envelope["message"].as_str().unwrap_or("screenshot failed").to_string();
            return Ok(CallToolResult::error(vec![Content::text(message)]));
        }

        let image_base64 = envelope["result"]["image_base64"].as_str().unwrap_or_default();
        let mime_type = match format.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            _ => "image/png",
        };
        Ok(CallToolResult::success(vec![Content::image(image_base64.to_string(), mime_type.to_string())]))
    }

    #[tool(description = "Execute a statement against the host's scripting surface and return captured stdout.")]
    async fn execute_code(
        &self,
        Parameters(req): Parameters<ExecuteCodeRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let send_as_base64 = req.send_as_base64 || should_auto_base64(&req.code);
        let code_field = if send_as_base64 {
            BASE64.encode(req.code.as_bytes())
        } else {
            req.code
        };

        let envelope = match self
            .client
            .call(json!({
                "type": "execute_code",
                "params": {
                    "code": code_field,
                    "code_is_base64": send_as_base64,
                    "return_as_base64": req.return_as_base64,
                },
            }))
            .await
        {
            Ok(envelope) => envelope,
            Err(e) => return Ok(CallToolResult::error(vec![Content::text(e.tool_message(&self.client))])),
        };

        if envelope["status"] != "success" {
            let message = envelope["message"].as_str().unwrap_or("execute_code failed").to_string();
            return Ok(CallToolResult::error(vec![Content::text(message)]));
        }

        let result = envelope["result"]["result"].as_str().unwrap_or_default();
        let text = if envelope["result"]["result_is_base64"].as_bool().unwrap_or(false) {
            match BASE64.decode(result) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => return Ok(CallToolResult::error(vec![Content::text(format!(
                    "bridge returned invalid base64: {e}"
                ))])),
            }
        } else {
            result.to_string()
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Probe the bridge with a trivial call and report connectivity.")]
    async fn check_connection_status(&self) -> Result<CallToolResult, ErrorData> {
        let (connected, last_error) = match self.client.call(json!({"type": "get_scene_info"})).await {
            Ok(envelope) if envelope["status"] == "success" => (true, None),
            Ok(envelope) => (false, envelope["message"].as_str().map(str::to_string)),
            Err(e) => (false, Some(e.tool_message(&self.client))),
        };
        let mut body = json!({
            "connected": connected,
            "host": self.client.host(),
            "port": self.client.port(),
        });
        if let Some(err) = last_error {
            body["last_error"] = json!(err);
        }
        Ok(CallToolResult::success(vec![Content::text(body.to_string())]))
    }

    #[tool(description = "Store a JSON value under a key in the bridge's session-scoped persist map.")]
    async fn put_persist_data(
        &self,
        Parameters(req): Parameters<PutPersistDataRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        self.call_bridge(json!({
            "type": "put_persist_data",
            "params": {"key": req.key, "data": req.data},
        }))
        .await
    }

    #[tool(description = "Retrieve a value from the bridge's persist map, with an optional default.")]
    async fn get_persist_data(
        &self,
        Parameters(req): Parameters<GetPersistDataRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let mut params = serde_json::Map::new();
        params.insert("key".into(), json!(req.key));
        if let Some(default) = req.default {
            params.insert("default".into(), default);
        }
        self.call_bridge(json!({"type": "get_persist_data", "params": params})).await
    }

    #[tool(description = "Remove a key from the bridge's persist map.")]
    async fn remove_persist_data(
        &self,
        Parameters(req): Parameters<RemovePersistDataRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        self.call_bridge(json!({
            "type": "remove_persist_data",
            "params": {"key": req.key},
        }))
        .await
    }
}

impl GatewayServer {
    /// Shared plumbing for tools whose success result is just the bridge's
    /// `result` object, JSON-stringified.
    async fn call_bridge(&self, request: Value) -> Result<CallToolResult, ErrorData> {
        match self.client.call(request).await {
            Ok(envelope) if envelope["status"] == "success" => {
                Ok(CallToolResult::success(vec![Content::text(envelope["result"].to_string())]))
            }
            Ok(envelope) => {
                let message = envelope["message"].as_str().unwrap_or("bridge call failed").to_string();
                Ok(CallToolResult::error(vec![Content::text(message)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.tool_message(&self.client))])),
        }
    }
}

fn should_auto_base64(code: &str) -> bool {
    code.len() > AUTO_BASE64_THRESHOLD || code.contains(['"', '\'']) || code.chars().any(|c| c.is_control() && c != '\n')
}

#[tool_handler]
impl ServerHandler for GatewayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "scenebridge-gateway".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Exposes a 3D-content host's scripting surface as MCP tools by relaying each \
                 call to the scenebridge TCP bridge."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_base64_on_length() {
        let code = "x".repeat(AUTO_BASE64_THRESHOLD + 1);
        assert!(should_auto_base64(&code));
    }

    #[test]
    fn auto_base64_on_quotes() {
        assert!(should_auto_base64("print('hi')"));
        assert!(should_auto_base64("print(\"hi\")"));
    }

    #[test]
    fn no_auto_base64_for_simple_code() {
        assert!(!should_auto_base64("host.add_cube(name=X)"));
    }
}
