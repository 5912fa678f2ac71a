//! Protocol server implementation

use serde::Serialize;
use serde_json::{Value, json};
use std::io::{BufRead, Write};
use tracing::{debug, error, info, warn};

use super::error::McpError;
use super::protocol::*;
use super::tools;

/// Tool-call server over a line-delimited JSON-RPC transport.
///
/// Holds no state between requests; every tool is a pure function of its
/// arguments.
#[derive(Debug)]
pub struct McpServer {
    name: String,
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl McpServer {
    pub fn new() -> Self {
        Self {
            name: "uuidkit".to_string(),
        }
    }

    /// Serve stdin/stdout until stdin closes.
    pub fn run(&self) -> Result<(), McpError> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Serve one request per line from `reader`, one response per line to `writer`.
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> Result<(), McpError> {
        info!("tool server started");

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    error!("Request is not valid UTF-8: {}", e);
                    let err = McpError::Parse(e.to_string());
                    self.write_response(&mut writer, &error_value(None, &err))?;
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            debug!("Received request: {}", line);

            let response = match parse_request(line) {
                Ok(request) => self.handle_request(request),
                Err((id, err)) => {
                    error!("Failed to parse request: {}", err);
                    Some(error_value(id, &err))
                }
            };
            if let Some(response) = response {
                self.write_response(&mut writer, &response)?;
            }
        }

        info!("tool server stopped");
        Ok(())
    }

    /// Handle one request. Notifications (no `id`) get no response.
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<Value> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "notification");
            return None;
        };
        let id = Some(id);

        if request.jsonrpc != JSONRPC_VERSION {
            let err = McpError::InvalidRequest(format!("unsupported jsonrpc {}", request.jsonrpc));
            return Some(error_value(id, &err));
        }

        let result = match request.method.as_str() {
            "initialize" => to_value(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => to_value(ToolListResponse {
                tools: tools::definitions(),
            }),
            "tools/call" => self.call_tool(request.params).and_then(to_value),
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => json_value(JsonRpcResponse::new(id, value)),
            Err(e) => error_value(id, &e),
        })
    }

    fn initialize(&self) -> InitializeResponse {
        InitializeResponse {
            protocol_version: PROTOCOL_VERSION.to_string(),
            server_info: ServerInfo {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: Capabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
        }
    }

    /// Run a tool. Errors raised by the tool become an `isError` result.
    fn call_tool(&self, params: Value) -> Result<ToolCallResult, McpError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::InvalidParams("Missing tool name".to_string()))?;
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        let outcome = tools::call(name, args).ok_or_else(|| McpError::ToolNotFound(name.to_string()))?;
        match outcome {
            Ok(value) => Ok(ToolCallResult::text(serde_json::to_string_pretty(&value)?, false)),
            Err(e) => {
                warn!(tool = name, error = %e, "tool failed");
                let body = json!({ "error": e.to_string() });
                Ok(ToolCallResult::text(body.to_string(), true))
            }
        }
    }

    fn write_response<W: Write, T: Serialize>(
        &self,
        writer: &mut W,
        response: &T,
    ) -> Result<(), McpError> {
        let response_str = serde_json::to_string(response)?;
        writeln!(writer, "{}", response_str)?;
        writer.flush()?;
        debug!("Sent response: {}", response_str);
        Ok(())
    }
}

/// Parse one frame. Malformed JSON is a parse error; well-formed JSON that is
/// not a request is an invalid request, answered with its `id` when present.
fn parse_request(line: &str) -> Result<JsonRpcRequest, (Option<Value>, McpError)> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| (None, McpError::Parse(e.to_string())))?;
    let id = value.get("id").filter(|id| !id.is_null()).cloned();
    serde_json::from_value(value).map_err(|e| (id, McpError::InvalidRequest(e.to_string())))
}

fn to_value<T: Serialize>(v: T) -> Result<Value, McpError> {
    Ok(serde_json::to_value(v)?)
}

fn json_value<T: Serialize>(v: T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}

fn error_value(id: Option<Value>, err: &McpError) -> Value {
    json_value(JsonRpcError::new(id, err.error_code(), err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(v: Value) -> JsonRpcRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_initialize() {
        let server = McpServer::new();
        let r = server
            .handle_request(request(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})))
            .unwrap();
        assert_eq!(r["id"], 1);
        assert_eq!(r["result"]["serverInfo"]["name"], "uuidkit");
        assert_eq!(r["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[test]
    fn test_notification_has_no_response() {
        let server = McpServer::new();
        let r = server.handle_request(request(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        ));
        assert!(r.is_none());
    }

    #[test]
    fn test_unknown_method_and_tool() {
        let server = McpServer::new();
        let r = server
            .handle_request(request(json!({"jsonrpc": "2.0", "id": 2, "method": "nope"})))
            .unwrap();
        assert_eq!(r["error"]["code"], -32601);

        let r = server
            .handle_request(request(json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": "nope", "arguments": {}}
            })))
            .unwrap();
        assert_eq!(r["error"]["code"], -32601);

        let r = server
            .handle_request(request(json!({
                "jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {}
            })))
            .unwrap();
        assert_eq!(r["error"]["code"], -32602);
    }

    #[test]
    fn test_parse_request_distinguishes_bad_json_from_bad_shape() {
        let (id, err) = parse_request("{oops").unwrap_err();
        assert!(id.is_none());
        assert_eq!(err.error_code(), -32700);

        let (id, err) = parse_request(r#"{"jsonrpc":"2.0","id":3}"#).unwrap_err();
        assert_eq!(id, Some(json!(3)));
        assert_eq!(err.error_code(), -32600);

        let (_, err) = parse_request("[1, 2]").unwrap_err();
        assert_eq!(err.error_code(), -32600);

        assert!(parse_request(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).is_ok());
    }

    #[test]
    fn test_wrong_jsonrpc_version() {
        let server = McpServer::new();
        let r = server
            .handle_request(request(json!({"jsonrpc": "1.0", "id": 5, "method": "ping"})))
            .unwrap();
        assert_eq!(r["error"]["code"], -32600);
    }
}
