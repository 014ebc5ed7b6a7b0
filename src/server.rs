//! Request/response serving loop
//!
//! Reads line-delimited JSON tool calls, runs each invocation as its own
//! task (calls are independent and may run concurrently), and writes one
//! response line per request through a single writer task. Dropping the
//! serve future — as the shutdown path does — aborts every in-flight
//! invocation, which stops further page requests promptly.

use crate::error::ServerError;
use crate::protocol::messages::{ServerMessage, ToolCallRequest, ToolResultMessage};
use crate::tools::ToolRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// Reserved request name that returns the ordered tool catalog
pub const LIST_TOOLS: &str = "list_tools";

/// The tool server: a registry plus the serving loop
pub struct ToolServer {
    registry: Arc<ToolRegistry>,
}

impl ToolServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Serve requests until the reader reaches end of input
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<ServerMessage>(64);

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(message) = rx.recv().await {
                let mut line = match serde_json::to_string(&message) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize response");
                        continue;
                    }
                };
                line.push('\n');
                if writer.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                let _ = writer.flush().await;
            }
        });

        let mut lines = BufReader::new(reader).lines();
        let mut invocations = JoinSet::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let registry = self.registry.clone();
            let tx = tx.clone();
            invocations.spawn(async move {
                let response = handle_line(&registry, &line).await;
                let _ = tx.send(response).await;
            });
        }

        // Input closed: let in-flight invocations finish, then stop the writer
        drop(tx);
        while invocations.join_next().await.is_some() {}
        let _ = writer_task.await;
        Ok(())
    }
}

/// Process one request line into exactly one response message
pub async fn handle_line(registry: &ToolRegistry, line: &str) -> ServerMessage {
    let call: ToolCallRequest = match serde_json::from_str(line) {
        Ok(call) => call,
        Err(e) => {
            let request_id = recover_request_id(line);
            return ServerMessage::Error(
                ServerError::MalformedRequest(e.to_string()).to_error_message(request_id),
            );
        }
    };

    if call.tool == LIST_TOOLS {
        return ServerMessage::Result(ToolResultMessage {
            request_id: call.request_id,
            tool: LIST_TOOLS.to_string(),
            result: catalog(registry),
        });
    }

    debug!(tool = %call.tool, request_id = %call.request_id, "dispatching tool call");
    match registry.invoke(&call.tool, &call.params).await {
        Ok(result) => ServerMessage::Result(ToolResultMessage {
            request_id: call.request_id,
            tool: call.tool,
            result,
        }),
        Err(error) => ServerMessage::Error(
            ServerError::for_tool(call.tool, error).to_error_message(call.request_id),
        ),
    }
}

/// The ordered tool catalog as a JSON document
fn catalog(registry: &ToolRegistry) -> Value {
    let tools: Vec<Value> = registry
        .definitions()
        .into_iter()
        .map(|definition| {
            json!({
                "name": definition.name,
                "description": definition.description,
                "parameters": definition.parameters,
            })
        })
        .collect();
    json!({ "tools": tools })
}

/// Best-effort request_id recovery from an unparseable line
fn recover_request_id(line: &str) -> Uuid {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|value| {
            value
                .get("request_id")
                .and_then(|id| id.as_str())
                .and_then(|id| id.parse().ok())
        })
        .unwrap_or(Uuid::nil())
}
