//! Newline-delimited JSON-RPC 2.0 over stdio.
//!
//! Only the session handshake is answered here. Requests are read one line at
//! a time; notifications get no reply.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::{ProtocolServer, ServerError, ServerMetadata};
use crate::lifecycle::faults::FaultReporter;
use crate::lifecycle::shutdown::{Shutdown, ShutdownNotice};

/// Protocol revision offered when the client does not ask for one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;

type Reader = Box<dyn AsyncBufRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

pub struct StdioServer<D> {
    service: Arc<D>,
    metadata: ServerMetadata,
    io: Mutex<Option<(Reader, Writer)>>,
    task: Mutex<Option<JoinHandle<()>>>,
    shutdown: Shutdown,
    closed: watch::Sender<bool>,
    faults: Option<FaultReporter>,
}

impl<D: Send + Sync + 'static> StdioServer<D> {
    /// Serve on the process's stdin and stdout.
    pub fn new(service: Arc<D>, metadata: ServerMetadata) -> Self {
        Self::with_io(
            service,
            metadata,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
    }

    /// Serve on arbitrary streams.
    pub fn with_io<R, W>(service: Arc<D>, metadata: ServerMetadata, reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (closed, _) = watch::channel(false);
        Self {
            service,
            metadata,
            io: Mutex::new(Some((Box::new(reader), Box::new(writer)))),
            task: Mutex::new(None),
            shutdown: Shutdown::new(),
            closed,
            faults: None,
        }
    }

    /// Report transport failures as uncaught faults. A failed transport is
    /// not reported through `closed()` when a reporter is attached.
    pub fn with_faults(mut self, faults: FaultReporter) -> Self {
        self.faults = Some(faults);
        self
    }

    pub fn service(&self) -> &Arc<D> {
        &self.service
    }
}

#[async_trait]
impl<D: Send + Sync + 'static> ProtocolServer for StdioServer<D> {
    fn metadata(&self) -> &ServerMetadata {
        &self.metadata
    }

    async fn start(&self) -> Result<(), ServerError> {
        let (reader, writer) = self.io.lock().await.take().ok_or(ServerError::AlreadyStarted)?;

        let metadata = self.metadata.clone();
        let notice = self.shutdown.subscribe();
        let closed = self.closed.clone();
        // Only a clean end counts as closed; errors travel as faults.
        let session = async move {
            serve(reader, writer, metadata, notice).await?;
            closed.send_replace(true);
            Ok::<_, io::Error>(())
        };

        let handle = match &self.faults {
            Some(faults) => faults.supervise("stdio transport", session),
            None => {
                let closed = self.closed.clone();
                tokio::spawn(async move {
                    if let Err(e) = session.await {
                        tracing::error!(error = %e, "Stdio transport failed");
                        closed.send_replace(true);
                    }
                })
            }
        };
        *self.task.lock().await = Some(handle);

        tracing::info!(transport = "stdio", "Protocol server accepting sessions");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        let Some(handle) = self.task.lock().await.take() else {
            return Ok(());
        };
        self.shutdown.trigger();
        handle
            .await
            .map_err(|e| ServerError::Task(e.to_string()))?;
        tracing::debug!("Stdio transport stopped");
        Ok(())
    }

    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

async fn serve(
    mut reader: Reader,
    mut writer: Writer,
    metadata: ServerMetadata,
    mut notice: ShutdownNotice,
) -> io::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        tokio::select! {
            _ = notice.requested() => return Ok(()),
            read = reader.read_line(&mut line) => {
                if read? == 0 {
                    tracing::info!("Client closed stdin");
                    return Ok(());
                }
                if line.trim().is_empty() {
                    continue;
                }
                let Some(response) = handle_line(&line, &metadata) else {
                    continue;
                };
                let mut bytes = serde_json::to_vec(&response)?;
                bytes.push(b'\n');
                match write_frame(&mut writer, &bytes).await {
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                        tracing::info!("Client closed stdout");
                        return Ok(());
                    }
                    other => other?,
                }
            }
        }
    }
}

async fn write_frame(writer: &mut Writer, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}

/// Answer one line of input. `None` means no reply is due.
fn handle_line(line: &str, metadata: &ServerMetadata) -> Option<Value> {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            let message = format!("Parse error: {}", e);
            return Some(error_response(Value::Null, PARSE_ERROR, &message));
        }
    };

    let id_hint = value.get("id").cloned().unwrap_or(Value::Null);
    let request: Request = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(_) => return Some(error_response(id_hint, INVALID_REQUEST, "Invalid Request")),
    };

    let Some(id) = request.id else {
        tracing::debug!(method = %request.method, "Notification received");
        return None;
    };

    tracing::debug!(method = %request.method, "Request received");
    let response = match request.method.as_str() {
        "initialize" => {
            let version = request
                .params
                .as_ref()
                .and_then(|p| p.get("protocolVersion"))
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_PROTOCOL_VERSION);
            result_response(
                id,
                json!({
                    "protocolVersion": version,
                    "capabilities": {},
                    "serverInfo": {
                        "name": metadata.name(),
                        "version": metadata.version(),
                    },
                    "instructions": metadata.description(),
                }),
            )
        }
        "ping" => result_response(id, json!({})),
        other => error_response(id, METHOD_NOT_FOUND, &format!("Method not found: {}", other)),
    };
    Some(response)
}

fn result_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}
