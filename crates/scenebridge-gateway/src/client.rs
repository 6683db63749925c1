//! A short-lived TCP client to the bridge. One connection per tool call;
//! no pooling, since the bridge's own connection lifecycle is one-shot anyway.

use scenebridge_runtime::framing::{JsonFrameScanner, ScanOutcome};
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const READ_CHUNK: usize = 128 * 1024;

#[derive(Debug, Clone)]
pub struct BridgeClient {
    host: String,
    port: u16,
}

#[derive(Debug)]
pub enum BridgeCallError {
    NotReachable,
    TimedOut(u64),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl BridgeCallError {
    /// Renders the failure taxonomy's exact client-facing wording.
    pub fn tool_message(&self, client: &BridgeClient) -> String {
        match self {
            Self::NotReachable => {
                format!("Blender bridge not reachable at {}:{}", client.host, client.port)
            }
            Self::TimedOut(secs) => format!("Blender bridge timed out after {secs}s"),
            Self::Io(e) => format!("Blender bridge connection failed: {e}"),
            Self::Serialization(e) => format!("Blender bridge returned malformed JSON: {e}"),
        }
    }
}

impl BridgeClient {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Opens a connection, writes `request`, reads exactly one JSON envelope back,
    /// and closes. Returns the raw decoded envelope; callers inspect `status`.
    pub async fn call(&self, request: Value) -> Result<Value, BridgeCallError> {
        let mut stream = match tokio::time::timeout(
            CONNECT_TIMEOUT,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(_)) | Err(_) => return Err(BridgeCallError::NotReachable),
        };

        let body = serde_json::to_vec(&request).map_err(BridgeCallError::Serialization)?;

        match tokio::time::timeout(WRITE_TIMEOUT, stream.write_all(&body)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(BridgeCallError::Io(e)),
            Err(_) => return Err(BridgeCallError::TimedOut(WRITE_TIMEOUT.as_secs())),
        }
        let _ = stream.shutdown().await;

        let response = match tokio::time::timeout(READ_TIMEOUT, read_one_frame(&mut stream)).await
        {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Err(BridgeCallError::Io(e)),
            Err(_) => return Err(BridgeCallError::TimedOut(READ_TIMEOUT.as_secs())),
        };

        serde_json::from_slice(&response).map_err(BridgeCallError::Serialization)
    }
}

async fn read_one_frame(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut scanner = JsonFrameScanner::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "bridge closed the connection before a complete response arrived",
            ));
        }
        buffer.extend_from_slice(&chunk[..n]);
        match scanner.scan(&buffer) {
            ScanOutcome::Complete(len) => {
                buffer.truncate(len);
                return Ok(buffer);
            }
            ScanOutcome::NeedMore => continue,
            ScanOutcome::Invalid => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "bridge response is not valid JSON",
                ));
            }
        }
    }
}
