//! Wires C1 (loop driver), C2 (framed TCP server), and C3 (dispatcher) into
//! the running bridge process. This is what `scenebridge-cli serve` starts.

use crate::dispatcher::{self, DispatcherHandle, DEFAULT_DISPATCH_TIMEOUT};
use crate::framing::{JsonFrameScanner, ScanOutcome};
use crate::host::Host;
use crate::loop_driver::LoopDriver;
use crate::persist::PersistStore;
use crate::router::{self, Request};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

pub const MAX_REQUEST_BYTES: usize = 10 * 1024 * 1024;
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BridgeServer {
    listener: TcpListener,
    port: u16,
    dispatcher: DispatcherHandle,
    loop_driver: Arc<LoopDriver>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl BridgeServer {
    /// Binds `127.0.0.1:port` only; this bridge never listens on a
    /// non-loopback address. A port already in use fails fast with an
    /// `io::Error` the caller can act on (e.g. retry with a different port).
    pub async fn bind(port: u16, host: Box<dyn Host>) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let bound_port = listener.local_addr()?.port();
        let dispatcher = dispatcher::spawn_host_worker(host, Arc::new(PersistStore::new()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            listener,
            port: bound_port,
            dispatcher,
            loop_driver: Arc::new(LoopDriver::new()),
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn loop_driver(&self) -> Arc<LoopDriver> {
        self.loop_driver.clone()
    }

    /// Runs the accept loop until `stop()` is called (via the returned
    /// shutdown sender) or a `server_shutdown` command is serviced.
    pub async fn serve(&self) -> io::Result<()> {
        loop {
            let mut shutdown_rx = self.shutdown_rx.clone();
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        return Ok(());
                    }
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    tracing::info!(%peer, "accepted connection");
                    let dispatcher = self.dispatcher.clone();
                    let shutdown_tx = self.shutdown_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer.to_string(), dispatcher, shutdown_tx).await {
                            tracing::warn!(%peer, error = %e, "connection error");
                        }
                    });
                }
            }
        }
    }

    /// Signals the accept loop to stop. In-flight dispatches are not waited
    /// on; their responses are dropped if they outlive the 5s grace period
    /// the caller enforces around this call.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        self.loop_driver.signal_shutdown();
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: String,
    dispatcher: DispatcherHandle,
    shutdown_tx: watch::Sender<bool>,
) -> io::Result<()> {
    let read_result = crate::timeout::with_timeout(READ_TIMEOUT, read_one_frame(&mut stream)).await;

    let body = match read_result {
        Err(_) => {
            write_envelope(&mut stream, &error_envelope("read timeout")).await?;
            return Ok(());
        }
        Ok(Err(e)) => {
            write_envelope(&mut stream, &error_envelope(e.to_string())).await?;
            return Ok(());
        }
        Ok(Ok(bytes)) => bytes,
    };

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            write_envelope(&mut stream, &error_envelope(format!("invalid JSON: {e}"))).await?;
            return Ok(());
        }
    };

    let request: Request = match router::parse_request(&value) {
        Ok(r) => r,
        Err(e) => {
            write_envelope(&mut stream, &error_envelope(e.0)).await?;
            return Ok(());
        }
    };

    let source = format!("tcp://{peer}");
    let outcome = dispatcher.dispatch(request, source, DEFAULT_DISPATCH_TIMEOUT).await;

    if outcome.envelope["status"] == "error" {
        tracing::warn!(%peer, message = %outcome.envelope["message"], "command failed");
    }

    write_envelope(&mut stream, &outcome.envelope).await?;

    if outcome.shutdown_requested {
        let _ = shutdown_tx.send(true);
    }

    Ok(())
}

/// Reads bytes until [`JsonFrameScanner`] reports a complete value, or until
/// `MAX_REQUEST_BYTES` is exceeded.
async fn read_one_frame(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut scanner = JsonFrameScanner::new();
    let mut chunk = [0u8; 65536];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed before a complete request arrived"));
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "request exceeds maximum size of 10 MiB"));
        }
        match scanner.scan(&buffer) {
            ScanOutcome::Complete(len) => {
                buffer.truncate(len);
                return Ok(buffer);
            }
            ScanOutcome::NeedMore => continue,
            ScanOutcome::Invalid => {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "request is not valid JSON"));
            }
        }
    }
}

fn error_envelope(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({"status": "error", "message": message.into()})
}

async fn write_envelope(stream: &mut TcpStream, envelope: &serde_json::Value) -> io::Result<()> {
    let body = serde_json::to_vec(envelope)?;
    stream.write_all(&body).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;
    use tokio::io::AsyncReadExt as _;

    #[tokio::test]
    async fn serves_get_scene_info_over_tcp() {
        let server = BridgeServer::bind(0, Box::new(InMemoryHost::new())).await.unwrap();
        let port = server.port();
        tokio::spawn(async move { server.serve().await.unwrap() });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = serde_json::json!({"type": "get_scene_info"});
        stream.write_all(&serde_json::to_vec(&request).unwrap()).await.unwrap();
        stream.shutdown().await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(envelope["status"], "success");
    }

    #[tokio::test]
    async fn unknown_command_returns_error_envelope() {
        let server = BridgeServer::bind(0, Box::new(InMemoryHost::new())).await.unwrap();
        let port = server.port();
        tokio::spawn(async move { server.serve().await.unwrap() });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = serde_json::json!({"type": "frobnicate"});
        stream.write_all(&serde_json::to_vec(&request).unwrap()).await.unwrap();
        stream.shutdown().await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(envelope["status"], "error");
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let server = BridgeServer::bind(0, Box::new(InMemoryHost::new())).await.unwrap();
        let port = server.port();
        tokio::spawn(async move { server.serve().await.unwrap() });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream.write_all(b"not json at all").await.unwrap();
        stream.shutdown().await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(envelope["status"], "error");
        assert!(envelope["message"].as_str().unwrap().contains("invalid JSON"));
    }

    #[tokio::test]
    async fn server_shutdown_command_stops_the_accept_loop() {
        let server = BridgeServer::bind(0, Box::new(InMemoryHost::new())).await.unwrap();
        let port = server.port();
        let serve_task = tokio::spawn(async move { server.serve().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = serde_json::json!({"type": "server_shutdown"});
        stream.write_all(&serde_json::to_vec(&request).unwrap()).await.unwrap();
        stream.shutdown().await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(envelope["status"], "success");

        let result = tokio::time::timeout(Duration::from_secs(1), serve_task).await;
        assert!(result.is_ok(), "serve loop did not stop after server_shutdown");
    }
}
