//! # scenebridge-runtime
//!
//! Core runtime for the scenebridge remote command-and-control bridge: a
//! length-framed JSON TCP server embedded "inside" a 3D-content host,
//! exposing its scripting surface to external clients.
//!
//! The pieces map onto these modules:
//!
//! - [`loop_driver`] — the cooperative loop driver.
//! - [`framing`] / [`bridge`] — the framed JSON TCP server.
//! - [`dispatcher`] — the main-thread dispatcher (here: a dedicated
//!   host-worker task with a FIFO job queue, replacing a poll-wait idiom).
//! - [`router`] / [`persist`] — the command table and persistence store.
//! - The MCP gateway lives in the separate `scenebridge-gateway` crate.
//!
//! [`host`] and [`interpreter`] are the seam between the command layer and the
//! host's scripting surface: `Host` stands in for the real embedded API, and
//! `interpreter` implements the closed command language `execute_code` runs.
//!
//! ## Quick Start
//!
//! ```rust
//! use scenebridge_runtime::bridge::BridgeServer;
//! use scenebridge_runtime::host::InMemoryHost;
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let server = BridgeServer::bind(0, Box::new(InMemoryHost::new())).await?;
//! println!("listening on 127.0.0.1:{}", server.port());
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod dispatcher;
pub mod error;
pub mod framing;
pub mod host;
pub mod interpreter;
pub mod loop_driver;
pub mod persist;
pub mod router;
pub mod telemetry;
pub mod timeout;

pub use error::{Error, Result};
