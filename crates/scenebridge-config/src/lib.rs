//! # scenebridge-config
//!
//! Configuration loading for the scenebridge remote bridge and MCP gateway.
//!
//! Two independent configuration surfaces are handled here:
//!
//! - [`BridgeConfig`]: the process-wide snapshot the bridge reads once from
//!   environment variables at addon/process startup (`BLD_REMOTE_MCP_PORT`,
//!   `BLD_REMOTE_MCP_START_NOW`, `BLD_REMOTE_LOG_LEVEL`).
//! - [`GatewayFileConfig`]: an optional YAML file consumed by the CLI/gateway,
//!   resolved from the OS-conventional user config directory.
//!
//! ## Quick Start
//!
//! ```rust
//! use scenebridge_config::{load_bridge_config_from, BridgeConfig};
//! use std::collections::HashMap;
//!
//! let config = load_bridge_config_from(&HashMap::new()).expect("defaults are valid");
//! assert_eq!(config, BridgeConfig::default());
//! ```

pub mod env;
pub mod error;
pub mod file;
pub mod types;

pub use env::{load_bridge_config, load_bridge_config_from};
pub use error::{ConfigError, Result};
pub use file::{default_config_path, load_gateway_config, load_gateway_config_default, parse_gateway_config};
pub use types::*;
