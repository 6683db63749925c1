use serde::{Deserialize, Serialize};

/// The five log levels the bridge and gateway recognize, matched case-insensitively
/// against `BLD_REMOTE_LOG_LEVEL` / `mcp_service.log_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// A `tracing_subscriber::EnvFilter`-compatible directive. `CRITICAL` has no tracing
    /// counterpart, so it maps to `error` (tracing's most severe level).
    pub fn as_tracing_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

/// Process-wide bridge configuration, read once at startup from environment
/// variables.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub port: u16,
    pub start_now: bool,
    pub log_level: LogLevel,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            start_now: false,
            log_level: LogLevel::Info,
        }
    }
}

impl BridgeConfig {
    pub const DEFAULT_PORT: u16 = 6688;

    pub const ENV_PORT: &'static str = "BLD_REMOTE_MCP_PORT";
    pub const ENV_START_NOW: &'static str = "BLD_REMOTE_MCP_START_NOW";
    pub const ENV_LOG_LEVEL: &'static str = "BLD_REMOTE_LOG_LEVEL";

    /// Parse a `BLD_REMOTE_MCP_START_NOW`-shaped boolean: `true/false/1/0/yes/no/on/off`,
    /// case-insensitive.
    pub fn parse_bool(raw: &str) -> Option<bool> {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

/// The optional on-disk YAML config consumed by the CLI/gateway.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayFileConfig {
    #[serde(default)]
    pub blender: BlenderSection,
    #[serde(default)]
    pub mcp_service: McpServiceSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlenderSection {
    #[serde(default)]
    pub exec_path: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub root_dir: Option<String>,
    #[serde(default)]
    pub plugin_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct McpServiceSection {
    #[serde(default)]
    pub default_port: Option<u16>,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl McpServiceSection {
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.as_deref().and_then(LogLevel::parse)
    }
}
