//! Loads the optional YAML gateway config file.
//!
//! The file lives at an OS-conventional, user-scoped config path and is entirely
//! optional: every field the gateway reads from it has a command-line or
//! environment-variable fallback.

use crate::{ConfigError, GatewayFileConfig, Result};
use std::path::{Path, PathBuf};

/// Default config file location: `<user config dir>/scenebridge/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scenebridge").join("config.yaml"))
}

/// Load the gateway config file from `path`, or return the default (empty) config
/// if the file does not exist. Any other IO or parse error is surfaced.
pub fn load_gateway_config(path: &Path) -> Result<GatewayFileConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_gateway_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(GatewayFileConfig::default()),
        Err(e) => Err(ConfigError::Io(path.to_path_buf(), e)),
    }
}

/// Load from the default OS-conventional path, if one exists; returns the empty
/// config when no config directory can be determined or the file is absent.
pub fn load_gateway_config_default() -> Result<GatewayFileConfig> {
    match default_config_path() {
        Some(path) => load_gateway_config(&path),
        None => Ok(GatewayFileConfig::default()),
    }
}

pub fn parse_gateway_config(yaml: &str) -> Result<GatewayFileConfig> {
    serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
blender:
  exec_path: /opt/blender/blender
  version: "4.2"
  root_dir: /opt/blender
  plugin_dir: /opt/blender/plugins

mcp_service:
  default_port: 7000
  log_level: DEBUG
"#;
        let config = parse_gateway_config(yaml).unwrap();
        assert_eq!(config.blender.exec_path.as_deref(), Some("/opt/blender/blender"));
        assert_eq!(config.mcp_service.default_port, Some(7000));
        assert_eq!(
            config.mcp_service.log_level(),
            Some(scenebridge_config_log_level_debug())
        );
    }

    fn scenebridge_config_log_level_debug() -> crate::LogLevel {
        crate::LogLevel::Debug
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = parse_gateway_config("").unwrap();
        assert!(config.blender.exec_path.is_none());
        assert!(config.mcp_service.default_port.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_gateway_config(Path::new("/nonexistent/scenebridge.yaml")).unwrap();
        assert!(config.mcp_service.default_port.is_none());
    }

    #[test]
    fn unreadable_directory_is_an_error() {
        // A path that exists as a directory, not a file, triggers a non-NotFound IO error.
        let tmp = tempfile::tempdir().unwrap();
        let err = load_gateway_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = parse_gateway_config("not: [valid: yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
