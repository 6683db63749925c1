//! Loads the bridge's process-wide configuration snapshot from environment
//! variables. Read once at addon/process startup.

use crate::{BridgeConfig, ConfigError, LogLevel, Result};
use std::collections::HashMap;
use std::env;

/// Read `BridgeConfig` from the process environment, applying the documented
/// defaults for any variable that is unset.
pub fn load_bridge_config() -> Result<BridgeConfig> {
    load_bridge_config_from(&env_snapshot())
}

/// Testable variant: builds a `BridgeConfig` from an explicit key/value map instead
/// of the real process environment, so tests don't need to mutate global env state.
pub fn load_bridge_config_from(vars: &HashMap<String, String>) -> Result<BridgeConfig> {
    let mut config = BridgeConfig::default();

    if let Some(raw) = vars.get(BridgeConfig::ENV_PORT) {
        let port: u32 = raw.parse().map_err(|_| ConfigError::InvalidValue {
            field: BridgeConfig::ENV_PORT.to_string(),
            reason: format!("'{}' is not an integer", raw),
        })?;
        if port == 0 || port > u16::MAX as u32 {
            return Err(ConfigError::InvalidValue {
                field: BridgeConfig::ENV_PORT.to_string(),
                reason: format!("{} is out of range 1..65535", port),
            });
        }
        config.port = port as u16;
    }

    if let Some(raw) = vars.get(BridgeConfig::ENV_START_NOW) {
        config.start_now = BridgeConfig::parse_bool(raw).ok_or_else(|| ConfigError::InvalidValue {
            field: BridgeConfig::ENV_START_NOW.to_string(),
            reason: format!("'{}' is not a recognized boolean", raw),
        })?;
    }

    if let Some(raw) = vars.get(BridgeConfig::ENV_LOG_LEVEL) {
        config.log_level = LogLevel::parse(raw).ok_or_else(|| ConfigError::InvalidValue {
            field: BridgeConfig::ENV_LOG_LEVEL.to_string(),
            reason: format!("'{}' is not one of DEBUG,INFO,WARNING,ERROR,CRITICAL", raw),
        })?;
    }

    Ok(config)
}

fn env_snapshot() -> HashMap<String, String> {
    [
        BridgeConfig::ENV_PORT,
        BridgeConfig::ENV_START_NOW,
        BridgeConfig::ENV_LOG_LEVEL,
    ]
    .into_iter()
    .filter_map(|key| env::var(key).ok().map(|v| (key.to_string(), v)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_unset() {
        let config = load_bridge_config_from(&HashMap::new()).unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.port, 6688);
        assert!(!config.start_now);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn parses_port() {
        let config = load_bridge_config_from(&vars(&[("BLD_REMOTE_MCP_PORT", "7777")])).unwrap();
        assert_eq!(config.port, 7777);
    }

    #[test]
    fn rejects_port_zero() {
        let err = load_bridge_config_from(&vars(&[("BLD_REMOTE_MCP_PORT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_port_out_of_range() {
        let err = load_bridge_config_from(&vars(&[("BLD_REMOTE_MCP_PORT", "99999")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = load_bridge_config_from(&vars(&[("BLD_REMOTE_MCP_PORT", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn parses_start_now_variants() {
        for truthy in ["true", "1", "yes", "on", "TRUE", "On"] {
            let config =
                load_bridge_config_from(&vars(&[("BLD_REMOTE_MCP_START_NOW", truthy)])).unwrap();
            assert!(config.start_now, "expected {truthy} to parse as true");
        }
        for falsy in ["false", "0", "no", "off"] {
            let config =
                load_bridge_config_from(&vars(&[("BLD_REMOTE_MCP_START_NOW", falsy)])).unwrap();
            assert!(!config.start_now, "expected {falsy} to parse as false");
        }
    }

    #[test]
    fn rejects_unrecognized_start_now() {
        let err =
            load_bridge_config_from(&vars(&[("BLD_REMOTE_MCP_START_NOW", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn parses_log_level_case_insensitively() {
        let config = load_bridge_config_from(&vars(&[("BLD_REMOTE_LOG_LEVEL", "warning")])).unwrap();
        assert_eq!(config.log_level, LogLevel::Warning);

        let config = load_bridge_config_from(&vars(&[("BLD_REMOTE_LOG_LEVEL", "CRITICAL")])).unwrap();
        assert_eq!(config.log_level, LogLevel::Critical);
    }

    #[test]
    fn rejects_unrecognized_log_level() {
        let err = load_bridge_config_from(&vars(&[("BLD_REMOTE_LOG_LEVEL", "VERBOSE")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
