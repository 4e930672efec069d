// yapi-mcp-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for yapi-mcp-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::HashMap;

use yapi_mcp_config::ConfigError;
use yapi_mcp_config::YapiMcpConfig;

/// Parses a TOML string into a `YapiMcpConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<YapiMcpConfig, ConfigError> {
    YapiMcpConfig::from_toml(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<YapiMcpConfig, ConfigError> {
    config_from_toml("")
}

/// Builds an environment lookup backed by fixed pairs.
pub fn env_lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |key| map.get(key).cloned()
}

/// Checks that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
