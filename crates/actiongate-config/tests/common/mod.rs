// crates/actiongate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for actiongate-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use actiongate_config::ActionGateConfig;
use actiongate_config::ConfigError;
use actiongate_config::ProfileConfig;

/// Digest of `admin:secret`.
pub const ADMIN_DIGEST: &str = "901b281c4e0c4007e8526ef27153b79330811e733976d5e65c8343a39e54ec81";

/// Parses a TOML string into an unvalidated `ActionGateConfig`.
pub fn config_from_toml(toml_str: &str) -> Result<ActionGateConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<ActionGateConfig, toml::de::Error> {
    config_from_toml("")
}

/// Returns a minimal config with one `admin` profile.
pub fn config_with_admin() -> Result<ActionGateConfig, toml::de::Error> {
    let mut config = minimal_config()?;
    config.auth.profiles.push(ProfileConfig {
        name: "admin".to_string(),
        credential_sha256: vec![ADMIN_DIGEST.to_string()],
    });
    Ok(config)
}

/// Asserts that validation fails with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
