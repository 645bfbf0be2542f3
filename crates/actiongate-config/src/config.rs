// crates/actiongate-config/src/config.rs
// ============================================================================
// Module: ActionGate Configuration
// Description: Configuration loading and validation for ActionGate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: actiongate-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: a config that parses but
//! names an unknown default profile, an unparsable bind address, or a
//! malformed credential digest is rejected before any listener starts.
//!
//! Security posture: config inputs are untrusted. Session secrets and
//! credential digests never appear in error messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use actiongate_core::runtime::DEFAULT_LOCK_NAME;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "actiongate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "ACTIONGATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Upper bound on the request body limit.
const MAX_BODY_BYTES_LIMIT: usize = 1024 * 1024 * 1024;
/// Maximum number of CORS origins.
const MAX_CORS_ORIGINS: usize = 64;
/// Default dispatch timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Maximum dispatch timeout in milliseconds.
const MAX_TIMEOUT_MS: u64 = 60 * 60 * 1000;
/// Maximum number of auth profiles.
const MAX_PROFILES: usize = 64;
/// Maximum number of credential digests per profile.
const MAX_DIGESTS_PER_PROFILE: usize = 256;
/// Maximum length of a profile name.
const MAX_PROFILE_NAME_LENGTH: usize = 64;
/// Minimum session secret length in bytes.
const MIN_SESSION_SECRET_BYTES: usize = 32;
/// Length of a hex SHA-256 digest.
const SHA256_HEX_LENGTH: usize = 64;
/// Maximum length of a log filter directive.
const MAX_LOG_FILTER_LENGTH: usize = 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// ActionGate configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ActionGateConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Dispatcher configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Authentication profiles and session settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Action registry location.
    #[serde(default)]
    pub actions: ActionsConfig,
    /// Bootstrap carve-out for the event stream.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Directory of the loaded file, used to resolve relative paths (not serialized).
    #[serde(skip)]
    pub source_dir: Option<PathBuf>,
}

impl ActionGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        Self::load_from(&resolved)
    }

    /// Loads configuration, falling back to defaults when no path was given
    /// and the default file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an existing file fails to load or validate.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        let implicit = path.is_none() && env::var_os(CONFIG_ENV_VAR).is_none();
        if implicit && !resolved.exists() {
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load_from(&resolved)
    }

    /// Parses and validates TOML content.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates the file at `resolved`.
    fn load_from(resolved: &Path) -> Result<Self, ConfigError> {
        validate_path(resolved)?;
        let bytes = fs::read(resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source_dir = resolved.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.dispatch.validate()?;
        self.auth.validate()?;
        self.actions.validate()?;
        self.bootstrap.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Resolves `path` against the directory of the loaded config file.
    #[must_use]
    pub fn resolve_relative(&self, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path.trim());
        match &self.source_dir {
            Some(dir) if candidate.is_relative() => dir.join(candidate),
            _ => candidate,
        }
    }

    /// Returns the resolved action map path, if configured.
    #[must_use]
    pub fn actions_map_path(&self) -> Option<PathBuf> {
        self.actions.map_path.as_deref().map(|path| self.resolve_relative(path))
    }

    /// Returns the resolved bootstrap marker path, if configured.
    #[must_use]
    pub fn bootstrap_marker_path(&self) -> Option<PathBuf> {
        self.bootstrap.marker_path.as_deref().map(|path| self.resolve_relative(path))
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Origins allowed to make credentialed cross-origin requests.
    #[serde(default)]
    pub allowed_cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            allowed_cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind is not a socket address: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid("server.max_body_bytes exceeds limit".to_string()));
        }
        if self.allowed_cors_origins.len() > MAX_CORS_ORIGINS {
            return Err(ConfigError::Invalid("too many server.allowed_cors_origins".to_string()));
        }
        for origin in &self.allowed_cors_origins {
            validate_origin(origin)?;
        }
        Ok(())
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Deadline covering lock wait and execution, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Name of the global lock.
    #[serde(default = "default_lock_name")]
    pub lock_name: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            lock_name: default_lock_name(),
        }
    }
}

impl DispatchConfig {
    /// Returns the timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates dispatcher configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "dispatch.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.lock_name.trim().is_empty() {
            return Err(ConfigError::Invalid("dispatch.lock_name must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Profile used by `/login` when the request names none.
    #[serde(default)]
    pub default_profile: Option<String>,
    /// Maximum session age in seconds; unlimited when absent.
    #[serde(default)]
    pub session_max_age_secs: Option<u64>,
    /// Marks session cookies `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,
    /// HMAC secret for session evidence; random per process when absent.
    #[serde(default)]
    pub session_secret: Option<String>,
    /// Configured profiles.
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
}

impl AuthConfig {
    /// Returns the configured session key bytes.
    #[must_use]
    pub fn session_key(&self) -> Option<Vec<u8>> {
        self.session_secret.as_ref().map(|secret| secret.as_bytes().to_vec())
    }

    /// Returns the maximum session age.
    #[must_use]
    pub fn session_max_age(&self) -> Option<Duration> {
        self.session_max_age_secs.map(Duration::from_secs)
    }

    /// Validates authentication configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.profiles.len() > MAX_PROFILES {
            return Err(ConfigError::Invalid("too many auth.profiles".to_string()));
        }
        let mut names = BTreeSet::new();
        for profile in &self.profiles {
            profile.validate()?;
            if !names.insert(profile.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "auth.profiles contains duplicate name: {}",
                    profile.name
                )));
            }
        }
        if let Some(default) = &self.default_profile
            && !names.contains(default.as_str())
        {
            return Err(ConfigError::Invalid(format!(
                "auth.default_profile references unknown profile: {default}"
            )));
        }
        if self.session_max_age_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "auth.session_max_age_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(secret) = &self.session_secret
            && secret.len() < MIN_SESSION_SECRET_BYTES
        {
            return Err(ConfigError::Invalid(format!(
                "auth.session_secret must be at least {MIN_SESSION_SECRET_BYTES} bytes"
            )));
        }
        Ok(())
    }
}

/// One authentication profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Profile name referenced by actions.
    pub name: String,
    /// Lowercase hex SHA-256 digests of accepted credentials.
    #[serde(default)]
    pub credential_sha256: Vec<String>,
}

impl ProfileConfig {
    /// Validates one profile.
    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.name.as_str();
        let well_formed = !name.is_empty()
            && name.len() <= MAX_PROFILE_NAME_LENGTH
            && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !well_formed || name.eq_ignore_ascii_case("none") {
            return Err(ConfigError::Invalid(format!("auth.profiles name is invalid: {name}")));
        }
        if self.credential_sha256.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "auth.profiles.{name} requires at least one credential_sha256"
            )));
        }
        if self.credential_sha256.len() > MAX_DIGESTS_PER_PROFILE {
            return Err(ConfigError::Invalid(format!("auth.profiles.{name} has too many digests")));
        }
        let malformed = self.credential_sha256.iter().any(|digest| {
            digest.len() != SHA256_HEX_LENGTH || !digest.chars().all(|ch| ch.is_ascii_hexdigit())
        });
        if malformed {
            return Err(ConfigError::Invalid(format!(
                "auth.profiles.{name}.credential_sha256 must be 64 hex characters"
            )));
        }
        Ok(())
    }
}

/// Action registry configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ActionsConfig {
    /// Path to the JSON or TOML action map.
    #[serde(default)]
    pub map_path: Option<String>,
}

impl ActionsConfig {
    /// Validates the registry path.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.map_path {
            validate_path_string("actions.map_path", path)?;
        }
        Ok(())
    }
}

/// Bootstrap carve-out configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Once this file exists, `/sse` requires authentication.
    #[serde(default)]
    pub marker_path: Option<String>,
}

impl BootstrapConfig {
    /// Validates the marker path.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.marker_path {
            validate_path_string("bootstrap.marker_path", path)?;
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `actiongate_http=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.trim();
        if level.is_empty() {
            return Err(ConfigError::Invalid("logging.level must be non-empty".to_string()));
        }
        if level.len() > MAX_LOG_FILTER_LENGTH {
            return Err(ConfigError::Invalid("logging.level exceeds max length".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default dispatch timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default lock name.
fn default_lock_name() -> String {
    DEFAULT_LOCK_NAME.to_string()
}

/// Default log filter.
fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML or JSON parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a resolved path against security limits.
pub(crate) fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    if path
        .components()
        .any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(ConfigError::Invalid("path component too long".to_string()));
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    validate_path(Path::new(trimmed)).map_err(|_| ConfigError::Invalid(format!("{field} exceeds path limits")))
}

/// Validates a CORS origin: scheme and host only.
fn validate_origin(origin: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Invalid(format!("server.allowed_cors_origins entry is invalid: {origin}"));
    let parsed = url::Url::parse(origin).map_err(|_| invalid())?;
    let scheme_ok = matches!(parsed.scheme(), "http" | "https");
    let bare = parsed.path() == "/" && parsed.query().is_none() && parsed.fragment().is_none();
    if !scheme_ok || parsed.host_str().is_none() || !bare || origin.ends_with('/') {
        return Err(invalid());
    }
    Ok(())
}
