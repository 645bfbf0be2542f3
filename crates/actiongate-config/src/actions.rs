// crates/actiongate-config/src/actions.rs
// ============================================================================
// Module: ActionGate Action Map Loading
// Description: Reads the declarative action registry from JSON or TOML.
// Purpose: Apply the same size and path limits to the registry as to config.
// Dependencies: actiongate-core, serde_json, toml
// ============================================================================

//! ## Overview
//! The action map is a document of the form `{"actions": [...]}` (JSON) or
//! `[[actions]]` tables (TOML). The format is chosen by file extension.
//! Argument declaration order is preserved in both formats.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use actiongate_core::ActionsMap;

use crate::config::ConfigError;
use crate::config::validate_path;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum action map size in bytes.
pub(crate) const MAX_ACTIONS_FILE_SIZE: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Action map encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionsFormat {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl ActionsFormat {
    /// Picks the format from the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Loads the action map at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file is unreadable, too large, of an
/// unknown format, or does not match the declaration shape.
pub fn load_actions_map(path: &Path) -> Result<ActionsMap, ConfigError> {
    validate_path(path)?;
    let format = ActionsFormat::from_path(path).ok_or_else(|| {
        ConfigError::Invalid(format!("action map must be .json or .toml: {}", path.display()))
    })?;
    let bytes = fs::read(path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
    if bytes.len() > MAX_ACTIONS_FILE_SIZE {
        return Err(ConfigError::Invalid("action map exceeds size limit".to_string()));
    }
    let content = std::str::from_utf8(&bytes)
        .map_err(|_| ConfigError::Invalid("action map must be utf-8".to_string()))?;
    parse_actions_map(content, format)
}

/// Parses action map content.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] when the content does not match the declaration shape.
pub fn parse_actions_map(content: &str, format: ActionsFormat) -> Result<ActionsMap, ConfigError> {
    match format {
        ActionsFormat::Json => {
            serde_json::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
        }
        ActionsFormat::Toml => toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string())),
    }
}
