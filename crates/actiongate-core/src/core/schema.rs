// crates/actiongate-core/src/core/schema.rs
// ============================================================================
// Module: ActionGate Argument Schema
// Description: Parameter specifications and action declarations.
// Purpose: Resolve declared argument types through a closed lookup table.
// Dependencies: indexmap, regex, serde, thiserror
// ============================================================================

//! ## Overview
//! An action declares an ordered set of arguments. Each declaration names its
//! value type as a string (`"str"`, `"store_true"`, `"open"`, ...). Type names
//! resolve through [`ValueKind::from_type_name`], a fixed table; an unknown
//! name is a load-time [`SchemaError`], never something evaluated.
//!
//! ## Invariants
//! - Parameter names and aliases are unique within one schema.
//! - Declaration order is preserved; positionals bind in that order.
//! - Flag parameters are never positional and never required.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::arguments::ArgumentValue;
use crate::core::identifiers::ActionId;
use crate::core::identifiers::ProfileName;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building an argument schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The declared type name is not in the lookup table.
    #[error("argument '{name}' declares unknown type '{type_name}'")]
    UnknownType {
        /// Argument name.
        name: String,
        /// Declared type name.
        type_name: String,
    },
    /// Two parameters share a name or alias.
    #[error("argument name '{0}' is declared more than once")]
    DuplicateName(String),
    /// The argument name is empty after stripping dashes.
    #[error("argument name '{0}' is invalid")]
    InvalidName(String),
    /// A flag was declared positional.
    #[error("flag argument '{0}' cannot be positional")]
    PositionalFlag(String),
    /// The default does not fit the value kind.
    #[error("argument '{name}' has an invalid default: {reason}")]
    InvalidDefault {
        /// Argument name.
        name: String,
        /// Failure reason.
        reason: String,
    },
    /// The `extra.pattern` regex does not compile.
    #[error("argument '{name}' has an invalid pattern: {reason}")]
    InvalidPattern {
        /// Argument name.
        name: String,
        /// Compiler error.
        reason: String,
    },
}

// ============================================================================
// SECTION: Value Kinds
// ============================================================================

/// Closed set of supported argument value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Boolean presence flag.
    Flag,
    /// Single string.
    String,
    /// Ordered list of strings.
    List,
    /// Uploaded file, surfaced to actions as a staged path.
    File,
}

/// Type names accepted in declarations.
const VALUE_KIND_LOOKUP: &[(&str, ValueKind)] = &[
    ("bool", ValueKind::Flag),
    ("boolean", ValueKind::Flag),
    ("flag", ValueKind::Flag),
    ("store_true", ValueKind::Flag),
    ("str", ValueKind::String),
    ("string", ValueKind::String),
    ("list", ValueKind::List),
    ("append", ValueKind::List),
    ("file", ValueKind::File),
    ("open", ValueKind::File),
];

impl ValueKind {
    /// Resolves a declared type name.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] when the name is not in the table.
    pub fn from_type_name(argument: &str, type_name: &str) -> Result<Self, SchemaError> {
        let wanted = type_name.trim().to_ascii_lowercase();
        VALUE_KIND_LOOKUP.iter().find(|(name, _)| *name == wanted).map(|(_, kind)| *kind).ok_or_else(
            || SchemaError::UnknownType {
                name: argument.to_string(),
                type_name: type_name.to_string(),
            },
        )
    }

    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::String => "string",
            Self::List => "list",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a parameter binds by position or by option name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Bound by position.
    Positional,
    /// Bound by `--name`.
    Optional,
}

// ============================================================================
// SECTION: Parameter Specs
// ============================================================================

/// Post-coercion rule attached to a parameter.
#[derive(Debug, Clone, Default)]
pub struct ExtraRule {
    /// Regex every string value must match, plus the message key shown on failure.
    pub pattern: Option<(Regex, String)>,
    /// Forces the parameter to be required even when optional.
    pub required: bool,
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    /// Canonical parameter name (no leading dashes).
    pub name: String,
    /// Positional or optional.
    pub kind: ParameterKind,
    /// Value kind.
    pub value_kind: ValueKind,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Value used when the parameter is absent.
    pub default: Option<ArgumentValue>,
    /// Alternate option names (no leading dashes).
    pub aliases: Vec<String>,
    /// Human help text.
    pub help: Option<String>,
    /// Optional post-validation rule.
    pub extra: ExtraRule,
}

impl ParameterSpec {
    /// Creates a positional parameter; positionals are required by default.
    #[must_use]
    pub fn positional(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self::build(name.into(), ParameterKind::Positional, value_kind, true)
    }

    /// Creates an optional parameter.
    #[must_use]
    pub fn optional(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self::build(name.into(), ParameterKind::Optional, value_kind, false)
    }

    /// Shared constructor.
    const fn build(
        name: String,
        kind: ParameterKind,
        value_kind: ValueKind,
        required: bool,
    ) -> Self {
        Self {
            name,
            kind,
            value_kind,
            required,
            default: None,
            aliases: Vec::new(),
            help: None,
            extra: ExtraRule {
                pattern: None,
                required: false,
            },
        }
    }

    /// Sets the required flag.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: ArgumentValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Adds an alias option name.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Attaches an `extra.pattern` rule.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidPattern`] when the regex does not compile.
    pub fn with_pattern(mut self, pattern: &str, message: &str) -> Result<Self, SchemaError> {
        let regex = Regex::new(pattern).map_err(|err| SchemaError::InvalidPattern {
            name: self.name.clone(),
            reason: err.to_string(),
        })?;
        self.extra.pattern = Some((regex, message.to_string()));
        Ok(self)
    }

    /// Returns true when the parameter must receive a value.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        !matches!(self.value_kind, ValueKind::Flag) && (self.required || self.extra.required)
    }

    /// Returns true when `token` names this parameter (canonical name or alias).
    #[must_use]
    pub fn answers_to(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|alias| alias == token)
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Ordered, validated parameter list of one action.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSchema {
    /// Parameters in declaration order.
    parameters: Vec<ParameterSpec>,
}

impl ArgumentSchema {
    /// Builds a schema after checking name uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] on duplicate names or positional flags.
    pub fn new(parameters: Vec<ParameterSpec>) -> Result<Self, SchemaError> {
        let mut seen: Vec<&str> = Vec::new();
        for spec in &parameters {
            if spec.name.is_empty() {
                return Err(SchemaError::InvalidName(spec.name.clone()));
            }
            if spec.kind == ParameterKind::Positional && spec.value_kind == ValueKind::Flag {
                return Err(SchemaError::PositionalFlag(spec.name.clone()));
            }
            for name in std::iter::once(&spec.name).chain(spec.aliases.iter()) {
                if seen.contains(&name.as_str()) {
                    return Err(SchemaError::DuplicateName(name.clone()));
                }
                seen.push(name.as_str());
            }
        }
        Ok(Self {
            parameters,
        })
    }

    /// Builds a schema from serde declarations, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] for unknown types, bad defaults, bad patterns, or duplicates.
    pub fn from_declarations(
        declarations: &IndexMap<String, ArgumentDeclaration>,
    ) -> Result<Self, SchemaError> {
        let mut parameters = Vec::with_capacity(declarations.len());
        for (key, declaration) in declarations {
            parameters.push(declaration.to_spec(key)?);
        }
        Self::new(parameters)
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Looks up a parameter by canonical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|spec| spec.name == name)
    }

    /// Looks up an optional parameter by canonical name or alias.
    #[must_use]
    pub fn lookup_option(&self, token: &str) -> Option<&ParameterSpec> {
        self.parameters
            .iter()
            .filter(|spec| spec.kind == ParameterKind::Optional)
            .find(|spec| spec.answers_to(token))
    }

    /// Iterates positional parameters in order.
    pub fn positionals(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(|spec| spec.kind == ParameterKind::Positional)
    }

    /// Iterates optional parameters in order.
    pub fn optionals(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(|spec| spec.kind == ParameterKind::Optional)
    }

    /// Returns true when no parameter is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

// ============================================================================
// SECTION: Declarations
// ============================================================================

/// `extra` block of an argument declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraDeclaration {
    /// `[regex, message_key]`.
    #[serde(default)]
    pub pattern: Option<(String, String)>,
    /// Forces the argument to be required.
    #[serde(default)]
    pub required: bool,
}

/// Serde shape of one argument as yielded by the action registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentDeclaration {
    /// Explicit kind; inferred from a leading dash when absent.
    #[serde(default)]
    pub kind: Option<ParameterKind>,
    /// Value type name.
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
    /// Argparse-style action (`store_true`, `append`), used when `type` is absent.
    #[serde(default)]
    pub action: Option<String>,
    /// Default value.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    /// Required override.
    #[serde(default)]
    pub required: Option<bool>,
    /// Long option name; becomes the canonical name.
    #[serde(default)]
    pub full: Option<String>,
    /// Help text.
    #[serde(default)]
    pub help: Option<String>,
    /// Post-validation rule.
    #[serde(default)]
    pub extra: Option<ExtraDeclaration>,
}

impl ArgumentDeclaration {
    /// Converts the declaration keyed by `key` into a [`ParameterSpec`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] on unknown types, invalid defaults, or invalid patterns.
    pub fn to_spec(&self, key: &str) -> Result<ParameterSpec, SchemaError> {
        let short = key.trim_start_matches('-');
        let name = self.full.as_deref().map_or(short, |full| full.trim_start_matches('-'));
        if name.is_empty() || short.is_empty() {
            return Err(SchemaError::InvalidName(key.to_string()));
        }
        let kind = self.kind.unwrap_or(if key.starts_with('-') {
            ParameterKind::Optional
        } else {
            ParameterKind::Positional
        });
        let type_name = self.value_type.as_deref().or(self.action.as_deref()).unwrap_or("string");
        let value_kind = ValueKind::from_type_name(name, type_name)?;
        let default = match &self.default {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(default_value(name, value_kind, value)?),
        };
        let required = self
            .required
            .unwrap_or(kind == ParameterKind::Positional && default.is_none());

        let mut spec = match kind {
            ParameterKind::Positional => ParameterSpec::positional(name, value_kind),
            ParameterKind::Optional => ParameterSpec::optional(name, value_kind),
        }
        .required(required);
        spec.default = default;
        spec.help.clone_from(&self.help);
        if short != name {
            spec.aliases.push(short.to_string());
        }
        if let Some(extra) = &self.extra {
            spec.extra.required = extra.required;
            if let Some((pattern, message)) = &extra.pattern {
                spec = spec.with_pattern(pattern, message)?;
            }
        }
        Ok(spec)
    }
}

/// Converts a declared default into a canonical value.
fn default_value(
    name: &str,
    kind: ValueKind,
    value: &serde_json::Value,
) -> Result<ArgumentValue, SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidDefault {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    match (kind, value) {
        (ValueKind::Flag, serde_json::Value::Bool(flag)) => Ok(ArgumentValue::Bool(*flag)),
        (ValueKind::Flag, _) => Err(invalid("flags take a boolean default")),
        (ValueKind::String, serde_json::Value::String(text)) => {
            Ok(ArgumentValue::Text(text.clone()))
        }
        (ValueKind::String, serde_json::Value::Number(number)) => {
            Ok(ArgumentValue::Text(number.to_string()))
        }
        (ValueKind::File, serde_json::Value::String(path)) => {
            Ok(ArgumentValue::Path(PathBuf::from(path)))
        }
        (ValueKind::List, serde_json::Value::String(text)) => {
            Ok(ArgumentValue::List(vec![text.clone()]))
        }
        (ValueKind::List, serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(ArgumentValue::List)
            .ok_or_else(|| invalid("list defaults must contain only strings")),
        _ => Err(invalid("default does not match the declared type")),
    }
}

/// One action as yielded by the declarative registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDeclaration {
    /// Hierarchical identifier.
    pub tid: ActionId,
    /// Route strings of the form `METHOD /path`.
    #[serde(default)]
    pub http_routes: Vec<String>,
    /// Profile that must approve callers; `"none"` or absent skips authentication.
    #[serde(default)]
    pub auth_profile: Option<ProfileName>,
    /// Whether the action serializes on the global lock.
    #[serde(default)]
    pub lock_required: bool,
    /// Arguments in declaration order.
    #[serde(default)]
    pub arguments: IndexMap<String, ArgumentDeclaration>,
    /// External program implementing the action.
    #[serde(default)]
    pub command: Vec<String>,
    /// Help text.
    #[serde(default)]
    pub help: Option<String>,
}

impl ActionDeclaration {
    /// Returns the effective profile, treating `"none"` and empty as no profile.
    #[must_use]
    pub fn profile(&self) -> Option<&ProfileName> {
        self.auth_profile.as_ref().filter(|profile| {
            let name = profile.as_str().trim();
            !name.is_empty() && !name.eq_ignore_ascii_case("none")
        })
    }
}

/// Full document yielded by the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionsMap {
    /// Declared actions.
    #[serde(default)]
    pub actions: Vec<ActionDeclaration>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn type_names_resolve_through_the_table() {
        assert_eq!(ValueKind::from_type_name("x", "store_true"), Ok(ValueKind::Flag));
        assert_eq!(ValueKind::from_type_name("x", "STR"), Ok(ValueKind::String));
        assert_eq!(ValueKind::from_type_name("x", "open"), Ok(ValueKind::File));
        assert!(matches!(
            ValueKind::from_type_name("x", "__import__('os')"),
            Err(SchemaError::UnknownType { .. })
        ));
    }

    #[test]
    fn dashed_key_with_full_name_becomes_alias() {
        let declaration = ArgumentDeclaration {
            full: Some("--domain".to_string()),
            ..ArgumentDeclaration::default()
        };
        let spec = declaration.to_spec("-d").unwrap();
        assert_eq!(spec.name, "domain");
        assert_eq!(spec.kind, ParameterKind::Optional);
        assert_eq!(spec.aliases, vec!["d".to_string()]);
        assert!(!spec.is_required());
    }

    #[test]
    fn positional_without_default_is_required() {
        let spec = ArgumentDeclaration::default().to_spec("username").unwrap();
        assert_eq!(spec.kind, ParameterKind::Positional);
        assert!(spec.is_required());
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let first = ParameterSpec::optional("domain", ValueKind::String).with_alias("d");
        let second = ParameterSpec::optional("d", ValueKind::String);
        assert_eq!(
            ArgumentSchema::new(vec![first, second]).unwrap_err(),
            SchemaError::DuplicateName("d".to_string())
        );
    }

    #[test]
    fn flag_default_must_be_boolean() {
        let declaration = ArgumentDeclaration {
            action: Some("store_true".to_string()),
            default: Some(serde_json::json!("yes")),
            ..ArgumentDeclaration::default()
        };
        assert!(matches!(
            declaration.to_spec("--force"),
            Err(SchemaError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn bad_pattern_fails_at_load_time() {
        let declaration = ArgumentDeclaration {
            extra: Some(ExtraDeclaration {
                pattern: Some(("([".to_string(), "pattern_name".to_string())),
                required: false,
            }),
            ..ArgumentDeclaration::default()
        };
        assert!(matches!(declaration.to_spec("name"), Err(SchemaError::InvalidPattern { .. })));
    }

    #[test]
    fn none_profile_means_no_authentication() {
        let declaration: ActionDeclaration = serde_json::from_value(serde_json::json!({
            "tid": "ping",
            "auth_profile": "none"
        }))
        .unwrap();
        assert!(declaration.profile().is_none());
    }
}
