// crates/actiongate-core/src/runtime/normalize.rs
// ============================================================================
// Module: ActionGate Argument Normalization
// Description: Converts HTTP transport parameters into parser tokens.
// Purpose: Erase transport origin before the shared parser validates arguments.
// Dependencies: crate::core, tracing
// ============================================================================

//! ## Overview
//! [`encode_tokens`] walks the schema (positionals first, then optionals)
//! and emits the tokens a CLI caller would have typed for the same request.
//! [`normalize`] feeds those tokens to the shared [`ArgumentParser`].
//!
//! Rules per value kind:
//! - flag: a truthy value emits the option alone; falsy values emit nothing;
//! - string: option plus value, or a bare value for positionals;
//! - list: scalars are wrapped, repeated keys keep submission order;
//! - file: uploads are staged and the staged path becomes the value.
//!
//! Unsupported shapes are logged and skipped; the parser still fails loudly
//! when a skipped parameter was required.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::arguments::ArgToken;
use crate::core::arguments::CanonicalArgumentSet;
use crate::core::schema::ArgumentSchema;
use crate::core::schema::ParameterKind;
use crate::core::schema::ParameterSpec;
use crate::core::schema::ValueKind;
use crate::core::transport::TransportParams;
use crate::core::transport::TransportValue;
use crate::msg;
use crate::runtime::parser::ArgumentParser;
use crate::runtime::parser::ValidationError;
use crate::runtime::staging::StagingArea;
use crate::runtime::staging::StagingError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Normalization failures.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Arguments failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An upload could not be staged.
    #[error(transparent)]
    Staging(#[from] StagingError),
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes transport parameters into a canonical argument set.
///
/// # Errors
///
/// Returns [`NormalizeError::Validation`] when the shared parser rejects the
/// arguments and [`NormalizeError::Staging`] when an upload cannot be staged.
pub fn normalize(
    params: &TransportParams,
    schema: &ArgumentSchema,
    staging: &mut StagingArea,
) -> Result<CanonicalArgumentSet, NormalizeError> {
    let tokens = encode_tokens(params, schema, staging)?;
    Ok(ArgumentParser::new(schema).parse(&tokens)?)
}

/// Encodes transport parameters as parser tokens.
///
/// # Errors
///
/// Returns [`NormalizeError`] when a scalar receives several values or an
/// upload cannot be staged.
pub fn encode_tokens(
    params: &TransportParams,
    schema: &ArgumentSchema,
    staging: &mut StagingArea,
) -> Result<Vec<ArgToken>, NormalizeError> {
    for (key, _) in params.iter() {
        if schema.get(key).is_none() && schema.lookup_option(key).is_none() {
            tracing::debug!(parameter = key, "{}", crate::t!("normalize.unknown_parameter", name = key));
        }
    }

    let mut tokens = Vec::new();
    let ordered = schema.positionals().chain(schema.optionals());
    for spec in ordered {
        let Some(value) = lookup(params, spec) else {
            continue;
        };
        encode_value(spec, value, staging, &mut tokens)?;
    }
    Ok(tokens)
}

/// Finds the transport value for `spec` by canonical name, then aliases.
fn lookup<'p>(params: &'p TransportParams, spec: &ParameterSpec) -> Option<&'p TransportValue> {
    params
        .get(&spec.name)
        .or_else(|| spec.aliases.iter().find_map(|alias| params.get(alias)))
}

/// Appends the tokens for one parameter.
fn encode_value(
    spec: &ParameterSpec,
    value: &TransportValue,
    staging: &mut StagingArea,
    tokens: &mut Vec<ArgToken>,
) -> Result<(), NormalizeError> {
    let option = (spec.kind == ParameterKind::Optional).then(|| ArgToken::option(&spec.name));
    match spec.value_kind {
        ValueKind::Flag => {
            if is_truthy(value) {
                tokens.extend(option);
            }
        }
        ValueKind::List => {
            let items = list_items(spec, value);
            if !items.is_empty() {
                tokens.extend(option);
                tokens.extend(items.into_iter().map(ArgToken::Value));
            }
        }
        ValueKind::String | ValueKind::File => {
            let scalar = single_value(spec, value)?;
            let text = match (spec.value_kind, scalar) {
                (ValueKind::String, TransportValue::Text(text)) => text.clone(),
                (ValueKind::File, TransportValue::Upload(upload)) => {
                    staging.stage(upload)?.display().to_string()
                }
                (_, other) => {
                    skip(spec, other.shape());
                    return Ok(());
                }
            };
            if text.is_empty() && option.is_some() {
                return Ok(());
            }
            tokens.extend(option);
            tokens.push(ArgToken::Value(text));
        }
    }
    Ok(())
}

/// Unwraps single-element lists and rejects several values for a scalar.
fn single_value<'v>(
    spec: &ParameterSpec,
    value: &'v TransportValue,
) -> Result<&'v TransportValue, NormalizeError> {
    match value {
        TransportValue::List(items) if items.len() == 1 => Ok(&items[0]),
        TransportValue::List(items) if items.len() > 1 => {
            Err(ValidationError(msg!("validation.single_value", name = spec.name)).into())
        }
        other => Ok(other),
    }
}

/// Collects the string items of a list parameter, wrapping scalars.
fn list_items(spec: &ParameterSpec, value: &TransportValue) -> Vec<String> {
    let items: &[TransportValue] = match value {
        TransportValue::List(items) => items,
        scalar => std::slice::from_ref(scalar),
    };
    items
        .iter()
        .filter_map(|item| match item {
            TransportValue::Text(text) => Some(text.clone()),
            other => {
                skip(spec, other.shape());
                None
            }
        })
        .collect()
}

/// Flag truthiness: `true`, or any string other than empty, `0`, `false`, `no`, `off`.
fn is_truthy(value: &TransportValue) -> bool {
    match value {
        TransportValue::Bool(flag) => *flag,
        TransportValue::Text(text) => {
            let text = text.trim().to_ascii_lowercase();
            !matches!(text.as_str(), "" | "0" | "false" | "no" | "off")
        }
        TransportValue::List(items) => items.iter().any(is_truthy),
        TransportValue::Upload(_) | TransportValue::Unsupported(_) => false,
    }
}

/// Logs a skipped value.
fn skip(spec: &ParameterSpec, shape: &str) {
    tracing::warn!(
        parameter = %spec.name,
        shape,
        "{}",
        crate::t!("normalize.skipped", name = spec.name, shape = shape)
    );
}

// ============================================================================
// SECTION: Tests
// ============================================================================
