// crates/actiongate-core/src/runtime/parser.rs
// ============================================================================
// Module: ActionGate Shared Argument Parser
// Description: Validating parser from argument tokens to canonical arguments.
// Purpose: Apply one set of binding and validation rules to every surface.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Both surfaces feed [`ArgumentParser::parse`]: the CLI through
//! [`lex_cli`], the HTTP API through the normalization engine. The parser
//! binds options and positionals, applies defaults, enforces required
//! parameters and `extra` rules, and emits a [`CanonicalArgumentSet`] in
//! schema order.
//!
//! ## Invariants
//! - A scalar parameter receives at most one value.
//! - Flags absent from the stream normalize to their default, else `false`.
//! - Every validation failure is a [`ValidationError`]; nothing panics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::arguments::ArgToken;
use crate::core::arguments::ArgumentValue;
use crate::core::arguments::CanonicalArgumentSet;
use crate::core::error::GatewayError;
use crate::core::schema::ArgumentSchema;
use crate::core::schema::ParameterSpec;
use crate::core::schema::ValueKind;
use crate::i18n::Message;
use crate::msg;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Malformed or missing argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub Message);

impl From<ValidationError> for GatewayError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.0)
    }
}

// ============================================================================
// SECTION: Parser
// ============================================================================

/// Validating parser bound to one action's schema.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentParser<'a> {
    /// Schema the tokens are checked against.
    schema: &'a ArgumentSchema,
}

impl<'a> ArgumentParser<'a> {
    /// Creates a parser for `schema`.
    #[must_use]
    pub const fn new(schema: &'a ArgumentSchema) -> Self {
        Self {
            schema,
        }
    }

    /// Parses `tokens` into a canonical argument set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on unknown options, missing values, surplus
    /// positionals, repeated scalars, missing required parameters, or failed
    /// `extra` rules.
    pub fn parse(&self, tokens: &[ArgToken]) -> Result<CanonicalArgumentSet, ValidationError> {
        let mut bound: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut flags: BTreeSet<&str> = BTreeSet::new();
        let mut positional_values: Vec<String> = Vec::new();

        let mut index = 0;
        while index < tokens.len() {
            match &tokens[index] {
                ArgToken::Value(value) => positional_values.push(value.clone()),
                ArgToken::Option(option) => {
                    let spec = self.schema.lookup_option(option).ok_or_else(|| {
                        ValidationError(msg!("validation.unknown_option", option = format!("--{option}")))
                    })?;
                    let values = bound.entry(spec.name.as_str()).or_default();
                    match spec.value_kind {
                        ValueKind::Flag => {
                            flags.insert(spec.name.as_str());
                        }
                        ValueKind::List => {
                            let start = values.len();
                            while let Some(ArgToken::Value(value)) = tokens.get(index + 1) {
                                values.push(value.clone());
                                index += 1;
                            }
                            if values.len() == start {
                                return Err(missing_value(option));
                            }
                        }
                        ValueKind::String | ValueKind::File => {
                            let Some(ArgToken::Value(value)) = tokens.get(index + 1) else {
                                return Err(missing_value(option));
                            };
                            if !values.is_empty() {
                                return Err(ValidationError(msg!(
                                    "validation.single_value",
                                    name = spec.name
                                )));
                            }
                            values.push(value.clone());
                            index += 1;
                        }
                    }
                }
            }
            index += 1;
        }

        self.bind_positionals(positional_values, &mut bound)?;

        let mut arguments = CanonicalArgumentSet::new();
        for spec in self.schema.parameters() {
            let value = if spec.value_kind == ValueKind::Flag {
                if flags.contains(spec.name.as_str()) {
                    ArgumentValue::Bool(true)
                } else {
                    spec.default.clone().unwrap_or(ArgumentValue::Bool(false))
                }
            } else {
                match bound.remove(spec.name.as_str()).filter(|values| !values.is_empty()) {
                    Some(values) => typed_value(spec, values),
                    None if spec.is_required() => {
                        return Err(ValidationError(msg!("validation.required", name = spec.name)));
                    }
                    None => spec.default.clone().unwrap_or(ArgumentValue::Absent),
                }
            };
            check_extra(spec, &value)?;
            arguments.push(spec.name.clone(), value);
        }
        Ok(arguments)
    }

    /// Assigns bare values to positional parameters in declaration order.
    fn bind_positionals(
        &self,
        values: Vec<String>,
        bound: &mut BTreeMap<&'a str, Vec<String>>,
    ) -> Result<(), ValidationError> {
        let positionals: Vec<&'a ParameterSpec> = self.schema.positionals().collect();
        let mut remaining = values.into_iter().peekable();
        for (position, spec) in positionals.iter().copied().enumerate() {
            if remaining.peek().is_none() {
                break;
            }
            let slot = bound.entry(spec.name.as_str()).or_default();
            if spec.value_kind == ValueKind::List {
                let reserved = positionals.len() - position - 1;
                let available = remaining.len().saturating_sub(reserved).max(1);
                slot.extend(remaining.by_ref().take(available));
            } else if let Some(value) = remaining.next() {
                slot.push(value);
            }
        }
        match remaining.next() {
            Some(value) => Err(ValidationError(msg!("validation.extra_positional", value = value))),
            None => Ok(()),
        }
    }
}

/// Builds the error for an option missing its value.
fn missing_value(option: &str) -> ValidationError {
    ValidationError(msg!("validation.missing_value", option = format!("--{option}")))
}

/// Converts bound strings into the canonical value for `spec`.
fn typed_value(spec: &ParameterSpec, mut values: Vec<String>) -> ArgumentValue {
    match spec.value_kind {
        ValueKind::List => ArgumentValue::List(values),
        ValueKind::File => ArgumentValue::Path(PathBuf::from(values.swap_remove(0))),
        ValueKind::String | ValueKind::Flag => ArgumentValue::Text(values.swap_remove(0)),
    }
}

/// Applies the `extra.pattern` rule to string values.
fn check_extra(spec: &ParameterSpec, value: &ArgumentValue) -> Result<(), ValidationError> {
    let Some((regex, message)) = &spec.extra.pattern else {
        return Ok(());
    };
    let candidates: Vec<&str> = match value {
        ArgumentValue::Text(text) => vec![text.as_str()],
        ArgumentValue::List(items) => items.iter().map(String::as_str).collect(),
        _ => Vec::new(),
    };
    if candidates.iter().all(|candidate| regex.is_match(candidate)) {
        return Ok(());
    }
    Err(ValidationError(msg!(
        "validation.pattern",
        name = spec.name,
        message = crate::i18n::translate(message, Vec::new())
    )))
}

// ============================================================================
// SECTION: CLI Lexer
// ============================================================================

/// Lexes command-line words into argument tokens.
///
/// `--name=value` splits into an option and a value, `--` ends option
/// parsing, and a lone `-` or a negative number stays a value.
///
/// # Errors
///
/// Returns [`ValidationError`] when `--flag=value` targets a flag.
pub fn lex_cli<S: AsRef<str>>(
    words: &[S],
    schema: &ArgumentSchema,
) -> Result<Vec<ArgToken>, ValidationError> {
    let mut tokens = Vec::with_capacity(words.len());
    let mut options_done = false;
    for word in words {
        let word = word.as_ref();
        if options_done {
            tokens.push(ArgToken::value(word));
            continue;
        }
        if word == "--" {
            options_done = true;
            continue;
        }
        if let Some(long) = word.strip_prefix("--") {
            if let Some((name, value)) = long.split_once('=') {
                if schema.lookup_option(name).is_some_and(|spec| spec.value_kind == ValueKind::Flag)
                {
                    return Err(ValidationError(msg!("validation.flag_value", name = name)));
                }
                tokens.push(ArgToken::option(name));
                tokens.push(ArgToken::value(value));
            } else {
                tokens.push(ArgToken::option(long));
            }
            continue;
        }
        match word.strip_prefix('-') {
            Some(short) if !short.is_empty() && short.parse::<f64>().is_err() => {
                tokens.push(ArgToken::option(short));
            }
            _ => tokens.push(ArgToken::value(word)),
        }
    }
    Ok(tokens)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
