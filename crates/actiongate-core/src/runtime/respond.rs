// crates/actiongate-core/src/runtime/respond.rs
// ============================================================================
// Module: ActionGate Response Translator
// Description: Maps results and gateway errors onto HTTP and CLI conventions.
// Purpose: Keep status codes, bodies, and exit codes consistent across surfaces.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! HTTP success statuses depend on the method: `POST` answers 201, `GET`
//! answers 200, and other methods answer 204 when the result is empty.
//! Errors map through [`GatewayError::http_status`]; internal failures carry
//! `{route, arguments, traceback}` so operators can reproduce them.
//!
//! The CLI prints results as JSON, plain text, or nothing, and exits with
//! [`GatewayError::exit_code`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::core::error::DomainPayload;
use crate::core::error::GatewayError;
use crate::core::result::ResultValue;
use crate::i18n::Locale;
use crate::runtime::routes::HttpMethod;

// ============================================================================
// SECTION: HTTP
// ============================================================================

/// Transport-neutral response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(serde_json::Value),
    /// Plain text.
    Text(String),
}

/// Status plus body, ready for the HTTP surface.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: ResponseBody,
}

/// Translates a successful result.
#[must_use]
pub fn success_reply(method: HttpMethod, value: &ResultValue) -> HttpReply {
    let status = match method {
        HttpMethod::Post => 201,
        HttpMethod::Get => 200,
        HttpMethod::Put | HttpMethod::Delete if value.is_empty() => {
            return HttpReply {
                status: 204,
                body: ResponseBody::Empty,
            };
        }
        HttpMethod::Put | HttpMethod::Delete => 200,
    };
    HttpReply {
        status,
        body: ResponseBody::Json(value.to_json()),
    }
}

/// Translates a gateway error.
#[must_use]
pub fn error_reply(error: &GatewayError, locale: Locale) -> HttpReply {
    let body = match error {
        GatewayError::Internal(failure) => ResponseBody::Json(serde_json::json!({
            "route": failure.route,
            "arguments": failure.arguments,
            "traceback": failure.trace,
        })),
        GatewayError::Domain(domain) => match &domain.payload {
            DomainPayload::Text(text) => ResponseBody::Text(text.clone()),
            DomainPayload::Json(value) => ResponseBody::Json(value.clone()),
        },
        GatewayError::Authentication(_) | GatewayError::CsrfRejected(_) => {
            ResponseBody::Text(error.render(locale))
        }
        GatewayError::Validation(_) | GatewayError::RouteNotFound(_) | GatewayError::ActionTimeout(_) => {
            ResponseBody::Json(serde_json::json!({
                "error": error.render(locale),
                "kind": error.kind().as_str(),
            }))
        }
    };
    HttpReply {
        status: error.http_status(),
        body,
    }
}

// ============================================================================
// SECTION: CLI
// ============================================================================

/// CLI result rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CliOutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// Human-readable text.
    #[default]
    Plain,
    /// Print nothing.
    None,
}

impl CliOutputFormat {
    /// Returns the flag value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Plain => "plain",
            Self::None => "none",
        }
    }
}

impl fmt::Display for CliOutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CliOutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "plain" | "text" => Ok(Self::Plain),
            "none" => Ok(Self::None),
            other => Err(format!("unsupported output format: {other}")),
        }
    }
}

/// Renders a result for stdout; `None` means print nothing.
#[must_use]
pub fn render_cli(value: &ResultValue, format: CliOutputFormat) -> Option<String> {
    match format {
        CliOutputFormat::None => None,
        CliOutputFormat::Json => serde_json::to_string_pretty(&value.to_json()).ok(),
        CliOutputFormat::Plain => render_plain(value),
    }
}

/// Renders a gateway error for stderr.
#[must_use]
pub fn render_cli_error(error: &GatewayError, locale: Locale) -> String {
    error.render(locale)
}

/// Plain rendering: scalars as text, lists one item per line, maps as `key: value`.
fn render_plain(value: &ResultValue) -> Option<String> {
    let json = value.to_json();
    let text = match json {
        serde_json::Value::Null => return None,
        serde_json::Value::String(text) => text,
        serde_json::Value::Array(items) => {
            items.iter().map(plain_scalar).collect::<Vec<_>>().join("\n")
        }
        serde_json::Value::Object(entries) => entries
            .iter()
            .map(|(key, value)| format!("{key}: {}", plain_scalar(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    };
    Some(text)
}

/// Renders a nested JSON value on one line.
fn plain_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
