// crates/actiongate-core/src/core/error.rs
// ============================================================================
// Module: ActionGate Error Taxonomy
// Description: Request-time and load-time error kinds shared by both surfaces.
// Purpose: Give every failure one intrinsic HTTP status and one CLI exit code.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every failure crossing the dispatcher is normalized into a
//! [`GatewayError`] before a surface renders it. Load-time problems in the
//! action registry are [`RegistryError`]s and never reach a request.
//!
//! ## Invariants
//! - Each [`ErrorKind`] maps to exactly one HTTP status and one exit code.
//! - Raw internal failures only surface inside [`InternalFailure`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::core::identifiers::ActionId;
use crate::core::identifiers::ProfileName;
use crate::core::schema::SchemaError;
use crate::i18n::Locale;
use crate::i18n::Message;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Exit code for domain errors raised by an action.
pub const EXIT_DOMAIN: u8 = 1;
/// Exit code for validation and route errors.
pub const EXIT_USAGE: u8 = 2;
/// Exit code for authentication errors.
pub const EXIT_AUTH: u8 = 3;
/// Exit code for dispatch timeouts.
pub const EXIT_TIMEOUT: u8 = 4;
/// Exit code for internal errors (`EX_SOFTWARE`).
pub const EXIT_INTERNAL: u8 = 70;
/// Exit code for configuration errors (`EX_CONFIG`).
pub const EXIT_CONFIG: u8 = 78;

// ============================================================================
// SECTION: Domain Errors
// ============================================================================

/// Payload of a domain error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainPayload {
    /// Plain text body.
    Text(String),
    /// Structured body.
    Json(serde_json::Value),
}

impl fmt::Display for DomainPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Json(value) => value.fmt(f),
        }
    }
}

/// Error chosen by an action, carrying its own HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{payload}")]
pub struct DomainError {
    /// HTTP status code.
    pub status: u16,
    /// Response payload.
    pub payload: DomainPayload,
}

impl DomainError {
    /// Builds a plain-text domain error.
    #[must_use]
    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            payload: DomainPayload::Text(text.into()),
        }
    }

    /// Builds a structured domain error.
    #[must_use]
    pub const fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            payload: DomainPayload::Json(value),
        }
    }
}

/// Failure returned by an action handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Expected failure with an action-chosen status.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Unexpected failure; logged and reported generically.
    #[error("{0}")]
    Internal(String),
}

// ============================================================================
// SECTION: Gateway Errors
// ============================================================================

/// Diagnostic context of an internal failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalFailure {
    /// Generic caller-facing message.
    pub message: Message,
    /// Route or action identifier that failed.
    pub route: String,
    /// Canonical arguments received.
    pub arguments: serde_json::Value,
    /// Trace string for operators.
    pub trace: String,
}

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing argument.
    Validation,
    /// Credentials rejected or session invalid.
    Authentication,
    /// No action for the route or command.
    RouteNotFound,
    /// Cross-site form submission refused.
    CsrfRejected,
    /// Dispatch exceeded its deadline.
    ActionTimeout,
    /// Action-chosen failure.
    Domain,
    /// Unexpected failure.
    Internal,
}

impl ErrorKind {
    /// Returns the stable label used in logs and error bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::RouteNotFound => "route_not_found",
            Self::CsrfRejected => "csrf_rejected",
            Self::ActionTimeout => "action_timeout",
            Self::Domain => "domain",
            Self::Internal => "internal",
        }
    }
}

/// Request-time error normalized at the dispatcher boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Malformed or missing argument.
    #[error("{0}")]
    Validation(Message),
    /// Credentials rejected or session invalid.
    #[error("{0}")]
    Authentication(Message),
    /// No action for the route or command.
    #[error("{0}")]
    RouteNotFound(Message),
    /// Cross-site form submission refused.
    #[error("{0}")]
    CsrfRejected(Message),
    /// Dispatch exceeded its deadline.
    #[error("{0}")]
    ActionTimeout(Message),
    /// Action-chosen failure.
    #[error(transparent)]
    Domain(DomainError),
    /// Unexpected failure.
    #[error("{}", .0.message)]
    Internal(Box<InternalFailure>),
}

impl GatewayError {
    /// Builds an authentication error from a catalog key.
    #[must_use]
    pub const fn authentication(key: &'static str) -> Self {
        Self::Authentication(Message::new(key))
    }

    /// Builds an internal error.
    #[must_use]
    pub fn internal(
        message: Message,
        route: impl Into<String>,
        arguments: serde_json::Value,
        trace: impl Into<String>,
    ) -> Self {
        Self::Internal(Box::new(InternalFailure {
            message,
            route: route.into(),
            arguments,
            trace: trace.into(),
        }))
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::RouteNotFound(_) => ErrorKind::RouteNotFound,
            Self::CsrfRejected(_) => ErrorKind::CsrfRejected,
            Self::ActionTimeout(_) => ErrorKind::ActionTimeout,
            Self::Domain(_) => ErrorKind::Domain,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the intrinsic HTTP status.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Authentication(_) => 401,
            Self::CsrfRejected(_) => 403,
            Self::RouteNotFound(_) => 404,
            Self::ActionTimeout(_) => 504,
            Self::Domain(error) => error.status,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the CLI exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::RouteNotFound(_) => EXIT_USAGE,
            Self::Authentication(_) | Self::CsrfRejected(_) => EXIT_AUTH,
            Self::ActionTimeout(_) => EXIT_TIMEOUT,
            Self::Domain(_) => EXIT_DOMAIN,
            Self::Internal(_) => EXIT_INTERNAL,
        }
    }

    /// Returns the caller-facing message key, when the error has one.
    #[must_use]
    pub fn message_key(&self) -> Option<&'static str> {
        match self {
            Self::Validation(message)
            | Self::Authentication(message)
            | Self::RouteNotFound(message)
            | Self::CsrfRejected(message)
            | Self::ActionTimeout(message) => Some(message.key()),
            Self::Internal(failure) => Some(failure.message.key()),
            Self::Domain(_) => None,
        }
    }

    /// Renders the caller-facing text in `locale`.
    #[must_use]
    pub fn render(&self, locale: Locale) -> String {
        match self {
            Self::Validation(message)
            | Self::Authentication(message)
            | Self::RouteNotFound(message)
            | Self::CsrfRejected(message)
            | Self::ActionTimeout(message) => message.render(locale),
            Self::Domain(error) => error.payload.to_string(),
            Self::Internal(failure) => failure.message.render(locale),
        }
    }
}

// ============================================================================
// SECTION: Registry Errors
// ============================================================================

/// Load-time errors raised while building the route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two actions declare the same `(method, path)`.
    #[error("route '{route}' is already defined by action '{existing}'")]
    DuplicateRoute {
        /// Route label.
        route: String,
        /// Action that owns the route.
        existing: ActionId,
    },
    /// The same tid is registered twice.
    #[error("action '{0}' is already registered")]
    DuplicateAction(ActionId),
    /// Routes were declared but none is valid.
    #[error("no valid api route found for action '{0}'")]
    NoValidRoute(ActionId),
    /// The tid is empty or has empty segments.
    #[error("action identifier '{0}' is malformed")]
    InvalidAction(ActionId),
    /// The argument schema is invalid.
    #[error("action '{tid}': {source}")]
    Schema {
        /// Action identifier.
        tid: ActionId,
        /// Schema failure.
        source: SchemaError,
    },
    /// The action names a profile nobody configured.
    #[error("action '{tid}' requires unknown authentication profile '{profile}'")]
    UnknownProfile {
        /// Action identifier.
        tid: ActionId,
        /// Missing profile.
        profile: ProfileName,
    },
}

// ============================================================================
// SECTION: Tests
// ============================================================================
