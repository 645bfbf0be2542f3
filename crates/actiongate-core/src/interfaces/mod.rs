// crates/actiongate-core/src/interfaces/mod.rs
// ============================================================================
// Module: ActionGate Interfaces
// Description: Capability traits for actions, authenticators, and audit sinks.
// Purpose: Let callers depend on contracts rather than concrete backends.
// Dependencies: async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! The gateway talks to three kinds of collaborators:
//! - [`ActionHandler`] implements an action;
//! - [`Authenticator`] verifies credentials and owns session evidence;
//! - [`AuthAuditSink`] records authentication decisions.
//!
//! Security posture: credentials are opaque and never logged; see
//! [`Credentials`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::arguments::CanonicalArgumentSet;
use crate::core::error::ActionError;
use crate::core::identifiers::ActionId;
use crate::core::identifiers::ProfileName;
use crate::core::result::ResultValue;
use crate::core::session::Claims;
use crate::core::session::Session;
use crate::i18n::Locale;
use crate::i18n::Message;

// ============================================================================
// SECTION: Invocation Context
// ============================================================================

/// Surface a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interface {
    /// Command-line invocation.
    Cli,
    /// HTTP API request.
    Api,
}

impl Interface {
    /// Returns the interface label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Api => "api",
        }
    }
}

/// Context handed to an action alongside its canonical arguments.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Action being invoked.
    pub tid: ActionId,
    /// Originating surface.
    pub interface: Interface,
    /// Session that approved the call, when the action requires a profile.
    pub session: Option<Session>,
    /// Locale requested by the caller.
    pub locale: Locale,
}

// ============================================================================
// SECTION: Action Handlers
// ============================================================================

/// Implementation of one action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Runs the action.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Domain`] for expected failures and
    /// [`ActionError::Internal`] for anything else.
    async fn invoke(
        &self,
        context: ActionContext,
        arguments: CanonicalArgumentSet,
    ) -> Result<ResultValue, ActionError>;
}

/// Adapter turning an async closure into an [`ActionHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ActionHandler for FnHandler<F>
where
    F: Fn(ActionContext, CanonicalArgumentSet) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ResultValue, ActionError>> + Send + 'static,
{
    async fn invoke(
        &self,
        context: ActionContext,
        arguments: CanonicalArgumentSet,
    ) -> Result<ResultValue, ActionError> {
        (self.0)(context, arguments).await
    }
}

/// Wraps an async closure as a shared handler.
pub fn handler_fn<F, Fut>(handler: F) -> Arc<dyn ActionHandler>
where
    F: Fn(ActionContext, CanonicalArgumentSet) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResultValue, ActionError>> + Send + 'static,
{
    Arc::new(FnHandler(handler))
}

// ============================================================================
// SECTION: Authentication
// ============================================================================

/// Opaque credentials submitted at login.
///
/// # Invariants
/// - The value is never rendered by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    /// Wraps a raw credential string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Joins a username and password as `username:password`.
    #[must_use]
    pub fn from_username_password(username: &str, password: &str) -> Self {
        Self(format!("{username}:{password}"))
    }

    /// Exposes the raw value to a verifier.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Credentials rejected with a caller-safe message.
    #[error("{0}")]
    Rejected(Message),
    /// Backend failure; logged, never shown to callers.
    #[error("authenticator backend failure: {0}")]
    Backend(String),
    /// Session evidence missing, malformed, forged, or expired.
    #[error("invalid session evidence: {0}")]
    InvalidEvidence(String),
}

/// Verifies credentials against an external identity source.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verifies `credentials`, returning claims for the session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the credentials are rejected or the backend fails.
    async fn verify(&self, credentials: &Credentials) -> Result<Claims, AuthError>;
}

/// Capability contract every authenticator backend implements.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verifies `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the credentials are rejected or the backend fails.
    async fn verify(&self, credentials: &Credentials) -> Result<Claims, AuthError>;

    /// Encodes `session` as evidence the caller stores.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Backend`] when the session cannot be encoded.
    fn issue_evidence(&self, session: &Session) -> Result<String, AuthError>;

    /// Decodes and checks evidence presented by a caller.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEvidence`] when the evidence is not acceptable.
    fn read_evidence(&self, evidence: &str) -> Result<Session, AuthError>;

    /// Invalidates evidence and returns the value that replaces the client copy.
    ///
    /// Calling it on absent or stale evidence is not an error.
    fn invalidate_evidence(&self, evidence: Option<&str>) -> String;
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Authentication decision recorded for audit.
#[derive(Debug, Clone, Serialize)]
pub struct AuthAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome.
    decision: &'static str,
    /// Operation label (`login`, `logout`, or an action tid).
    operation: String,
    /// Profile consulted.
    profile: ProfileName,
    /// Interface label.
    interface: &'static str,
    /// Session identifier (allow events only).
    session_id: Option<String>,
    /// Failure reason (deny events only).
    reason: Option<String>,
}

impl AuthAuditEvent {
    /// Builds an allow event.
    #[must_use]
    pub fn allowed(
        operation: impl Into<String>,
        interface: Interface,
        session: &Session,
    ) -> Self {
        Self {
            event: "actiongate_auth",
            decision: "allow",
            operation: operation.into(),
            profile: session.profile.clone(),
            interface: interface.as_str(),
            session_id: Some(session.id.to_string()),
            reason: None,
        }
    }

    /// Builds a deny event.
    #[must_use]
    pub fn denied(
        operation: impl Into<String>,
        interface: Interface,
        profile: &ProfileName,
        reason: &str,
    ) -> Self {
        Self {
            event: "actiongate_auth",
            decision: "deny",
            operation: operation.into(),
            profile: profile.clone(),
            interface: interface.as_str(),
            session_id: None,
            reason: Some(reason.to_string()),
        }
    }

    /// Returns the decision label.
    #[must_use]
    pub const fn decision(&self) -> &'static str {
        self.decision
    }

    /// Returns the operation label.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

/// Audit sink for authentication decisions.
pub trait AuthAuditSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &AuthAuditEvent);
}

/// Audit sink that emits JSON payloads through `tracing`.
pub struct TracingAuditSink;

impl AuthAuditSink for TracingAuditSink {
    fn record(&self, event: &AuthAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            tracing::info!(
                target: "actiongate::audit",
                decision = event.decision(),
                operation = event.operation(),
                "{payload}"
            );
        }
    }
}

/// No-op audit sink for tests.
pub struct NoopAuditSink;

impl AuthAuditSink for NoopAuditSink {
    fn record(&self, _event: &AuthAuditEvent) {}
}
