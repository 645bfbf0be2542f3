// crates/actiongate-core/src/core/session.rs
// ============================================================================
// Module: ActionGate Sessions
// Description: Session records and the per-profile authentication state machine.
// Purpose: Make login and logout transitions explicit and checkable.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Session`] is the decoded content of a caller's session evidence. The
//! server keeps no session table: the caller holds the only durable copy.
//! [`SessionState`] tracks one caller's progress through
//! `Anonymous -> Authenticating -> Authenticated -> Anonymous`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ProfileName;
use crate::core::identifiers::SessionId;

// ============================================================================
// SECTION: Session
// ============================================================================

/// Authenticator-supplied claims.
pub type Claims = BTreeMap<String, serde_json::Value>;

/// Decoded session evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Profile that approved the session.
    pub profile: ProfileName,
    /// Stable session identifier.
    pub id: SessionId,
    /// Claims merged across logins.
    #[serde(default)]
    pub claims: Claims,
    /// Issue time, seconds since the Unix epoch.
    pub issued_at: i64,
}

impl Session {
    /// Merges `claims` into the session; newer values win.
    pub fn merge_claims(&mut self, claims: Claims) {
        self.claims.extend(claims);
    }
}

// ============================================================================
// SECTION: State Machine
// ============================================================================

/// Authentication state of one caller for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No valid evidence.
    #[default]
    Anonymous,
    /// Credentials are being verified.
    Authenticating,
    /// Evidence verified.
    Authenticated(Session),
}

/// Inputs that move a [`SessionState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were submitted.
    CredentialsSubmitted,
    /// The backend accepted the credentials and a session was issued.
    Issued(Session),
    /// The backend rejected the credentials.
    Rejected,
    /// Valid evidence was presented.
    EvidenceAccepted(Session),
    /// Evidence was missing, malformed, forged, or expired.
    EvidenceInvalid,
    /// The caller logged out.
    LoggedOut,
}

/// A transition not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session transition from {from} on {event}")]
pub struct InvalidTransition {
    /// State label before the event.
    pub from: &'static str,
    /// Event label.
    pub event: &'static str,
}

impl SessionState {
    /// Returns the state label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::Authenticated(_) => "authenticated",
        }
    }

    /// Returns the session when authenticated.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Applies `event`, returning the next state.
    ///
    /// Re-authentication is allowed from `Authenticated`; it passes back
    /// through `Authenticating` so the existing session id can be kept.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when `event` is not valid in this state.
    pub fn apply(self, event: SessionEvent) -> Result<Self, InvalidTransition> {
        match (self, event) {
            (Self::Anonymous | Self::Authenticated(_), SessionEvent::CredentialsSubmitted) => {
                Ok(Self::Authenticating)
            }
            (Self::Authenticating, SessionEvent::Issued(session))
            | (Self::Anonymous | Self::Authenticated(_), SessionEvent::EvidenceAccepted(session)) => {
                Ok(Self::Authenticated(session))
            }
            (Self::Authenticating, SessionEvent::Rejected)
            | (_, SessionEvent::EvidenceInvalid | SessionEvent::LoggedOut) => Ok(Self::Anonymous),
            (state, event) => Err(InvalidTransition {
                from: state.label(),
                event: event_label(&event),
            }),
        }
    }
}

/// Returns the event label.
const fn event_label(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::CredentialsSubmitted => "credentials_submitted",
        SessionEvent::Issued(_) => "issued",
        SessionEvent::Rejected => "rejected",
        SessionEvent::EvidenceAccepted(_) => "evidence_accepted",
        SessionEvent::EvidenceInvalid => "evidence_invalid",
        SessionEvent::LoggedOut => "logged_out",
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
