// crates/actiongate-core/src/runtime/auth.rs
// ============================================================================
// Module: ActionGate Authentication Sessions
// Description: Session manager, signed-evidence authenticator, and profile registry.
// Purpose: Approve callers per profile without server-side session storage.
// Dependencies: base64, hmac, sha2, subtle, time, tracing
// ============================================================================

//! ## Overview
//! Each profile owns one [`SessionManager`], which drives the
//! [`SessionState`] machine against an [`Authenticator`]. The shipped
//! [`SignedCookieAuthenticator`] encodes sessions as
//! `base64url(json) "." base64url(hmac_sha256)` and delegates credential
//! checks to a [`CredentialVerifier`].
//!
//! Security posture: evidence is tamper-evident, not encrypted; claims must
//! not hold secrets. Signature checks use constant-time comparison. Backend
//! failures are logged and reported to callers only as
//! `unable_authenticate`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::Hmac;
use hmac::Mac;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::core::error::GatewayError;
use crate::core::error::RegistryError;
use crate::core::identifiers::ProfileName;
use crate::core::identifiers::SessionId;
use crate::core::session::Claims;
use crate::core::session::Session;
use crate::core::session::SessionEvent;
use crate::core::session::SessionState;
use crate::interfaces::AuthAuditEvent;
use crate::interfaces::AuthAuditSink;
use crate::interfaces::AuthError;
use crate::interfaces::Authenticator;
use crate::interfaces::CredentialVerifier;
use crate::interfaces::Credentials;
use crate::interfaces::Interface;
use crate::i18n::Message;
use crate::msg;
use crate::runtime::routes::RouteTable;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of generated session keys in bytes.
pub const SESSION_KEY_BYTES: usize = 32;

/// HMAC-SHA256 alias.
type HmacSha256 = Hmac<Sha256>;

/// Returns a fresh random session key.
#[must_use]
pub fn random_session_key() -> Vec<u8> {
    rand::random::<[u8; SESSION_KEY_BYTES]>().to_vec()
}

/// Returns the lowercase hex SHA-256 digest of `input`.
#[must_use]
pub fn sha256_hex(input: &[u8]) -> String {
    use std::fmt::Write as _;

    let digest = Sha256::digest(input);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Current time in seconds since the Unix epoch.
fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

// ============================================================================
// SECTION: Static Credentials
// ============================================================================

/// Verifier accepting credentials whose SHA-256 digest is configured.
///
/// Credentials of the form `username:password` yield a `username` claim.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    /// Accepted digests (lowercase hex).
    digests: Vec<String>,
}

impl StaticCredentials {
    /// Creates a verifier from hex digests.
    #[must_use]
    pub fn new<I, S>(digests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            digests: digests.into_iter().map(|digest| digest.as_ref().to_ascii_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, credentials: &Credentials) -> Result<Claims, AuthError> {
        let presented = sha256_hex(credentials.expose().as_bytes());
        let matched = self
            .digests
            .iter()
            .fold(false, |found, digest| found | bool::from(digest.as_bytes().ct_eq(presented.as_bytes())));
        if !matched {
            return Err(AuthError::Rejected(Message::new("auth.invalid_password")));
        }
        let mut claims = Claims::new();
        if let Some((username, _)) = credentials.expose().split_once(':') {
            claims.insert("username".to_string(), serde_json::Value::String(username.to_string()));
        }
        Ok(claims)
    }
}

// ============================================================================
// SECTION: Signed Evidence Authenticator
// ============================================================================

/// Authenticator storing sessions in HMAC-signed caller-held evidence.
pub struct SignedCookieAuthenticator {
    /// Profile the evidence is scoped to.
    profile: ProfileName,
    /// Credential backend.
    verifier: Arc<dyn CredentialVerifier>,
    /// HMAC key.
    key: Vec<u8>,
    /// Maximum evidence age; unlimited when `None`.
    max_age: Option<Duration>,
}

impl SignedCookieAuthenticator {
    /// Creates an authenticator for `profile`.
    #[must_use]
    pub fn new(
        profile: impl Into<ProfileName>,
        verifier: Arc<dyn CredentialVerifier>,
        key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            profile: profile.into(),
            verifier,
            key: key.into(),
            max_age: None,
        }
    }

    /// Expires evidence older than `max_age`.
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Computes the signature over `payload`.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|err| AuthError::Backend(err.to_string()))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

#[async_trait]
impl Authenticator for SignedCookieAuthenticator {
    async fn verify(&self, credentials: &Credentials) -> Result<Claims, AuthError> {
        self.verifier.verify(credentials).await
    }

    fn issue_evidence(&self, session: &Session) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(session).map_err(|err| AuthError::Backend(err.to_string()))?;
        let encoded = URL_SAFE_NO_PAD.encode(&payload);
        let signature = self.sign(encoded.as_bytes())?;
        Ok(format!("{encoded}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    fn read_evidence(&self, evidence: &str) -> Result<Session, AuthError> {
        let invalid = |reason: &str| AuthError::InvalidEvidence(reason.to_string());
        let (encoded, signature) = evidence.split_once('.').ok_or_else(|| invalid("malformed"))?;
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid("malformed signature"))?;
        let expected = self.sign(encoded.as_bytes())?;
        if !bool::from(expected.ct_eq(&signature)) {
            return Err(invalid("bad signature"));
        }
        let payload = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| invalid("malformed payload"))?;
        let session: Session =
            serde_json::from_slice(&payload).map_err(|_| invalid("malformed payload"))?;
        if session.profile != self.profile {
            return Err(invalid("profile mismatch"));
        }
        if let Some(max_age) = self.max_age {
            let age = now_unix().saturating_sub(session.issued_at);
            if age < 0 || u64::try_from(age).map_or(true, |age| age > max_age.as_secs()) {
                return Err(invalid("expired"));
            }
        }
        Ok(session)
    }

    fn invalidate_evidence(&self, evidence: Option<&str>) -> String {
        tracing::debug!(
            profile = %self.profile,
            present = evidence.is_some(),
            "session evidence invalidated"
        );
        String::new()
    }
}

// ============================================================================
// SECTION: Session Manager
// ============================================================================

/// Session plus the evidence the caller must store.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Decoded session.
    pub session: Session,
    /// Evidence string.
    pub evidence: String,
}

/// Login, logout, and validation for one profile.
pub struct SessionManager {
    /// Profile name.
    profile: ProfileName,
    /// Backend capability.
    authenticator: Arc<dyn Authenticator>,
    /// Audit sink for decisions.
    audit: Arc<dyn AuthAuditSink>,
}

impl SessionManager {
    /// Creates a manager for `profile`.
    #[must_use]
    pub fn new(
        profile: impl Into<ProfileName>,
        authenticator: Arc<dyn Authenticator>,
        audit: Arc<dyn AuthAuditSink>,
    ) -> Self {
        Self {
            profile: profile.into(),
            authenticator,
            audit,
        }
    }

    /// Returns the profile name.
    #[must_use]
    pub const fn profile(&self) -> &ProfileName {
        &self.profile
    }

    /// Verifies credentials; backend failures become `unable_authenticate`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Authentication`] when verification fails.
    pub async fn authenticate_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Claims, GatewayError> {
        match self.authenticator.verify(credentials).await {
            Ok(claims) => Ok(claims),
            Err(AuthError::Rejected(message)) => Err(GatewayError::Authentication(message)),
            Err(error) => {
                tracing::error!(profile = %self.profile, error = %error, "authenticator failure");
                Err(GatewayError::authentication("auth.unable_authenticate"))
            }
        }
    }

    /// Derives the caller's state from presented evidence.
    ///
    /// Valid evidence yields [`SessionState::Authenticated`]; missing or
    /// invalid evidence yields [`SessionState::Anonymous`].
    ///
    /// # Errors
    ///
    /// Returns `unable_authenticate` if the state machine refuses the transition.
    pub fn state_for(&self, evidence: Option<&str>) -> Result<SessionState, GatewayError> {
        let event = match evidence.map(|evidence| self.authenticator.read_evidence(evidence)) {
            Some(Ok(session)) => SessionEvent::EvidenceAccepted(session),
            Some(Err(error)) => {
                tracing::debug!(profile = %self.profile, error = %error, "session evidence rejected");
                SessionEvent::EvidenceInvalid
            }
            None => SessionEvent::EvidenceInvalid,
        };
        SessionState::Anonymous.apply(event).map_err(|error| self.transition_failure(&error))
    }

    /// Issues evidence for `claims`, keeping the session id of valid `existing` evidence.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Authentication`] when the evidence cannot be encoded.
    pub fn issue_session(
        &self,
        claims: Claims,
        existing: Option<&str>,
    ) -> Result<IssuedSession, GatewayError> {
        let previous = self.state_for(existing)?;
        self.issue(claims, previous.session().cloned())
    }

    /// Encodes a session built on `previous`, or on a fresh id.
    fn issue(&self, claims: Claims, previous: Option<Session>) -> Result<IssuedSession, GatewayError> {
        let mut session = previous.unwrap_or_else(|| Session {
            profile: self.profile.clone(),
            id: SessionId::generate(),
            claims: Claims::new(),
            issued_at: 0,
        });
        session.merge_claims(claims);
        session.issued_at = now_unix();
        let evidence = self.authenticator.issue_evidence(&session).map_err(|error| {
            tracing::error!(profile = %self.profile, error = %error, "session encoding failure");
            GatewayError::authentication("auth.unable_authenticate")
        })?;
        Ok(IssuedSession {
            session,
            evidence,
        })
    }

    /// Runs a full login: verify credentials, then issue or refresh the session.
    ///
    /// A caller already authenticated by `existing` keeps its session id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Authentication`] when credentials are rejected.
    pub async fn login(
        &self,
        credentials: &Credentials,
        existing: Option<&str>,
        interface: Interface,
    ) -> Result<IssuedSession, GatewayError> {
        let current = self.state_for(existing)?;
        let previous = current.session().cloned();
        let state = current
            .apply(SessionEvent::CredentialsSubmitted)
            .map_err(|error| self.transition_failure(&error))?;

        match self.authenticate_credentials(credentials).await {
            Ok(claims) => {
                let issued = self.issue(claims, previous)?;
                state
                    .apply(SessionEvent::Issued(issued.session.clone()))
                    .map_err(|error| self.transition_failure(&error))?;
                self.audit.record(&AuthAuditEvent::allowed("login", interface, &issued.session));
                Ok(issued)
            }
            Err(error) => {
                state.apply(SessionEvent::Rejected).map_err(|error| self.transition_failure(&error))?;
                self.audit.record(&AuthAuditEvent::denied(
                    "login",
                    interface,
                    &self.profile,
                    error.message_key().unwrap_or_default(),
                ));
                Err(error)
            }
        }
    }

    /// Validates caller evidence.
    ///
    /// # Errors
    ///
    /// Returns `authentication_required` when evidence is missing or invalid.
    pub fn validate_session(&self, evidence: Option<&str>) -> Result<Session, GatewayError> {
        let evidence = evidence.ok_or_else(|| GatewayError::authentication("auth.authentication_required"))?;
        match self.state_for(Some(evidence))? {
            SessionState::Authenticated(session) => Ok(session),
            SessionState::Anonymous | SessionState::Authenticating => {
                Err(GatewayError::authentication("auth.authentication_required"))
            }
        }
    }

    /// Validates evidence for `operation` and records the decision.
    ///
    /// # Errors
    ///
    /// Returns `authentication_required` when evidence is missing or invalid.
    pub fn authorize(
        &self,
        evidence: Option<&str>,
        operation: &str,
        interface: Interface,
    ) -> Result<Session, GatewayError> {
        match self.validate_session(evidence) {
            Ok(session) => {
                self.audit.record(&AuthAuditEvent::allowed(operation, interface, &session));
                Ok(session)
            }
            Err(error) => {
                self.audit.record(&AuthAuditEvent::denied(
                    operation,
                    interface,
                    &self.profile,
                    error.message_key().unwrap_or_default(),
                ));
                Err(error)
            }
        }
    }

    /// Invalidates evidence and returns the value that clears the client copy.
    ///
    /// Revoking absent or stale evidence is not an error.
    pub fn revoke_session(&self, evidence: Option<&str>) -> String {
        let revoked = self.state_for(evidence).and_then(|state| {
            let from = state.label();
            state
                .apply(SessionEvent::LoggedOut)
                .map(|_| from)
                .map_err(|error| self.transition_failure(&error))
        });
        if let Ok(from) = revoked {
            tracing::debug!(profile = %self.profile, from, "session revoked");
        }
        self.authenticator.invalidate_evidence(evidence)
    }

    /// Logs an impossible state transition and maps it to a generic failure.
    fn transition_failure(&self, error: &crate::core::session::InvalidTransition) -> GatewayError {
        tracing::error!(profile = %self.profile, error = %error, "session state machine violation");
        GatewayError::authentication("auth.unable_authenticate")
    }
}

// ============================================================================
// SECTION: Profile Registry
// ============================================================================

/// Session managers keyed by profile, plus the default login profile.
#[derive(Default)]
pub struct ProfileRegistry {
    /// Managers by profile.
    managers: BTreeMap<ProfileName, Arc<SessionManager>>,
    /// Profile used when a login names none.
    default_profile: Option<ProfileName>,
}

impl ProfileRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a manager, replacing any manager with the same profile.
    pub fn insert(&mut self, manager: SessionManager) {
        self.managers.insert(manager.profile().clone(), Arc::new(manager));
    }

    /// Sets the default login profile.
    pub fn set_default(&mut self, profile: impl Into<ProfileName>) {
        self.default_profile = Some(profile.into());
    }

    /// Returns the default login profile.
    #[must_use]
    pub const fn default_profile(&self) -> Option<&ProfileName> {
        self.default_profile.as_ref()
    }

    /// Returns the manager for `profile`.
    #[must_use]
    pub fn get(&self, profile: &ProfileName) -> Option<Arc<SessionManager>> {
        self.managers.get(profile).cloned()
    }

    /// Returns the manager for `profile`, or the default when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for unknown profiles.
    pub fn resolve(&self, profile: Option<&str>) -> Result<Arc<SessionManager>, GatewayError> {
        let name = match profile {
            Some(name) if !name.trim().is_empty() => ProfileName::new(name.trim()),
            _ => self
                .default_profile
                .clone()
                .ok_or_else(|| GatewayError::Validation(msg!("auth.unknown_profile", profile = "")))?,
        };
        self.get(&name)
            .ok_or_else(|| GatewayError::Validation(msg!("auth.unknown_profile", profile = name)))
    }

    /// Iterates profile names.
    pub fn profiles(&self) -> impl Iterator<Item = &ProfileName> {
        self.managers.keys()
    }

    /// Checks that every action names a configured profile.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownProfile`] for the first unknown profile.
    pub fn check_actions(&self, routes: &RouteTable) -> Result<(), RegistryError> {
        for action in routes.actions() {
            if let Some(profile) = &action.auth_profile
                && !self.managers.contains_key(profile)
            {
                return Err(RegistryError::UnknownProfile {
                    tid: action.tid.clone(),
                    profile: profile.clone(),
                });
            }
        }
        Ok(())
    }
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

    use std::sync::Mutex;

    use super::*;
    use crate::interfaces::NoopAuditSink;

    fn manager() -> SessionManager {
        let verifier = Arc::new(StaticCredentials::new([sha256_hex(b"admin:secret")]));
        let authenticator =
            SignedCookieAuthenticator::new("admin", verifier, random_session_key());
        SessionManager::new("admin", Arc::new(authenticator), Arc::new(NoopAuditSink))
    }

    #[tokio::test]
    async fn login_then_validate_round_trips_session() {
        let manager = manager();
        let issued = manager
            .login(&Credentials::new("admin:secret"), None, Interface::Api)
            .await
            .unwrap();
        let session = manager.validate_session(Some(&issued.evidence)).unwrap();
        assert_eq!(session.id, issued.session.id);
        assert_eq!(session.claims.get("username"), Some(&serde_json::json!("admin")));
    }

    #[test]
    fn relogin_keeps_session_id_and_merges_claims() {
        let manager = manager();
        let first = manager.issue_session(Claims::from([("a".into(), serde_json::json!(1))]), None).unwrap();
        let second = manager
            .issue_session(Claims::from([("b".into(), serde_json::json!(2))]), Some(&first.evidence))
            .unwrap();
        assert_eq!(first.session.id, second.session.id);
        assert_eq!(second.session.claims.len(), 2);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected_with_its_message() {
        let error = manager()
            .login(&Credentials::new("admin:nope"), None, Interface::Api)
            .await
            .unwrap_err();
        assert_eq!(error.message_key(), Some("auth.invalid_password"));
    }

    #[tokio::test]
    async fn backend_failures_are_normalized() {
        struct Broken;

        #[async_trait]
        impl CredentialVerifier for Broken {
            async fn verify(&self, _: &Credentials) -> Result<Claims, AuthError> {
                Err(AuthError::Backend("ldap: connection refused".into()))
            }
        }

        let authenticator = SignedCookieAuthenticator::new("admin", Arc::new(Broken), vec![1; 32]);
        let manager = SessionManager::new("admin", Arc::new(authenticator), Arc::new(NoopAuditSink));
        let error = manager.authenticate_credentials(&Credentials::new("x")).await.unwrap_err();
        assert_eq!(error.message_key(), Some("auth.unable_authenticate"));
        assert!(!error.render(crate::i18n::Locale::En).contains("ldap"));
    }

    #[test]
    fn tampered_or_missing_evidence_requires_authentication() {
        let manager = manager();
        let issued = manager.issue_session(Claims::new(), None).unwrap();
        let mut tampered = issued.evidence.clone();
        tampered.insert(0, 'x');
        for evidence in [None, Some("garbage"), Some(tampered.as_str())] {
            let error = manager.validate_session(evidence).unwrap_err();
            assert_eq!(error.message_key(), Some("auth.authentication_required"));
        }
    }

    #[test]
    fn evidence_from_another_profile_is_rejected() {
        let key = random_session_key();
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(StaticCredentials::default());
        let admin = SignedCookieAuthenticator::new("admin", Arc::clone(&verifier), key.clone());
        let user = SignedCookieAuthenticator::new("user", verifier, key);
        let session = Session {
            profile: ProfileName::new("admin"),
            id: SessionId::generate(),
            claims: Claims::new(),
            issued_at: now_unix(),
        };
        let evidence = admin.issue_evidence(&session).unwrap();
        assert!(user.read_evidence(&evidence).is_err());
    }

    #[test]
    fn expired_evidence_is_rejected() {
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(StaticCredentials::default());
        let authenticator = SignedCookieAuthenticator::new("admin", verifier, vec![7; 32])
            .with_max_age(Duration::from_secs(60));
        let session = Session {
            profile: ProfileName::new("admin"),
            id: SessionId::generate(),
            claims: Claims::new(),
            issued_at: now_unix() - 3600,
        };
        let evidence = authenticator.issue_evidence(&session).unwrap();
        assert!(matches!(authenticator.read_evidence(&evidence), Err(AuthError::InvalidEvidence(_))));
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<(String, String)>>,
    }

    impl AuthAuditSink for RecordingSink {
        fn record(&self, event: &AuthAuditEvent) {
            self.events
                .lock()
                .unwrap()
                .push((event.decision().to_string(), event.operation().to_string()));
        }
    }

    #[test]
    fn state_follows_presented_evidence() {
        let manager = manager();
        assert_eq!(manager.state_for(None).unwrap(), SessionState::Anonymous);
        assert_eq!(manager.state_for(Some("garbage")).unwrap(), SessionState::Anonymous);
        let issued = manager.issue_session(Claims::new(), None).unwrap();
        let state = manager.state_for(Some(&issued.evidence)).unwrap();
        assert_eq!(state.session().map(|session| &session.id), Some(&issued.session.id));
    }

    #[tokio::test]
    async fn relogin_with_valid_evidence_keeps_the_session() {
        let manager = manager();
        let first = manager
            .login(&Credentials::new("admin:secret"), None, Interface::Api)
            .await
            .unwrap();
        let second = manager
            .login(&Credentials::new("admin:secret"), Some(&first.evidence), Interface::Api)
            .await
            .unwrap();
        assert_eq!(first.session.id, second.session.id);

        let fresh = manager
            .login(&Credentials::new("admin:secret"), Some("garbage"), Interface::Api)
            .await
            .unwrap();
        assert_ne!(fresh.session.id, first.session.id);
    }

    #[tokio::test]
    async fn login_decisions_are_audited() {
        let sink = Arc::new(RecordingSink::default());
        let verifier = Arc::new(StaticCredentials::new([sha256_hex(b"admin:secret")]));
        let authenticator = SignedCookieAuthenticator::new("admin", verifier, random_session_key());
        let audit = Arc::clone(&sink) as Arc<dyn AuthAuditSink>;
        let manager = SessionManager::new("admin", Arc::new(authenticator), audit);
        manager.login(&Credentials::new("admin:secret"), None, Interface::Api).await.unwrap();
        manager.login(&Credentials::new("admin:nope"), None, Interface::Cli).await.unwrap_err();
        manager.authorize(None, "admin.reset", Interface::Api).unwrap_err();
        let events = sink.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                ("allow".to_string(), "login".to_string()),
                ("deny".to_string(), "login".to_string()),
                ("deny".to_string(), "admin.reset".to_string()),
            ]
        );
    }

    #[test]
    fn revoke_is_idempotent() {
        let manager = manager();
        let issued = manager.issue_session(Claims::new(), None).unwrap();
        let first = manager.revoke_session(Some(&issued.evidence));
        let second = manager.revoke_session(Some(&issued.evidence));
        assert_eq!(first, second);
        assert!(manager.revoke_session(None).is_empty());
        assert!(manager.validate_session(Some(&first)).is_err());
    }
}
