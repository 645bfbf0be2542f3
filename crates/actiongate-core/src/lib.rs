// crates/actiongate-core/src/lib.rs
// ============================================================================
// Module: ActionGate Core Library
// Description: Public API surface for the ActionGate core.
// Purpose: Expose core types, interfaces, and the shared invocation pipeline.
// Dependencies: crate::{core, interfaces, runtime, i18n}
// ============================================================================

//! ## Overview
//! ActionGate exposes one registry of server-side actions through a CLI and
//! an HTTP API. The core normalizes transport parameters into one canonical
//! argument set, validates it with one parser, gates it through profile
//! sessions, and dispatches it under a deadline. Surfaces are thin adapters
//! over [`Gateway`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod i18n;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;
pub use i18n::Locale;
pub use i18n::Message;

pub use interfaces::ActionContext;
pub use interfaces::ActionHandler;
pub use interfaces::AuthAuditEvent;
pub use interfaces::AuthAuditSink;
pub use interfaces::AuthError;
pub use interfaces::Authenticator;
pub use interfaces::CredentialVerifier;
pub use interfaces::Credentials;
pub use interfaces::Interface;
pub use interfaces::NoopAuditSink;
pub use interfaces::TracingAuditSink;
pub use interfaces::handler_fn;
pub use runtime::Action;
pub use runtime::CliOutputFormat;
pub use runtime::CommandHandler;
pub use runtime::Dispatcher;
pub use runtime::Gateway;
pub use runtime::HttpMethod;
pub use runtime::ProfileRegistry;
pub use runtime::RouteTable;
pub use runtime::SessionManager;
pub use runtime::SignedCookieAuthenticator;
pub use runtime::StaticCredentials;
