// crates/actiongate-core/src/runtime/mod.rs
// ============================================================================
// Module: ActionGate Runtime
// Description: Normalization, parsing, routing, sessions, dispatch, and replies.
// Purpose: Execute actions identically for the CLI and HTTP surfaces.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Runtime modules implement the invocation pipeline. Every surface must call
//! into [`Gateway`] so validation, authentication, and error semantics stay
//! identical across transports.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod auth;
pub mod command;
pub mod csrf;
pub mod dispatch;
pub mod gateway;
pub mod normalize;
pub mod parser;
pub mod respond;
pub mod routes;
pub mod staging;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::IssuedSession;
pub use auth::ProfileRegistry;
pub use auth::SessionManager;
pub use auth::SignedCookieAuthenticator;
pub use auth::StaticCredentials;
pub use auth::random_session_key;
pub use auth::sha256_hex;
pub use command::CommandHandler;
pub use csrf::CSRF_MARKER_HEADER;
pub use csrf::check_csrf;
pub use csrf::is_csrf;
pub use dispatch::DEFAULT_LOCK_NAME;
pub use dispatch::DEFAULT_TIMEOUT;
pub use dispatch::DispatchEvent;
pub use dispatch::Dispatcher;
pub use gateway::Gateway;
pub use normalize::NormalizeError;
pub use normalize::encode_tokens;
pub use normalize::normalize;
pub use parser::ArgumentParser;
pub use parser::ValidationError;
pub use parser::lex_cli;
pub use respond::CliOutputFormat;
pub use respond::HttpReply;
pub use respond::ResponseBody;
pub use respond::error_reply;
pub use respond::render_cli;
pub use respond::render_cli_error;
pub use respond::success_reply;
pub use routes::Action;
pub use routes::HttpMethod;
pub use routes::ResolvedRoute;
pub use routes::RouteKey;
pub use routes::RouteTable;
pub use staging::StagingArea;
pub use staging::StagingError;
