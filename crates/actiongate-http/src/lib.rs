// crates/actiongate-http/src/lib.rs
// ============================================================================
// Module: ActionGate HTTP Library
// Description: HTTP API surface over the shared gateway.
// Purpose: Expose the axum router and server entry points.
// Dependencies: actiongate-core, actiongate-config, axum
// ============================================================================

//! ## Overview
//! The HTTP surface is a thin adapter: it decodes requests into transport
//! parameters, carries session evidence in per-profile cookies, and renders
//! gateway replies. All validation and authorization happen in
//! [`actiongate_core::Gateway`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cookies;
pub mod request;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cookies::CookiePolicy;
pub use request::RequestError;
pub use server::HttpServerError;
pub use server::HttpSettings;
pub use server::build_router;
pub use server::serve_config;
pub use server::serve_with_shutdown;
