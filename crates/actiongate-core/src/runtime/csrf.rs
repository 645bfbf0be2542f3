// crates/actiongate-core/src/runtime/csrf.rs
// ============================================================================
// Module: ActionGate CSRF Guard
// Description: Heuristic rejection of cross-site form submissions.
// Purpose: Refuse browser-forgeable POSTs before any action runs.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! A request is rejected when all three hold:
//! - the method is `POST`;
//! - the content type is absent or a browser form kind (`text/plain`,
//!   `application/x-www-form-urlencoded`, `multipart/form-data`);
//! - the programmatic-client marker header is missing.
//!
//! This is a header heuristic, not a token scheme. JSON bodies pass because
//! browsers cannot send them cross-site without a preflight.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::error::GatewayError;
use crate::i18n::Message;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header whose presence marks a programmatic client.
pub const CSRF_MARKER_HEADER: &str = "x-requested-with";

/// Media types a browser form can submit cross-site.
const FORM_MEDIA_TYPES: &[&str] =
    &["text/plain", "application/x-www-form-urlencoded", "multipart/form-data"];

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Returns true when the request looks like a cross-site form submission.
#[must_use]
pub fn is_csrf(method: &str, content_type: Option<&str>, has_marker: bool) -> bool {
    if !method.eq_ignore_ascii_case("POST") {
        return false;
    }
    let Some(content_type) = content_type else {
        return !has_marker;
    };
    let media_type = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    FORM_MEDIA_TYPES.contains(&media_type.as_str()) && !has_marker
}

/// Fails with [`GatewayError::CsrfRejected`] for cross-site form submissions.
///
/// # Errors
///
/// Returns [`GatewayError::CsrfRejected`] when [`is_csrf`] holds.
pub fn check_csrf(
    method: &str,
    content_type: Option<&str>,
    has_marker: bool,
) -> Result<(), GatewayError> {
    if is_csrf(method, content_type, has_marker) {
        return Err(GatewayError::CsrfRejected(Message::new("csrf.rejected")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
