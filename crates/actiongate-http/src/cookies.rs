// crates/actiongate-http/src/cookies.rs
// ============================================================================
// Module: ActionGate Session Cookies
// Description: Reads and writes the per-profile session cookie.
// Purpose: Carry signed session evidence between browser requests.
// Dependencies: axum (http headers)
// ============================================================================

//! ## Overview
//! Each profile stores its evidence in its own cookie, `actiongate.<profile>`,
//! so logging into one profile never disturbs another. Cookies are always
//! `HttpOnly` and `SameSite=Lax`; `Secure` follows configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use actiongate_core::ProfileName;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::header::COOKIE;

// ============================================================================
// SECTION: Cookie Policy
// ============================================================================

/// Prefix shared by every session cookie.
pub const COOKIE_PREFIX: &str = "actiongate.";

/// Attributes applied to issued cookies.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    /// Adds the `Secure` attribute.
    pub secure: bool,
    /// Adds `Max-Age`; session cookie when `None`.
    pub max_age: Option<Duration>,
}

/// Returns the cookie name for `profile`.
#[must_use]
pub fn cookie_name(profile: &ProfileName) -> String {
    format!("{COOKIE_PREFIX}{profile}")
}

/// Reads the session cookie for `profile` from the request headers.
#[must_use]
pub fn read_session_cookie(headers: &HeaderMap, profile: &ProfileName) -> Option<String> {
    let name = cookie_name(profile);
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Builds a `Set-Cookie` value carrying `evidence`.
///
/// Returns `None` when the evidence cannot be a header value.
#[must_use]
pub fn session_cookie(profile: &ProfileName, evidence: &str, policy: CookiePolicy) -> Option<HeaderValue> {
    let mut cookie = format!("{}={evidence}; Path=/; HttpOnly; SameSite=Lax", cookie_name(profile));
    if policy.secure {
        cookie.push_str("; Secure");
    }
    if let Some(max_age) = policy.max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age.as_secs()));
    }
    HeaderValue::from_str(&cookie).ok()
}

/// Builds a `Set-Cookie` value that replaces the profile cookie with
/// `cleared` evidence and expires it.
#[must_use]
pub fn clear_session_cookie(profile: &ProfileName, cleared: &str, policy: CookiePolicy) -> Option<HeaderValue> {
    let mut cookie = format!("{}={cleared}; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", cookie_name(profile));
    if policy.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
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

    use super::*;

    #[test]
    fn reads_only_the_matching_profile() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; actiongate.admin=abc.def; actiongate.ops=xyz"));
        assert_eq!(read_session_cookie(&headers, &ProfileName::new("admin")).as_deref(), Some("abc.def"));
        assert_eq!(read_session_cookie(&headers, &ProfileName::new("ops")).as_deref(), Some("xyz"));
        assert_eq!(read_session_cookie(&headers, &ProfileName::new("audit")), None);
    }

    #[test]
    fn cleared_cookies_read_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("actiongate.admin="));
        assert_eq!(read_session_cookie(&headers, &ProfileName::new("admin")), None);
    }

    #[test]
    fn issued_cookie_attributes() {
        let policy = CookiePolicy {
            secure: true,
            max_age: Some(Duration::from_secs(60)),
        };
        let cookie = session_cookie(&ProfileName::new("admin"), "token", policy).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "actiongate.admin=token; Path=/; HttpOnly; SameSite=Lax; Secure; Max-Age=60"
        );
        let cleared = clear_session_cookie(&ProfileName::new("admin"), "", CookiePolicy::default()).unwrap();
        assert!(cleared.to_str().unwrap().ends_with("Max-Age=0"));
    }
}
