//! HTTP surface integration tests.
//!
//! ## Purpose
//! Exercise the axum router in-process with `tower::ServiceExt::oneshot`.
//!
//! ## What is covered
//! - `GET /ping?echo=hello` answers 200 with the JSON string `"hello"`.
//! - Unexpected handler failures answer 500 naming the route and arguments.
//! - Form posts without `X-Requested-With` are refused; JSON posts are not.
//! - Login, logout, and profile-gated routes honor the session cookie.
//! - `OPTIONS` answers 204; allowed origins receive CORS headers.
//! - The event feed is open until the bootstrap marker exists.
// crates/actiongate-http/tests/http_surface.rs
// ============================================================================
// Module: HTTP Surface Tests
// Description: Router-level checks for action routes, sessions, CSRF, and CORS.
// Purpose: Pin the observable HTTP contract of the gateway.
// ============================================================================

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
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use actiongate_http::HttpSettings;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::header::COOKIE;
use axum::http::header::LOCATION;

use crate::common::ADMIN_CREDENTIALS;
use crate::common::admin_cookie;
use crate::common::body_text;
use crate::common::json_login;
use crate::common::router;
use crate::common::router_with;
use crate::common::send;
use crate::common::set_cookie;

// ============================================================================
// SECTION: Action Routes
// ============================================================================

#[tokio::test]
async fn ping_returns_json_encoded_echo() {
    let router = router();
    let response = send(&router, Request::get("/ping?echo=hello").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "\"hello\"");
}

#[tokio::test]
async fn post_actions_answer_created() {
    let router = router();
    let request = Request::post("/notes")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"title": "groceries"}"#))
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_text(response).await, "\"groceries\"");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let router = router();
    let response = send(&router, Request::get("/missing").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["kind"], "route_not_found");
}

#[tokio::test]
async fn repeated_scalar_values_are_validation_errors() {
    let router = router();
    let response = send(&router, Request::get("/ping?echo=a&echo=b").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn handler_failures_answer_500_with_route_and_arguments() {
    let router = router();
    let response = send(&router, Request::get("/crash?code=7").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["route"], "GET /crash");
    assert_eq!(body["arguments"], serde_json::json!({"code": "7"}));
    assert_eq!(body["traceback"], "boom");
}

// ============================================================================
// SECTION: CSRF
// ============================================================================

#[tokio::test]
async fn form_posts_need_the_marker_header() {
    let router = router();
    let form = || {
        Request::post("/notes")
            .header("content-type", "application/x-www-form-urlencoded")
    };
    let refused = send(&router, form().body(Body::from("title=x")).unwrap()).await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(refused).await, "CSRF protection");

    let accepted =
        send(&router, form().header("x-requested-with", "XMLHttpRequest").body(Body::from("title=x")).unwrap())
            .await;
    assert_eq!(accepted.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn form_login_is_refused_while_json_login_is_accepted() {
    let router = router();
    let form = Request::post("/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("credentials={ADMIN_CREDENTIALS}")))
        .unwrap();
    let refused = send(&router, form).await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);

    let body = format!(r#"{{"credentials": "{ADMIN_CREDENTIALS}"}}"#);
    let accepted = send(&router, json_login(&body)).await;
    assert_eq!(accepted.status(), StatusCode::OK);
    assert!(set_cookie(&accepted).unwrap().starts_with("actiongate.admin="));
    assert_eq!(body_text(accepted).await, "Logged in");
}

#[tokio::test]
async fn csrf_message_follows_locale_header() {
    let router = router();
    let request = Request::post("/notes")
        .header("content-type", "text/plain")
        .header("locale", "fr")
        .body(Body::from("x"))
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Protection CSRF");
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

#[tokio::test]
async fn login_without_credentials_is_a_bad_request() {
    let router = router();
    let response = send(&router, json_login("{}")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Missing credentials parameter");
}

#[tokio::test]
async fn username_and_password_are_joined() {
    let router = router();
    let request = Request::post("/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("x-requested-with", "XMLHttpRequest")
        .body(Body::from("username=admin&password=secret"))
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_login_clears_the_cookie() {
    let router = router();
    let response = send(&router, json_login(r#"{"credentials": "admin:wrong"}"#)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(set_cookie(&response).as_deref(), Some("actiongate.admin="));
    assert_eq!(body_text(response).await, "Invalid password");
}

#[tokio::test]
async fn gated_routes_require_the_session_cookie() {
    let router = router();
    let reset = || Request::post("/admin/reset").header("content-type", "application/json");

    let anonymous = send(&router, reset().body(Body::from("{}")).unwrap()).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let cookie = admin_cookie(&router).await;
    let authorized = send(&router, reset().header(COOKIE, cookie).body(Body::from("{}")).unwrap()).await;
    assert_eq!(authorized.status(), StatusCode::CREATED);
    assert_eq!(body_text(authorized).await, "\"admin.reset\"");
}

#[tokio::test]
async fn tampered_cookies_are_rejected() {
    let router = router();
    let cookie = format!("{}x", admin_cookie(&router).await);
    let request = Request::post("/admin/reset")
        .header("content-type", "application/json")
        .header(COOKIE, cookie)
        .body(Body::from("{}"))
        .unwrap();
    assert_eq!(send(&router, request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_requires_a_session_and_clears_it() {
    let router = router();
    let anonymous = send(&router, Request::get("/logout").body(Body::empty()).unwrap()).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(anonymous).await, "You are not logged in");

    let cookie = admin_cookie(&router).await;
    let response = send(&router, Request::get("/logout").header(COOKIE, cookie).body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie(&response).as_deref(), Some("actiongate.admin="));
    assert_eq!(body_text(response).await, "Logged out");
}

#[tokio::test]
async fn referer_redirect_answers_see_other() {
    let router = router();
    let body = format!(r#"{{"credentials": "{ADMIN_CREDENTIALS}", "referer_redirect": true}}"#);
    let request = Request::post("/login")
        .header("content-type", "application/json")
        .header("referer", "https://console.example/dashboard")
        .body(Body::from(body))
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "https://console.example/dashboard");
    assert!(set_cookie(&response).is_some());
}

#[tokio::test]
async fn unknown_login_profile_is_a_bad_request() {
    let router = router();
    let body = format!(r#"{{"credentials": "{ADMIN_CREDENTIALS}", "profile": "ops"}}"#);
    let response = send(&router, json_login(&body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// SECTION: CORS and Preflight
// ============================================================================

#[tokio::test]
async fn options_always_answers_no_content() {
    let router = router();
    let request = Request::options("/anything/at/all").body(Body::empty()).unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn allowed_origins_receive_cors_headers() {
    let settings = HttpSettings {
        allowed_cors_origins: vec!["https://console.example".to_string()],
        ..HttpSettings::default()
    };
    let router = router_with(settings);
    let allowed = Request::get("/ping?echo=x")
        .header("origin", "https://console.example")
        .body(Body::empty())
        .unwrap();
    let response = send(&router, allowed).await;
    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://console.example");

    let foreign =
        Request::get("/ping?echo=x").header("origin", "https://evil.example").body(Body::empty()).unwrap();
    let response = send(&router, foreign).await;
    assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

// ============================================================================
// SECTION: Event Feed
// ============================================================================

#[tokio::test]
async fn event_feed_is_open_until_bootstrap_completes() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("bootstrapped");
    let settings = HttpSettings {
        bootstrap_marker: Some(marker.clone()),
        ..HttpSettings::default()
    };
    let router = router_with(settings);

    let open = send(&router, Request::get("/sse").body(Body::empty()).unwrap()).await;
    assert_eq!(open.status(), StatusCode::OK);
    assert_eq!(open.headers()["content-type"], "text/event-stream");

    std::fs::write(&marker, b"done").unwrap();
    let closed = send(&router, Request::get("/sse").body(Body::empty()).unwrap()).await;
    assert_eq!(closed.status(), StatusCode::UNAUTHORIZED);

    let cookie = admin_cookie(&router).await;
    let authorized = send(&router, Request::get("/sse").header(COOKIE, cookie).body(Body::empty()).unwrap()).await;
    assert_eq!(authorized.status(), StatusCode::OK);
}
