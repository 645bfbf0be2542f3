// crates/actiongate-http/tests/common/mod.rs
// =============================================================================
// Module: HTTP Test Helpers
// Description: Gateway fixtures and request helpers for router tests.
// Purpose: Drive the axum router in-process without binding a socket.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use actiongate_core::Action;
use actiongate_core::ActionError;
use actiongate_core::ActionHandler;
use actiongate_core::ActionsMap;
use actiongate_core::CanonicalArgumentSet;
use actiongate_core::Dispatcher;
use actiongate_core::Gateway;
use actiongate_core::NoopAuditSink;
use actiongate_core::ProfileRegistry;
use actiongate_core::ResultValue;
use actiongate_core::RouteTable;
use actiongate_core::SessionManager;
use actiongate_core::SignedCookieAuthenticator;
use actiongate_core::StaticCredentials;
use actiongate_core::handler_fn;
use actiongate_core::runtime::random_session_key;
use actiongate_core::runtime::sha256_hex;
use actiongate_http::HttpSettings;
use actiongate_http::build_router;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::http::header::SET_COOKIE;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Actions served by the test router.
const DECLARATIONS: &str = r#"{
    "actions": [
        {
            "tid": "ping",
            "http_routes": ["GET /ping"],
            "arguments": {"echo": {"type": "str"}}
        },
        {
            "tid": "notes.create",
            "http_routes": ["POST /notes"],
            "arguments": {"title": {"type": "str"}}
        },
        {
            "tid": "admin.reset",
            "http_routes": ["POST /admin/reset"],
            "auth_profile": "admin"
        },
        {
            "tid": "jobs.crash",
            "http_routes": ["GET /crash"],
            "arguments": {"code": {"type": "str"}}
        }
    ]
}"#;

/// Credentials accepted by the `admin` profile.
pub const ADMIN_CREDENTIALS: &str = "admin:secret";

/// Returns the first text argument, or the tid when there is none.
fn echo_handler() -> Arc<dyn ActionHandler> {
    handler_fn(|context, arguments: CanonicalArgumentSet| async move {
        let text = ["echo", "title"]
            .iter()
            .find_map(|name| arguments.get(name).and_then(|value| value.as_text()))
            .map_or_else(|| context.tid.to_string(), str::to_string);
        Ok::<_, ActionError>(ResultValue::Text(text))
    })
}

/// Fails every call the way an unexpected handler error does.
fn crash_handler() -> Arc<dyn ActionHandler> {
    handler_fn(|_, _| async { Err::<ResultValue, _>(ActionError::Internal("boom".to_string())) })
}

/// Builds the gateway behind the test router.
pub fn gateway() -> Arc<Gateway> {
    let map: ActionsMap = serde_json::from_str(DECLARATIONS).unwrap();
    let mut routes = RouteTable::new();
    for declaration in &map.actions {
        let handler = if declaration.tid.as_str() == "jobs.crash" { crash_handler() } else { echo_handler() };
        routes.register(Action::from_declaration(declaration, handler).unwrap()).unwrap();
    }
    let verifier = Arc::new(StaticCredentials::new([sha256_hex(ADMIN_CREDENTIALS.as_bytes())]));
    let authenticator = SignedCookieAuthenticator::new("admin", verifier, random_session_key());
    let mut profiles = ProfileRegistry::new();
    profiles.insert(SessionManager::new("admin", Arc::new(authenticator), Arc::new(NoopAuditSink)));
    profiles.set_default("admin");
    Arc::new(Gateway::new(routes, profiles, Dispatcher::new()).unwrap())
}

/// Builds a router with default settings.
pub fn router() -> Router {
    build_router(gateway(), HttpSettings::default())
}

/// Builds a router with custom settings.
pub fn router_with(settings: HttpSettings) -> Router {
    build_router(gateway(), settings)
}

/// Sends one request through the router.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

/// Collects a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Returns the `name=value` part of the first `Set-Cookie` header.
pub fn set_cookie<B>(response: &Response<B>) -> Option<String> {
    let header = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    header.split(';').next().map(str::to_string)
}

/// Builds a JSON login request.
pub fn json_login(body: &str) -> Request<Body> {
    Request::post("/login")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Logs into `admin` and returns the cookie pair to send back.
pub async fn admin_cookie(router: &Router) -> String {
    let body = format!(r#"{{"credentials": "{ADMIN_CREDENTIALS}"}}"#);
    let response = send(router, json_login(&body)).await;
    set_cookie(&response).unwrap()
}
