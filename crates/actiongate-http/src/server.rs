// crates/actiongate-http/src/server.rs
// ============================================================================
// Module: ActionGate HTTP Server
// Description: axum router exposing actions, login, logout, and the event feed.
// Purpose: Adapt HTTP requests onto the shared gateway pipeline.
// Dependencies: actiongate-core, actiongate-config, axum, tokio
// ============================================================================

//! ## Overview
//! Every declared action route is served by one fallback handler that runs
//! the pipeline in a fixed order: route table, CSRF guard, session check,
//! parameter decoding, then [`Gateway::invoke_http`]. `POST /login`,
//! `GET /logout`, and `GET /sse` are fixed routes; `OPTIONS` on any path
//! answers 204. Responses for allowed CORS origins carry the CORS headers.
//!
//! Security posture: request bodies and cookies are untrusted. Bodies are
//! bounded by `max_body_bytes`; session evidence is only trusted after
//! signature verification by the profile's authenticator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;
use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use actiongate_config::ActionGateConfig;
use actiongate_core::Credentials;
use actiongate_core::GatewayError;
use actiongate_core::Interface;
use actiongate_core::Locale;
use actiongate_core::Message;
use actiongate_core::TransportParams;
use actiongate_core::TransportValue;
use actiongate_core::i18n::current_locale;
use actiongate_core::msg;
use actiongate_core::runtime::CSRF_MARKER_HEADER;
use actiongate_core::runtime::Gateway;
use actiongate_core::runtime::HttpMethod;
use actiongate_core::runtime::HttpReply;
use actiongate_core::runtime::ResponseBody;
use actiongate_core::runtime::check_csrf;
use actiongate_core::runtime::error_reply;
use actiongate_core::runtime::success_reply;
use actiongate_core::t;
use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS;
use axum::http::header::ACCESS_CONTROL_ALLOW_HEADERS;
use axum::http::header::ACCESS_CONTROL_ALLOW_METHODS;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::header::LOCATION;
use axum::http::header::ORIGIN;
use axum::http::header::REFERER;
use axum::http::header::SET_COOKIE;
use axum::http::header::VARY;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::Sse;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::routing::get;
use axum::routing::post;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::wrappers::ReceiverStream;

use crate::cookies::CookiePolicy;
use crate::cookies::clear_session_cookie;
use crate::cookies::read_session_cookie;
use crate::cookies::session_cookie;
use crate::request::RequestError;
use crate::request::collect_params;
use crate::request::content_type;
use crate::request::request_locale;
use crate::request::wants_referer_redirect;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Methods advertised to allowed CORS origins.
const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Request headers advertised to allowed CORS origins.
const CORS_ALLOW_HEADERS: &str = "Content-Type, X-Requested-With, Locale";

/// Events buffered per SSE subscriber before the forwarder waits.
const SSE_BUFFER: usize = 64;

/// Operation label recorded when the event feed is authorized.
const SSE_OPERATION: &str = "sse";

// ============================================================================
// SECTION: Settings
// ============================================================================

/// HTTP surface settings derived from configuration.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
    /// Origins that receive CORS headers.
    pub allowed_cors_origins: Vec<String>,
    /// Session cookie attributes.
    pub cookies: CookiePolicy,
    /// The event feed requires authentication once this file exists.
    pub bootstrap_marker: Option<PathBuf>,
    /// Locale used when a request carries no `locale` header.
    pub default_locale: Locale,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self::from_config(&ActionGateConfig::default())
    }
}

impl HttpSettings {
    /// Builds settings from validated configuration.
    #[must_use]
    pub fn from_config(config: &ActionGateConfig) -> Self {
        Self {
            max_body_bytes: config.server.max_body_bytes,
            allowed_cors_origins: config.server.allowed_cors_origins.clone(),
            cookies: CookiePolicy {
                secure: config.auth.cookie_secure,
                max_age: config.auth.session_max_age(),
            },
            bootstrap_marker: config.bootstrap_marker_path(),
            default_locale: current_locale(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum HttpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Another process holds the bind address.
    #[error("{0}")]
    AlreadyRunning(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Shared state for every handler.
struct ServerState {
    /// Invocation pipeline.
    gateway: Arc<Gateway>,
    /// Surface settings.
    settings: HttpSettings,
}

/// Builds the router for `gateway`.
#[must_use]
pub fn build_router(gateway: Arc<Gateway>, settings: HttpSettings) -> Router {
    let max_body_bytes = settings.max_body_bytes;
    let state = Arc::new(ServerState {
        gateway,
        settings,
    });
    Router::new()
        .route("/login", post(handle_login))
        .route("/logout", get(handle_logout))
        .route("/sse", get(handle_sse))
        .fallback(handle_action)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), apply_cors))
        .with_state(state)
}

/// Serves the gateway using the bind address and settings from `config`.
///
/// # Errors
///
/// Returns [`HttpServerError`] when the address is invalid, already in use,
/// or the server fails.
pub async fn serve_config(gateway: Arc<Gateway>, config: &ActionGateConfig) -> Result<(), HttpServerError> {
    let bind = config.server.bind_addr().map_err(|error| HttpServerError::Config(error.to_string()))?;
    serve_with_shutdown(gateway, HttpSettings::from_config(config), bind, shutdown_signal()).await
}

/// Serves the gateway until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`HttpServerError`] when binding or serving fails.
pub async fn serve_with_shutdown<F>(
    gateway: Arc<Gateway>,
    settings: HttpSettings,
    bind: SocketAddr,
    shutdown: F,
) -> Result<(), HttpServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(gateway, settings);
    let listener = tokio::net::TcpListener::bind(bind).await.map_err(|error| {
        if error.kind() == ErrorKind::AddrInUse {
            HttpServerError::AlreadyRunning(t!("server.already_running", address = bind))
        } else {
            HttpServerError::Transport(t!("server.bind_failed", address = bind, error = error))
        }
    })?;
    tracing::info!(address = %bind, "{}", t!("server.listening", address = bind));
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|error| HttpServerError::Transport(t!("server.failed", error = error)))
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "shutdown signal unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

// ============================================================================
// SECTION: Action Routes
// ============================================================================

/// Serves every declared action route.
async fn handle_action(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let locale = request_locale(request.headers(), state.settings.default_locale);
    tracing::debug!(method = %request.method(), path = %request.uri().path(), "action request");
    match run_action(&state, request, locale).await {
        Ok(response) => response,
        Err(error) => request_error_response(&error, locale),
    }
}

/// Route table, CSRF guard, session, decoding, dispatch, reply.
async fn run_action(state: &ServerState, request: Request, locale: Locale) -> Result<Response, RequestError> {
    let path = request.uri().path().to_string();
    let method = HttpMethod::parse(request.method().as_str()).ok_or_else(|| {
        GatewayError::RouteNotFound(msg!("route.not_found", target = format!("{} {path}", request.method())))
    })?;
    let resolved = state.gateway.routes().resolve(method, &path)?;
    check_csrf(
        request.method().as_str(),
        content_type(request.headers()),
        request.headers().contains_key(CSRF_MARKER_HEADER),
    )?;
    let evidence = resolved
        .action
        .auth_profile
        .as_ref()
        .and_then(|profile| read_session_cookie(request.headers(), profile));
    let session = state.gateway.authorize(&resolved.action, evidence.as_deref(), Interface::Api)?;
    let params = collect_params(request, state.settings.max_body_bytes).await?;
    let value = state.gateway.invoke_http(&resolved, params, session, locale, None).await?;
    Ok(reply_response(success_reply(method, &value)))
}

// ============================================================================
// SECTION: Login and Logout
// ============================================================================

/// Logs a caller into a profile and sets the profile cookie.
async fn handle_login(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let headers = request.headers().clone();
    let locale = request_locale(&headers, state.settings.default_locale);
    if let Err(error) = check_csrf(
        request.method().as_str(),
        content_type(&headers),
        headers.contains_key(CSRF_MARKER_HEADER),
    ) {
        return plain_error(&error, locale);
    }
    let params = match collect_params(request, state.settings.max_body_bytes).await {
        Ok(params) => params,
        Err(error) => return request_error_response(&error, locale),
    };
    let Some(credentials) = login_credentials(&params) else {
        return plain_error(&GatewayError::Validation(Message::new("auth.missing_credentials")), locale);
    };
    let manager = match state.gateway.profiles().resolve(text_param(&params, "profile")) {
        Ok(manager) => manager,
        Err(error) => return plain_error(&error, locale),
    };
    let existing = read_session_cookie(&headers, manager.profile());
    match manager.login(&credentials, existing.as_deref(), Interface::Api).await {
        Ok(issued) => {
            let mut response =
                completion_response(&headers, &params, Message::new("auth.logged_in").render(locale));
            if let Some(cookie) = session_cookie(manager.profile(), &issued.evidence, state.settings.cookies) {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            response
        }
        Err(error) => {
            let cleared = manager.revoke_session(existing.as_deref());
            let mut response = plain_error(&error, locale);
            if let Some(cookie) = clear_session_cookie(manager.profile(), &cleared, state.settings.cookies) {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            response
        }
    }
}

/// Revokes the caller's session for a profile and clears the cookie.
async fn handle_logout(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let headers = request.headers().clone();
    let locale = request_locale(&headers, state.settings.default_locale);
    let params = match collect_params(request, state.settings.max_body_bytes).await {
        Ok(params) => params,
        Err(error) => return request_error_response(&error, locale),
    };
    let manager = match state.gateway.profiles().resolve(text_param(&params, "profile")) {
        Ok(manager) => manager,
        Err(error) => return plain_error(&error, locale),
    };
    let evidence = read_session_cookie(&headers, manager.profile());
    if manager.validate_session(evidence.as_deref()).is_err() {
        return plain_error(&GatewayError::authentication("auth.not_logged_in"), locale);
    }
    let cleared = manager.revoke_session(evidence.as_deref());
    let mut response = completion_response(&headers, &params, Message::new("auth.logged_out").render(locale));
    if let Some(cookie) = clear_session_cookie(manager.profile(), &cleared, state.settings.cookies) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

/// Reads `credentials`, or joins `username` and `password`.
fn login_credentials(params: &TransportParams) -> Option<Credentials> {
    if let Some(credentials) = text_param(params, "credentials") {
        return Some(Credentials::new(credentials));
    }
    let username = text_param(params, "username")?;
    let password = text_param(params, "password")?;
    Some(Credentials::from_username_password(username, password))
}

/// Returns a single text parameter.
fn text_param<'a>(params: &'a TransportParams, name: &str) -> Option<&'a str> {
    match params.get(name) {
        Some(TransportValue::Text(text)) => Some(text.as_str()),
        _ => None,
    }
}

/// Answers 303 to the referer when asked to, else 200 with `message`.
fn completion_response(headers: &HeaderMap, params: &TransportParams, message: String) -> Response {
    if wants_referer_redirect(params)
        && let Some(referer) = headers.get(REFERER)
    {
        return (StatusCode::SEE_OTHER, [(LOCATION, referer.clone())]).into_response();
    }
    (StatusCode::OK, message).into_response()
}

// ============================================================================
// SECTION: Event Feed
// ============================================================================

/// Streams dispatch lifecycle events as server-sent events.
async fn handle_sse(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let locale = request_locale(&headers, state.settings.default_locale);
    if let Err(error) = authorize_event_feed(&state, &headers).await {
        return plain_error(&error, locale);
    }
    let mut events = state.gateway.dispatcher().subscribe();
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(SSE_BUFFER);
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Ok(payload) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if tx.send(Ok(Event::default().data(payload))).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event feed subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
    Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()).into_response()
}

/// Open until the bootstrap marker exists; then the default profile gates it.
///
/// A marker that cannot be checked counts as present.
async fn authorize_event_feed(state: &ServerState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let bootstrapped = match &state.settings.bootstrap_marker {
        Some(marker) => tokio::fs::try_exists(marker).await.unwrap_or(true),
        None => true,
    };
    if !bootstrapped {
        return Ok(());
    }
    let profiles = state.gateway.profiles();
    let Some(profile) = profiles.default_profile() else {
        return Ok(());
    };
    let manager =
        profiles.get(profile).ok_or_else(|| GatewayError::authentication("auth.unable_authenticate"))?;
    let evidence = read_session_cookie(headers, profile);
    manager.authorize(evidence.as_deref(), SSE_OPERATION, Interface::Api).map(|_| ())
}

// ============================================================================
// SECTION: CORS
// ============================================================================

/// Answers `OPTIONS` with 204 and adds CORS headers for allowed origins.
async fn apply_cors(State(state): State<Arc<ServerState>>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(ORIGIN)
        .filter(|origin| {
            origin.to_str().is_ok_and(|origin| {
                state.settings.allowed_cors_origins.iter().any(|allowed| allowed == origin)
            })
        })
        .cloned();
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    if let Some(origin) = origin {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(CORS_ALLOW_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(CORS_ALLOW_HEADERS));
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
    response
}

// ============================================================================
// SECTION: Replies
// ============================================================================

/// Converts a translated reply into an axum response.
fn reply_response(reply: HttpReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match reply.body {
        ResponseBody::Empty => status.into_response(),
        ResponseBody::Json(value) => (status, Json(value)).into_response(),
        ResponseBody::Text(text) => (status, text).into_response(),
    }
}

/// Renders a decoding or pipeline failure.
fn request_error_response(error: &RequestError, locale: Locale) -> Response {
    match error {
        RequestError::BodyTooLarge {
            limit,
        } => (StatusCode::PAYLOAD_TOO_LARGE, msg!("request.body_too_large", limit = limit).render(locale))
            .into_response(),
        RequestError::Invalid(error) => reply_response(error_reply(error, locale)),
    }
}

/// Renders an error as plain text with its status, for login and logout.
fn plain_error(error: &GatewayError, locale: Locale) -> Response {
    let status = StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, error.render(locale)).into_response()
}
