// crates/actiongate-http/src/request.rs
// ============================================================================
// Module: ActionGate HTTP Request Decoding
// Description: Turns query strings and request bodies into transport parameters.
// Purpose: Give the normalization engine one parameter map per request.
// Dependencies: axum (multipart), url, actiongate-core
// ============================================================================

//! ## Overview
//! Query parameters are collected first. A form or multipart body adds to
//! them; a JSON object body replaces them. Repeated keys coalesce into lists
//! so the normalization engine sees the same shape for every encoding.
//! Multipart parts with a file name become uploads; every other part is text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use actiongate_core::GatewayError;
use actiongate_core::Locale;
use actiongate_core::TransportParams;
use actiongate_core::TransportValue;
use actiongate_core::UploadedFile;
use actiongate_core::msg;
use axum::extract::FromRequest;
use axum::extract::Multipart;
use axum::extract::Request;
use axum::extract::multipart::MultipartError;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the caller's preferred locale.
pub const LOCALE_HEADER: &str = "locale";

/// Parameter that asks login and logout to redirect to the referer.
pub const REFERER_REDIRECT_PARAM: &str = "referer_redirect";

// ============================================================================
// SECTION: Body Kinds
// ============================================================================

/// Body encodings the gateway decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `application/json` or any `+json` media type.
    Json,
    /// `application/x-www-form-urlencoded`.
    Form,
    /// `multipart/form-data`.
    Multipart,
    /// Anything else; the body is ignored.
    Other,
}

impl BodyKind {
    /// Classifies a `Content-Type` header value.
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Self::Other;
        };
        let media_type = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match media_type.as_str() {
            "application/json" => Self::Json,
            "application/x-www-form-urlencoded" => Self::Form,
            "multipart/form-data" => Self::Multipart,
            other if other.ends_with("+json") => Self::Json,
            _ => Self::Other,
        }
    }
}

// ============================================================================
// SECTION: Header Helpers
// ============================================================================

/// Returns the `Content-Type` header as text.
#[must_use]
pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok())
}

/// Picks the response locale from the `locale` header, else `fallback`.
#[must_use]
pub fn request_locale(headers: &HeaderMap, fallback: Locale) -> Locale {
    headers
        .get(LOCALE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(Locale::parse)
        .unwrap_or(fallback)
}

// ============================================================================
// SECTION: Parameter Collection
// ============================================================================

/// Adds every `key=value` pair of a URL-encoded string to `params`.
pub fn extend_urlencoded(params: &mut TransportParams, encoded: &[u8]) {
    for (key, value) in url::form_urlencoded::parse(encoded) {
        params.insert(key.into_owned(), TransportValue::Text(value.into_owned()));
    }
}

/// Failure while decoding a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },
    /// The body could not be decoded.
    #[error(transparent)]
    Invalid(#[from] GatewayError),
}

/// Collects parameters from the query string and the request body.
///
/// Bodies other than multipart are buffered up to `limit` bytes; multipart
/// bodies stream under the router's body limit.
///
/// # Errors
///
/// Returns [`RequestError::BodyTooLarge`] past the limit and
/// [`RequestError::Invalid`] when a JSON body is not an object or a
/// multipart body is malformed.
pub async fn collect_params(request: Request, limit: usize) -> Result<TransportParams, RequestError> {
    let mut params = TransportParams::new();
    if let Some(query) = request.uri().query() {
        extend_urlencoded(&mut params, query.as_bytes());
    }
    let kind = BodyKind::from_content_type(content_type(request.headers()));
    if kind == BodyKind::Multipart {
        extend_multipart(&mut params, request, limit).await?;
        return Ok(params);
    }
    let body = axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|_| RequestError::BodyTooLarge {
            limit,
        })?;
    match kind {
        BodyKind::Json if !body.is_empty() => {
            let value: serde_json::Value = serde_json::from_slice(&body)
                .map_err(|_| GatewayError::Validation(msg!("request.invalid_json")))?;
            if !value.is_object() {
                return Err(GatewayError::Validation(msg!("request.invalid_json")).into());
            }
            params = TransportParams::from_json_object(value);
        }
        BodyKind::Form => extend_urlencoded(&mut params, &body),
        BodyKind::Json | BodyKind::Multipart | BodyKind::Other => {}
    }
    Ok(params)
}

/// Decodes a multipart body into `params`.
async fn extend_multipart(
    params: &mut TransportParams,
    request: Request,
    limit: usize,
) -> Result<(), RequestError> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(|error| {
        GatewayError::Validation(msg!("request.invalid_multipart", error = error.body_text()))
    })?;
    let invalid = |error: MultipartError| {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return RequestError::BodyTooLarge {
                limit,
            };
        }
        RequestError::Invalid(GatewayError::Validation(msg!(
            "request.invalid_multipart",
            error = error.body_text()
        )))
    };
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let filename = field.file_name().map(str::to_string);
        let declared_type = field.content_type().map(str::to_string);
        let value = match filename {
            Some(filename) => TransportValue::Upload(UploadedFile {
                filename,
                content_type: declared_type,
                bytes: field.bytes().await.map_err(invalid)?.to_vec(),
            }),
            None => TransportValue::Text(field.text().await.map_err(invalid)?),
        };
        params.insert(name, value);
    }
    Ok(())
}

/// Returns true when `params` carries a truthy `referer_redirect`.
#[must_use]
pub fn wants_referer_redirect(params: &TransportParams) -> bool {
    match params.get(REFERER_REDIRECT_PARAM) {
        Some(TransportValue::Bool(flag)) => *flag,
        Some(TransportValue::Text(text)) => !matches!(text.trim(), "" | "0" | "false"),
        Some(TransportValue::List(items)) => !items.is_empty(),
        Some(TransportValue::Upload(_) | TransportValue::Unsupported(_)) | None => false,
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

    use axum::body::Body;
    use axum::http::HeaderValue;

    use super::*;

    const LIMIT: usize = 1024;

    fn request(uri: &str, content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[test]
    fn body_kinds_ignore_parameters() {
        assert_eq!(BodyKind::from_content_type(Some("application/json; charset=utf-8")), BodyKind::Json);
        assert_eq!(BodyKind::from_content_type(Some("application/merge-patch+json")), BodyKind::Json);
        assert_eq!(BodyKind::from_content_type(Some("multipart/form-data; boundary=x")), BodyKind::Multipart);
        assert_eq!(BodyKind::from_content_type(Some("text/plain")), BodyKind::Other);
        assert_eq!(BodyKind::from_content_type(None), BodyKind::Other);
    }

    #[tokio::test]
    async fn repeated_query_keys_become_lists() {
        let params = collect_params(request("/x?tag=a&tag=b&name=x", None, ""), LIMIT).await.unwrap();
        assert_eq!(
            params.get("tag"),
            Some(&TransportValue::List(vec![
                TransportValue::Text("a".into()),
                TransportValue::Text("b".into()),
            ]))
        );
        assert_eq!(params.get("name"), Some(&TransportValue::Text("x".into())));
    }

    #[tokio::test]
    async fn json_body_replaces_query() {
        let body = r#"{"name": "json", "force": true}"#;
        let params =
            collect_params(request("/x?name=query&extra=1", Some("application/json"), body), LIMIT).await.unwrap();
        assert_eq!(params.get("name"), Some(&TransportValue::Text("json".into())));
        assert_eq!(params.get("force"), Some(&TransportValue::Bool(true)));
        assert!(!params.contains_key("extra"));
    }

    #[tokio::test]
    async fn non_object_json_is_rejected() {
        let error = collect_params(request("/x", Some("application/json"), "[1]"), LIMIT).await.unwrap_err();
        let RequestError::Invalid(error) = error else {
            panic!("expected invalid body");
        };
        assert_eq!(error.message_key(), Some("request.invalid_json"));
    }

    #[tokio::test]
    async fn oversized_bodies_are_refused() {
        let error = collect_params(request("/x", Some("application/json"), "{\"a\": 1}"), 4).await.unwrap_err();
        assert!(matches!(error, RequestError::BodyTooLarge { limit: 4 }));
    }

    #[tokio::test]
    async fn form_body_extends_query() {
        let params =
            collect_params(request("/x?tag=a", Some("application/x-www-form-urlencoded"), "tag=b"), LIMIT)
                .await
                .unwrap();
        assert_eq!(
            params.get("tag"),
            Some(&TransportValue::List(vec![
                TransportValue::Text("a".into()),
                TransportValue::Text("b".into()),
            ]))
        );
    }

    #[tokio::test]
    async fn multipart_files_become_uploads() {
        let body = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"note\"\r\n\r\n",
            "hello\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"dump.sql\"\r\n",
            "Content-Type: application/sql\r\n\r\n",
            "select 1;\r\n",
            "--XBOUNDARY--\r\n",
        );
        let params =
            collect_params(request("/x", Some("multipart/form-data; boundary=XBOUNDARY"), body), LIMIT)
                .await
                .unwrap();
        assert_eq!(params.get("note"), Some(&TransportValue::Text("hello".into())));
        let Some(TransportValue::Upload(upload)) = params.get("file") else {
            panic!("expected upload");
        };
        assert_eq!(upload.filename, "dump.sql");
        assert_eq!(upload.content_type.as_deref(), Some("application/sql"));
        assert_eq!(upload.bytes, b"select 1;");
    }

    #[test]
    fn referer_redirect_truthiness() {
        let mut params = TransportParams::new();
        assert!(!wants_referer_redirect(&params));
        params.insert(REFERER_REDIRECT_PARAM, TransportValue::Text("1".into()));
        assert!(wants_referer_redirect(&params));
        let mut params = TransportParams::new();
        params.insert(REFERER_REDIRECT_PARAM, TransportValue::Text("false".into()));
        assert!(!wants_referer_redirect(&params));
    }

    #[test]
    fn locale_header_falls_back() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_locale(&headers, Locale::En), Locale::En);
        headers.insert(LOCALE_HEADER, HeaderValue::from_static("fr-CA"));
        assert_eq!(request_locale(&headers, Locale::En), Locale::Fr);
    }
}
