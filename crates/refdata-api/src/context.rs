//! Request context and request-id middleware.
//!
//! Every request carries a request ID (caller-supplied `X-Request-Id` or a
//! freshly minted ulid) that is attached to handler errors and echoed on
//! the response. Authentication is deliberately absent (out of scope for
//! this service).

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::header::HeaderName;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use ulid::Ulid;

use crate::error::ApiError;

/// Header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request context derived from headers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing/correlation.
    pub request_id: String,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(existing) = parts.extensions.get::<Self>() {
            return Ok(existing.clone());
        }
        let ctx = Self {
            request_id: request_id_from_headers(&parts.headers)
                .unwrap_or_else(|| Ulid::new().to_string()),
        };
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}

fn request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get("X-Request-Id")
        .or_else(|| headers.get("X-Request-ID"))?;
    value.to_str().ok().map(str::to_string)
}

/// Middleware that injects a request context and echoes the request ID.
pub async fn request_id_middleware(req: Request<Body>, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let ctx = RequestContext {
        request_id: request_id_from_headers(&parts.headers)
            .unwrap_or_else(|| Ulid::new().to_string()),
    };
    parts.extensions.insert(ctx.clone());

    let mut response = next.run(Request::from_parts(parts, body)).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}
