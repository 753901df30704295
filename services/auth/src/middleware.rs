//! Request-identity middleware
//!
//! The resolution layer runs on every request and attaches the resolved
//! `Identity` to the request extensions. The guard layer sits on protected
//! routes only and decides how to answer unauthenticated requests: browsers
//! get sent to the login page, API consumers get a 401 body.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tracing::error;

use crate::{AppState, error::AuthError, identity::Identity};

/// Resolve the request identity and expose it to handlers
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = state
        .resolver
        .resolve(req.headers(), req.uri())
        .await
        .map_err(|e| {
            error!("Identity resolution failed: {}", e);
            AuthError::Internal
        })?;

    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

/// Reject requests that did not resolve to an identity
pub async fn require_auth(req: Request<Body>, next: Next) -> Response {
    if req.extensions().get::<Identity>().is_some() {
        return next.run(req).await;
    }

    if wants_html(req.headers()) {
        Redirect::to("/login").into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Unauthorized"})),
        )
            .into_response()
    }
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_negotiation_matches_browser_accept() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            "text/html,application/xhtml+xml".parse().unwrap(),
        );
        assert!(wants_html(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "application/json".parse().unwrap());
        assert!(!wants_html(&headers));

        assert!(!wants_html(&HeaderMap::new()));
    }
}
