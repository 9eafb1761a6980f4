use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::server::AppState;

pub const API_VERSION_HEADER: &str = "Tunelink-Api-Version";
const API_VERSION: &str = "1";

/// Rejects requests whose `Authorization` header doesn't carry the server password.
pub async fn check_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let supplied = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let reason = match supplied {
        Some(password) if password == state.config.server.password => {
            return Ok(next.run(req).await);
        }
        Some(_) => "wrong password",
        None => "no Authorization header",
    };
    warn!(
        "Rejected {} {}: {}",
        req.method(),
        req.uri().path(),
        reason
    );
    Err(StatusCode::UNAUTHORIZED)
}

pub async fn add_response_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
    response
}
