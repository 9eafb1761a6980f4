use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    common::TunelinkError, player::ControlAction, server::AppState,
    transport::models::InteractionRequest,
};

/// POST /v1/interactions
///
/// A button press on a now-playing card. Presses on windows that have
/// already closed answer `stale` rather than an error.
pub async fn interact(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InteractionRequest>,
) -> Response {
    tracing::debug!(
        "POST /v1/interactions window={} action={} user={}",
        body.window_id,
        body.action,
        body.user_id
    );

    let action = match body.action.parse::<ControlAction>() {
        Ok(action) => action,
        Err(e) => return TunelinkError::bad_request(e, "/v1/interactions").into_response(),
    };

    let result = state
        .players
        .interact(&body.window_id, body.user_id, action)
        .await;
    (StatusCode::OK, Json(result)).into_response()
}
