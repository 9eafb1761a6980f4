use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{catalog_error, player_error};
use crate::{
    common::{TunelinkError, types::GuildId},
    player::{PinMode, PlayerError, PlayerSnapshot},
    server::AppState,
    transport::models::{
        ClearResponse, CommandResponse, PinRequest, PlayRequest, PlayResponse, QueueView,
    },
};

/// POST /v1/guilds/{guildId}/play
pub async fn play(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlayRequest>,
) -> Response {
    let path = format!("/v1/guilds/{}/play", guild_id);
    tracing::info!("POST {} query={:?} user={}", path, body.query, body.user_id);

    let Some(voice_channel) = body.voice_channel_id else {
        return player_error(PlayerError::NoVoiceChannel, path);
    };
    if body.query.trim().is_empty() {
        return TunelinkError::bad_request("query must not be empty", path).into_response();
    }

    let track = match state.sources.resolve(&body.query, body.user_id).await {
        Ok(track) => track,
        Err(e) => return catalog_error(e, path),
    };

    match state
        .players
        .enqueue(&guild_id, track.clone(), Some(voice_channel), body.text_channel_id)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(PlayResponse { track, outcome })).into_response(),
        Err(e) => player_error(e, path),
    }
}

/// POST /v1/guilds/{guildId}/skip
pub async fn skip(Path(guild_id): Path<GuildId>, State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("POST /v1/guilds/{}/skip", guild_id);
    let applied = state.players.skip(&guild_id).await;
    command_response(&state, &guild_id, applied).await
}

/// POST /v1/guilds/{guildId}/stop
pub async fn stop(Path(guild_id): Path<GuildId>, State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("POST /v1/guilds/{}/stop", guild_id);
    let applied = state.players.stop(&guild_id).await;
    command_response(&state, &guild_id, applied).await
}

/// POST /v1/guilds/{guildId}/pause
pub async fn pause(Path(guild_id): Path<GuildId>, State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("POST /v1/guilds/{}/pause", guild_id);
    let applied = state.players.pause(&guild_id).await;
    command_response(&state, &guild_id, applied).await
}

/// POST /v1/guilds/{guildId}/resume
pub async fn resume(Path(guild_id): Path<GuildId>, State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("POST /v1/guilds/{}/resume", guild_id);
    let applied = state.players.resume(&guild_id).await;
    command_response(&state, &guild_id, applied).await
}

/// POST /v1/guilds/{guildId}/leave
pub async fn leave(Path(guild_id): Path<GuildId>, State(state): State<Arc<AppState>>) -> Response {
    let path = format!("/v1/guilds/{}/leave", guild_id);
    tracing::info!("POST {}", path);
    match state.players.leave(&guild_id).await {
        Ok(applied) => command_response(&state, &guild_id, applied).await,
        Err(e) => player_error(e, path),
    }
}

async fn command_response(state: &AppState, guild_id: &GuildId, applied: bool) -> Response {
    let body = CommandResponse {
        applied,
        state: state.players.state(guild_id).await,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// GET /v1/guilds/{guildId}/queue
pub async fn get_queue(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
) -> Json<QueueView> {
    tracing::debug!("GET /v1/guilds/{}/queue", guild_id);
    match state.players.snapshot(&guild_id).await {
        Some(snapshot) => Json(QueueView::new(
            snapshot.now_playing,
            &snapshot.upcoming,
            snapshot.queue_length,
        )),
        None => Json(QueueView::empty()),
    }
}

/// DELETE /v1/guilds/{guildId}/queue
pub async fn clear_queue(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
) -> Json<ClearResponse> {
    tracing::info!("DELETE /v1/guilds/{}/queue", guild_id);
    Json(ClearResponse {
        removed: state.players.clear_queue(&guild_id).await,
    })
}

/// GET /v1/guilds/{guildId}
pub async fn get_player(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
) -> Response {
    tracing::debug!("GET /v1/guilds/{}", guild_id);
    match state.players.snapshot(&guild_id).await {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => TunelinkError::not_found(
            format!("No session for guild {}", guild_id),
            format!("/v1/guilds/{}", guild_id),
        )
        .into_response(),
    }
}

/// GET /v1/players
pub async fn get_players(State(state): State<Arc<AppState>>) -> Json<Vec<PlayerSnapshot>> {
    tracing::debug!("GET /v1/players");
    Json(state.players.snapshots().await)
}

/// PUT /v1/guilds/{guildId}/pin
pub async fn update_pin(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<PinRequest>,
) -> Response {
    let path = format!("/v1/guilds/{}/pin", guild_id);
    tracing::info!("PUT {} mode={:?}", path, body.mode);

    let mode = match body.mode.as_deref().unwrap_or("toggle").parse::<PinMode>() {
        Ok(mode) => mode,
        Err(e) => return TunelinkError::bad_request(e, path).into_response(),
    };

    match state
        .players
        .set_pin(&guild_id, mode, body.voice_channel_id)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => player_error(e, path),
    }
}
