use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info, warn};

use crate::{protocol::OutgoingMessage, server::AppState};

/// GET /v1/websocket
pub async fn websocket_handler(
    headers: HeaderMap,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, &'static str)> {
    let auth_header = headers.get("authorization").and_then(|h| h.to_str().ok());

    match auth_header {
        Some(auth) if auth == state.config.server.password => {}
        Some(_) => {
            warn!("Authorization failed: Invalid password provided");
            return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
        }
        None => {
            warn!("Authorization failed: Missing Authorization header");
            return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
        }
    }

    if let Some(name) = headers.get("client-name").and_then(|h| h.to_str().ok()) {
        info!("Incoming connection from client: {}", name);
    }

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state))
        .into_response())
}

pub async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let client_id = uuid::Uuid::new_v4().to_string();
    let rx = state.events.register(&client_id);
    info!("WebSocket connected: client={}", client_id);

    let ready = OutgoingMessage::Ready {
        client_id: client_id.clone(),
    };
    if let Ok(json) = serde_json::to_string(&ready) {
        if socket.send(Message::Text(json.into())).await.is_err() {
            state.events.unregister(&client_id);
            return;
        }
    }

    loop {
        tokio::select! {
            Ok(json) = rx.recv_async() => {
                if let Err(e) = socket.send(Message::Text(json.into())).await {
                    error!("Socket send error: client={} err={}", client_id, e);
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => debug!("Ignoring inbound frame from client={}", client_id),
                    Some(Err(e)) => {
                        warn!("WebSocket error: client={} err={}", client_id, e);
                        break;
                    }
                }
            }
        }
    }

    state.events.unregister(&client_id);
    info!("WebSocket closed: client={}", client_id);
}
