use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::{
    server::AppState,
    transport::{
        middleware::{add_response_headers, check_auth},
        routes::{info, interactions, player},
        websocket_server::websocket_handler,
    },
};

const API_V1: &str = "/v1";

pub fn router(state: Arc<AppState>) -> Router {
    let v1_routes = Router::new()
        .route("/players", get(player::get_players))
        .route("/guilds/{guild_id}", get(player::get_player))
        .route("/guilds/{guild_id}/play", post(player::play))
        .route("/guilds/{guild_id}/skip", post(player::skip))
        .route("/guilds/{guild_id}/stop", post(player::stop))
        .route("/guilds/{guild_id}/leave", post(player::leave))
        .route("/guilds/{guild_id}/pause", post(player::pause))
        .route("/guilds/{guild_id}/resume", post(player::resume))
        .route(
            "/guilds/{guild_id}/queue",
            get(player::get_queue).delete(player::clear_queue),
        )
        .route("/guilds/{guild_id}/pin", put(player::update_pin))
        .route("/interactions", post(interactions::interact));

    let rest = Router::new()
        .nest(API_V1, v1_routes)
        .route("/version", get(info::get_version))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth));

    // The websocket authenticates during the upgrade itself.
    Router::new()
        .route("/v1/websocket", get(websocket_handler))
        .merge(rest)
        .layer(middleware::from_fn(add_response_headers))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        configs::{Config, ServerConfig},
        engine::StreamingEngineFactory,
        pins::PinStore,
        player::{ManagerDeps, PlayerManager},
        presenter::EventPresenter,
        render::TextCardRenderer,
        sources::{CatalogError, CatalogSource, SearchResult, SourceManager},
        voice::UdpConnector,
    };

    struct EmptyCatalog;

    #[async_trait]
    impl CatalogSource for EmptyCatalog {
        fn name(&self) -> &str {
            "empty"
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, CatalogError> {
            Ok(Vec::new())
        }
    }

    fn app(dir: &tempfile::TempDir) -> Router {
        let events = Arc::new(EventPresenter::new());
        let (players, rx) = PlayerManager::new(
            ManagerDeps {
                connector: Arc::new(UdpConnector::new(Default::default())),
                engines: Arc::new(StreamingEngineFactory::new(20).unwrap()),
                presenter: events.clone(),
                renderer: Arc::new(TextCardRenderer::default()),
                pins: Arc::new(PinStore::new(dir.path().join("pins.json"), 1)),
            },
            Default::default(),
            Duration::from_secs(1),
        );
        players.run_events(rx);

        let config = Config {
            server: ServerConfig {
                password: "secret".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        router(Arc::new(AppState {
            players,
            sources: Arc::new(SourceManager::new(Arc::new(EmptyCatalog), "320kbps")),
            events,
            config,
        }))
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "secret")
            .header("content-type", "application/json");
        match body {
            Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_requires_password() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(
                Request::builder()
                    .uri("/v1/players")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["Tunelink-Api-Version"], "1");
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(
                Request::builder()
                    .uri("/v1/players")
                    .header("authorization", "guess")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_server_lists_no_players() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(request("GET", "/v1/players", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_guild_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(request("GET", "/v1/guilds/1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["path"], "/v1/guilds/1");
    }

    #[tokio::test]
    async fn test_play_without_voice_channel() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(request(
                "POST",
                "/v1/guilds/1/play",
                Some(serde_json::json!({ "query": "ilahi", "userId": 5 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "Join a voice channel first");
    }

    #[tokio::test]
    async fn test_play_with_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(request(
                "POST",
                "/v1/guilds/1/play",
                Some(serde_json::json!({ "query": "ilahi", "userId": 5, "voiceChannelId": 9 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_pin_mode() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(request(
                "PUT",
                "/v1/guilds/1/pin",
                Some(serde_json::json!({ "mode": "sometimes" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pin_to_unreachable_channel() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(request(
                "PUT",
                "/v1/guilds/1/pin",
                Some(serde_json::json!({ "mode": "on", "voiceChannelId": 77 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_interaction_on_closed_window_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(request(
                "POST",
                "/v1/interactions",
                Some(serde_json::json!({ "windowId": "gone", "action": "skip", "userId": 1 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["result"], "stale");
    }

    #[tokio::test]
    async fn test_leave_on_empty_guild_is_safe() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(request("POST", "/v1/guilds/1/leave", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["applied"], false);
    }

    #[tokio::test]
    async fn test_stop_on_empty_guild_is_safe() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(request("POST", "/v1/guilds/1/stop", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["applied"], false);
        assert_eq!(body["state"], "empty");
    }
}
