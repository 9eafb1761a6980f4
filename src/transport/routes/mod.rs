pub mod info;
pub mod interactions;
pub mod player;

use axum::response::{IntoResponse, Response};

use crate::{common::TunelinkError, player::PlayerError, sources::CatalogError};

pub(crate) fn catalog_error(err: CatalogError, path: String) -> Response {
    match err {
        CatalogError::NoResults(_) | CatalogError::NoPlayableSource(_) => {
            TunelinkError::not_found(err.to_string(), path).into_response()
        }
        CatalogError::Request(_) | CatalogError::Payload(_) => {
            tracing::warn!("Catalog lookup failed: {}", err);
            TunelinkError::bad_gateway(err.to_string(), path).into_response()
        }
    }
}

pub(crate) fn player_error(err: PlayerError, path: String) -> Response {
    match err {
        PlayerError::NoVoiceChannel => TunelinkError::bad_request(err.to_string(), path).into_response(),
        PlayerError::Pinned => TunelinkError::conflict(err.to_string(), path).into_response(),
        PlayerError::Join(_) => {
            tracing::warn!("Voice join failed: {}", err);
            TunelinkError::bad_gateway(err.to_string(), path).into_response()
        }
    }
}
