use std::sync::Arc;

use crate::{
    configs::Config, player::PlayerManager, presenter::EventPresenter, sources::SourceManager,
};

/// Top-level application state.
pub struct AppState {
    pub players: Arc<PlayerManager>,
    pub sources: Arc<SourceManager>,
    /// Websocket fan-out; also the presenter the players publish through.
    pub events: Arc<EventPresenter>,
    pub config: Config,
}
