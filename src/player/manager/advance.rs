use std::sync::Arc;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{PlayerManager, WindowRoute};
use crate::{
    common::types::{TrackToken, WindowId},
    player::{
        context::{GuildPlayer, NowPlaying},
        manager::controls::WindowTask,
        progress::Progress,
        window::ControlWindow,
    },
    protocol::{PlayerEvent, tracks::Track},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Advance {
    Started(TrackToken),
    /// Queue empty or no engine.
    NotStarted,
}

impl PlayerManager {
    /// Binds the head of the queue to the engine. Caller holds the session lock
    /// and nothing is current.
    pub(super) fn advance_locked(self: &Arc<Self>, player: &mut GuildPlayer) -> Advance {
        let Some(engine) = player.engine.clone() else {
            debug!("[{}] advance without engine", player.guild_id);
            return Advance::NotStarted;
        };
        let Some(track) = player.queue.pop_front() else {
            player.current = None;
            return Advance::NotStarted;
        };

        let token = self.next_token();
        engine.bind(token, &track.stream_url);
        info!(
            "[{}] now playing {} - {} ({})",
            player.guild_id,
            track.title,
            track.artist_line(),
            token
        );

        let window = self.open_window(player, &track, token);
        player.current = Some(NowPlaying {
            track: track.clone(),
            token,
            progress: Progress::start(track.duration_secs),
            window: Some(window),
            skipped: false,
        });

        self.presenter.announce(PlayerEvent::TrackStart {
            guild_id: player.guild_id.clone(),
            token,
            track,
        });
        Advance::Started(token)
    }

    fn open_window(
        self: &Arc<Self>,
        player: &GuildPlayer,
        track: &Track,
        token: TrackToken,
    ) -> ControlWindow {
        let id = WindowId::generate();
        let cancel = CancellationToken::new();
        let refresh = Arc::new(Notify::new());

        self.windows.insert(
            id.clone(),
            WindowRoute {
                guild_id: player.guild_id.clone(),
                token,
            },
        );

        let task = WindowTask {
            id: id.clone(),
            guild_id: player.guild_id.clone(),
            channel_id: player.text_channel,
            token,
            track: track.clone(),
            ttl: self.config.window_ttl(track.duration_secs),
            cancel: cancel.clone(),
            refresh: refresh.clone(),
        };
        tokio::spawn(self.clone().run_window(task));

        ControlWindow::new(id, cancel, refresh)
    }
}
