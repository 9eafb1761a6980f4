use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{
    EngineError, EngineEvent, EngineEventSender, EngineFactory, PlaybackEngine, PlaybackState,
    TrackHandle,
    decoder::{extension_hint, start_decoding},
};
use crate::{
    common::types::{GuildId, TrackToken},
    voice::VoiceConnection,
};

/// Builds [`StreamingEngine`]s sharing one HTTP client.
pub struct StreamingEngineFactory {
    client: reqwest::Client,
    frame_duration: Duration,
}

impl StreamingEngineFactory {
    pub fn new(frame_duration_ms: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            frame_duration: Duration::from_millis(frame_duration_ms.max(1)),
        })
    }
}

impl EngineFactory for StreamingEngineFactory {
    fn create(
        &self,
        guild_id: GuildId,
        connection: Arc<dyn VoiceConnection>,
        events: EngineEventSender,
    ) -> Arc<dyn PlaybackEngine> {
        Arc::new(StreamingEngine {
            guild_id,
            connection,
            events,
            client: self.client.clone(),
            frame_duration: self.frame_duration,
            current: Mutex::new(None),
        })
    }
}

/// Downloads, decodes and paces one track at a time onto a voice connection.
pub struct StreamingEngine {
    guild_id: GuildId,
    connection: Arc<dyn VoiceConnection>,
    events: EngineEventSender,
    client: reqwest::Client,
    frame_duration: Duration,
    current: Mutex<Option<TrackHandle>>,
}

impl PlaybackEngine for StreamingEngine {
    fn bind(&self, token: TrackToken, source_url: &str) {
        let handle = TrackHandle::new();
        if let Some(previous) = self.current.lock().replace(handle.clone()) {
            previous.stop();
        }

        let ctx = StreamCtx {
            guild_id: self.guild_id.clone(),
            token,
            url: source_url.to_string(),
            handle,
            connection: self.connection.clone(),
            client: self.client.clone(),
            frame_duration: self.frame_duration,
            events: self.events.clone(),
        };
        tokio::spawn(stream_track(ctx));
    }

    fn pause(&self) -> bool {
        self.current.lock().as_ref().is_some_and(TrackHandle::pause)
    }

    fn resume(&self) -> bool {
        self.current.lock().as_ref().is_some_and(TrackHandle::play)
    }

    fn stop(&self) {
        if let Some(handle) = self.current.lock().as_ref() {
            handle.stop();
        }
    }

    fn state(&self) -> PlaybackState {
        self.current
            .lock()
            .as_ref()
            .map(TrackHandle::get_state)
            .unwrap_or(PlaybackState::Stopped)
    }
}

struct StreamCtx {
    guild_id: GuildId,
    token: TrackToken,
    url: String,
    handle: TrackHandle,
    connection: Arc<dyn VoiceConnection>,
    client: reqwest::Client,
    frame_duration: Duration,
    events: EngineEventSender,
}

async fn stream_track(ctx: StreamCtx) {
    info!("[{}] stream {} starting: {}", ctx.guild_id, ctx.token, ctx.url);

    let result = run_stream(&ctx).await;
    ctx.handle.stop();

    let error = match result {
        Ok(()) => None,
        Err(e) => {
            warn!("[{}] stream {} failed: {}", ctx.guild_id, ctx.token, e);
            Some(e.to_string())
        }
    };
    debug!(
        "[{}] stream {} idle after {} ms",
        ctx.guild_id,
        ctx.token,
        ctx.handle.get_position(ctx.frame_duration)
    );

    let _ = ctx.events.send(EngineEvent::Idle {
        guild_id: ctx.guild_id,
        token: ctx.token,
        error,
    });
}

async fn run_stream(ctx: &StreamCtx) -> Result<(), EngineError> {
    let download = async {
        let resp = ctx.client.get(&ctx.url).send().await?.error_for_status()?;
        resp.bytes().await
    };
    let data = tokio::select! {
        biased;
        _ = ctx.handle.stopped() => return Ok(()),
        data = download => data?,
    };

    let frame_ms = ctx.frame_duration.as_millis() as u64;
    let (frames, errors) = start_decoding(data, extension_hint(&ctx.url), frame_ms);

    let mut interval = tokio::time::interval(ctx.frame_duration);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut pcm = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = ctx.handle.stopped() => return Ok(()),
            _ = interval.tick() => {}
        }

        match ctx.handle.get_state() {
            PlaybackState::Stopped => return Ok(()),
            PlaybackState::Paused => continue,
            PlaybackState::Playing => {}
        }

        let frame = tokio::select! {
            biased;
            _ = ctx.handle.stopped() => return Ok(()),
            frame = frames.recv_async() => match frame {
                Ok(frame) => frame,
                Err(_) => break,
            },
        };

        pcm.clear();
        for sample in &frame {
            pcm.extend_from_slice(&sample.to_le_bytes());
        }
        ctx.connection
            .send_frame(&pcm)
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        ctx.handle.record_frame();
    }

    // Disconnects once the decoder thread exits.
    match errors.recv_async().await {
        Ok(err) => Err(EngineError::Decode(err)),
        Err(_) => Ok(()),
    }
}
