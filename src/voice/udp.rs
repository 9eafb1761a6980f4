use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use super::{
    JoinError, VoiceConnection, VoiceConnector,
    constants::{
        DISCOVERY_BODY_LEN, DISCOVERY_PACKET_SIZE, DISCOVERY_REQUEST, DISCOVERY_RESPONSE,
        RTP_HEADER_LEN, RTP_PCM_PAYLOAD_TYPE, RTP_VERSION_BYTE, STEREO_FRAME_BYTES,
    },
};
use crate::{
    common::types::{AnyResult, ChannelId, GuildId},
    configs::VoiceConfig,
};

/// Connects to UDP media endpoints configured per voice channel.
pub struct UdpConnector {
    endpoints: HashMap<ChannelId, String>,
}

impl UdpConnector {
    pub fn new(endpoints: HashMap<ChannelId, String>) -> Self {
        Self { endpoints }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        let mut endpoints = HashMap::new();
        for (channel, endpoint) in &config.endpoints {
            match channel.parse::<ChannelId>() {
                Ok(id) => {
                    endpoints.insert(id, endpoint.clone());
                }
                Err(_) => warn!("Ignoring voice endpoint with invalid channel id: {}", channel),
            }
        }
        Self::new(endpoints)
    }

    async fn resolve(&self, channel_id: ChannelId) -> Result<SocketAddr, JoinError> {
        let endpoint = self
            .endpoints
            .get(&channel_id)
            .ok_or(JoinError::ChannelUnavailable(channel_id))?;
        tokio::net::lookup_host(endpoint.as_str())
            .await?
            .next()
            .ok_or(JoinError::ChannelUnavailable(channel_id))
    }
}

#[async_trait]
impl VoiceConnector for UdpConnector {
    async fn join(
        &self,
        guild_id: &GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceConnection>, JoinError> {
        let addr = self.resolve(channel_id).await?;
        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(addr).await?;

        let ssrc: u32 = rand::random();
        let (ip, port) = discover_ip(&socket, ssrc).await?;
        info!(
            "[{}] voice ready on channel {} via {} (external {}:{})",
            guild_id, channel_id, addr, ip, port
        );

        Ok(Arc::new(UdpVoiceLink::new(
            Arc::new(socket),
            channel_id,
            ssrc,
        )))
    }
}

/// Performs the IP discovery handshake, which doubles as the readiness probe.
///
/// The caller bounds the wait; this only returns once a response arrives.
pub async fn discover_ip(socket: &UdpSocket, ssrc: u32) -> Result<(String, u16), JoinError> {
    let mut packet = [0u8; DISCOVERY_PACKET_SIZE];
    packet[0..2].copy_from_slice(&DISCOVERY_REQUEST.to_be_bytes());
    packet[2..4].copy_from_slice(&DISCOVERY_BODY_LEN.to_be_bytes());
    packet[4..8].copy_from_slice(&ssrc.to_be_bytes());
    socket.send(&packet).await?;

    let mut buf = [0u8; DISCOVERY_PACKET_SIZE];
    loop {
        let n = socket.recv(&mut buf).await?;
        if n < DISCOVERY_PACKET_SIZE {
            debug!("Ignoring short discovery datagram ({} bytes)", n);
            continue;
        }
        if u16::from_be_bytes([buf[0], buf[1]]) != DISCOVERY_RESPONSE {
            return Err(JoinError::Rejected("unexpected discovery response type".into()));
        }
        if u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]) != ssrc {
            return Err(JoinError::Rejected("discovery response for another ssrc".into()));
        }

        let ip = std::str::from_utf8(&buf[8..72])
            .map_err(|e| JoinError::Rejected(e.to_string()))?
            .trim_matches('\0')
            .to_string();
        let port = u16::from_be_bytes([buf[72], buf[73]]);
        return Ok((ip, port));
    }
}

struct RtpState {
    sequence: u16,
    timestamp: u32,
    packet_buf: Vec<u8>,
}

/// RTP-over-UDP link carrying raw PCM frames.
pub struct UdpVoiceLink {
    socket: Arc<UdpSocket>,
    channel_id: ChannelId,
    ssrc: u32,
    alive: AtomicBool,
    rtp: Mutex<RtpState>,
}

impl UdpVoiceLink {
    pub fn new(socket: Arc<UdpSocket>, channel_id: ChannelId, ssrc: u32) -> Self {
        Self {
            socket,
            channel_id,
            ssrc,
            alive: AtomicBool::new(true),
            rtp: Mutex::new(RtpState {
                sequence: 0,
                timestamp: 0,
                packet_buf: Vec::with_capacity(RTP_HEADER_LEN + 3840),
            }),
        }
    }

    /// Frames `pcm` into an RTP packet and advances sequence/timestamp.
    fn build_packet(&self, pcm: &[u8]) -> Vec<u8> {
        let mut rtp = self.rtp.lock();
        let sequence = rtp.sequence;
        let timestamp = rtp.timestamp;
        rtp.sequence = rtp.sequence.wrapping_add(1);
        rtp.timestamp = rtp
            .timestamp
            .wrapping_add((pcm.len() / STEREO_FRAME_BYTES) as u32);

        let buf = &mut rtp.packet_buf;
        buf.clear();
        buf.push(RTP_VERSION_BYTE);
        buf.push(RTP_PCM_PAYLOAD_TYPE);
        buf.extend_from_slice(&sequence.to_be_bytes());
        buf.extend_from_slice(&timestamp.to_be_bytes());
        buf.extend_from_slice(&self.ssrc.to_be_bytes());
        buf.extend_from_slice(pcm);
        buf.clone()
    }
}

#[async_trait]
impl VoiceConnection for UdpVoiceLink {
    fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    async fn send_frame(&self, pcm: &[u8]) -> AnyResult<()> {
        if !self.is_alive() {
            return Err("voice link destroyed".into());
        }
        let packet = self.build_packet(pcm);
        self.socket.send(&packet).await?;
        Ok(())
    }

    fn destroy(&self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            debug!("Voice link to channel {} destroyed", self.channel_id);
        }
    }
}
