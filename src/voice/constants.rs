/// Size of the IP discovery request and response.
pub const DISCOVERY_PACKET_SIZE: usize = 74;

/// IP discovery request type.
pub const DISCOVERY_REQUEST: u16 = 0x1;

/// IP discovery response type.
pub const DISCOVERY_RESPONSE: u16 = 0x2;

/// Length field of a discovery packet (everything after the first 4 bytes).
pub const DISCOVERY_BODY_LEN: u16 = 70;

/// RTP version 2, no padding, no extension, no CSRC.
pub const RTP_VERSION_BYTE: u8 = 0x80;

/// Dynamic payload type used for raw s16le PCM frames.
pub const RTP_PCM_PAYLOAD_TYPE: u8 = 96;

pub const RTP_HEADER_LEN: usize = 12;

/// Bytes per interleaved stereo s16 sample frame.
pub const STEREO_FRAME_BYTES: usize = 4;
