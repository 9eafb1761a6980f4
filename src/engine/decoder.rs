use std::{io::Cursor, thread};

use bytes::Bytes;
use flume::{Receiver, Sender};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};
use tracing::{debug, error};

/// Frames buffered between the decoder thread and the pacer.
const FRAME_BUFFER: usize = 50;

/// Decode `data` on a dedicated thread into fixed-length stereo frames.
///
/// Returns the frame receiver and a receiver that yields at most one error
/// message if decoding failed. Dropping the frame receiver stops the thread.
pub fn start_decoding(
    data: Bytes,
    extension: Option<String>,
    frame_ms: u64,
) -> (Receiver<Vec<i16>>, Receiver<String>) {
    let (tx, rx) = flume::bounded::<Vec<i16>>(FRAME_BUFFER);
    let (err_tx, err_rx) = flume::bounded::<String>(1);

    thread::spawn(move || {
        if let Err(e) = decode_loop(data, extension, frame_ms, tx) {
            error!("Decoding error: {}", e);
            let _ = err_tx.send(e.to_string());
        }
    });

    (rx, err_rx)
}

/// Symphonia hint extension for a source URL.
pub fn extension_hint(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|s| s.to_str())?
        .to_lowercase();

    let hint = match ext.as_str() {
        "mp3" => "mp3",
        "m4a" | "mp4" | "3gp" | "mov" => "m4a",
        "ogg" | "opus" => "ogg",
        "flac" => "flac",
        "wav" => "wav",
        "aac" => "aac",
        "mkv" | "webm" => "mkv",
        _ => return None,
    };
    Some(hint.to_string())
}

/// Number of interleaved stereo samples in one frame.
pub fn frame_len(sample_rate: u32, frame_ms: u64) -> usize {
    ((sample_rate as u64 * frame_ms / 1000) as usize).max(1) * 2
}

/// Appends `samples` (interleaved, `channels` wide) to `out` as stereo.
pub fn push_stereo(samples: &[i16], channels: usize, out: &mut Vec<i16>) {
    let channels = channels.max(1);
    for frame in samples.chunks_exact(channels) {
        let left = frame[0];
        let right = if channels > 1 { frame[1] } else { frame[0] };
        out.push(left);
        out.push(right);
    }
}

fn decode_loop(
    data: Bytes,
    extension: Option<String>,
    frame_ms: u64,
    tx: Sender<Vec<i16>>,
) -> Result<(), Error> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension.as_deref() {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(Error::Unsupported("no audio track found"))?;

    let track_id = track.id;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(48_000);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);
    let frame_len = frame_len(sample_rate, frame_ms);
    debug!("Source: {}Hz {} channels, frame {} samples", sample_rate, channels, frame_len);

    let mut sample_buf: Option<SampleBuffer<i16>> = None;
    let mut pending: Vec<i16> = Vec::with_capacity(frame_len * 2);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(Error::DecodeError(e)) => {
                debug!("decode error: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                let buf = sample_buf.get_or_insert_with(|| {
                    SampleBuffer::<i16>::new(audio_buf.capacity() as u64, *audio_buf.spec())
                });
                buf.copy_interleaved_ref(audio_buf);
                push_stereo(buf.samples(), channels, &mut pending);

                while pending.len() >= frame_len {
                    let frame: Vec<i16> = pending.drain(..frame_len).collect();
                    if tx.send(frame).is_err() {
                        return Ok(());
                    }
                }
            }
            Err(Error::DecodeError(e)) => {
                debug!("decode error: {}", e);
                continue;
            }
            Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }

    if !pending.is_empty() {
        pending.resize(frame_len, 0);
        let _ = tx.send(pending);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_hint_ignores_query() {
        assert_eq!(
            extension_hint("https://aac.saavncdn.com/a/b_320.mp4?token=1").as_deref(),
            Some("m4a")
        );
        assert_eq!(extension_hint("https://x/y.MP3").as_deref(), Some("mp3"));
        assert_eq!(extension_hint("https://x/stream"), None);
    }

    #[test]
    fn test_frame_len_is_stereo_samples() {
        assert_eq!(frame_len(48_000, 20), 1920);
        assert_eq!(frame_len(44_100, 20), 1764);
    }

    #[test]
    fn test_mono_is_duplicated_and_surround_is_folded() {
        let mut out = Vec::new();
        push_stereo(&[1, 2], 1, &mut out);
        assert_eq!(out, vec![1, 1, 2, 2]);

        out.clear();
        push_stereo(&[1, 2, 3, 4, 5, 6], 3, &mut out);
        assert_eq!(out, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_garbage_input_reports_error() {
        let (frames, errors) = start_decoding(Bytes::from_static(b"not audio"), None, 20);
        assert!(frames.recv().is_err(), "no frames from garbage");
        assert!(errors.recv().is_ok(), "an error is reported");
    }
}
