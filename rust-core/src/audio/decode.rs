//! File decoding through symphonia
//!
//! Produces an interleaved [`Waveform`]; channel layout is preserved and the
//! downmix is left to the analysis pipeline.

use log::{debug, warn};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use super::waveform::Waveform;
use crate::error::SpectrumError;

/// File extensions the bundled codecs can open
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["mp3", "wav", "flac", "m4a", "aac"];

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to open audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported or corrupt audio stream: {0}")]
    Format(#[from] SymphoniaError),

    #[error("No decodable audio track found")]
    NoTrack,

    #[error("Audio track does not declare a sample rate")]
    UnknownSampleRate,

    #[error("Audio stream decoded to zero samples")]
    Empty,

    #[error(transparent)]
    Waveform(#[from] SpectrumError),
}

/// Decode an audio file into an interleaved waveform
///
/// The file extension, when present, is passed to the format probe as a hint.
pub fn decode_file(path: &Path) -> Result<Waveform, DecodeError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
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
        .ok_or(DecodeError::NoTrack)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::UnknownSampleRate)?;
    let mut channels = track.codec_params.channels.map_or(0, |c| c.count());

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f64> = Vec::new();
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                skipped += 1;
                debug!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count();

        let mut buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend(buf.samples().iter().map(|&s| s as f64));
    }

    if skipped > 0 {
        warn!("{}: skipped {} corrupt packet(s)", path.display(), skipped);
    }
    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }

    debug!(
        "Decoded {}: {} samples, {} channel(s), {} Hz",
        path.display(),
        samples.len(),
        channels,
        sample_rate
    );

    Ok(Waveform::from_interleaved(samples, channels.max(1), sample_rate)?)
}

/// Whether `path` has an extension the decoder is expected to handle
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
