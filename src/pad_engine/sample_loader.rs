//! Pad clip loading.
//!
//! Clips are decoded fully up front with symphonia into interleaved `f32`
//! frames matching the output device. Pads are short one-shots, so nothing
//! is streamed.

use std::fs::File;
use std::path::Path;

use symphonia::core::{
    audio::SampleBuffer as SymphoniaSampleBuffer, codecs::DecoderOptions,
    errors::Error as SymphoniaError, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};

use crate::messages::SampleBuffer;
use crate::pad_engine::errors::SampleLoadError;

/// Decode the clip at `path` for an output with `output_channels` channels
/// running at `output_rate_hz`.
///
/// The clip must already be at the output rate; mono and stereo clips are
/// converted to the output channel count.
pub fn decode_clip(
    path: &Path,
    output_channels: usize,
    output_rate_hz: u32,
) -> Result<SampleBuffer, SampleLoadError> {
    let source = MediaSourceStream::new(Box::new(File::open(path)?), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut format = get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?
        .format;

    let track = format
        .default_track()
        .ok_or(SampleLoadError::NoDefaultTrack)?;
    let track_id = track.id;
    let file_rate = track
        .codec_params
        .sample_rate
        .ok_or(SampleLoadError::MissingSampleRate)?;
    let file_channels = track
        .codec_params
        .channels
        .ok_or(SampleLoadError::MissingChannels)?
        .count();

    if file_rate != output_rate_hz {
        return Err(SampleLoadError::SampleRateMismatch {
            file_rate,
            output_rate: output_rate_hz,
        });
    }

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut interleaved: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet)?;
        let mut block = SymphoniaSampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        block.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(block.samples());
    }

    log::debug!(
        "Decoded {} ({} frames, {} ch)",
        path.display(),
        interleaved.len() / file_channels.max(1),
        file_channels
    );

    let mapped = remap_channels(interleaved, file_channels, output_channels)?;
    Ok(SampleBuffer::new(output_channels, mapped))
}

/// Convert interleaved frames between mono and stereo.
pub fn remap_channels(
    samples: Vec<f32>,
    from: usize,
    to: usize,
) -> Result<Vec<f32>, SampleLoadError> {
    match (from, to) {
        _ if from == to => Ok(samples),
        (1, 2) => Ok(samples.iter().flat_map(|&s| [s, s]).collect()),
        (2, 1) => Ok(samples
            .chunks_exact(2)
            .map(|frame| (frame[0] + frame[1]) * 0.5)
            .collect()),
        _ => Err(SampleLoadError::UnsupportedChannels {
            file_channels: from,
            output_channels: to,
        }),
    }
}
