//! Error types for the pad surface and its audio backend.

use thiserror::Error;

use crate::pad_engine::pad::PadId;

/// Errors that can occur while loading audio clips.
#[derive(Debug, Error)]
pub enum SampleLoadError {
    /// Failed to open the audio file.
    #[error("failed to open file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the audio file.
    #[error("failed to decode audio file: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    /// Audio file has no default track.
    #[error("audio file has no default track")]
    NoDefaultTrack,

    /// Audio file is missing sample rate information.
    #[error("audio file is missing a sample rate")]
    MissingSampleRate,

    /// Audio file is missing channel information.
    #[error("audio file is missing channel information")]
    MissingChannels,

    /// The clip was recorded at a different rate than the output device runs at.
    #[error("sample rate mismatch: file is {file_rate} Hz, output is {output_rate} Hz")]
    SampleRateMismatch {
        /// Sample rate of the source file.
        file_rate: u32,
        /// Sample rate of the output device.
        output_rate: u32,
    },

    /// Unsupported channel mapping configuration.
    #[error(
        "unsupported channel mapping: file has {file_channels} channels, output has {output_channels} channels (only mono↔stereo supported)"
    )]
    UnsupportedChannels {
        /// Number of channels in the source file.
        file_channels: usize,
        /// Number of channels expected for output.
        output_channels: usize,
    },
}

/// Errors reported by an audio backend.
#[derive(Debug, Error)]
pub enum AudioError {
    /// No output device is present on this host.
    #[error("no audio output device found")]
    NoDevice,

    /// The device refused the stream configuration or failed to start.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// Every sample slot is already taken.
    #[error("no free sample slot (capacity {capacity})")]
    SlotsExhausted { capacity: usize },

    /// The clip does not match the output channel layout.
    #[error("clip has {clip} channels, backend renders {output}")]
    ChannelMismatch { clip: usize, output: usize },

    /// The control ring towards the audio callback is full.
    #[error("control buffer full, dropped {0}")]
    ControlBufferFull(&'static str),
}

/// Errors returned by [`Surface`](crate::pad_engine::surface::Surface) operations.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// Geometry was requested before the UI layout reported itself settled.
    #[error("layout has not settled yet, geometry index left unchanged")]
    LayoutNotSettled,

    /// The pad handle does not belong to this surface.
    #[error("unknown pad {0:?}")]
    UnknownPad(PadId),

    /// More pads were requested than the surface supports.
    #[error("too many pads: {requested} (maximum {max})")]
    TooManyPads { requested: usize, max: usize },

    /// The layout provider and the clip list disagree on the pad count.
    #[error("layout has {layout} pads but {clips} clips were supplied")]
    PadCountMismatch { layout: usize, clips: usize },

    /// Audio backend failure.
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Clip loading failure.
    #[error(transparent)]
    Load(#[from] SampleLoadError),
}
