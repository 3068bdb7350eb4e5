//! Pad surface configuration constants and limits.

use crate::pad_engine::geometry::Resolution;

/// Maximum number of pads a surface accepts.
pub const MAX_PADS: usize = 64;

/// Number of sample slots the audio backend can hold. Each pad may occupy
/// two: one for the native fast path and one for the standard path.
pub const NUM_SAMPLES: usize = MAX_PADS * 2;

/// Maximum number of voices that can sound simultaneously.
pub const MAX_VOICES: usize = 32;

/// Capacity of the pull-mode touch ring buffer.
pub const TOUCH_RING_CAPACITY: usize = 256;

/// Capacity of the control ring buffer feeding the audio callback.
pub const CONTROL_RING_CAPACITY: usize = 1024;

/// Fixed output block size requested from the audio device.
pub const OUTPUT_BLOCK_FRAMES: u32 = 256;

/// Resolution substituted when the host cannot report a native screen size.
pub const FALLBACK_RESOLUTION: Resolution = Resolution {
    width: 1,
    height: 1,
};

/// Default playback volume for pad triggers.
pub const TRIGGER_VOLUME: f32 = 1.0;

/// Minimum volume level (silence).
pub const VOLUME_MIN: f32 = 0.0;

/// Maximum volume level (100%).
pub const VOLUME_MAX: f32 = 1.0;
