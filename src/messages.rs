//! Message definitions shared between the owning thread, touch callbacks and
//! the real-time audio thread.
//!
//! [`TouchSample`] is what a touch source delivers; [`ControlMessage`] is the
//! wire format of the ring buffer feeding the audio callback.

use std::sync::Arc;

/// Decoded, immutable clip data shared by reference with the audio thread.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    pub channels: usize,
    pub samples: Arc<[f32]>,
}

impl SampleBuffer {
    pub fn new(channels: usize, samples: Vec<f32>) -> Self {
        Self {
            channels,
            samples: Arc::from(samples.into_boxed_slice()),
        }
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }
}

/// Phase of a touch sample. Only [`TouchPhase::Began`] triggers audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

impl TouchPhase {
    /// Parse the phase names used by host bindings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "began" | "begin" | "down" => Some(Self::Began),
            "moved" | "move" => Some(Self::Moved),
            "ended" | "end" | "up" => Some(Self::Ended),
            "cancelled" | "cancel" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// One touch event in device-native pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub x: f32,
    pub y: f32,
    pub phase: TouchPhase,
}

impl TouchSample {
    pub const fn new(x: f32, y: f32, phase: TouchPhase) -> Self {
        Self { x, y, phase }
    }

    pub const fn began(x: f32, y: f32) -> Self {
        Self::new(x, y, TouchPhase::Began)
    }
}

/// Message sent from the owning thread to the audio thread.
#[derive(Debug, Clone)]
pub enum ControlMessage {
    /// Publish a loaded clip into an audio-thread slot.
    ///
    /// # Parameters
    /// * `slot` - Sample slot the clip is stored in
    /// * `sample` - Pre-decoded immutable sample buffer (shared handle)
    LoadSample { slot: usize, sample: SampleBuffer },

    /// Start a voice for a loaded slot.
    PlaySample { slot: usize, volume: f32 },

    /// Stop every voice playing a slot.
    StopSample { slot: usize },

    /// Stop all currently active voices.
    StopAll,
}
