//! Per-pad state.
//!
//! A pad is split in two. [`PadVoice`] is what touch callbacks may read: it is
//! built once when the scene is initialised, shared as `Arc<[PadVoice]>` and
//! never mutated again, so reading it from another thread needs no lock.
//! [`Pad`] holds everything else and stays on the owning thread.

use crate::pad_engine::audio_trigger::{NativeSampleHandle, StandardSampleHandle};

/// Stable handle of a pad: its position in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PadId(pub usize);

/// Read-only audio data of a pad, safe to read from any thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadVoice {
    pub id: PadId,
    /// Handle into the native fast path; `None` when the clip could not be
    /// loaded there or the platform has no fast path.
    pub native: Option<NativeSampleHandle>,
}

/// What the pad currently looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadVisual {
    #[default]
    Idle,
    Pressed,
}

/// Owning-thread state of a pad.
#[derive(Debug, Clone)]
pub struct Pad {
    id: PadId,
    standard: Option<StandardSampleHandle>,
    visual: PadVisual,
    restore_to: PadVisual,
}

impl Pad {
    pub fn new(id: PadId, standard: Option<StandardSampleHandle>) -> Self {
        Self {
            id,
            standard,
            visual: PadVisual::Idle,
            restore_to: PadVisual::Idle,
        }
    }

    pub fn id(&self) -> PadId {
        self.id
    }

    pub fn standard_handle(&self) -> Option<StandardSampleHandle> {
        self.standard
    }

    pub fn visual(&self) -> PadVisual {
        self.visual
    }

    pub fn is_pressed(&self) -> bool {
        self.visual == PadVisual::Pressed
    }

    /// Remember the current look and switch to the pressed one.
    pub fn press(&mut self) {
        if self.visual != PadVisual::Pressed {
            self.restore_to = self.visual;
        }
        self.visual = PadVisual::Pressed;
    }

    /// Go back to whatever the pad looked like before [`Pad::press`].
    pub fn release(&mut self) {
        self.visual = self.restore_to;
    }
}
