//! Pad audio triggering.
//!
//! Two playback capabilities exist:
//!
//! - [`NativeAudio`]: a low-latency fast path whose `play` may be called from
//!   any thread, including a touch callback running outside the owning thread.
//! - [`StandardAudio`]: the regular backend, which is only valid on the owning
//!   thread.
//!
//! Touch callbacks get a [`ForeignTrigger`], which has no access to
//! [`StandardAudio`] at all. The owning thread uses [`AudioTrigger`], which
//! holds both and picks one per pad with [`resolve_action`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::messages::SampleBuffer;
use crate::pad_engine::constants::MAX_PADS;
use crate::pad_engine::errors::{AudioError, SurfaceError};
use crate::pad_engine::pad::{Pad, PadId, PadVoice};

/// Clip handle owned by a [`NativeAudio`] backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeSampleHandle(pub usize);

/// Clip handle owned by a [`StandardAudio`] backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandardSampleHandle(pub usize);

/// Low-latency playback callable from any thread.
pub trait NativeAudio: Send + Sync {
    /// Whether this platform actually provides the fast path.
    fn is_fast_path_available(&self) -> bool;

    /// Load a clip. Called once per pad during scene initialisation.
    fn load(&self, clip: &SampleBuffer) -> Result<NativeSampleHandle, AudioError>;

    /// Start playback. Must not block or allocate.
    fn play(&self, handle: NativeSampleHandle);
}

/// Regular playback, restricted to the owning thread.
pub trait StandardAudio {
    fn load(&mut self, clip: &SampleBuffer) -> Result<StandardSampleHandle, AudioError>;

    fn stop(&mut self, handle: StandardSampleHandle);

    fn play(&mut self, handle: StandardSampleHandle);

    /// Silence every voice, whichever path started it.
    fn stop_all(&mut self);
}

/// Thread a trigger request originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallContext {
    /// The thread that owns the pads, the layout and the standard backend.
    Owning,
    /// A touch source callback thread.
    Foreign,
}

/// What a trigger request turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// Play through the native fast path.
    Native,
    /// Stop and restart the clip on the standard backend.
    Standard,
    /// Do nothing: the only available path is not safe from this thread.
    Skip,
}

/// Choose the playback path for one trigger.
///
/// The standard backend is never selected for [`CallContext::Foreign`].
pub fn resolve_action(native_available: bool, context: CallContext) -> TriggerAction {
    match (native_available, context) {
        (true, _) => TriggerAction::Native,
        (false, CallContext::Owning) => TriggerAction::Standard,
        (false, CallContext::Foreign) => TriggerAction::Skip,
    }
}

/// The subset of triggering that is safe off the owning thread.
///
/// Cloning is cheap; every field is shared and read-only apart from the
/// native-audio switch, which is an atomic.
#[derive(Clone)]
pub struct ForeignTrigger {
    native: Option<Arc<dyn NativeAudio>>,
    voices: Arc<[PadVoice]>,
    native_enabled: Arc<AtomicBool>,
}

impl ForeignTrigger {
    fn native_handle(&self, pad: PadId) -> Option<(&dyn NativeAudio, NativeSampleHandle)> {
        if !self.native_enabled.load(Ordering::Relaxed) {
            return None;
        }
        let native = self.native.as_deref()?;
        if !native.is_fast_path_available() {
            return None;
        }
        let handle = self.voices.get(pad.0)?.native?;
        Some((native, handle))
    }

    /// Whether `pad` would currently play through the native fast path.
    pub fn native_available(&self, pad: PadId) -> bool {
        self.native_handle(pad).is_some()
    }

    /// Trigger `pad` from a touch callback.
    pub fn trigger(&self, pad: PadId) -> TriggerAction {
        let target = self.native_handle(pad);
        match resolve_action(target.is_some(), CallContext::Foreign) {
            TriggerAction::Native => {
                if let Some((native, handle)) = target {
                    native.play(handle);
                }
                TriggerAction::Native
            }
            _ => TriggerAction::Skip,
        }
    }

    pub fn voices(&self) -> &[PadVoice] {
        &self.voices
    }
}

/// Owning-thread trigger with access to both playback paths.
pub struct AudioTrigger {
    foreign: ForeignTrigger,
    standard: Option<Box<dyn StandardAudio>>,
}

impl AudioTrigger {
    /// Load `clips` into the available backends and build one pad per clip.
    ///
    /// Native handles are assigned here and never change afterwards. A clip
    /// the native backend rejects falls back to the standard path.
    pub fn load(
        native: Option<Arc<dyn NativeAudio>>,
        mut standard: Option<Box<dyn StandardAudio>>,
        clips: &[SampleBuffer],
        native_enabled: bool,
    ) -> Result<(Self, Vec<Pad>), SurfaceError> {
        if clips.len() > MAX_PADS {
            return Err(SurfaceError::TooManyPads {
                requested: clips.len(),
                max: MAX_PADS,
            });
        }

        let native = native.filter(|n| {
            let available = n.is_fast_path_available();
            if !available {
                log::info!("Native audio fast path not available on this platform");
            }
            available
        });

        let mut voices = Vec::with_capacity(clips.len());
        let mut pads = Vec::with_capacity(clips.len());
        for (i, clip) in clips.iter().enumerate() {
            let id = PadId(i);

            let native_handle = match native.as_deref() {
                Some(backend) => match backend.load(clip) {
                    Ok(handle) => Some(handle),
                    Err(err) => {
                        log::warn!("{id:?}: native load failed ({err}), using standard audio");
                        None
                    }
                },
                None => None,
            };

            let standard_handle = match standard.as_mut() {
                Some(backend) => Some(backend.load(clip)?),
                None => None,
            };

            voices.push(PadVoice {
                id,
                native: native_handle,
            });
            pads.push(Pad::new(id, standard_handle));
        }

        let trigger = Self {
            foreign: ForeignTrigger {
                native,
                voices: Arc::from(voices.into_boxed_slice()),
                native_enabled: Arc::new(AtomicBool::new(native_enabled)),
            },
            standard,
        };
        Ok((trigger, pads))
    }

    /// Handle to give to touch callbacks.
    pub fn foreign(&self) -> ForeignTrigger {
        self.foreign.clone()
    }

    /// Runtime switch between native and standard playback.
    pub fn set_native_enabled(&self, enabled: bool) {
        self.foreign.native_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn native_enabled(&self) -> bool {
        self.foreign.native_enabled.load(Ordering::Relaxed)
    }

    pub fn native_available(&self, pad: PadId) -> bool {
        self.foreign.native_available(pad)
    }

    /// Panic button: stop everything that is sounding. Returns false when
    /// there is no standard backend to send the request through.
    pub fn stop_all(&mut self) -> bool {
        match self.standard.as_mut() {
            Some(backend) => {
                backend.stop_all();
                true
            }
            None => false,
        }
    }

    /// Trigger `pad` according to the decision table.
    pub fn trigger(&mut self, pad: &Pad, context: CallContext) -> TriggerAction {
        if context == CallContext::Foreign {
            return self.foreign.trigger(pad.id());
        }

        let native = self.foreign.native_available(pad.id());
        match resolve_action(native, context) {
            TriggerAction::Native => self.foreign.trigger(pad.id()),
            TriggerAction::Standard => {
                match (self.standard.as_mut(), pad.standard_handle()) {
                    (Some(backend), Some(handle)) => {
                        backend.stop(handle);
                        backend.play(handle);
                    }
                    _ => log::debug!("{:?} has no playable audio", pad.id()),
                }
                TriggerAction::Standard
            }
            TriggerAction::Skip => TriggerAction::Skip,
        }
    }
}
