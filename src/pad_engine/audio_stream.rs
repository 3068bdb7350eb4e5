//! cpal audio backend.
//!
//! One output stream renders an [`RtMixer`]. Two ways into it:
//!
//! - the standard path pushes [`ControlMessage`]s through an `rtrb` ring
//!   guarded by a mutex; it belongs to the owning thread;
//! - the native fast path bumps one `AtomicU32` trigger counter per sample
//!   slot, which the callback takes back at the start of each block. A bump
//!   never blocks or allocates, so any thread may do it, and two taps within
//!   one block still start two voices.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Stream, StreamConfig};
use env_logger::{Builder, Env};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::messages::{ControlMessage, SampleBuffer};
use crate::pad_engine::audio_trigger::{
    NativeAudio, NativeSampleHandle, StandardAudio, StandardSampleHandle,
};
use crate::pad_engine::constants::{
    CONTROL_RING_CAPACITY, NUM_SAMPLES, OUTPUT_BLOCK_FRAMES, TRIGGER_VOLUME,
};
use crate::pad_engine::errors::AudioError;
use crate::pad_engine::mixer::RtMixer;

/// Setup and configure the logger.
pub fn setup_logger() {
    // `RUST_LOG=debug` shows the computed pad rectangles.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(()); // Ignore initialization errors
}

/// State shared between the owning thread, the fast path and the callback.
struct BackendShared {
    producer: Mutex<Producer<ControlMessage>>,
    /// Fast-path triggers per slot not yet started by the callback.
    pending: Box<[AtomicU32]>,
    next_slot: AtomicUsize,
    output_channels: usize,
}

impl BackendShared {
    /// Claim a slot for `clip` and publish it to the audio thread.
    fn publish(&self, clip: &SampleBuffer) -> Result<usize, AudioError> {
        if clip.channels != self.output_channels {
            return Err(AudioError::ChannelMismatch {
                clip: clip.channels,
                output: self.output_channels,
            });
        }

        let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
        if slot >= NUM_SAMPLES {
            return Err(AudioError::SlotsExhausted {
                capacity: NUM_SAMPLES,
            });
        }

        self.send(ControlMessage::LoadSample {
            slot,
            sample: clip.clone(),
        })?;
        Ok(slot)
    }

    fn send(&self, message: ControlMessage) -> Result<(), AudioError> {
        let label = match &message {
            ControlMessage::LoadSample { .. } => "LoadSample",
            ControlMessage::PlaySample { .. } => "PlaySample",
            ControlMessage::StopSample { .. } => "StopSample",
            ControlMessage::StopAll => "StopAll",
        };
        let mut producer = self
            .producer
            .lock()
            .map_err(|_| AudioError::Stream("control producer lock poisoned".to_string()))?;
        producer
            .push(message)
            .map_err(|_| AudioError::ControlBufferFull(label))
    }
}

/// Native fast path of the cpal backend.
pub struct CpalFastPath {
    shared: Arc<BackendShared>,
}

impl NativeAudio for CpalFastPath {
    fn is_fast_path_available(&self) -> bool {
        true
    }

    fn load(&self, clip: &SampleBuffer) -> Result<NativeSampleHandle, AudioError> {
        self.shared.publish(clip).map(NativeSampleHandle)
    }

    fn play(&self, handle: NativeSampleHandle) {
        if let Some(count) = self.shared.pending.get(handle.0) {
            count.fetch_add(1, Ordering::Release);
        }
    }
}

/// Output stream plus the standard playback path.
pub struct CpalAudio {
    /// Dropping the stream stops playback.
    _stream: Stream,
    shared: Arc<BackendShared>,
    output_sample_rate: u32,
}

impl CpalAudio {
    /// Open the default output device and start rendering.
    pub fn open() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        let sample_rate = config.sample_rate();
        let channels = config.channels();

        log::info!("Opening pad audio output ({} ch@{} Hz)", channels, sample_rate);

        let (producer, mut consumer) = RingBuffer::new(CONTROL_RING_CAPACITY);
        let shared = Arc::new(BackendShared {
            producer: Mutex::new(producer),
            pending: (0..NUM_SAMPLES).map(|_| AtomicU32::new(0)).collect(),
            next_slot: AtomicUsize::new(0),
            output_channels: channels as usize,
        });

        let mut mixer = RtMixer::new(channels as usize);
        let callback_shared = shared.clone();

        let stream_config = StreamConfig {
            channels,
            sample_rate,
            buffer_size: BufferSize::Fixed(OUTPUT_BLOCK_FRAMES),
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render_block(&mut consumer, &callback_shared, &mut mixer, data);
                },
                |err| {
                    log::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            shared,
            output_sample_rate: sample_rate,
        })
    }

    /// Fast-path handle to hand to touch callbacks.
    pub fn fast_path(&self) -> Arc<CpalFastPath> {
        Arc::new(CpalFastPath {
            shared: self.shared.clone(),
        })
    }

    pub fn output_channels(&self) -> usize {
        self.shared.output_channels
    }

    pub fn output_sample_rate(&self) -> u32 {
        self.output_sample_rate
    }

}

/// One audio callback: apply control messages, start fast-path triggers,
/// then mix into `data`.
fn render_block(
    consumer: &mut Consumer<ControlMessage>,
    shared: &BackendShared,
    mixer: &mut RtMixer,
    data: &mut [f32],
) {
    // Loads first, so a trigger for a freshly loaded slot finds it.
    while let Ok(message) = consumer.pop() {
        match message {
            ControlMessage::LoadSample { slot, sample } => {
                mixer.load_sample(slot, sample);
            }
            ControlMessage::PlaySample { slot, volume } => {
                mixer.play_sample(slot, volume);
            }
            ControlMessage::StopSample { slot } => {
                mixer.stop_sample(slot);
            }
            ControlMessage::StopAll => {
                mixer.stop_all();
            }
        }
    }

    for (slot, count) in shared.pending.iter().enumerate() {
        for _ in 0..count.swap(0, Ordering::Acquire) {
            mixer.play_sample(slot, TRIGGER_VOLUME);
        }
    }

    mixer.render(data);
}

impl StandardAudio for CpalAudio {
    fn load(&mut self, clip: &SampleBuffer) -> Result<StandardSampleHandle, AudioError> {
        self.shared.publish(clip).map(StandardSampleHandle)
    }

    fn stop(&mut self, handle: StandardSampleHandle) {
        if let Err(err) = self.shared.send(ControlMessage::StopSample { slot: handle.0 }) {
            log::warn!("Failed to stop slot {}: {err}", handle.0);
        }
    }

    fn play(&mut self, handle: StandardSampleHandle) {
        let message = ControlMessage::PlaySample {
            slot: handle.0,
            volume: TRIGGER_VOLUME,
        };
        if let Err(err) = self.shared.send(message) {
            log::warn!("Failed to play slot {}: {err}", handle.0);
        }
    }

    fn stop_all(&mut self) {
        if let Err(err) = self.shared.send(ControlMessage::StopAll) {
            log::warn!("Failed to stop all pads: {err}");
        }
    }
}
