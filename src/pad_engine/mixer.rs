//! Real-time one-shot mixer.
//!
//! [`RtMixer`] lives inside the audio callback. It owns a bank of loaded
//! clips and a fixed pool of voices; nothing in here allocates or locks, so
//! every method is safe to call from the real-time thread.

use cpal::Sample;

use crate::messages::SampleBuffer;
use crate::pad_engine::constants::{MAX_VOICES, NUM_SAMPLES, VOLUME_MAX, VOLUME_MIN};

struct VoiceSlot {
    active: bool,
    slot: usize,
    sample: Option<SampleBuffer>,
    frame_pos: usize,
    volume: f32,
}

impl VoiceSlot {
    fn idle() -> Self {
        Self {
            active: false,
            slot: 0,
            sample: None,
            frame_pos: 0,
            volume: 0.0,
        }
    }

    fn start(&mut self, slot: usize, sample: SampleBuffer, volume: f32) {
        self.active = true;
        self.slot = slot;
        self.sample = Some(sample);
        self.frame_pos = 0;
        self.volume = volume;
    }

    fn stop(&mut self) {
        self.active = false;
        self.sample = None;
        self.frame_pos = 0;
        self.volume = 0.0;
    }

    fn is_playing_slot(&self, slot: usize) -> bool {
        self.active && self.slot == slot
    }
}

/// Mixer for pad one-shots.
pub struct RtMixer {
    /// Number of output channels (1 for mono, 2 for stereo).
    channels: usize,

    /// Sample storage with NUM_SAMPLES slots.
    sample_bank: [Option<SampleBuffer>; NUM_SAMPLES],

    /// Voice pool; a trigger with no free voice is dropped.
    voices: [VoiceSlot; MAX_VOICES],
}

impl RtMixer {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            sample_bank: std::array::from_fn(|_| None),
            voices: std::array::from_fn(|_| VoiceSlot::idle()),
        }
    }

    /// Store a clip in `slot`. Clips with a different channel count than the
    /// output, and out-of-range slots, are ignored.
    pub fn load_sample(&mut self, slot: usize, sample: SampleBuffer) {
        if slot >= NUM_SAMPLES || sample.channels != self.channels {
            return;
        }
        self.sample_bank[slot] = Some(sample);
    }

    /// Start a new voice for `slot`.
    pub fn play_sample(&mut self, slot: usize, volume: f32) {
        if slot >= NUM_SAMPLES {
            return;
        }
        if !volume.is_finite() || !(VOLUME_MIN..=VOLUME_MAX).contains(&volume) {
            return;
        }
        let Some(sample) = self.sample_bank[slot].as_ref() else {
            return;
        };

        if let Some(voice) = self.voices.iter_mut().find(|v| !v.active) {
            voice.start(slot, sample.clone(), volume);
        }
    }

    /// Stop every voice playing `slot`.
    pub fn stop_sample(&mut self, slot: usize) {
        for voice in &mut self.voices {
            if voice.is_playing_slot(slot) {
                voice.stop();
            }
        }
    }

    pub fn stop_all(&mut self) {
        for voice in &mut self.voices {
            voice.stop();
        }
    }

    /// Mix every active voice into `output` (interleaved, `channels` wide).
    /// Voices stop when their clip ends.
    pub fn render(&mut self, output: &mut [f32]) {
        output.fill(Sample::EQUILIBRIUM);

        if self.channels == 0 {
            return;
        }
        let frames = output.len() / self.channels;

        for voice in &mut self.voices {
            if !voice.active {
                continue;
            }
            let Some(sample) = voice.sample.as_ref() else {
                voice.stop();
                continue;
            };

            let remaining = sample.frames().saturating_sub(voice.frame_pos);
            let count = remaining.min(frames);
            let start = voice.frame_pos * self.channels;
            let source = &sample.samples[start..start + count * self.channels];

            for (out, src) in output.iter_mut().zip(source) {
                *out += src * voice.volume;
            }

            voice.frame_pos += count;
            if voice.frame_pos >= sample.frames() {
                voice.stop();
            }
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }
}
