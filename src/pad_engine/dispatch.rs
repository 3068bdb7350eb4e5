//! Touch-to-pad dispatch.
//!
//! [`ForeignDispatcher`] is the only thing a touch callback thread ever
//! calls. It reads the current geometry snapshot, hit-tests, and fires the
//! pad through a [`ForeignTrigger`]. It holds no pad visuals and no standard
//! audio backend, so it cannot touch either.

use crate::messages::{TouchPhase, TouchSample};
use crate::pad_engine::audio_trigger::{ForeignTrigger, TriggerAction};
use crate::pad_engine::geometry::{GeometryIndex, Point, SharedIndex};
use crate::pad_engine::hit_test::hit_test;
use crate::pad_engine::pad::PadId;

/// Convert a raw touch into index space.
///
/// Touch sources report Y growing downwards from the top edge; the index has
/// Y growing upwards from the bottom edge.
#[inline]
pub fn to_index_space(sample: &TouchSample, screen_height: f32) -> Point {
    Point::new(sample.x, screen_height - sample.y)
}

/// Pad hit by a touch-down, if any. Other phases never hit.
#[inline]
pub fn locate(index: &GeometryIndex, sample: &TouchSample) -> Option<PadId> {
    if sample.phase != TouchPhase::Began {
        return None;
    }
    hit_test(index, to_index_space(sample, index.screen_height()))
}

/// Entry point for touch callbacks running off the owning thread.
#[derive(Clone)]
pub struct ForeignDispatcher {
    index: SharedIndex,
    trigger: ForeignTrigger,
}

impl ForeignDispatcher {
    pub fn new(index: SharedIndex, trigger: ForeignTrigger) -> Self {
        Self { index, trigger }
    }

    /// Hit-test `sample` and trigger the pad it lands on.
    ///
    /// Lock-free and allocation-free; the snapshot loaded here stays valid
    /// even if the owning thread publishes a new index meanwhile.
    pub fn on_touch(&self, sample: TouchSample) -> Option<(PadId, TriggerAction)> {
        if sample.phase != TouchPhase::Began {
            return None;
        }
        let index = self.index.load();
        let pad = locate(&index, &sample)?;
        Some((pad, self.trigger.trigger(pad)))
    }
}
