//! The pad surface: owner of pads, geometry and touch delivery.
//!
//! A [`Surface`] lives on the owning thread. It is the only writer of the
//! geometry index and the only holder of pad visuals and the standard audio
//! backend. Touch callbacks only ever see the [`ForeignDispatcher`] it hands
//! to the touch adapter.

use std::sync::Arc;

use crate::messages::{SampleBuffer, TouchSample};
use crate::pad_engine::audio_trigger::{
    AudioTrigger, CallContext, NativeAudio, StandardAudio, TriggerAction,
};
use crate::pad_engine::config::{DeliveryPolicy, SurfaceConfig};
use crate::pad_engine::dispatch::{ForeignDispatcher, locate};
use crate::pad_engine::errors::SurfaceError;
use crate::pad_engine::geometry::{
    GeometryIndex, GeometryIndexBuilder, Point, Resolution, ScreenInfo, SharedIndex,
    new_shared_index, resolve_resolution,
};
use crate::pad_engine::hit_test::hit_test;
use crate::pad_engine::layout::LayoutProvider;
use crate::pad_engine::pad::{Pad, PadId, PadVisual};
use crate::pad_engine::touch_source::{TouchAdapter, TouchSource};

/// Playback backends a surface is built with. Either may be missing.
#[derive(Default)]
pub struct AudioBackends {
    pub native: Option<Arc<dyn NativeAudio>>,
    pub standard: Option<Box<dyn StandardAudio>>,
}

/// Owning-thread coordinator of the pad grid.
pub struct Surface<L: LayoutProvider> {
    layout: L,
    screen_info: Box<dyn ScreenInfo>,
    screen: Resolution,
    index: SharedIndex,
    pads: Vec<Pad>,
    audio: AudioTrigger,
    dispatcher: ForeignDispatcher,
    touch: TouchAdapter,
}

impl<L: LayoutProvider> Surface<L> {
    /// Load one clip per pad, build the geometry index if the layout has
    /// settled, and start native touch if configured.
    pub fn new(
        config: &SurfaceConfig,
        layout: L,
        screen_info: Box<dyn ScreenInfo>,
        backends: AudioBackends,
        clips: &[SampleBuffer],
        touch_source: Box<dyn TouchSource>,
    ) -> Result<Self, SurfaceError> {
        if layout.pad_count() != clips.len() {
            return Err(SurfaceError::PadCountMismatch {
                layout: layout.pad_count(),
                clips: clips.len(),
            });
        }

        let (audio, pads) =
            AudioTrigger::load(backends.native, backends.standard, clips, config.native_audio)?;

        let screen = resolve_resolution(screen_info.as_ref());
        let index = new_shared_index(screen);
        let dispatcher = ForeignDispatcher::new(index.clone(), audio.foreign());
        let touch = TouchAdapter::new(touch_source, config.delivery_policy());

        let mut surface = Self {
            layout,
            screen_info,
            screen,
            index,
            pads,
            audio,
            dispatcher,
            touch,
        };

        if surface.layout.is_settled() {
            surface.rebuild_geometry()?;
        } else {
            log::info!("Layout not settled yet, call rebuild_geometry() once it is");
        }

        if config.native_touch {
            surface.set_native_touch(true);
        }

        log::info!(
            "Pad surface ready: {} pads, {}x{} screen, {:?} touch delivery",
            surface.pads.len(),
            surface.screen.width,
            surface.screen.height,
            surface.touch.policy()
        );
        Ok(surface)
    }

    /// Recompute every pad rectangle and publish the new index atomically.
    ///
    /// Call after the first layout pass and after every geometry change.
    /// Returns the number of indexed pads.
    pub fn rebuild_geometry(&mut self) -> Result<usize, SurfaceError> {
        if !self.layout.is_settled() {
            log::warn!("Geometry rebuild requested before layout settled; keeping previous index");
            return Err(SurfaceError::LayoutNotSettled);
        }

        let corners = self.layout.pad_corners();
        let index =
            GeometryIndexBuilder::rebuild(&corners, self.layout.canvas_size(), self.screen);
        let count = index.len();
        self.index.store(Arc::new(index));
        Ok(count)
    }

    /// Screen changed size or orientation: adopt `resolution` and rebuild.
    pub fn set_screen_resolution(&mut self, resolution: Resolution) -> Result<usize, SurfaceError> {
        self.screen = if resolution.width > 0 && resolution.height > 0 {
            resolution
        } else {
            resolve_resolution(self.screen_info.as_ref())
        };
        self.rebuild_geometry()
    }

    /// Re-query the screen info provider (after a rotation event) and rebuild.
    pub fn refresh_screen(&mut self) -> Result<usize, SurfaceError> {
        self.screen = resolve_resolution(self.screen_info.as_ref());
        self.rebuild_geometry()
    }

    /// Turn native touch delivery on or off. Returns whether it is now active;
    /// on platforms without native touch this is always false and pads keep
    /// triggering from UI input.
    pub fn set_native_touch(&mut self, enabled: bool) -> bool {
        if enabled {
            self.touch.start(&self.dispatcher)
        } else {
            self.touch.stop();
            false
        }
    }

    /// Whether native touch currently drives triggering.
    pub fn native_touch_active(&self) -> bool {
        self.touch.is_running()
    }

    pub fn set_native_audio(&mut self, enabled: bool) {
        self.audio.set_native_enabled(enabled);
    }

    pub fn native_audio_enabled(&self) -> bool {
        self.audio.native_enabled()
    }

    /// UI pointer-down on `pad`.
    ///
    /// Always updates the visual. Triggers audio only when native touch is
    /// not active; otherwise the touch path already did, and triggering here
    /// would play the pad twice.
    pub fn press(&mut self, pad: PadId) -> Result<Option<TriggerAction>, SurfaceError> {
        let state = self.pads.get_mut(pad.0).ok_or(SurfaceError::UnknownPad(pad))?;
        state.press();

        if self.touch.is_running() {
            return Ok(None);
        }
        Ok(Some(self.audio.trigger(state, CallContext::Owning)))
    }

    /// Stop every sounding pad. Returns false without a standard backend.
    pub fn stop_all(&mut self) -> bool {
        self.audio.stop_all()
    }

    /// UI pointer-up on `pad`.
    pub fn release(&mut self, pad: PadId) -> Result<(), SurfaceError> {
        self.pads
            .get_mut(pad.0)
            .ok_or(SurfaceError::UnknownPad(pad))?
            .release();
        Ok(())
    }

    /// Drain the pull-mode touch buffer and trigger every pad hit by a
    /// touch-down. Call once per update; a no-op in push mode.
    pub fn poll_touches(&mut self) -> Vec<(PadId, TriggerAction)> {
        let mut fired = Vec::new();
        if self.touch.policy() != DeliveryPolicy::Pull {
            return fired;
        }

        let index = self.index.load_full();
        let audio = &mut self.audio;
        let pads = &self.pads;
        self.touch.poll(&mut |sample| {
            if let Some(pad) = locate(&index, &sample).and_then(|id| pads.get(id.0)) {
                fired.push((pad.id(), audio.trigger(pad, CallContext::Owning)));
            }
        });
        fired
    }

    /// Pad under `point`, in index space (origin bottom-left).
    pub fn hit_test(&self, point: Point) -> Option<PadId> {
        hit_test(&self.index.load(), point)
    }

    /// Pad a raw touch-down would land on, in touch-source coordinates.
    pub fn locate_touch(&self, sample: &TouchSample) -> Option<PadId> {
        locate(&self.index.load(), sample)
    }

    pub fn pad_visual(&self, pad: PadId) -> Option<PadVisual> {
        self.pads.get(pad.0).map(Pad::visual)
    }

    pub fn pad_count(&self) -> usize {
        self.pads.len()
    }

    pub fn screen(&self) -> Resolution {
        self.screen
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        self.touch.policy()
    }

    /// Current geometry snapshot.
    pub fn geometry(&self) -> Arc<GeometryIndex> {
        self.index.load_full()
    }

    /// Entry point for touch callbacks registered outside the adapter.
    pub fn dispatcher(&self) -> ForeignDispatcher {
        self.dispatcher.clone()
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Mutable access to the layout. Call [`Surface::rebuild_geometry`]
    /// after changing it.
    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::pad_engine::audio_trigger::test_support::{
        RecordingNative, RecordingStandard, StandardCall, clips,
    };
    use crate::pad_engine::config::DeploymentTarget;
    use crate::pad_engine::geometry::{CanvasSize, FixedScreen};
    use crate::pad_engine::layout::GridLayout;
    use crate::pad_engine::touch_source::{TouchInjector, VirtualTouchSource};

    struct Rig {
        surface: Surface<GridLayout>,
        injector: TouchInjector,
        native: Arc<RecordingNative>,
        standard: RecordingStandard,
    }

    fn rig(config: SurfaceConfig, native: RecordingNative, screen: Resolution) -> Rig {
        let native = Arc::new(native);
        let standard = RecordingStandard::default();
        let source = VirtualTouchSource::new(config.touch_ring_capacity);
        let injector = source.injector();
        let surface = Surface::new(
            &config,
            GridLayout::new(2, 2, CanvasSize::new(1000.0, 1000.0)),
            Box::new(FixedScreen(Some(screen))),
            AudioBackends {
                native: Some(native.clone()),
                standard: Some(Box::new(standard.clone())),
            },
            &clips(4),
            Box::new(source),
        )
        .unwrap();
        Rig {
            surface,
            injector,
            native,
            standard,
        }
    }

    fn square_rig(config: SurfaceConfig) -> Rig {
        rig(config, RecordingNative::default(), Resolution::new(1000, 1000))
    }

    #[test]
    fn test_two_by_two_grid_scenario() {
        let rig = square_rig(SurfaceConfig::default());

        assert_eq!(rig.surface.hit_test(Point::new(250.0, 250.0)), Some(PadId(0)));
        assert_eq!(rig.surface.hit_test(Point::new(750.0, 750.0)), Some(PadId(3)));
        assert_eq!(rig.surface.hit_test(Point::new(500.0, 500.0)), Some(PadId(3)));
        assert_eq!(rig.surface.hit_test(Point::new(1000.0, 1000.0)), None);
    }

    #[test]
    fn test_push_touch_triggers_native_audio() {
        let rig = square_rig(SurfaceConfig::default());
        assert!(rig.surface.native_touch_active());

        // Raw y=100 from the top is index y=900: the top-left pad (2).
        assert!(rig.injector.inject(TouchSample::began(100.0, 100.0)));

        assert_eq!(
            *rig.native.played.lock().unwrap(),
            vec![crate::pad_engine::audio_trigger::NativeSampleHandle(2)]
        );
        assert!(rig.standard.calls.borrow().is_empty());
    }

    #[test]
    fn test_push_touch_without_native_audio_is_silent() {
        let rig = rig(
            SurfaceConfig::default(),
            RecordingNative {
                unavailable: true,
                ..Default::default()
            },
            Resolution::new(1000, 1000),
        );

        rig.injector.inject(TouchSample::began(100.0, 100.0));

        assert!(rig.native.played.lock().unwrap().is_empty());
        assert!(rig.standard.calls.borrow().is_empty());
    }

    #[test]
    fn test_ui_press_defers_to_native_touch() {
        let mut rig = square_rig(SurfaceConfig::default());

        assert_eq!(rig.surface.press(PadId(1)).unwrap(), None);
        assert_eq!(rig.surface.pad_visual(PadId(1)), Some(PadVisual::Pressed));
        assert!(rig.native.played.lock().unwrap().is_empty());

        rig.surface.release(PadId(1)).unwrap();
        assert_eq!(rig.surface.pad_visual(PadId(1)), Some(PadVisual::Idle));
    }

    #[test]
    fn test_ui_press_triggers_when_native_touch_off() {
        let mut rig = square_rig(SurfaceConfig::default());
        rig.surface.set_native_touch(false);
        rig.surface.set_native_audio(false);

        assert_eq!(
            rig.surface.press(PadId(1)).unwrap(),
            Some(TriggerAction::Standard)
        );
        assert_eq!(
            *rig.standard.calls.borrow(),
            vec![
                StandardCall::Stop(crate::pad_engine::audio_trigger::StandardSampleHandle(1)),
                StandardCall::Play(crate::pad_engine::audio_trigger::StandardSampleHandle(1)),
            ]
        );

        // Stopped delivery no longer reaches the dispatcher.
        assert!(!rig.injector.inject(TouchSample::began(100.0, 100.0)));
    }

    #[test]
    fn test_stop_all_after_native_touch() {
        let mut rig = square_rig(SurfaceConfig::default());
        rig.injector.inject(TouchSample::began(100.0, 100.0));

        assert!(rig.surface.stop_all());
        assert_eq!(*rig.standard.calls.borrow(), vec![StandardCall::StopAll]);
    }

    #[test]
    fn test_ui_press_on_unsupported_touch_platform() {
        let config = SurfaceConfig::default();
        let surface = Surface::new(
            &config,
            GridLayout::new(2, 2, CanvasSize::new(1000.0, 1000.0)),
            Box::new(FixedScreen(Some(Resolution::new(1000, 1000)))),
            AudioBackends {
                native: Some(Arc::new(RecordingNative::default())),
                standard: None,
            },
            &clips(4),
            Box::new(VirtualTouchSource::unsupported()),
        );
        let mut surface = surface.unwrap();

        assert!(!surface.native_touch_active());
        assert_eq!(surface.press(PadId(0)).unwrap(), Some(TriggerAction::Native));
    }

    #[test]
    fn test_pull_mode_triggers_on_poll() {
        let mut rig = square_rig(SurfaceConfig::for_target(DeploymentTarget::aot_android()));
        rig.surface.set_native_audio(false);

        rig.injector.inject(TouchSample::began(900.0, 900.0));
        rig.injector.inject(TouchSample::new(900.0, 900.0, crate::messages::TouchPhase::Ended));
        assert!(rig.standard.calls.borrow().is_empty());

        let fired = rig.surface.poll_touches();

        // Raw (900, 900) flips to (900, 100): bottom-right pad (1), owning context.
        assert_eq!(fired, vec![(PadId(1), TriggerAction::Standard)]);
        assert_eq!(rig.standard.calls.borrow().len(), 2);
        assert!(rig.surface.poll_touches().is_empty());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut rig = square_rig(SurfaceConfig::default());
        let before = rig.surface.geometry();

        rig.surface.rebuild_geometry().unwrap();
        let after = rig.surface.geometry();

        assert_eq!(*before, *after);
        for y in (0..1000).step_by(50) {
            for x in (0..1000).step_by(50) {
                let point = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                assert_eq!(hit_test(&before, point), hit_test(&after, point));
            }
        }
    }

    #[test]
    fn test_rotation_changes_mapping() {
        let mut rig = rig(
            SurfaceConfig::default(),
            RecordingNative::default(),
            Resolution::new(1000, 2000),
        );
        let point = Point::new(1200.0, 700.0);
        assert_eq!(rig.surface.hit_test(point), None);
        assert_eq!(rig.surface.hit_test(Point::new(750.0, 1500.0)), Some(PadId(3)));

        let rotated = rig.surface.screen().rotated();
        rig.surface.set_screen_resolution(rotated).unwrap();

        assert_eq!(rig.surface.screen(), Resolution::new(2000, 1000));
        assert_eq!(rig.surface.hit_test(point), Some(PadId(3)));
        assert_eq!(rig.surface.hit_test(Point::new(750.0, 1500.0)), None);
    }

    #[test]
    fn test_zero_resolution_requeries_screen_info() {
        let mut rig = rig(
            SurfaceConfig::default(),
            RecordingNative::default(),
            Resolution::new(1000, 2000),
        );
        assert!(rig.surface.native_audio_enabled());

        rig.surface.set_screen_resolution(Resolution::new(0, 0)).unwrap();
        assert_eq!(rig.surface.screen(), Resolution::new(1000, 2000));

        rig.surface.set_screen_resolution(Resolution::new(500, 500)).unwrap();
        assert_eq!(rig.surface.refresh_screen().unwrap(), 4);
        assert_eq!(rig.surface.screen(), Resolution::new(1000, 2000));
    }

    #[test]
    fn test_unsettled_layout_defers_geometry() {
        let config = SurfaceConfig {
            native_touch: false,
            ..SurfaceConfig::default()
        };
        let mut surface = Surface::new(
            &config,
            GridLayout::unsettled(2, 2, CanvasSize::new(1000.0, 1000.0)),
            Box::new(FixedScreen(None)),
            AudioBackends::default(),
            &clips(4),
            Box::new(VirtualTouchSource::new(4)),
        )
        .unwrap();

        assert!(surface.geometry().is_empty());
        assert!(matches!(
            surface.rebuild_geometry(),
            Err(SurfaceError::LayoutNotSettled)
        ));

        surface.layout_mut().mark_settled();
        assert_eq!(surface.rebuild_geometry().unwrap(), 4);
        // No native resolution: 1x1 fallback screen.
        assert_eq!(surface.screen(), Resolution::new(1, 1));
        assert_eq!(surface.hit_test(Point::new(0.75, 0.75)), Some(PadId(3)));
    }

    #[test]
    fn test_pad_count_mismatch() {
        let result = Surface::new(
            &SurfaceConfig::default(),
            GridLayout::new(2, 2, CanvasSize::new(10.0, 10.0)),
            Box::new(FixedScreen(None)),
            AudioBackends::default(),
            &clips(3),
            Box::new(VirtualTouchSource::new(4)),
        );
        assert!(matches!(
            result,
            Err(SurfaceError::PadCountMismatch { layout: 4, clips: 3 })
        ));
    }

    #[test]
    fn test_unknown_pad() {
        let mut rig = square_rig(SurfaceConfig::default());
        assert!(matches!(
            rig.surface.press(PadId(9)),
            Err(SurfaceError::UnknownPad(PadId(9)))
        ));
    }

    #[test]
    fn test_readers_never_see_partial_index() {
        let mut rig = rig(
            SurfaceConfig::default(),
            RecordingNative::default(),
            Resolution::new(1000, 2000),
        );
        let shared = rig.surface.index.clone();
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let done = done.clone();
            std::thread::spawn(move || {
                let mut reads = 0usize;
                while !done.load(Ordering::Acquire) || reads == 0 {
                    let snapshot = shared.load();
                    assert_eq!(snapshot.len(), 4);
                    // Every rectangle agrees with the screen it was built for.
                    let last = snapshot.rect_of(PadId(3)).unwrap();
                    assert_eq!(last.x_max, snapshot.screen().width as f32);
                    assert_eq!(last.y_max, snapshot.screen().height as f32);
                    reads += 1;
                }
                reads
            })
        };

        for _ in 0..200 {
            let rotated = rig.surface.screen().rotated();
            rig.surface.set_screen_resolution(rotated).unwrap();
        }
        done.store(true, Ordering::Release);

        assert!(reader.join().unwrap() > 0);
    }
}
