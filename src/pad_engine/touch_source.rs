//! Touch source capability and the adapter driving it.
//!
//! A [`TouchSource`] delivers [`TouchSample`]s either by calling registered
//! callbacks on whatever thread produced them (push) or by queueing them in a
//! bounded ring buffer the owning thread drains (pull). [`TouchAdapter`]
//! wires a source to the dispatcher according to the configured
//! [`DeliveryPolicy`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::messages::TouchSample;
use crate::pad_engine::config::DeliveryPolicy;
use crate::pad_engine::dispatch::ForeignDispatcher;

/// Callback invoked by a touch source, possibly off the owning thread.
pub type TouchCallback = Arc<dyn Fn(TouchSample) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOptions {
    /// Deliver through callbacks instead of the ring buffer.
    pub push_mode: bool,
}

/// Platform touch input.
pub trait TouchSource {
    /// False when the platform has no native touch input.
    fn is_supported(&self) -> bool;

    fn start(&mut self, options: StartOptions);

    /// Stop delivery. When this returns no callback is running and none
    /// will run until the next `start`.
    fn stop(&mut self);

    fn register_callback(&mut self, callback: TouchCallback);

    fn clear_callbacks(&mut self);

    /// Hand every queued sample to `sink`, oldest first. Returns how many
    /// were delivered. Only meaningful in pull mode.
    fn drain(&mut self, sink: &mut dyn FnMut(TouchSample)) -> usize;
}

struct SourceShared {
    running: AtomicBool,
    push_mode: AtomicBool,
    callbacks: Mutex<Vec<TouchCallback>>,
    ring: Mutex<Producer<TouchSample>>,
    dropped: AtomicUsize,
}

/// Touch source fed by the host through [`TouchInjector`]s.
///
/// This is the source used when touch events arrive from outside Rust (an OS
/// input thread, a Python host, a test). In push mode callbacks run on the
/// injecting thread.
pub struct VirtualTouchSource {
    shared: Arc<SourceShared>,
    consumer: Consumer<TouchSample>,
    supported: bool,
}

impl VirtualTouchSource {
    pub fn new(ring_capacity: usize) -> Self {
        let (producer, consumer) = RingBuffer::new(ring_capacity.max(1));
        Self {
            shared: Arc::new(SourceShared {
                running: AtomicBool::new(false),
                push_mode: AtomicBool::new(true),
                callbacks: Mutex::new(Vec::new()),
                ring: Mutex::new(producer),
                dropped: AtomicUsize::new(0),
            }),
            consumer,
            supported: true,
        }
    }

    /// A source standing in for a platform without native touch.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new(1)
        }
    }

    pub fn injector(&self) -> TouchInjector {
        TouchInjector {
            shared: self.shared.clone(),
        }
    }

    fn callbacks(&self) -> std::sync::MutexGuard<'_, Vec<TouchCallback>> {
        // A panicking callback poisons the lock; the list itself is intact.
        self.shared
            .callbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TouchSource for VirtualTouchSource {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(&mut self, options: StartOptions) {
        if !self.supported {
            return;
        }
        // Samples queued during a previous run are stale.
        while self.consumer.pop().is_ok() {}
        self.shared
            .push_mode
            .store(options.push_mode, Ordering::Release);
        self.shared.running.store(true, Ordering::Release);
    }

    fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        // Wait out any callback currently running on an injecting thread.
        drop(self.callbacks());
    }

    fn register_callback(&mut self, callback: TouchCallback) {
        self.callbacks().push(callback);
    }

    fn clear_callbacks(&mut self) {
        self.callbacks().clear();
    }

    fn drain(&mut self, sink: &mut dyn FnMut(TouchSample)) -> usize {
        let mut delivered = 0;
        while let Ok(sample) = self.consumer.pop() {
            sink(sample);
            delivered += 1;
        }
        delivered
    }
}

/// Thread-safe handle feeding samples into a [`VirtualTouchSource`].
#[derive(Clone)]
pub struct TouchInjector {
    shared: Arc<SourceShared>,
}

impl TouchInjector {
    /// Deliver one sample. Returns false when the source is stopped or the
    /// pull-mode buffer is full.
    ///
    /// Callbacks must not inject themselves.
    pub fn inject(&self, sample: TouchSample) -> bool {
        if !self.shared.running.load(Ordering::Acquire) {
            return false;
        }

        if self.shared.push_mode.load(Ordering::Acquire) {
            let callbacks = match self.shared.callbacks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            // Re-check under the lock so a concurrent stop() wins.
            if !self.shared.running.load(Ordering::Acquire) {
                return false;
            }
            for callback in callbacks.iter() {
                callback(sample);
            }
            return true;
        }

        let pushed = match self.shared.ring.lock() {
            Ok(mut producer) => producer.push(sample).is_ok(),
            Err(_) => false,
        };
        if !pushed {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
        }
        pushed
    }

    /// Samples lost because the pull-mode buffer was full.
    pub fn dropped(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

/// Connects a [`TouchSource`] to the dispatcher under a fixed policy.
pub struct TouchAdapter {
    source: Box<dyn TouchSource>,
    policy: DeliveryPolicy,
    running: bool,
}

impl TouchAdapter {
    pub fn new(source: Box<dyn TouchSource>, policy: DeliveryPolicy) -> Self {
        Self {
            source,
            policy,
            running: false,
        }
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    pub fn is_supported(&self) -> bool {
        self.source.is_supported()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start delivery. Returns false when the platform has no native touch.
    ///
    /// Previously registered callbacks are always cleared first, so calling
    /// this twice never delivers a sample twice.
    pub fn start(&mut self, dispatcher: &ForeignDispatcher) -> bool {
        if !self.source.is_supported() {
            log::info!("Native touch not supported, pads stay on UI input");
            return false;
        }

        self.source.clear_callbacks();
        let push_mode = self.policy == DeliveryPolicy::Push;
        if push_mode {
            let dispatcher = dispatcher.clone();
            self.source.register_callback(Arc::new(move |sample| {
                dispatcher.on_touch(sample);
            }));
        }
        self.source.start(StartOptions { push_mode });
        self.running = true;
        log::info!("Native touch started ({:?} delivery)", self.policy);
        true
    }

    /// Stop delivery and unregister callbacks before returning.
    pub fn stop(&mut self) {
        self.source.stop();
        self.source.clear_callbacks();
        if self.running {
            log::info!("Native touch stopped");
        }
        self.running = false;
    }

    /// Drain queued samples into `sink`. Does nothing unless running in pull
    /// mode.
    pub fn poll(&mut self, sink: &mut dyn FnMut(TouchSample)) -> usize {
        if !self.running || self.policy != DeliveryPolicy::Pull {
            return 0;
        }
        self.source.drain(sink)
    }
}

impl Drop for TouchAdapter {
    fn drop(&mut self) {
        if self.running {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pad_engine::audio_trigger::AudioTrigger;
    use crate::pad_engine::audio_trigger::test_support::{RecordingNative, clips};
    use crate::pad_engine::geometry::{
        GeometryIndex, IndexEntry, Resolution, ScreenRect, new_shared_index,
    };
    use crate::pad_engine::pad::PadId;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> TouchCallback {
        let counter = counter.clone();
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn full_screen_dispatcher(native: Arc<RecordingNative>) -> ForeignDispatcher {
        let (trigger, _pads) = AudioTrigger::load(Some(native), None, &clips(1), true).unwrap();
        let index = new_shared_index(Resolution::new(100, 100));
        index.store(Arc::new(GeometryIndex::from_entries(
            vec![IndexEntry {
                rect: ScreenRect::from_origin_size(0.0, 0.0, 100.0, 100.0),
                pad: PadId(0),
            }],
            Resolution::new(100, 100),
        )));
        ForeignDispatcher::new(index, trigger.foreign())
    }

    #[test]
    fn test_push_mode_invokes_callbacks() {
        let mut source = VirtualTouchSource::new(8);
        let injector = source.injector();
        let counter = Arc::new(AtomicUsize::new(0));

        source.register_callback(counting_callback(&counter));
        source.start(StartOptions { push_mode: true });

        assert!(injector.inject(TouchSample::began(1.0, 1.0)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(source.drain(&mut |_| {}), 0);
    }

    #[test]
    fn test_stopped_source_rejects_samples() {
        let mut source = VirtualTouchSource::new(8);
        let injector = source.injector();
        let counter = Arc::new(AtomicUsize::new(0));
        source.register_callback(counting_callback(&counter));

        assert!(!injector.inject(TouchSample::began(1.0, 1.0)));

        source.start(StartOptions { push_mode: true });
        source.stop();
        assert!(!injector.inject(TouchSample::began(1.0, 1.0)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pull_mode_buffers_and_drops_when_full() {
        let mut source = VirtualTouchSource::new(2);
        let injector = source.injector();
        source.start(StartOptions { push_mode: false });

        assert!(injector.inject(TouchSample::began(1.0, 1.0)));
        assert!(injector.inject(TouchSample::began(2.0, 2.0)));
        assert!(!injector.inject(TouchSample::began(3.0, 3.0)));
        assert_eq!(injector.dropped(), 1);

        let mut seen = Vec::new();
        assert_eq!(source.drain(&mut |s| seen.push(s.x)), 2);
        assert_eq!(seen, vec![1.0, 2.0]);
    }

    #[test]
    fn test_restart_discards_stale_samples() {
        let mut source = VirtualTouchSource::new(4);
        let injector = source.injector();
        source.start(StartOptions { push_mode: false });
        injector.inject(TouchSample::began(1.0, 1.0));

        source.stop();
        source.start(StartOptions { push_mode: false });

        assert_eq!(source.drain(&mut |_| {}), 0);
    }

    #[test]
    fn test_adapter_restart_does_not_duplicate_delivery() {
        let native = Arc::new(RecordingNative::default());
        let dispatcher = full_screen_dispatcher(native.clone());
        let source = VirtualTouchSource::new(8);
        let injector = source.injector();
        let mut adapter = TouchAdapter::new(Box::new(source), DeliveryPolicy::Push);

        assert!(adapter.start(&dispatcher));
        assert!(adapter.start(&dispatcher));
        injector.inject(TouchSample::began(50.0, 50.0));

        assert_eq!(native.played.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_adapter_stop_unregisters_before_returning() {
        let native = Arc::new(RecordingNative::default());
        let dispatcher = full_screen_dispatcher(native.clone());
        let source = VirtualTouchSource::new(8);
        let injector = source.injector();
        let mut adapter = TouchAdapter::new(Box::new(source), DeliveryPolicy::Push);

        adapter.start(&dispatcher);
        adapter.stop();

        assert!(!adapter.is_running());
        assert!(!injector.inject(TouchSample::began(50.0, 50.0)));
        assert!(native.played.lock().unwrap().is_empty());
    }

    #[test]
    fn test_adapter_pull_policy_polls() {
        let native = Arc::new(RecordingNative::default());
        let dispatcher = full_screen_dispatcher(native.clone());
        let source = VirtualTouchSource::new(8);
        let injector = source.injector();
        let mut adapter = TouchAdapter::new(Box::new(source), DeliveryPolicy::Pull);

        adapter.start(&dispatcher);
        injector.inject(TouchSample::began(50.0, 50.0));

        // Nothing fires until the owning thread polls.
        assert!(native.played.lock().unwrap().is_empty());

        let mut polled = Vec::new();
        assert_eq!(adapter.poll(&mut |s| polled.push(s)), 1);
        assert_eq!(polled, vec![TouchSample::began(50.0, 50.0)]);
    }

    #[test]
    fn test_adapter_on_unsupported_platform() {
        let native = Arc::new(RecordingNative::default());
        let dispatcher = full_screen_dispatcher(native);
        let mut adapter =
            TouchAdapter::new(Box::new(VirtualTouchSource::unsupported()), DeliveryPolicy::Push);

        assert!(!adapter.start(&dispatcher));
        assert!(!adapter.is_running());
        assert_eq!(adapter.poll(&mut |_| {}), 0);
    }

    #[test]
    fn test_injection_from_another_thread() {
        let native = Arc::new(RecordingNative::default());
        let dispatcher = full_screen_dispatcher(native.clone());
        let source = VirtualTouchSource::new(8);
        let injector = source.injector();
        let mut adapter = TouchAdapter::new(Box::new(source), DeliveryPolicy::Push);
        adapter.start(&dispatcher);

        let handle = std::thread::spawn(move || {
            for _ in 0..10 {
                injector.inject(TouchSample::began(10.0, 10.0));
            }
        });
        handle.join().unwrap();

        assert_eq!(native.played.lock().unwrap().len(), 10);
    }
}
