//! Deployment configuration.
//!
//! Which touch delivery policy a build uses is a property of the target
//! (runtime + platform), declared up front. Nothing here measures callback
//! latency at runtime.

use std::env;

use crate::pad_engine::constants::TOUCH_RING_CAPACITY;

/// Environment variable overriding the touch delivery policy (`push` / `pull`).
pub const ENV_TOUCH_DELIVERY: &str = "PAD_DISPATCH_TOUCH_DELIVERY";

/// Environment variable for the initial native audio switch (`0` / `1`).
pub const ENV_NATIVE_AUDIO: &str = "PAD_DISPATCH_NATIVE_AUDIO";

/// How touch samples reach the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// The touch source calls back on its own thread; audio is triggered
    /// right there through the native fast path.
    Push,
    /// Samples queue in a bounded ring buffer that the owning thread drains
    /// once per update.
    Pull,
}

impl DeliveryPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "push" | "callback" => Some(Self::Push),
            "pull" | "poll" => Some(Self::Pull),
            _ => None,
        }
    }
}

/// What is known about the target's touch callback latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// True when the runtime delivers touch callbacks fast enough to play
    /// audio from inside them.
    pub callback_latency_acceptable: bool,
}

impl DeploymentTarget {
    /// Targets whose touch callbacks arrive promptly (JIT runtimes on
    /// Android, AOT runtimes on iOS, native hosts).
    pub const fn low_latency_callbacks() -> Self {
        Self {
            callback_latency_acceptable: true,
        }
    }

    /// AOT-compiled runtime on Android: the callback bridge is slow enough
    /// that polling on the owning thread wins.
    pub const fn aot_android() -> Self {
        Self {
            callback_latency_acceptable: false,
        }
    }

    pub const fn delivery_policy(&self) -> DeliveryPolicy {
        if self.callback_latency_acceptable {
            DeliveryPolicy::Push
        } else {
            DeliveryPolicy::Pull
        }
    }
}

impl Default for DeploymentTarget {
    fn default() -> Self {
        Self::low_latency_callbacks()
    }
}

/// Startup configuration of a [`Surface`](crate::pad_engine::surface::Surface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub target: DeploymentTarget,
    /// Initial state of the native audio switch.
    pub native_audio: bool,
    /// Start native touch delivery as soon as the surface is built.
    pub native_touch: bool,
    /// Capacity of the pull-mode ring buffer.
    pub touch_ring_capacity: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            target: DeploymentTarget::default(),
            native_audio: true,
            native_touch: true,
            touch_ring_capacity: TOUCH_RING_CAPACITY,
        }
    }
}

impl SurfaceConfig {
    pub fn for_target(target: DeploymentTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Defaults, overridden by `PAD_DISPATCH_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_TOUCH_DELIVERY) {
            match DeliveryPolicy::from_name(&value) {
                Some(policy) => {
                    self.target.callback_latency_acceptable = policy == DeliveryPolicy::Push;
                }
                None => log::warn!("Ignoring {ENV_TOUCH_DELIVERY}={value:?} (expected push or pull)"),
            }
        }

        if let Some(value) = lookup(ENV_NATIVE_AUDIO) {
            match value.trim() {
                "1" | "true" | "on" => self.native_audio = true,
                "0" | "false" | "off" => self.native_audio = false,
                other => log::warn!("Ignoring {ENV_NATIVE_AUDIO}={other:?} (expected 0 or 1)"),
            }
        }
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        self.target.delivery_policy()
    }
}
