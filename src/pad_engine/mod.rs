//! Pad Engine Module
//!
//! Low-latency touch-to-audio dispatch for a grid of sample pads. It is
//! organized into sub-modules, each with a specific responsibility:
//!
//! - [`geometry`]: screen-space pad rectangles and the shared index
//! - [`hit_test`]: point-to-pad lookup
//! - [`layout`]: UI layout collaborators
//! - [`touch_source`]: touch delivery (push callbacks or a polled ring)
//! - [`dispatch`]: the entry point touch callbacks call
//! - [`audio_trigger`]: native vs. standard playback selection
//! - [`pad`]: per-pad state
//! - [`surface`]: the owning-thread coordinator
//! - [`config`]: deployment configuration
//! - [`audio_stream`], [`mixer`]: cpal output and real-time mixing
//! - [`sample_loader`]: clip decoding
//!
//! [`PadSurface`] wraps a [`surface::Surface`] on a cpal backend for Python.

use std::path::Path;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::messages::{TouchPhase, TouchSample};
use crate::pad_engine::audio_stream::{CpalAudio, setup_logger};
use crate::pad_engine::config::{DeliveryPolicy, SurfaceConfig};
use crate::pad_engine::errors::{SampleLoadError, SurfaceError};
use crate::pad_engine::geometry::{CanvasSize, FixedScreen, Point, Resolution};
use crate::pad_engine::layout::GridLayout;
use crate::pad_engine::pad::{PadId, PadVisual};
use crate::pad_engine::sample_loader::decode_clip;
use crate::pad_engine::surface::{AudioBackends, Surface};
use crate::pad_engine::touch_source::{TouchInjector, VirtualTouchSource};

pub mod audio_stream;
pub mod audio_trigger;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod geometry;
pub mod hit_test;
pub mod layout;
pub mod mixer;
pub mod pad;
pub mod sample_loader;
pub mod surface;
pub mod touch_source;

fn surface_error(err: SurfaceError) -> PyErr {
    match err {
        SurfaceError::UnknownPad(_)
        | SurfaceError::TooManyPads { .. }
        | SurfaceError::PadCountMismatch { .. } => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Grid of sample pads played by touch, for a Python host.
///
/// The Python thread that creates it is the owning thread. Touches injected
/// with `inject_touch` go through the same path a native touch callback would.
#[pyclass(unsendable)]
pub struct PadSurface {
    surface: Surface<GridLayout>,
    injector: TouchInjector,
}

#[pymethods]
impl PadSurface {
    /// Open the default audio device, load one clip per pad and lay the pads
    /// out as a grid with `columns` columns.
    #[new]
    #[pyo3(signature = (
        sample_paths,
        columns,
        canvas_width,
        canvas_height,
        screen_width = None,
        screen_height = None,
        low_latency_callbacks = None
    ))]
    pub fn new(
        sample_paths: Vec<String>,
        columns: usize,
        canvas_width: f32,
        canvas_height: f32,
        screen_width: Option<u32>,
        screen_height: Option<u32>,
        low_latency_callbacks: Option<bool>,
    ) -> PyResult<Self> {
        setup_logger();

        if columns == 0 || sample_paths.is_empty() || sample_paths.len() % columns != 0 {
            return Err(PyValueError::new_err(format!(
                "{} samples cannot fill a grid with {columns} columns",
                sample_paths.len()
            )));
        }
        let rows = sample_paths.len() / columns;

        let mut config = SurfaceConfig::from_env();
        if let Some(acceptable) = low_latency_callbacks {
            config.target.callback_latency_acceptable = acceptable;
        }

        let audio = CpalAudio::open()
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to open audio output: {e}")))?;

        let mut clips = Vec::with_capacity(sample_paths.len());
        for path in &sample_paths {
            let clip = decode_clip(
                Path::new(path),
                audio.output_channels(),
                audio.output_sample_rate(),
            )
            .map_err(|err| match err {
                SampleLoadError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                    PyValueError::new_err(format!("File not found: {path}"))
                }
                other => PyRuntimeError::new_err(format!("Failed to load {path}: {other}")),
            })?;
            clips.push(clip);
        }

        let screen = match (screen_width, screen_height) {
            (Some(width), Some(height)) => Some(Resolution::new(width, height)),
            _ => None,
        };

        let source = VirtualTouchSource::new(config.touch_ring_capacity);
        let injector = source.injector();
        let backends = AudioBackends {
            native: Some(audio.fast_path()),
            standard: Some(Box::new(audio)),
        };

        let surface = Surface::new(
            &config,
            GridLayout::new(
                columns,
                rows,
                CanvasSize::new(canvas_width, canvas_height),
            ),
            Box::new(FixedScreen(screen)),
            backends,
            &clips,
            Box::new(source),
        )
        .map_err(surface_error)?;

        Ok(PadSurface { surface, injector })
    }

    /// Recompute pad rectangles. Returns the number of indexed pads.
    pub fn rebuild_geometry(&mut self) -> PyResult<usize> {
        self.surface.rebuild_geometry().map_err(surface_error)
    }

    /// Adopt a new native screen resolution (resize) and rebuild.
    pub fn set_screen_resolution(&mut self, width: u32, height: u32) -> PyResult<usize> {
        self.surface
            .set_screen_resolution(Resolution::new(width, height))
            .map_err(surface_error)
    }

    /// Swap screen width and height (device rotation) and rebuild.
    pub fn rotate(&mut self) -> PyResult<(u32, u32)> {
        let rotated = self.surface.screen().rotated();
        self.surface
            .set_screen_resolution(rotated)
            .map_err(surface_error)?;
        Ok((rotated.width, rotated.height))
    }

    /// Resize the canvas (the UI relaid out) and rebuild.
    pub fn set_canvas_size(&mut self, width: f32, height: f32) -> PyResult<usize> {
        self.surface
            .layout_mut()
            .set_canvas_size(CanvasSize::new(width, height));
        self.surface.rebuild_geometry().map_err(surface_error)
    }

    /// Toggle native touch delivery. Returns whether it is active.
    pub fn set_native_touch(&mut self, enabled: bool) -> bool {
        self.surface.set_native_touch(enabled)
    }

    /// Toggle the native audio fast path.
    pub fn set_native_audio(&mut self, enabled: bool) {
        self.surface.set_native_audio(enabled);
    }

    /// UI pointer-down. Returns True when this call triggered audio.
    pub fn press(&mut self, pad: usize) -> PyResult<bool> {
        let action = self.surface.press(PadId(pad)).map_err(surface_error)?;
        Ok(action.is_some())
    }

    /// Silence every pad (panic button).
    pub fn stop_all(&mut self) -> bool {
        self.surface.stop_all()
    }

    /// UI pointer-up.
    pub fn release(&mut self, pad: usize) -> PyResult<()> {
        self.surface.release(PadId(pad)).map_err(surface_error)
    }

    /// Feed a raw touch in device pixels (origin top-left).
    ///
    /// Returns False when native touch is off or the pull buffer is full.
    #[pyo3(signature = (x, y, phase = "began"))]
    pub fn inject_touch(&self, x: f32, y: f32, phase: &str) -> PyResult<bool> {
        let phase = TouchPhase::from_name(phase)
            .ok_or_else(|| PyValueError::new_err(format!("unknown touch phase {phase:?}")))?;
        Ok(self.injector.inject(TouchSample::new(x, y, phase)))
    }

    /// Drain queued touches (pull delivery). Returns the pads triggered.
    pub fn poll_touches(&mut self) -> Vec<usize> {
        self.surface
            .poll_touches()
            .into_iter()
            .map(|(pad, _)| pad.0)
            .collect()
    }

    /// Pad under a point in index space (origin bottom-left), if any.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        self.surface.hit_test(Point::new(x, y)).map(|pad| pad.0)
    }

    /// Pad a raw touch-down at `(x, y)` would land on, if any.
    pub fn locate_touch(&self, x: f32, y: f32) -> Option<usize> {
        self.surface
            .locate_touch(&TouchSample::began(x, y))
            .map(|pad| pad.0)
    }

    pub fn is_pressed(&self, pad: usize) -> PyResult<bool> {
        self.surface
            .pad_visual(PadId(pad))
            .map(|visual| visual == PadVisual::Pressed)
            .ok_or_else(|| PyValueError::new_err(format!("unknown pad {pad}")))
    }

    pub fn native_touch_active(&self) -> bool {
        self.surface.native_touch_active()
    }

    pub fn delivery_policy(&self) -> &'static str {
        match self.surface.delivery_policy() {
            DeliveryPolicy::Push => "push",
            DeliveryPolicy::Pull => "pull",
        }
    }

    /// Touches lost because the pull buffer was full.
    pub fn dropped_touches(&self) -> usize {
        self.injector.dropped()
    }

    pub fn pad_count(&self) -> usize {
        self.surface.pad_count()
    }
}
