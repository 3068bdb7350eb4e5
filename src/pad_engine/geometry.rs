//! Screen-space geometry index for touch hit testing.
//!
//! The index is built on the owning thread from the UI layout and published
//! as an immutable snapshot through [`SharedIndex`]. Readers on any thread
//! load the current snapshot without locking; a rebuild replaces the whole
//! snapshot with a single pointer swap, so a reader never sees a half-built
//! index.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::pad_engine::constants::FALLBACK_RESOLUTION;
use crate::pad_engine::pad::PadId;

/// A point in device-native screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Native screen resolution in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The same screen after a quarter turn.
    pub const fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Size of the root canvas in logical layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in device-native screen space.
///
/// Containment is half-open: the min edges are inside, the max edges are not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl ScreenRect {
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x_min: x,
            y_min: y,
            x_max: x + width,
            y_max: y + height,
        }
    }

    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x_min && point.x < self.x_max && point.y >= self.y_min && point.y < self.y_max
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// True when the rectangle cannot contain any point.
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }
}

/// The four corners of a pad in root canvas space.
///
/// Root space has its origin at the canvas centre and Y pointing up. Corners
/// are ordered bottom-left, top-left, top-right, bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadCorners {
    pub pad: PadId,
    pub corners: [Point; 4],
}

impl PadCorners {
    pub fn bottom_left(&self) -> Point {
        self.corners[0]
    }

    pub fn top_left(&self) -> Point {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.corners[3]
    }
}

/// One `(rectangle, pad)` pair of the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    pub rect: ScreenRect,
    pub pad: PadId,
}

/// Ordered list of pad rectangles in device screen space.
///
/// Entry order is scan order. Pads are expected not to overlap; when they
/// do, the earlier entry wins.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryIndex {
    entries: Vec<IndexEntry>,
    screen: Resolution,
}

impl GeometryIndex {
    /// An index with no pads, built for the given screen.
    pub fn empty(screen: Resolution) -> Self {
        Self {
            entries: Vec::new(),
            screen,
        }
    }

    pub fn from_entries(entries: Vec<IndexEntry>, screen: Resolution) -> Self {
        Self { entries, screen }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Screen resolution this index was built for.
    pub fn screen(&self) -> Resolution {
        self.screen
    }

    /// Cached screen height used to flip incoming touch coordinates.
    pub fn screen_height(&self) -> f32 {
        self.screen.height as f32
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rect_of(&self, pad: PadId) -> Option<ScreenRect> {
        self.entries.iter().find(|e| e.pad == pad).map(|e| e.rect)
    }

    pub fn degenerate_count(&self) -> usize {
        self.entries.iter().filter(|e| e.rect.is_degenerate()).count()
    }
}

/// Index shared between the owning thread (writer) and touch callbacks (readers).
pub type SharedIndex = Arc<ArcSwap<GeometryIndex>>;

pub fn new_shared_index(screen: Resolution) -> SharedIndex {
    Arc::new(ArcSwap::from_pointee(GeometryIndex::empty(screen)))
}

/// Source of the device's native screen resolution.
pub trait ScreenInfo {
    /// Native resolution in device pixels, or `None` when the host cannot
    /// tell (desktop development hosts, headless tests).
    fn native_resolution(&self) -> Option<Resolution>;
}

/// Screen info with a fixed, caller-supplied answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedScreen(pub Option<Resolution>);

impl ScreenInfo for FixedScreen {
    fn native_resolution(&self) -> Option<Resolution> {
        self.0
    }
}

/// Query `screen`, substituting the 1x1 fallback when it has no answer.
pub fn resolve_resolution(screen: &dyn ScreenInfo) -> Resolution {
    match screen.native_resolution() {
        Some(res) if res.width > 0 && res.height > 0 => res,
        _ => {
            log::debug!(
                "Native screen resolution unavailable, using {}x{} fallback",
                FALLBACK_RESOLUTION.width,
                FALLBACK_RESOLUTION.height
            );
            FALLBACK_RESOLUTION
        }
    }
}

/// Converts UI layout rectangles into a screen-space [`GeometryIndex`].
#[derive(Debug, Default)]
pub struct GeometryIndexBuilder;

impl GeometryIndexBuilder {
    /// Build the index for `pads` laid out on `canvas`, targeting `screen`.
    ///
    /// Degenerate rectangles are kept so pad order is preserved, but they are
    /// reported: they usually mean the layout was read before it settled.
    pub fn rebuild(pads: &[PadCorners], canvas: CanvasSize, screen: Resolution) -> GeometryIndex {
        let half_w = canvas.width / 2.0;
        let half_h = canvas.height / 2.0;
        let scale_x = axis_scale(screen.width, canvas.width);
        let scale_y = axis_scale(screen.height, canvas.height);

        let mut entries = Vec::with_capacity(pads.len());
        for pad in pads {
            let origin = pad.bottom_left();
            let canvas_x = origin.x + half_w;
            let canvas_y = origin.y + half_h;
            let width = pad.bottom_right().x - origin.x;
            let height = pad.top_left().y - origin.y;

            // Size goes through the same scale as position or edges drift.
            let rect = ScreenRect::from_origin_size(
                canvas_x * scale_x,
                canvas_y * scale_y,
                width * scale_x,
                height * scale_y,
            );

            log::debug!("{:?} -> {:?}", pad.pad, rect);
            entries.push(IndexEntry { rect, pad: pad.pad });
        }

        let index = GeometryIndex::from_entries(entries, screen);
        let degenerate = index.degenerate_count();
        if degenerate > 0 {
            log::warn!(
                "{degenerate} of {} pad rectangles are empty; was the layout read before it settled?",
                index.len()
            );
        }
        index
    }
}

fn axis_scale(screen_px: u32, canvas_units: f32) -> f32 {
    if !canvas_units.is_finite() || canvas_units <= 0.0 {
        return 0.0;
    }
    screen_px as f32 / canvas_units
}
