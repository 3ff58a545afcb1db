/// A scrollable viewport the controller can move.
///
/// Adapters implement this over their UI scroll container. The controller only reads the
/// current offset and extents and writes new offsets; it never owns scroll physics.
pub trait ScrollPosition {
    /// Current scroll offset.
    fn pixels(&self) -> f64;
    fn min_scroll_extent(&self) -> f64;
    fn max_scroll_extent(&self) -> f64;
    /// Moves the viewport to `pixels` immediately.
    fn jump_to(&mut self, pixels: f64);
}

/// A plain in-memory [`ScrollPosition`], useful for headless adapters and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasicScrollPosition {
    pub pixels: f64,
    pub min_scroll_extent: f64,
    pub max_scroll_extent: f64,
}

impl BasicScrollPosition {
    pub fn new(min_scroll_extent: f64, max_scroll_extent: f64) -> Self {
        Self {
            pixels: min_scroll_extent,
            min_scroll_extent,
            max_scroll_extent,
        }
    }

    pub fn with_pixels(mut self, pixels: f64) -> Self {
        self.pixels = pixels;
        self
    }

    /// Updates the extents, typically after the content's total extent changed.
    pub fn set_scroll_extents(&mut self, min_scroll_extent: f64, max_scroll_extent: f64) {
        self.min_scroll_extent = min_scroll_extent;
        self.max_scroll_extent = max_scroll_extent;
    }
}

impl ScrollPosition for BasicScrollPosition {
    fn pixels(&self) -> f64 {
        self.pixels
    }

    fn min_scroll_extent(&self) -> f64 {
        self.min_scroll_extent
    }

    fn max_scroll_extent(&self) -> f64 {
        self.max_scroll_extent
    }

    fn jump_to(&mut self, pixels: f64) {
        self.pixels = pixels;
    }
}

pub(crate) fn clamp_to_extents(position: &dyn ScrollPosition, offset: f64) -> f64 {
    // Not `f64::clamp`: extents may briefly be inverted while content shrinks.
    offset
        .max(position.min_scroll_extent())
        .min(position.max_scroll_extent())
}

/// `true` when the position rests exactly on an edge and `target` lies beyond it.
pub(crate) fn pinned_past_edge(position: &dyn ScrollPosition, target: f64) -> bool {
    let pixels = position.pixels();
    let min = position.min_scroll_extent();
    let max = position.max_scroll_extent();
    (pixels == min && target <= min) || (pixels == max && target >= max)
}
