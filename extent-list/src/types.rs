/// The extent of a single item together with its trust flag.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtentEntry {
    /// Size along the scroll axis. Never negative.
    pub extent: f64,
    /// `true` until the layout driver has measured the item (and again after invalidation).
    pub is_estimated: bool,
}

impl ExtentEntry {
    pub fn estimated(extent: f64) -> Self {
        Self {
            extent,
            is_estimated: true,
        }
    }

    pub fn measured(extent: f64) -> Self {
        Self {
            extent,
            is_estimated: false,
        }
    }
}

/// The scroll axis of the list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

/// A rectangle in the item's own coordinate space.
///
/// Used to reveal only part of an item. Only the projection on the scroll axis matters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Returns `(leading, extent)` of this rect along `axis`.
    pub fn main_axis(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::Vertical => (self.top, self.height),
            Axis::Horizontal => (self.left, self.width),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualRange {
    pub start_index: usize,
    pub end_index: usize, // exclusive
}

impl VirtualRange {
    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }

    /// The last index in the range, if any.
    pub fn last_index(&self) -> Option<usize> {
        (!self.is_empty()).then(|| self.end_index - 1)
    }
}

/// Geometry reported by the layout driver at the start of each layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutFrame {
    /// Scroll offset of the viewport's leading edge, relative to the list start.
    pub scroll_offset: f64,
    /// Viewport size along the scroll axis. `None` until the viewport has been laid out.
    pub viewport_extent: Option<f64>,
    /// Size of the list along the cross axis. Estimates depend on it.
    pub cross_axis_extent: f64,
    /// Extra distance before and after the viewport where items are kept laid out.
    pub cache_extent: f64,
    /// Part of the viewport's leading edge covered by pinned content (e.g. a sticky header).
    pub leading_obstruction: f64,
}

impl LayoutFrame {
    pub fn new(scroll_offset: f64, viewport_extent: f64, cross_axis_extent: f64) -> Self {
        Self {
            scroll_offset,
            viewport_extent: Some(viewport_extent),
            cross_axis_extent,
            cache_extent: 0.0,
            leading_obstruction: 0.0,
        }
    }

    pub fn with_cache_extent(mut self, cache_extent: f64) -> Self {
        self.cache_extent = cache_extent;
        self
    }

    pub fn with_leading_obstruction(mut self, leading_obstruction: f64) -> Self {
        self.leading_obstruction = leading_obstruction;
        self
    }

    pub fn viewport_extent_or_zero(&self) -> f64 {
        self.viewport_extent.unwrap_or(0.0)
    }

    /// `[start, end)` of the cache area in list coordinates.
    pub fn cache_window(&self) -> (f64, f64) {
        let start = self.scroll_offset - self.cache_extent;
        let end = self.scroll_offset + self.viewport_extent_or_zero() + self.cache_extent;
        (start, end)
    }
}
