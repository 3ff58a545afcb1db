use alloc::sync::Arc;
use core::time::Duration;

use crate::budget::DEFAULT_LAYOUT_BUDGET;
use crate::estimate::{ExtentEstimator, FixedExtent};
use crate::manager::ExtentManager;
use crate::{Axis, Changes};

/// Measures an item synchronously: `(index, cross_axis_extent) -> extent`.
///
/// Installed by the layout driver so that offset computations can force authoritative extents
/// for items inside the cache area. Returning `None` leaves the estimate in place.
pub type MeasureItem = Arc<dyn Fn(usize, f64) -> Option<f64> + Send + Sync>;

/// Asks the layout driver to schedule a layout pass.
///
/// Fired when the precalculation policy requests a new decision while no pass is running.
pub type RequestLayout = Arc<dyn Fn() + Send + Sync>;

/// A callback fired after a state-affecting change.
pub type ListenerCallback = Arc<dyn Fn(&ExtentManager, Changes) + Send + Sync>;

/// Configuration for [`crate::ExtentManager`].
///
/// Cheap to clone: closures are stored in `Arc`s.
#[derive(Clone)]
pub struct ExtentListOptions {
    pub item_count: usize,
    pub estimator: Arc<dyn ExtentEstimator>,
    pub axis: Axis,

    /// Synchronous measurement hook used when an offset must be authoritative.
    pub measure_item: Option<MeasureItem>,

    /// Driver hook scheduling a new layout pass.
    pub request_layout: Option<RequestLayout>,

    /// Threshold of the default time-based layout budget.
    pub layout_budget: Duration,

    /// Whether jump targets and the final frame of an animation are clamped to the scroll
    /// position's extents. Intermediate animation frames are always clamped.
    pub clamp_final_offset: bool,
}

impl ExtentListOptions {
    /// Creates options for `item_count` items, all estimated with `estimator`.
    pub fn new(item_count: usize, estimator: impl ExtentEstimator + 'static) -> Self {
        Self {
            item_count,
            estimator: Arc::new(estimator),
            axis: Axis::Vertical,
            measure_item: None,
            request_layout: None,
            layout_budget: DEFAULT_LAYOUT_BUDGET,
            clamp_final_offset: false,
        }
    }

    /// Every item is estimated at `extent`.
    pub fn fixed(item_count: usize, extent: f64) -> Self {
        Self::new(item_count, FixedExtent(extent))
    }

    pub fn with_item_count(mut self, item_count: usize) -> Self {
        self.item_count = item_count;
        self
    }

    pub fn with_estimator(mut self, estimator: impl ExtentEstimator + 'static) -> Self {
        self.estimator = Arc::new(estimator);
        self
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_measure_item(
        mut self,
        measure_item: Option<impl Fn(usize, f64) -> Option<f64> + Send + Sync + 'static>,
    ) -> Self {
        self.measure_item = measure_item.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_request_layout(
        mut self,
        request_layout: Option<impl Fn() + Send + Sync + 'static>,
    ) -> Self {
        self.request_layout = request_layout.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_layout_budget(mut self, layout_budget: Duration) -> Self {
        self.layout_budget = layout_budget;
        self
    }

    pub fn with_clamp_final_offset(mut self, clamp_final_offset: bool) -> Self {
        self.clamp_final_offset = clamp_final_offset;
        self
    }
}

impl Default for ExtentListOptions {
    fn default() -> Self {
        Self::new(0, FixedExtent::default())
    }
}

impl core::fmt::Debug for ExtentListOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExtentListOptions")
            .field("item_count", &self.item_count)
            .field("axis", &self.axis)
            .field("measure_item", &self.measure_item.is_some())
            .field("request_layout", &self.request_layout.is_some())
            .field("layout_budget", &self.layout_budget)
            .field("clamp_final_offset", &self.clamp_final_offset)
            .finish_non_exhaustive()
    }
}
