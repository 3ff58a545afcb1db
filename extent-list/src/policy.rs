use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::RequestLayout;

/// Snapshot handed to an [`ExtentPrecalculationPolicy`] when the manager decides whether to keep
/// measuring items outside the visible window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrecalculationContext {
    /// `None` until the viewport has been laid out.
    pub viewport_extent: Option<f64>,
    pub content_total_extent: f64,
    pub number_of_items: usize,
    pub number_of_items_with_estimated_extent: usize,
}

/// Lets a policy ask the manager to revisit its decision (e.g. when app state changes).
#[derive(Clone, Default)]
pub struct PrecalculationHandle {
    retry: Arc<AtomicBool>,
    request_layout: Option<RequestLayout>,
}

impl PrecalculationHandle {
    pub(crate) fn new(request_layout: Option<RequestLayout>) -> Self {
        Self {
            retry: Arc::default(),
            request_layout,
        }
    }

    /// Requests a new decision on the next layout pass.
    ///
    /// The first request since the last pass also asks the driver for a layout pass through
    /// [`ExtentListOptions::request_layout`](crate::ExtentListOptions::request_layout).
    pub fn value_did_change(&self) {
        if self.retry.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(request_layout) = &self.request_layout {
            request_layout();
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.retry.load(Ordering::Acquire)
    }

    pub(crate) fn take(&self) -> bool {
        self.retry.swap(false, Ordering::AcqRel)
    }
}

impl fmt::Debug for PrecalculationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrecalculationHandle")
            .field("pending", &self.is_pending())
            .field("request_layout", &self.request_layout.is_some())
            .finish()
    }
}

/// Decides whether the layout driver should eagerly measure items beyond the cache area.
///
/// Precalculated extents make the scroll indicator accurate and `animate_to_item` land without
/// visible corrections, at the cost of extra layout work spread over several frames.
pub trait ExtentPrecalculationPolicy: Send {
    /// Called when the policy is installed on a manager.
    fn on_attached(&mut self, handle: PrecalculationHandle) {
        let _ = handle;
    }

    /// Called when the policy is removed or the manager is dropped.
    fn on_detached(&mut self) {}

    fn should_precalculate_extents(&self, context: &PrecalculationContext) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysPrecalculate;

impl ExtentPrecalculationPolicy for AlwaysPrecalculate {
    fn should_precalculate_extents(&self, _context: &PrecalculationContext) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NeverPrecalculate;

impl ExtentPrecalculationPolicy for NeverPrecalculate {
    fn should_precalculate_extents(&self, _context: &PrecalculationContext) -> bool {
        false
    }
}

/// Precalculates only lists shorter than the given number of items.
#[derive(Clone, Copy, Debug)]
pub struct PrecalculateBelow(pub usize);

impl ExtentPrecalculationPolicy for PrecalculateBelow {
    fn should_precalculate_extents(&self, context: &PrecalculationContext) -> bool {
        context.number_of_items < self.0
    }
}
