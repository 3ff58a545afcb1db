/// Provides extents for items that have not been measured yet.
///
/// `index` is `None` when the table asks for a fallback that applies to every unmeasured item.
/// Estimators that return the same value for every index should report [`is_uniform`] so the
/// table can fill large ranges with a single call.
///
/// Closures `Fn(Option<usize>, f64) -> f64` implement this trait.
///
/// [`is_uniform`]: ExtentEstimator::is_uniform
pub trait ExtentEstimator: Send + Sync {
    fn estimate(&self, index: Option<usize>, cross_axis_extent: f64) -> f64;

    fn is_uniform(&self) -> bool {
        false
    }
}

impl<F> ExtentEstimator for F
where
    F: Fn(Option<usize>, f64) -> f64 + Send + Sync,
{
    fn estimate(&self, index: Option<usize>, cross_axis_extent: f64) -> f64 {
        self(index, cross_axis_extent)
    }
}

/// Every unmeasured item is assumed to have the same extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedExtent(pub f64);

impl Default for FixedExtent {
    fn default() -> Self {
        Self(100.0)
    }
}

impl ExtentEstimator for FixedExtent {
    fn estimate(&self, _index: Option<usize>, _cross_axis_extent: f64) -> f64 {
        self.0
    }

    fn is_uniform(&self) -> bool {
        true
    }
}

/// Estimates with a fixed aspect ratio: `extent = cross_axis_extent * ratio`.
///
/// Useful for image grids flattened into a list where every row keeps its aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectRatioExtent(pub f64);

impl ExtentEstimator for AspectRatioExtent {
    fn estimate(&self, _index: Option<usize>, cross_axis_extent: f64) -> f64 {
        cross_axis_extent * self.0
    }

    fn is_uniform(&self) -> bool {
        true
    }
}

pub(crate) fn sanitize_extent(extent: f64) -> f64 {
    if extent.is_finite() && extent > 0.0 {
        extent
    } else {
        0.0
    }
}
