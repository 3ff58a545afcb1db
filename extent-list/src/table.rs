use alloc::vec::Vec;

use crate::estimate::{ExtentEstimator, sanitize_extent};
use crate::fenwick::Fenwick;
use crate::{ExtentEntry, ExtentError};

/// Incremental updates between two exact recomputations of the cached total.
const RESYNC_INTERVAL: usize = 1024;

/// Per-item extents with their estimated/measured flags.
///
/// The table owns all index arithmetic: insertions and removals shift the entries above the
/// touched index. Totals and counts are maintained incrementally, prefix sums are kept in a
/// Fenwick tree so offset lookups stay `O(log n)`. The incremental total is recomputed from the
/// entries every `max(len, 1024)` updates so rounding errors do not accumulate.
///
/// Lock checks and change notifications live one level up in [`crate::ExtentManager`].
#[derive(Clone, Debug, Default)]
pub struct ExtentTable {
    extents: Vec<f64>,
    estimated: Vec<bool>,
    sums: Fenwick,
    total: f64,
    estimated_count: usize,
    updates_since_resync: usize,
}

impl ExtentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table of `len` estimated entries.
    pub fn with_len(len: usize, estimator: &dyn ExtentEstimator, cross_axis_extent: f64) -> Self {
        let mut table = Self::new();
        table.resize(len, estimator, cross_axis_extent);
        table
    }

    pub fn len(&self) -> usize {
        self.extents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    pub fn total_extent(&self) -> f64 {
        self.total
    }

    pub fn estimated_count(&self) -> usize {
        self.estimated_count
    }

    pub fn get(&self, index: usize) -> Option<ExtentEntry> {
        let extent = *self.extents.get(index)?;
        Some(ExtentEntry {
            extent,
            is_estimated: self.estimated[index],
        })
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = ExtentEntry> + '_ {
        self.extents
            .iter()
            .zip(self.estimated.iter())
            .map(|(&extent, &is_estimated)| ExtentEntry {
                extent,
                is_estimated,
            })
    }

    /// Sum of the extents of the items before `index` (clamped to `len`).
    pub fn start_of(&self, index: usize) -> f64 {
        self.sums.prefix_sum(index)
    }

    /// Returns the item covering `offset`, clamped to the last item.
    pub fn index_at_offset(&self, offset: f64) -> Option<usize> {
        if self.is_empty() || offset.is_nan() {
            return None;
        }
        let consumed = self.sums.lower_bound(offset);
        Some(consumed.min(self.len() - 1))
    }

    /// Records an authoritative extent. Returns `true` if the entry changed.
    pub(crate) fn set_measured(&mut self, index: usize, extent: f64) -> Result<bool, ExtentError> {
        self.check_index(index)?;
        let extent = sanitize_extent(extent);
        let prev = self.extents[index];
        let was_estimated = self.estimated[index];
        if prev == extent && !was_estimated {
            return Ok(false);
        }

        self.extents[index] = extent;
        self.sums.add(index, extent - prev);
        self.total += extent - prev;
        if was_estimated {
            self.estimated[index] = false;
            self.estimated_count -= 1;
        }
        self.note_incremental_update();
        Ok(true)
    }

    /// Marks one entry as estimated again, keeping its value. Returns `true` if the flag changed.
    pub(crate) fn invalidate(&mut self, index: usize) -> Result<bool, ExtentError> {
        self.check_index(index)?;
        if self.estimated[index] {
            return Ok(false);
        }
        self.estimated[index] = true;
        self.estimated_count += 1;
        Ok(true)
    }

    /// Marks every entry as estimated. Returns how many flags changed.
    pub(crate) fn invalidate_all(&mut self) -> usize {
        let changed = self.len() - self.estimated_count;
        self.estimated.fill(true);
        self.estimated_count = self.len();
        changed
    }

    /// Inserts a fresh estimate at `index`, shifting later entries up.
    pub(crate) fn insert(
        &mut self,
        index: usize,
        estimator: &dyn ExtentEstimator,
        cross_axis_extent: f64,
    ) -> Result<(), ExtentError> {
        if index > self.len() {
            return Err(ExtentError::Index {
                index,
                len: self.len(),
            });
        }
        let extent = sanitize_extent(estimator.estimate(Some(index), cross_axis_extent));
        self.extents.insert(index, extent);
        self.estimated.insert(index, true);
        self.estimated_count += 1;
        if index == self.len() - 1 {
            self.sums.push_value(extent);
        } else {
            self.sums.rebuild_from(index, &self.extents);
        }
        self.total += extent;
        self.note_incremental_update();
        Ok(())
    }

    /// Removes the entry at `index`, shifting later entries down.
    pub(crate) fn remove(&mut self, index: usize) -> Result<ExtentEntry, ExtentError> {
        self.check_index(index)?;
        let extent = self.extents.remove(index);
        let is_estimated = self.estimated.remove(index);
        if is_estimated {
            self.estimated_count -= 1;
        }
        if index == self.len() {
            self.sums.truncate(index);
        } else {
            self.sums.rebuild_from(index, &self.extents);
        }
        self.total -= extent;
        self.note_incremental_update();
        Ok(ExtentEntry {
            extent,
            is_estimated,
        })
    }

    /// Grows with estimated entries or truncates to `len`. Existing entries are preserved.
    pub(crate) fn resize(
        &mut self,
        len: usize,
        estimator: &dyn ExtentEstimator,
        cross_axis_extent: f64,
    ) {
        let cur = self.len();
        if len == cur {
            return;
        }
        if len < cur {
            self.extents.truncate(len);
            self.estimated.truncate(len);
            self.sums.truncate(len);
            self.estimated_count = self.estimated.iter().filter(|&&e| e).count();
            self.total = self.sums.prefix_sum(len);
            return;
        }

        let uniform = estimator
            .is_uniform()
            .then(|| sanitize_extent(estimator.estimate(None, cross_axis_extent)));
        self.extents.reserve_exact(len - cur);
        self.estimated.reserve_exact(len - cur);
        for i in cur..len {
            let extent = match uniform {
                Some(extent) => extent,
                None => sanitize_extent(estimator.estimate(Some(i), cross_axis_extent)),
            };
            self.extents.push(extent);
            self.estimated.push(true);
        }
        self.estimated_count += len - cur;
        self.rebuild();
    }

    /// Replaces the value of every estimated entry with a fresh estimate.
    ///
    /// Measured entries are left alone.
    pub(crate) fn reestimate(&mut self, estimator: &dyn ExtentEstimator, cross_axis_extent: f64) {
        if self.estimated_count == 0 {
            return;
        }
        let uniform = estimator
            .is_uniform()
            .then(|| sanitize_extent(estimator.estimate(None, cross_axis_extent)));
        for (i, extent) in self.extents.iter_mut().enumerate() {
            if !self.estimated[i] {
                continue;
            }
            *extent = match uniform {
                Some(extent) => extent,
                None => sanitize_extent(estimator.estimate(Some(i), cross_axis_extent)),
            };
        }
        self.rebuild();
    }

    /// Recomputes prefix sums and the cached total from the entries.
    fn rebuild(&mut self) {
        self.sums = Fenwick::from_extents(&self.extents);
        self.total = self.extents.iter().sum();
        self.updates_since_resync = 0;
    }

    fn note_incremental_update(&mut self) {
        self.updates_since_resync += 1;
        if self.updates_since_resync > self.len().max(RESYNC_INTERVAL) {
            vtrace!(len = self.len(), "resyncing extent totals");
            self.rebuild();
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ExtentError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(ExtentError::Index {
                index,
                len: self.len(),
            })
        }
    }
}
