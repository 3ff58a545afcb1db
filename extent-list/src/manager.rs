use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use bitflags::bitflags;

use crate::budget::LayoutBudget;
use crate::estimate::sanitize_extent;
use crate::policy::{ExtentPrecalculationPolicy, PrecalculationContext, PrecalculationHandle};
use crate::table::ExtentTable;
use crate::{
    ExtentEntry, ExtentError, ExtentListOptions, LayoutFrame, ListenerCallback, Rect,
    RequestLayout, VirtualRange,
};

bitflags! {
    /// What a change notification is about.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Changes: u8 {
        /// An extent value or an estimated/measured flag changed.
        const EXTENTS = 1;
        /// Items were inserted, removed, or the item count was reset.
        const ITEM_COUNT = 1 << 1;
        /// A layout pass took or released the lock.
        const LOCK = 1 << 2;
        /// The precalculation policy changed or asked for a new decision.
        const PRECALCULATION = 1 << 3;
    }
}

/// Identifies a listener registered with [`ExtentManager::add_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// The extent-tracking engine shared by the layout driver and list controllers.
///
/// It owns the [`ExtentTable`], the layout lock, the layout budget and the precalculation
/// policy, and answers "how far from the origin is item `i`" questions.
///
/// The layout driver works in passes:
///
/// ```
/// use extent_list::{ExtentListOptions, ExtentManager, LayoutFrame};
///
/// let mut manager = ExtentManager::new(ExtentListOptions::fixed(1_000, 50.0));
/// {
///     let mut pass = manager.begin_layout(LayoutFrame::new(0.0, 200.0, 400.0)).unwrap();
///     for index in 0..4 {
///         pass.set_measured_extent(index, 60.0).unwrap();
///     }
/// } // dropping the pass releases the lock
/// assert_eq!(manager.number_of_items_with_estimated_extent(), 996);
/// ```
///
/// Caller mutations (`invalidate_*`, `add_item`, `remove_item`, `set_measured_extent`) fail with
/// [`ExtentError::Locked`] while a pass is in progress.
pub struct ExtentManager {
    options: ExtentListOptions,
    table: ExtentTable,
    frame: Option<LayoutFrame>,
    /// Cross axis extent the current estimates were computed with.
    estimate_cross_axis_extent: f64,
    locked: bool,

    budget: Box<dyn LayoutBudget + Send>,
    policy: Option<Box<dyn ExtentPrecalculationPolicy>>,
    policy_handle: PrecalculationHandle,
    precalculate_cursor: usize,

    listeners: Vec<(ListenerId, ListenerCallback)>,
    next_listener_id: u64,
    notify_depth: Cell<usize>,
    notify_pending: Cell<Changes>,
}

impl ExtentManager {
    pub fn new(options: ExtentListOptions) -> Self {
        vdebug!(item_count = options.item_count, "ExtentManager::new");
        let table = ExtentTable::with_len(options.item_count, &*options.estimator, 0.0);
        let mut budget = default_budget(&options);
        budget.reset();
        Self {
            table,
            frame: None,
            estimate_cross_axis_extent: 0.0,
            locked: false,
            budget,
            policy: None,
            policy_handle: PrecalculationHandle::new(options.request_layout.clone()),
            precalculate_cursor: 0,
            listeners: Vec::new(),
            next_listener_id: 0,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(Changes::empty()),
            options,
        }
    }

    pub fn options(&self) -> &ExtentListOptions {
        &self.options
    }

    /// Replaces the options, rebuilding estimates when the estimator or item count changed.
    pub fn set_options(&mut self, options: ExtentListOptions) -> Result<(), ExtentError> {
        self.check_unlocked()?;
        let estimator_changed = !Arc::ptr_eq(&self.options.estimator, &options.estimator);
        let count_changed = self.options.item_count != options.item_count;
        let budget_changed = self.options.layout_budget != options.layout_budget;
        let request_layout_changed =
            !same_hook(&self.options.request_layout, &options.request_layout);
        self.options = options;
        vtrace!(
            item_count = self.options.item_count,
            estimator_changed,
            "ExtentManager::set_options"
        );

        let mut changes = Changes::empty();
        if estimator_changed {
            self.table
                .reestimate(&*self.options.estimator, self.estimate_cross_axis_extent);
            changes |= Changes::EXTENTS;
        }
        if count_changed {
            self.table.resize(
                self.options.item_count,
                &*self.options.estimator,
                self.estimate_cross_axis_extent,
            );
            changes |= Changes::ITEM_COUNT | Changes::EXTENTS;
        }
        if budget_changed {
            self.budget = default_budget(&self.options);
            self.budget.reset();
        }
        if request_layout_changed && self.policy.is_some() {
            // The policy holds a handle to the old hook.
            if let Some(policy) = self.policy.as_mut() {
                policy.on_detached();
            }
            let policy = self.policy.take();
            self.install_policy(policy);
            changes |= Changes::PRECALCULATION;
        }
        if !changes.is_empty() {
            self.notify(changes);
        }
        Ok(())
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(
        &mut self,
        f: impl FnOnce(&mut ExtentListOptions),
    ) -> Result<(), ExtentError> {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next)
    }

    /// Replaces the layout budget. The new budget is reset immediately.
    pub fn set_layout_budget(&mut self, budget: impl LayoutBudget + Send + 'static) {
        self.budget = Box::new(budget);
        self.budget.reset();
    }

    /// Restarts the budget cycle. Drivers call this at the start of a frame.
    pub fn reset_budget(&mut self) {
        self.budget.reset();
    }

    pub fn set_precalculation_policy(
        &mut self,
        policy: Option<impl ExtentPrecalculationPolicy + 'static>,
    ) {
        self.install_policy(policy.map(|p| Box::new(p) as Box<dyn ExtentPrecalculationPolicy>));
        self.notify(Changes::PRECALCULATION);
    }

    /// Removes the precalculation policy. Extents outside the cache area are no longer
    /// precalculated.
    pub fn clear_precalculation_policy(&mut self) {
        if self.policy.is_none() {
            return;
        }
        self.install_policy(None);
        self.notify(Changes::PRECALCULATION);
    }

    fn install_policy(&mut self, policy: Option<Box<dyn ExtentPrecalculationPolicy>>) {
        if let Some(mut old) = self.policy.take() {
            old.on_detached();
        }
        self.policy_handle = PrecalculationHandle::new(self.options.request_layout.clone());
        self.policy = policy.map(|mut p| {
            p.on_attached(self.policy_handle.clone());
            p
        });
        self.precalculate_cursor = 0;
    }

    pub fn has_precalculation_policy(&self) -> bool {
        self.policy.is_some()
    }

    /// `true` when the precalculation policy asked for a new decision since the last pass.
    pub fn needs_layout(&self) -> bool {
        self.policy_handle.is_pending()
    }

    pub fn precalculation_context(&self) -> PrecalculationContext {
        PrecalculationContext {
            viewport_extent: self.frame.and_then(|f| f.viewport_extent),
            content_total_extent: self.table.total_extent(),
            number_of_items: self.table.len(),
            number_of_items_with_estimated_extent: self.table.estimated_count(),
        }
    }

    pub fn should_precalculate_extents(&self) -> bool {
        self.policy
            .as_ref()
            .is_some_and(|p| p.should_precalculate_extents(&self.precalculation_context()))
    }

    pub fn add_listener(
        &mut self,
        f: impl Fn(&ExtentManager, Changes) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Arc::new(f)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    fn notify_now(&self, changes: Changes) {
        for (_, listener) in &self.listeners {
            listener(self, changes);
        }
    }

    fn notify(&self, changes: Changes) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(self.notify_pending.get() | changes);
            return;
        }
        self.notify_now(changes);
    }

    fn push_batch(&self) {
        self.notify_depth.set(self.notify_depth.get() + 1);
    }

    fn pop_batch(&self) {
        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);
        if next == 0 {
            let pending = self.notify_pending.replace(Changes::empty());
            if !pending.is_empty() {
                self.notify_now(pending);
            }
        }
    }

    /// Batches multiple updates into a single notification.
    pub fn batch_update<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_batch();
        let out = f(self);
        self.pop_batch();
        out
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn table(&self) -> &ExtentTable {
        &self.table
    }

    pub fn number_of_items(&self) -> usize {
        self.table.len()
    }

    pub fn total_extent(&self) -> f64 {
        self.table.total_extent()
    }

    pub fn number_of_items_with_estimated_extent(&self) -> usize {
        self.table.estimated_count()
    }

    /// The most recent frame reported by the layout driver.
    pub fn layout_frame(&self) -> Option<LayoutFrame> {
        self.frame
    }

    pub fn cross_axis_extent(&self) -> f64 {
        self.estimate_cross_axis_extent
    }

    /// Returns the stored entry, or a fresh estimate for indexes the table does not hold.
    pub fn extent_for_index(&self, index: usize) -> ExtentEntry {
        self.table.get(index).unwrap_or_else(|| {
            ExtentEntry::estimated(sanitize_extent(
                self.options
                    .estimator
                    .estimate(Some(index), self.estimate_cross_axis_extent),
            ))
        })
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = ExtentEntry> + '_ {
        self.table.iter()
    }

    pub fn item_start(&self, index: usize) -> Option<f64> {
        (index < self.table.len()).then(|| self.table.start_of(index))
    }

    pub fn index_at_offset(&self, offset: f64) -> Option<usize> {
        self.table.index_at_offset(offset)
    }

    /// Items intersecting the viewport. `None` before the first layout pass.
    pub fn visible_range(&self) -> Option<VirtualRange> {
        let frame = self.frame?;
        let start = frame.scroll_offset;
        Some(self.range_for_window(start, start + frame.viewport_extent_or_zero()))
    }

    /// Items intersecting the part of the viewport not covered by pinned content.
    pub fn unobstructed_visible_range(&self) -> Option<VirtualRange> {
        let frame = self.frame?;
        let start = frame.scroll_offset + frame.leading_obstruction.max(0.0);
        let end = frame.scroll_offset + frame.viewport_extent_or_zero();
        Some(self.range_for_window(start, end))
    }

    /// Items intersecting the cache area.
    pub fn cache_range(&self) -> Option<VirtualRange> {
        let (start, end) = self.frame?.cache_window();
        Some(self.range_for_window(start, end))
    }

    fn range_for_window(&self, start: f64, end: f64) -> VirtualRange {
        let count = self.table.len();
        if count == 0 || !(end > start) || end <= 0.0 {
            return VirtualRange {
                start_index: 0,
                end_index: 0,
            };
        }
        if start >= self.table.total_extent() {
            return VirtualRange {
                start_index: count,
                end_index: count,
            };
        }

        let first = self.table.index_at_offset(start.max(0.0)).unwrap_or(count);
        let end_index = match self.table.index_at_offset(end) {
            Some(last) if self.table.start_of(last) < end => last + 1,
            Some(last) => last,
            None => count,
        };
        VirtualRange {
            start_index: first,
            end_index: end_index.max(first),
        }
    }

    /// Records an authoritative extent outside of a layout pass.
    ///
    /// During a pass the driver writes through [`LayoutPass::set_measured_extent`].
    pub fn set_measured_extent(&mut self, index: usize, extent: f64) -> Result<(), ExtentError> {
        self.check_unlocked()?;
        if self.table.set_measured(index, extent)? {
            self.notify(Changes::EXTENTS);
        }
        Ok(())
    }

    /// Marks the extent of `index` as estimated again. The last known value is kept as the
    /// best guess until the item is measured again.
    pub fn invalidate_extent(&mut self, index: usize) -> Result<(), ExtentError> {
        self.check_unlocked()?;
        if self.table.invalidate(index)? {
            vtrace!(index, "invalidate_extent");
            self.notify(Changes::EXTENTS);
        }
        Ok(())
    }

    pub fn invalidate_all_extents(&mut self) -> Result<(), ExtentError> {
        self.check_unlocked()?;
        let changed = self.table.invalidate_all();
        vdebug!(changed, "invalidate_all_extents");
        if changed > 0 {
            self.notify(Changes::EXTENTS);
        }
        Ok(())
    }

    /// Inserts an estimated item at `index` (`0..=len`), shifting later items up.
    pub fn add_item(&mut self, index: usize) -> Result<(), ExtentError> {
        self.check_unlocked()?;
        self.table.insert(
            index,
            &*self.options.estimator,
            self.estimate_cross_axis_extent,
        )?;
        self.options.item_count = self.table.len();
        vtrace!(index, count = self.table.len(), "add_item");
        self.notify(Changes::ITEM_COUNT | Changes::EXTENTS);
        Ok(())
    }

    /// Removes the item at `index` (`0..len`), shifting later items down.
    pub fn remove_item(&mut self, index: usize) -> Result<(), ExtentError> {
        self.check_unlocked()?;
        self.table.remove(index)?;
        self.options.item_count = self.table.len();
        vtrace!(index, count = self.table.len(), "remove_item");
        self.notify(Changes::ITEM_COUNT | Changes::EXTENTS);
        Ok(())
    }

    fn check_unlocked(&self) -> Result<(), ExtentError> {
        if self.locked {
            vwarn!("mutation rejected while a layout pass holds the lock");
            return Err(ExtentError::Locked);
        }
        Ok(())
    }

    /// Starts a layout pass and takes the lock.
    ///
    /// The lock is released when the returned [`LayoutPass`] is dropped.
    pub fn begin_layout(&mut self, frame: LayoutFrame) -> Result<LayoutPass<'_>, ExtentError> {
        self.check_unlocked()?;
        self.locked = true;
        self.notify(Changes::LOCK);
        self.push_batch();

        let had_frame = self.frame.is_some();
        self.frame = Some(frame);
        if frame.cross_axis_extent != self.estimate_cross_axis_extent {
            vdebug!(
                from = self.estimate_cross_axis_extent,
                to = frame.cross_axis_extent,
                "cross axis extent changed"
            );
            self.estimate_cross_axis_extent = frame.cross_axis_extent;
            self.table
                .reestimate(&*self.options.estimator, frame.cross_axis_extent);
            if had_frame {
                // Measured under the old cross axis extent; keep the values as best guesses.
                self.table.invalidate_all();
            }
            self.notify(Changes::EXTENTS);
        }

        if self.policy_handle.take() {
            self.notify(Changes::PRECALCULATION);
        }
        let precalculate = self.should_precalculate_extents();
        self.budget.begin_layout();
        vtrace!(
            scroll_offset = frame.scroll_offset,
            precalculate,
            "begin_layout"
        );
        Ok(LayoutPass {
            manager: self,
            measured: 0,
            precalculate,
        })
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn end_layout(&mut self, measured: usize) {
        self.budget.end_layout();
        self.locked = false;
        vtrace!(
            measured,
            estimated = self.table.estimated_count(),
            "end_layout"
        );
        self.notify(Changes::LOCK);
        self.pop_batch();
    }

    /// Computes the scroll offset that reveals `index` (or `rect` inside it) at `alignment`.
    ///
    /// `alignment` 0.0 aligns the leading edges of the revealed region and the viewport, 1.0 the
    /// trailing edges, 0.5 centers the region.
    ///
    /// With `estimation_only == false`, estimated items between the cache area start and `index`
    /// are measured through [`ExtentListOptions::measure_item`] first, provided `index` is inside
    /// the cache area. Items further away keep their estimates.
    ///
    /// Before the viewport extent is known, every alignment degrades to leading alignment.
    ///
    /// Returns a non-finite value when `index` is out of bounds or `rect` is not finite on the
    /// scroll axis; callers must skip navigation in that case.
    pub fn offset_to_reveal(
        &mut self,
        index: usize,
        alignment: f64,
        rect: Option<Rect>,
        estimation_only: bool,
    ) -> f64 {
        if index >= self.table.len() {
            return f64::NAN;
        }
        if !estimation_only {
            self.measure_cache_area_through(index);
        }

        let item_start = self.table.start_of(index);
        let item_extent = self.table.get(index).map_or(0.0, |e| e.extent);
        let (leading, reveal_extent) = match rect {
            None => (0.0, item_extent),
            Some(rect) => {
                let (leading, extent) = rect.main_axis(self.options.axis);
                if !leading.is_finite() || !extent.is_finite() {
                    return f64::NAN;
                }
                let leading = leading.clamp(0.0, item_extent);
                (leading, extent.clamp(0.0, item_extent - leading))
            }
        };
        let reveal_start = item_start + leading;
        match self.frame.and_then(|f| f.viewport_extent) {
            Some(viewport) => reveal_start - alignment * (viewport - reveal_extent),
            // Unknown viewport: only leading alignment is meaningful.
            None => reveal_start,
        }
    }

    fn measure_cache_area_through(&mut self, index: usize) {
        let Some(measure) = self.options.measure_item.clone() else {
            return;
        };
        let Some(cache) = self.cache_range() else {
            return;
        };
        if !cache.contains(index) {
            return;
        }

        let cross = self.estimate_cross_axis_extent;
        let was_locked = core::mem::replace(&mut self.locked, true);
        let mut changed = false;
        for i in cache.start_index..=index {
            if !self.table.get(i).is_some_and(|e| e.is_estimated) {
                continue;
            }
            if let Some(extent) = measure(i, cross) {
                // `i` is in bounds: the cache range never exceeds the table.
                changed |= self.table.set_measured(i, extent).unwrap_or(false);
            }
        }
        self.locked = was_locked;
        if changed {
            self.notify(Changes::EXTENTS);
        }
    }
}

impl Drop for ExtentManager {
    fn drop(&mut self) {
        if let Some(policy) = self.policy.as_mut() {
            policy.on_detached();
        }
    }
}

impl fmt::Debug for ExtentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtentManager")
            .field("options", &self.options)
            .field("number_of_items", &self.table.len())
            .field("total_extent", &self.table.total_extent())
            .field(
                "number_of_items_with_estimated_extent",
                &self.table.estimated_count(),
            )
            .field("frame", &self.frame)
            .field("locked", &self.locked)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

fn same_hook(a: &Option<RequestLayout>, b: &Option<RequestLayout>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(feature = "std")]
fn default_budget(options: &ExtentListOptions) -> Box<dyn LayoutBudget + Send> {
    Box::new(crate::budget::TimeLayoutBudget::new(
        crate::budget::StdClock::default(),
        options.layout_budget,
    ))
}

#[cfg(not(feature = "std"))]
fn default_budget(_options: &ExtentListOptions) -> Box<dyn LayoutBudget + Send> {
    Box::new(crate::budget::ItemCountLayoutBudget::default())
}

/// A layout pass in progress. Holds the lock until dropped.
///
/// The driver reports measured extents here in increasing index order and consults
/// [`should_layout_next_item`](Self::should_layout_next_item) before each extra measurement.
pub struct LayoutPass<'a> {
    manager: &'a mut ExtentManager,
    measured: usize,
    precalculate: bool,
}

impl LayoutPass<'_> {
    pub fn frame(&self) -> LayoutFrame {
        // Set by `begin_layout` before the pass is created.
        self.manager.frame.unwrap_or_default()
    }

    pub fn manager(&self) -> &ExtentManager {
        self.manager
    }

    /// Reentrant access for callbacks running inside the pass. Mutations through it fail with
    /// [`ExtentError::Locked`].
    pub fn manager_mut(&mut self) -> &mut ExtentManager {
        self.manager
    }

    pub fn extent_for_index(&self, index: usize) -> ExtentEntry {
        self.manager.extent_for_index(index)
    }

    pub fn set_measured_extent(&mut self, index: usize, extent: f64) -> Result<(), ExtentError> {
        if self.manager.table.set_measured(index, extent)? {
            self.manager.notify(Changes::EXTENTS);
        }
        self.measured += 1;
        Ok(())
    }

    /// Updates the item count, keeping existing entries and estimating new ones.
    pub fn set_item_count(&mut self, item_count: usize) {
        let manager = &mut *self.manager;
        if manager.table.len() == item_count {
            return;
        }
        vdebug!(from = manager.table.len(), to = item_count, "set_item_count");
        manager.table.resize(
            item_count,
            &*manager.options.estimator,
            manager.estimate_cross_axis_extent,
        );
        manager.options.item_count = item_count;
        manager.precalculate_cursor = manager.precalculate_cursor.min(item_count);
        manager.notify(Changes::ITEM_COUNT | Changes::EXTENTS);
    }

    pub fn should_layout_next_item(&mut self) -> bool {
        self.manager.budget.should_layout_next_item()
    }

    /// The precalculation decision taken when the pass started.
    pub fn should_precalculate_extents(&self) -> bool {
        self.precalculate
    }

    /// Number of measurements reported during this pass.
    pub fn measured_count(&self) -> usize {
        self.measured
    }

    /// Measures estimated items outside the cache area while the policy allows it and the
    /// budget is not exhausted. Resumes where the previous pass stopped.
    ///
    /// Returns how many items were measured.
    pub fn precalculate(&mut self, mut measure: impl FnMut(usize, f64) -> f64) -> usize {
        if !self.precalculate {
            return 0;
        }
        let count = self.manager.table.len();
        if count == 0 {
            return 0;
        }
        let cache = self.manager.cache_range().unwrap_or(VirtualRange {
            start_index: 0,
            end_index: 0,
        });
        let cross = self.manager.estimate_cross_axis_extent;

        let mut index = self.manager.precalculate_cursor % count;
        let mut visited = 0usize;
        let mut measured = 0usize;
        while visited < count && self.manager.table.estimated_count() > 0 {
            let is_estimated = self.manager.table.get(index).is_some_and(|e| e.is_estimated);
            if is_estimated && !cache.contains(index) {
                if !self.should_layout_next_item() {
                    break;
                }
                let extent = measure(index, cross);
                self.set_measured_extent(index, extent).ok();
                measured += 1;
            }
            index = (index + 1) % count;
            visited += 1;
        }
        self.manager.precalculate_cursor = index;
        vtrace!(
            measured,
            remaining = self.manager.table.estimated_count(),
            "precalculate"
        );
        measured
    }

    /// Ends the pass. Equivalent to dropping it.
    pub fn finish(self) {}
}

impl Drop for LayoutPass<'_> {
    fn drop(&mut self) {
        self.manager.end_layout(self.measured);
    }
}

impl fmt::Debug for LayoutPass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutPass")
            .field("frame", &self.manager.frame)
            .field("measured", &self.measured)
            .field("precalculate", &self.precalculate)
            .finish()
    }
}
