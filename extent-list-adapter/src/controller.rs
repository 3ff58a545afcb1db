use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use extent_list::{ExtentEntry, ExtentError, ExtentManager, Rect, VirtualRange};

use crate::position::{clamp_to_extents, pinned_past_edge};
use crate::task::CompletionShared;
use crate::{
    AnimationCompletion, AnimationState, AnimationTask, Curve, IndexGetter, ScrollPosition,
};

/// Identifies a scroll position attached with [`ListController::attach_position`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionId(u64);

/// A framework-neutral list controller: queries, mutations and navigation over an attached
/// [`ExtentManager`] and any number of scroll positions.
///
/// This type does not hold any UI objects. Adapters drive it by:
/// - running layout passes through [`manager_mut`](Self::manager_mut)
/// - calling [`tick`](Self::tick) every frame while [`is_animating`](Self::is_animating)
///
/// Every operation fails with [`ExtentError::NotAttached`] until a manager is attached.
pub struct ListController {
    manager: Option<ExtentManager>,
    positions: Vec<(PositionId, Box<dyn ScrollPosition>)>,
    next_position_id: u64,
    tasks: Vec<AnimationTask>,
}

impl ListController {
    /// Creates a detached controller.
    pub fn new() -> Self {
        Self {
            manager: None,
            positions: Vec::new(),
            next_position_id: 0,
            tasks: Vec::new(),
        }
    }

    pub fn with_manager(manager: ExtentManager) -> Self {
        let mut c = Self::new();
        c.manager = Some(manager);
        c
    }

    /// Attaches `manager`, returning the previously attached one.
    ///
    /// Animations driven by the previous manager are cancelled.
    pub fn attach(&mut self, manager: ExtentManager) -> Option<ExtentManager> {
        let previous = self.detach();
        self.manager = Some(manager);
        vdebug!("ListController::attach");
        previous
    }

    /// Cancels every animation and hands the manager back.
    pub fn detach(&mut self) -> Option<ExtentManager> {
        self.dispose();
        self.manager.take()
    }

    pub fn is_attached(&self) -> bool {
        self.manager.is_some()
    }

    pub fn manager(&self) -> Result<&ExtentManager, ExtentError> {
        self.manager.as_ref().ok_or(ExtentError::NotAttached)
    }

    pub fn manager_mut(&mut self) -> Result<&mut ExtentManager, ExtentError> {
        self.manager.as_mut().ok_or(ExtentError::NotAttached)
    }

    pub fn number_of_items(&self) -> Result<usize, ExtentError> {
        Ok(self.manager()?.number_of_items())
    }

    pub fn total_extent(&self) -> Result<f64, ExtentError> {
        Ok(self.manager()?.total_extent())
    }

    pub fn number_of_items_with_estimated_extent(&self) -> Result<usize, ExtentError> {
        Ok(self.manager()?.number_of_items_with_estimated_extent())
    }

    pub fn extent_for_index(&self, index: usize) -> Result<ExtentEntry, ExtentError> {
        Ok(self.manager()?.extent_for_index(index))
    }

    pub fn visible_range(&self) -> Result<Option<VirtualRange>, ExtentError> {
        Ok(self.manager()?.visible_range())
    }

    pub fn unobstructed_visible_range(&self) -> Result<Option<VirtualRange>, ExtentError> {
        Ok(self.manager()?.unobstructed_visible_range())
    }

    pub fn is_locked(&self) -> Result<bool, ExtentError> {
        Ok(self.manager()?.is_locked())
    }

    pub fn invalidate_extent(&mut self, index: usize) -> Result<(), ExtentError> {
        self.manager_mut()?.invalidate_extent(index)
    }

    pub fn invalidate_all_extents(&mut self) -> Result<(), ExtentError> {
        self.manager_mut()?.invalidate_all_extents()
    }

    /// Tells the list an item was inserted at `index`.
    pub fn notify_item_inserted(&mut self, index: usize) -> Result<(), ExtentError> {
        self.manager_mut()?.add_item(index)
    }

    /// Tells the list the item at `index` was removed.
    pub fn notify_item_removed(&mut self, index: usize) -> Result<(), ExtentError> {
        self.manager_mut()?.remove_item(index)
    }

    pub fn attach_position(&mut self, position: impl ScrollPosition + 'static) -> PositionId {
        let id = PositionId(self.next_position_id);
        self.next_position_id += 1;
        self.positions.push((id, Box::new(position)));
        id
    }

    /// Detaches a position, cancelling its animation.
    pub fn detach_position(&mut self, id: PositionId) -> Option<Box<dyn ScrollPosition>> {
        let slot = self.positions.iter().position(|(other, _)| *other == id)?;
        self.cancel_tasks(|task| task.position() == id);
        Some(self.positions.remove(slot).1)
    }

    pub fn position(&self, id: PositionId) -> Option<&dyn ScrollPosition> {
        self.positions
            .iter()
            .find(|(other, _)| *other == id)
            .map(|(_, p)| &**p)
    }

    pub fn position_mut(
        &mut self,
        id: PositionId,
    ) -> Option<&mut (dyn ScrollPosition + 'static)> {
        self.positions
            .iter_mut()
            .find(|(other, _)| *other == id)
            .map(|(_, p)| &mut **p)
    }

    pub fn position_ids(&self) -> impl ExactSizeIterator<Item = PositionId> + '_ {
        self.positions.iter().map(|(id, _)| *id)
    }

    /// See [`ExtentManager::offset_to_reveal`].
    pub fn compute_offset_to_reveal(
        &mut self,
        index: usize,
        alignment: f64,
        rect: Option<Rect>,
        estimation_only: bool,
    ) -> Result<f64, ExtentError> {
        Ok(self
            .manager_mut()?
            .offset_to_reveal(index, alignment, rect, estimation_only))
    }

    /// Moves every attached position so that `index` (or `rect` inside it) is revealed at
    /// `alignment`, cancelling their animations.
    ///
    /// Nothing happens when no offset exists for `index`. A position resting on its min (max)
    /// edge is left alone when the target lies at or beyond that edge.
    pub fn jump_to_item(
        &mut self,
        index: usize,
        alignment: f64,
        rect: Option<Rect>,
    ) -> Result<(), ExtentError> {
        let manager = self.manager.as_mut().ok_or(ExtentError::NotAttached)?;
        let offset = manager.offset_to_reveal(index, alignment, rect, false);
        if !offset.is_finite() {
            vdebug!(index, "jump_to_item: no offset for index");
            return Ok(());
        }
        let clamp = manager.options().clamp_final_offset;

        self.cancel_tasks(|_| true);
        for (_id, position) in &mut self.positions {
            let target = if clamp {
                clamp_to_extents(&**position, offset)
            } else {
                offset
            };
            if pinned_past_edge(&**position, target) {
                vtrace!(position = _id.0, offset = target, "jump_to_item: pinned at edge");
                continue;
            }
            position.jump_to(target);
        }
        Ok(())
    }

    /// Animates every attached position towards the item returned by `index`.
    ///
    /// `index` is re-read on every [`tick`](Self::tick), so the animation follows an item that
    /// moves while it runs; returning `None` cancels it. `duration_ms` and `curve` receive the
    /// estimated scroll distance of each position. Animations already running are cancelled.
    pub fn animate_to_item(
        &mut self,
        index: impl Fn() -> Option<usize> + 'static,
        alignment: f64,
        rect: Option<Rect>,
        duration_ms: impl Fn(f64) -> u64,
        curve: impl Fn(f64) -> Curve,
        now_ms: u64,
    ) -> Result<AnimationCompletion, ExtentError> {
        if self.manager.is_none() {
            return Err(ExtentError::NotAttached);
        }
        self.cancel_tasks(|_| true);

        let shared = CompletionShared::new(self.positions.len());
        let completion = AnimationCompletion::new(shared.clone());
        let index: IndexGetter = Rc::new(index);

        let estimated = match (index)() {
            Some(i) => self
                .manager
                .as_mut()
                .map_or(f64::NAN, |m| m.offset_to_reveal(i, alignment, rect, true)),
            None => f64::NAN,
        };

        for (id, position) in &self.positions {
            let from = position.pixels();
            let distance = if estimated.is_finite() {
                (estimated - from).abs()
            } else {
                0.0
            };
            self.tasks.push(AnimationTask::new(
                *id,
                index.clone(),
                alignment,
                rect,
                from,
                now_ms,
                duration_ms(distance),
                curve(distance),
                shared.clone(),
            ));
        }
        vdebug!(
            positions = self.positions.len(),
            offset = estimated,
            "animate_to_item"
        );
        Ok(completion)
    }

    pub fn is_animating(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn animations(&self) -> impl ExactSizeIterator<Item = &AnimationTask> + '_ {
        self.tasks.iter()
    }

    /// Advances every animation to `now_ms`. Returns `true` while animations remain.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let Some(manager) = self.manager.as_mut() else {
            return false;
        };
        if self.tasks.is_empty() {
            return false;
        }
        let clamp_final = manager.options().clamp_final_offset;

        let tasks = core::mem::take(&mut self.tasks);
        let mut remaining = Vec::with_capacity(tasks.len());
        for mut task in tasks {
            let Some(index) = task.target_index() else {
                vdebug!(position = task.position().0, "animation cancelled: target is gone");
                task.finish(AnimationState::Cancelled);
                continue;
            };
            let Some(position) = self
                .positions
                .iter_mut()
                .find(|(id, _)| *id == task.position())
                .map(|(_, p)| p)
            else {
                task.finish(AnimationState::Cancelled);
                continue;
            };
            task.mark_running();

            let t = task.progress(now_ms);
            let done = t >= 1.0;
            let target = manager.offset_to_reveal(index, task.alignment(), task.rect(), !done);
            if target.is_finite() {
                let target = if !done || clamp_final {
                    clamp_to_extents(&**position, target)
                } else {
                    target
                };
                let from = task.from();
                let value = from + (target - from) * task.curve().transform(t);
                if !pinned_past_edge(&**position, value) {
                    position.jump_to(value);
                }
            }

            if done {
                vtrace!(position = task.position().0, "animation completed");
                task.finish(AnimationState::Completed);
            } else {
                remaining.push(task);
            }
        }
        self.tasks = remaining;
        !self.tasks.is_empty()
    }

    /// Cancels every animation. Each completion is notified exactly once.
    pub fn dispose(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        vdebug!(tasks = self.tasks.len(), "ListController::dispose");
        self.cancel_tasks(|_| true);
    }

    fn cancel_tasks(&mut self, mut matches: impl FnMut(&AnimationTask) -> bool) {
        // Completion callbacks run after the controller state is consistent again.
        let snapshot = core::mem::take(&mut self.tasks);
        let mut cancelled = Vec::new();
        for task in snapshot {
            if matches(&task) {
                cancelled.push(task);
            } else {
                self.tasks.push(task);
            }
        }
        for task in cancelled {
            task.finish(AnimationState::Cancelled);
        }
    }
}

impl Default for ListController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ListController {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ListController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListController")
            .field("manager", &self.manager)
            .field("positions", &self.positions.len())
            .field("tasks", &self.tasks)
            .finish()
    }
}
