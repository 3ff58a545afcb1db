use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use extent_list::Rect;

use crate::{Curve, PositionId};

/// Returns the item an animation is heading to, re-read on every tick.
///
/// Returning `None` cancels the animation (e.g. the item was deleted).
pub type IndexGetter = Rc<dyn Fn() -> Option<usize>>;

/// Lifecycle of an [`AnimationTask`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnimationState {
    #[default]
    Created,
    Running,
    Completed,
    Cancelled,
}

impl AnimationState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// One scroll position animating towards a (possibly moving) item.
///
/// Duration and curve are fixed when the task is created, from the distance estimated at that
/// time. The target offset is recomputed every tick so the animation follows extent changes.
pub struct AnimationTask {
    position: PositionId,
    index: IndexGetter,
    alignment: f64,
    rect: Option<Rect>,
    from: f64,
    start_ms: u64,
    duration_ms: u64,
    curve: Curve,
    state: AnimationState,
    completion: Rc<CompletionShared>,
}

impl AnimationTask {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        position: PositionId,
        index: IndexGetter,
        alignment: f64,
        rect: Option<Rect>,
        from: f64,
        start_ms: u64,
        duration_ms: u64,
        curve: Curve,
        completion: Rc<CompletionShared>,
    ) -> Self {
        Self {
            position,
            index,
            alignment,
            rect,
            from,
            start_ms,
            duration_ms,
            curve,
            state: AnimationState::Created,
            completion,
        }
    }

    pub fn position(&self) -> PositionId {
        self.position
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn alignment(&self) -> f64 {
        self.alignment
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// Scroll offset the animation started from.
    pub fn from(&self) -> f64 {
        self.from
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Linear progress in `[0, 1]`. A zero duration is immediately done.
    pub fn progress(&self, now_ms: u64) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms);
        (elapsed as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    pub(crate) fn target_index(&self) -> Option<usize> {
        (self.index)()
    }

    pub(crate) fn mark_running(&mut self) {
        if self.state == AnimationState::Created {
            self.state = AnimationState::Running;
        }
    }

    /// Consumes the task, reporting `state` to its completion exactly once.
    pub(crate) fn finish(self, state: AnimationState) {
        debug_assert!(state.is_finished());
        self.completion.task_finished(state);
    }
}

impl fmt::Debug for AnimationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationTask")
            .field("position", &self.position)
            .field("alignment", &self.alignment)
            .field("rect", &self.rect)
            .field("from", &self.from)
            .field("start_ms", &self.start_ms)
            .field("duration_ms", &self.duration_ms)
            .field("curve", &self.curve)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// How an animate request ended, counted per scroll position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationOutcome {
    pub completed: usize,
    pub cancelled: usize,
}

impl AnimationOutcome {
    pub fn was_cancelled(&self) -> bool {
        self.cancelled > 0
    }
}

type CompletionCallback = Box<dyn FnOnce(AnimationOutcome)>;

pub(crate) struct CompletionShared {
    pending: Cell<usize>,
    outcome: Cell<AnimationOutcome>,
    callback: RefCell<Option<CompletionCallback>>,
}

impl CompletionShared {
    pub(crate) fn new(tasks: usize) -> Rc<Self> {
        Rc::new(Self {
            pending: Cell::new(tasks),
            outcome: Cell::new(AnimationOutcome::default()),
            callback: RefCell::new(None),
        })
    }

    fn task_finished(&self, state: AnimationState) {
        let mut outcome = self.outcome.get();
        match state {
            AnimationState::Completed => outcome.completed += 1,
            _ => outcome.cancelled += 1,
        }
        self.outcome.set(outcome);

        let pending = self.pending.get();
        debug_assert!(pending > 0, "more tasks finished than were started");
        self.pending.set(pending.saturating_sub(1));
        if pending == 1 {
            let callback = self.callback.borrow_mut().take();
            if let Some(callback) = callback {
                callback(outcome);
            }
        }
    }
}

/// Completion signal returned by `ListController::animate_to_item`.
///
/// The request is complete once every scroll position it animated has completed or been
/// cancelled.
#[derive(Clone)]
pub struct AnimationCompletion {
    shared: Rc<CompletionShared>,
}

impl AnimationCompletion {
    pub(crate) fn new(shared: Rc<CompletionShared>) -> Self {
        Self { shared }
    }

    pub fn is_complete(&self) -> bool {
        self.shared.pending.get() == 0
    }

    /// Number of positions still animating.
    pub fn pending(&self) -> usize {
        self.shared.pending.get()
    }

    /// `Some` once the request is complete.
    pub fn outcome(&self) -> Option<AnimationOutcome> {
        self.is_complete().then(|| self.shared.outcome.get())
    }

    /// Registers `f` to run when the request completes. Runs `f` right away if it already has.
    ///
    /// Replaces a previously registered callback.
    pub fn on_complete(&self, f: impl FnOnce(AnimationOutcome) + 'static) {
        if self.is_complete() {
            f(self.shared.outcome.get());
            return;
        }
        *self.shared.callback.borrow_mut() = Some(Box::new(f));
    }
}

impl fmt::Debug for AnimationCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationCompletion")
            .field("pending", &self.shared.pending.get())
            .field("outcome", &self.shared.outcome.get())
            .finish()
    }
}
