use crate::*;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use extent_list::{ExtentError, ExtentListOptions, ExtentManager, LayoutFrame};

/// A scroll position that records every `jump_to`.
#[derive(Clone, Debug, Default)]
struct RecordingPosition {
    inner: BasicScrollPosition,
    jumps: Rc<RefCell<Vec<f64>>>,
}

impl RecordingPosition {
    fn new(min: f64, max: f64, pixels: f64) -> Self {
        Self {
            inner: BasicScrollPosition::new(min, max).with_pixels(pixels),
            jumps: Rc::default(),
        }
    }
}

impl ScrollPosition for RecordingPosition {
    fn pixels(&self) -> f64 {
        self.inner.pixels
    }

    fn min_scroll_extent(&self) -> f64 {
        self.inner.min_scroll_extent
    }

    fn max_scroll_extent(&self) -> f64 {
        self.inner.max_scroll_extent
    }

    fn jump_to(&mut self, pixels: f64) {
        self.jumps.borrow_mut().push(pixels);
        self.inner.pixels = pixels;
    }
}

/// 100 items of 100, laid out in a 200 viewport: scroll extents `[0, 9800]`.
fn controller() -> ListController {
    let mut manager = ExtentManager::new(ExtentListOptions::fixed(100, 100.0));
    drop(manager.begin_layout(LayoutFrame::new(0.0, 200.0, 300.0)).unwrap());
    ListController::with_manager(manager)
}

fn fixed_index(index: usize) -> impl Fn() -> Option<usize> + 'static {
    move || Some(index)
}

#[test]
fn detached_controller_reports_not_attached() {
    let mut c = ListController::new();
    assert!(!c.is_attached());
    assert_eq!(c.total_extent(), Err(ExtentError::NotAttached));
    assert_eq!(c.notify_item_inserted(0), Err(ExtentError::NotAttached));
    assert_eq!(c.jump_to_item(0, 0.0, None), Err(ExtentError::NotAttached));
    assert_eq!(
        c.animate_to_item(fixed_index(0), 0.0, None, |_| 100, |_| Curve::Linear, 0)
            .err(),
        Some(ExtentError::NotAttached)
    );
    assert!(!c.tick(16));

    c.attach(ExtentManager::new(ExtentListOptions::fixed(3, 10.0)));
    assert_eq!(c.total_extent(), Ok(30.0));
    assert!(c.detach().is_some());
    assert_eq!(c.number_of_items(), Err(ExtentError::NotAttached));
}

#[test]
fn mutations_delegate_to_manager() {
    let mut c = controller();
    c.notify_item_inserted(0).unwrap();
    assert_eq!(c.number_of_items(), Ok(101));
    c.notify_item_removed(100).unwrap();
    assert_eq!(
        c.notify_item_removed(100),
        Err(ExtentError::Index {
            index: 100,
            len: 100,
        })
    );
    c.manager_mut().unwrap().set_measured_extent(0, 50.0).unwrap();
    c.invalidate_extent(0).unwrap();
    assert_eq!(c.number_of_items_with_estimated_extent(), Ok(100));
    assert_eq!(c.total_extent(), Ok(9_950.0));
}

#[test]
fn jump_moves_every_position() {
    let mut c = controller();
    let a = RecordingPosition::new(0.0, 9_800.0, 0.0);
    let b = RecordingPosition::new(0.0, 9_800.0, 300.0);
    let (a_jumps, b_jumps) = (a.jumps.clone(), b.jumps.clone());
    let a = c.attach_position(a);
    let b = c.attach_position(b);

    c.jump_to_item(10, 0.5, None).unwrap();
    assert_eq!(*a_jumps.borrow(), [950.0]);
    assert_eq!(*b_jumps.borrow(), [950.0]);
    assert_eq!(c.position(a).map(|p| p.pixels()), Some(950.0));
    assert_eq!(c.position(b).map(|p| p.pixels()), Some(950.0));
}

#[test]
fn jump_pinned_at_min_does_not_touch_position() {
    let mut c = controller();
    let p = RecordingPosition::new(0.0, 9_800.0, 0.0);
    let jumps = p.jumps.clone();
    c.attach_position(p);

    // Item 0 trailing-aligned wants -100: beyond the min edge the position rests on.
    c.jump_to_item(0, 1.0, None).unwrap();
    c.jump_to_item(0, 0.0, None).unwrap();
    assert!(jumps.borrow().is_empty());
}

#[test]
fn jump_pinned_at_max_does_not_touch_position() {
    let mut c = controller();
    let p = RecordingPosition::new(0.0, 9_800.0, 9_800.0);
    let jumps = p.jumps.clone();
    c.attach_position(p);

    c.jump_to_item(99, 0.0, None).unwrap();
    assert!(jumps.borrow().is_empty());

    c.jump_to_item(50, 0.0, None).unwrap();
    assert_eq!(*jumps.borrow(), [5_000.0]);
}

#[test]
fn jump_to_missing_item_is_a_no_op() {
    let mut c = controller();
    let p = RecordingPosition::new(0.0, 9_800.0, 500.0);
    let jumps = p.jumps.clone();
    c.attach_position(p);

    c.jump_to_item(100, 0.0, None).unwrap();
    assert!(jumps.borrow().is_empty());
    assert!(!c.compute_offset_to_reveal(100, 0.0, None, true).unwrap().is_finite());
}

#[test]
fn jump_clamps_when_configured() {
    let mut c = controller();
    c.manager_mut()
        .unwrap()
        .update_options(|o| o.clamp_final_offset = true)
        .unwrap();
    let p = RecordingPosition::new(0.0, 9_800.0, 500.0);
    let jumps = p.jumps.clone();
    c.attach_position(p);

    c.jump_to_item(99, 0.0, None).unwrap();
    assert_eq!(*jumps.borrow(), [9_800.0]);
}

#[test]
fn animation_reaches_target_and_completes() {
    let mut c = controller();
    let p = RecordingPosition::new(0.0, 9_800.0, 0.0);
    let jumps = p.jumps.clone();
    let id = c.attach_position(p);

    let seen_distance = Rc::new(Cell::new(0.0));
    let sink = seen_distance.clone();
    let completion = c
        .animate_to_item(
            fixed_index(20),
            0.0,
            None,
            move |distance| {
                sink.set(distance);
                100
            },
            |_| Curve::Linear,
            1_000,
        )
        .unwrap();
    assert_eq!(seen_distance.get(), 2_000.0);
    assert!(c.is_animating());
    assert_eq!(completion.pending(), 1);
    assert_eq!(c.animations().next().map(|t| t.state()), Some(AnimationState::Created));

    assert!(c.tick(1_050));
    assert_eq!(c.animations().next().map(|t| t.state()), Some(AnimationState::Running));
    assert_eq!(c.position(id).map(|p| p.pixels()), Some(1_000.0));

    assert!(!c.tick(1_100));
    assert_eq!(c.position(id).map(|p| p.pixels()), Some(2_000.0));
    assert_eq!(*jumps.borrow(), [1_000.0, 2_000.0]);
    assert!(!c.is_animating());
    assert_eq!(
        completion.outcome(),
        Some(AnimationOutcome {
            completed: 1,
            cancelled: 0,
        })
    );
}

#[test]
fn animation_follows_a_moving_item() {
    let mut c = controller();
    let id = c.attach_position(BasicScrollPosition::new(0.0, 9_800.0));
    let target = Rc::new(Cell::new(Some(10)));
    let getter = target.clone();

    c.animate_to_item(move || getter.get(), 0.0, None, |_| 100, |_| Curve::Linear, 0)
        .unwrap();
    assert!(c.tick(50));
    assert_eq!(c.position(id).map(|p| p.pixels()), Some(500.0));

    // Two items were inserted above the target.
    c.notify_item_inserted(0).unwrap();
    c.notify_item_inserted(0).unwrap();
    target.set(Some(12));
    assert!(!c.tick(100));
    assert_eq!(c.position(id).map(|p| p.pixels()), Some(1_200.0));
}

#[test]
fn missing_target_cancels_within_one_tick() {
    let mut c = controller();
    let p = RecordingPosition::new(0.0, 9_800.0, 0.0);
    let jumps = p.jumps.clone();
    c.attach_position(p);
    let target = Rc::new(Cell::new(Some(30)));
    let getter = target.clone();

    let completion = c
        .animate_to_item(move || getter.get(), 0.0, None, |_| 1_000, |_| Curve::EaseInOut, 0)
        .unwrap();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    completion.on_complete(move |outcome| {
        assert!(outcome.was_cancelled());
        counter.set(counter.get() + 1);
    });

    assert!(c.tick(100));
    let moved = jumps.borrow().len();
    target.set(None);
    assert!(!c.tick(200));
    assert_eq!(jumps.borrow().len(), moved);
    assert!(!c.is_animating());
    assert_eq!(calls.get(), 1);

    c.tick(300);
    c.dispose();
    assert_eq!(calls.get(), 1);
    assert_eq!(
        completion.outcome(),
        Some(AnimationOutcome {
            completed: 0,
            cancelled: 1,
        })
    );
}

#[test]
fn dispose_cancels_every_task_once() {
    let mut c = controller();
    for _ in 0..3 {
        c.attach_position(BasicScrollPosition::new(0.0, 9_800.0));
    }
    let completion = c
        .animate_to_item(fixed_index(40), 0.5, None, |_| 500, |_| Curve::SmoothStep, 0)
        .unwrap();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    completion.on_complete(move |_| counter.set(counter.get() + 1));

    assert!(c.tick(100));
    assert_eq!(completion.pending(), 3);
    c.dispose();
    assert!(!c.is_animating());
    assert_eq!(c.animations().len(), 0);
    assert_eq!(calls.get(), 1);
    assert_eq!(
        completion.outcome(),
        Some(AnimationOutcome {
            completed: 0,
            cancelled: 3,
        })
    );

    c.dispose();
    drop(c);
    assert_eq!(calls.get(), 1);
}

#[test]
fn detach_disposes_animations() {
    let mut c = controller();
    c.attach_position(BasicScrollPosition::new(0.0, 9_800.0));
    let completion = c
        .animate_to_item(fixed_index(5), 0.0, None, |_| 500, |_| Curve::Linear, 0)
        .unwrap();
    let manager = c.detach();
    assert!(manager.is_some());
    assert!(completion.is_complete());
    assert!(!c.tick(600));
}

#[test]
fn new_animation_or_jump_cancels_the_running_one() {
    let mut c = controller();
    c.attach_position(BasicScrollPosition::new(0.0, 9_800.0));
    let first = c
        .animate_to_item(fixed_index(5), 0.0, None, |_| 500, |_| Curve::Linear, 0)
        .unwrap();
    let second = c
        .animate_to_item(fixed_index(6), 0.0, None, |_| 500, |_| Curve::Linear, 0)
        .unwrap();
    assert!(first.outcome().is_some_and(|o| o.was_cancelled()));
    assert_eq!(c.animations().len(), 1);

    c.jump_to_item(7, 0.0, None).unwrap();
    assert!(second.outcome().is_some_and(|o| o.was_cancelled()));
    assert!(!c.is_animating());
}

#[test]
fn detaching_a_position_cancels_only_its_task() {
    let mut c = controller();
    let a = c.attach_position(BasicScrollPosition::new(0.0, 9_800.0));
    let b = c.attach_position(BasicScrollPosition::new(0.0, 9_800.0));
    let completion = c
        .animate_to_item(fixed_index(8), 0.0, None, |_| 100, |_| Curve::EaseOut, 0)
        .unwrap();

    assert!(c.detach_position(a).is_some());
    assert!(c.detach_position(a).is_none());
    assert_eq!(completion.pending(), 1);

    assert!(!c.tick(100));
    assert_eq!(c.position(b).map(|p| p.pixels()), Some(800.0));
    assert_eq!(
        completion.outcome(),
        Some(AnimationOutcome {
            completed: 1,
            cancelled: 1,
        })
    );
}

#[test]
fn intermediate_frames_are_clamped_and_final_frame_is_not() {
    let mut c = controller();
    // Scroll extents shorter than the content.
    let id = c.attach_position(BasicScrollPosition::new(0.0, 1_000.0));
    c.animate_to_item(fixed_index(50), 0.0, None, |_| 100, |_| Curve::Linear, 0)
        .unwrap();

    assert!(c.tick(50));
    assert_eq!(c.position(id).map(|p| p.pixels()), Some(500.0));
    assert!(!c.tick(100));
    assert_eq!(c.position(id).map(|p| p.pixels()), Some(5_000.0));
}

#[test]
fn intermediate_frames_use_estimates_and_final_frame_measures() {
    let options = ExtentListOptions::fixed(100, 100.0)
        .with_measure_item(Some(|_: usize, _: f64| Some(50.0)));
    let mut manager = ExtentManager::new(options);
    let frame = LayoutFrame::new(0.0, 200.0, 300.0).with_cache_extent(1_000.0);
    drop(manager.begin_layout(frame).unwrap());
    let mut c = ListController::with_manager(manager);
    let id = c.attach_position(BasicScrollPosition::new(0.0, 9_800.0));
    c.animate_to_item(fixed_index(10), 0.0, None, |_| 100, |_| Curve::Linear, 0)
        .unwrap();

    // Estimated target 1000, nothing measured yet.
    assert!(c.tick(40));
    assert_eq!(c.position(id).map(|p| p.pixels()), Some(400.0));
    assert_eq!(c.number_of_items_with_estimated_extent(), Ok(100));

    // Items 0..=10 are measured at 50 before the last frame.
    assert!(!c.tick(100));
    assert_eq!(c.position(id).map(|p| p.pixels()), Some(500.0));
    assert_eq!(c.number_of_items_with_estimated_extent(), Ok(89));
}

#[test]
fn final_frame_is_clamped_when_configured() {
    let mut c = controller();
    c.manager_mut()
        .unwrap()
        .update_options(|o| o.clamp_final_offset = true)
        .unwrap();
    let id = c.attach_position(BasicScrollPosition::new(0.0, 1_000.0));
    c.animate_to_item(fixed_index(50), 0.0, None, |_| 100, |_| Curve::Linear, 0)
        .unwrap();
    assert!(!c.tick(100));
    assert_eq!(c.position(id).map(|p| p.pixels()), Some(1_000.0));
}

#[test]
fn animation_without_positions_completes_immediately() {
    let mut c = controller();
    let completion = c
        .animate_to_item(fixed_index(3), 0.0, None, |_| 100, |_| Curve::Linear, 0)
        .unwrap();
    assert!(completion.is_complete());
    assert_eq!(completion.outcome(), Some(AnimationOutcome::default()));
    assert!(!c.is_animating());
}

#[test]
fn curves_pass_through_endpoints() {
    let curves = [
        Curve::Linear,
        Curve::EaseIn,
        Curve::EaseOut,
        Curve::EaseInOut,
        Curve::SmoothStep,
        Curve::EaseInOutCubic,
    ];
    for curve in curves {
        assert_eq!(curve.transform(0.0), 0.0, "{curve:?}");
        assert_eq!(curve.transform(1.0), 1.0, "{curve:?}");
        assert_eq!(curve.transform(2.0), 1.0, "{curve:?}");
        assert_eq!(curve.transform(-1.0), 0.0, "{curve:?}");

        let mut last = 0.0;
        for step in 1..=20 {
            let value = curve.transform(step as f64 / 20.0);
            assert!(value >= last, "{curve:?} is not monotonic");
            last = value;
        }
    }
    assert_eq!(Curve::EaseInOut.transform(0.5), 0.5);
    assert_eq!(Curve::EaseIn.transform(0.5), 0.25);
}
