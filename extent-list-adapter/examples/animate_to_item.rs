use std::cell::Cell;
use std::rc::Rc;

use extent_list::{ExtentListOptions, ExtentManager, LayoutFrame};
use extent_list_adapter::{BasicScrollPosition, Curve, ListController};

fn main() {
    // Example: a headless adapter animating to an item while the list changes underneath.
    //
    // An adapter would:
    // - run layout passes through `manager_mut()` when the UI lays out
    // - call tick(now_ms) in a frame loop / timer while `is_animating()`
    // - mirror the scroll position into the real scroll container (if any)
    let mut manager = ExtentManager::new(ExtentListOptions::fixed(10_000, 20.0));
    drop(manager.begin_layout(LayoutFrame::new(0.0, 400.0, 300.0)).unwrap());

    let mut c = ListController::with_manager(manager);
    let max = c.total_extent().unwrap() - 400.0;
    let id = c.attach_position(BasicScrollPosition::new(0.0, max));

    let target = Rc::new(Cell::new(Some(2_000)));
    let getter = target.clone();
    let completion = c
        .animate_to_item(
            move || getter.get(),
            0.5,
            None,
            |distance| (distance / 100.0).clamp(150.0, 600.0) as u64,
            |_| Curve::EaseInOutCubic,
            0,
        )
        .unwrap();
    completion.on_complete(|outcome| println!("done: {outcome:?}"));

    let mut now_ms = 0u64;
    while c.is_animating() {
        now_ms += 16;
        if now_ms == 160 {
            // Items were prepended: the target moved down by ten rows.
            for _ in 0..10 {
                c.notify_item_inserted(0).unwrap();
            }
            target.set(target.get().map(|i| i + 10));
        }
        c.tick(now_ms);
        if now_ms % 80 == 0 {
            println!(
                "t={now_ms} pixels={:?}",
                c.position(id).map(|p| p.pixels())
            );
        }
    }
    println!("final pixels={:?}", c.position(id).map(|p| p.pixels()));
}
