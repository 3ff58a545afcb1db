// Example: a layout driver spreading measurement work over several passes.
use extent_list::{
    AlwaysPrecalculate, ExtentListOptions, ExtentManager, ItemCountLayoutBudget, LayoutFrame,
};

fn main() {
    let mut m = ExtentManager::new(ExtentListOptions::fixed(200, 40.0));
    m.set_layout_budget(ItemCountLayoutBudget::new(32));
    m.set_precalculation_policy(Some(AlwaysPrecalculate));
    m.add_listener(|m, changes| {
        println!(
            "changes={changes:?} total={} estimated={}",
            m.total_extent(),
            m.number_of_items_with_estimated_extent()
        );
    });

    // Pretend item `i` renders at `30 + i % 5 * 10` pixels.
    let measure = |index: usize, _cross: f64| 30.0 + (index % 5) as f64 * 10.0;
    let frame = LayoutFrame::new(0.0, 400.0, 320.0).with_cache_extent(100.0);

    let mut passes = 0;
    while m.number_of_items_with_estimated_extent() > 0 {
        passes += 1;
        let mut pass = m.begin_layout(frame).unwrap();
        let cache = pass.manager().cache_range().expect("set by begin_layout");
        for index in cache.start_index..cache.end_index {
            pass.set_measured_extent(index, measure(index, frame.cross_axis_extent))
                .unwrap();
        }
        let extra = pass.precalculate(measure);
        println!("pass {passes}: cache={cache:?} precalculated={extra}");
    }

    println!(
        "done after {passes} passes: total={} offset(150)={}",
        m.total_extent(),
        m.offset_to_reveal(150, 0.5, None, true)
    );
}
