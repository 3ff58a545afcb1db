// Example: turning "reveal item i" requests into scroll offsets.
use extent_list::{ExtentListOptions, ExtentManager, LayoutFrame, Rect};

fn main() {
    // The driver can measure items synchronously; here every row is 64 pixels tall.
    let options = ExtentListOptions::fixed(1_000, 48.0)
        .with_measure_item(Some(|_index: usize, _cross: f64| Some(64.0)));
    let mut m = ExtentManager::new(options);
    drop(
        m.begin_layout(LayoutFrame::new(0.0, 480.0, 360.0).with_cache_extent(240.0))
            .unwrap(),
    );

    for alignment in [0.0, 0.5, 1.0] {
        println!(
            "item 5 at alignment {alignment}: estimated={} authoritative={}",
            m.offset_to_reveal(5, alignment, None, true),
            m.offset_to_reveal(5, alignment, None, false),
        );
    }

    // Reveal only the lower half of item 8.
    let rect = Rect::new(0.0, 32.0, 360.0, 32.0);
    println!(
        "item 8 lower half, trailing: {}",
        m.offset_to_reveal(8, 1.0, Some(rect), false)
    );

    // Far items keep their estimates; out-of-range items have no offset.
    println!("item 900: {}", m.offset_to_reveal(900, 0.0, None, false));
    println!(
        "item 1000 is_finite: {}",
        m.offset_to_reveal(1_000, 0.0, None, false).is_finite()
    );
    println!(
        "estimated={} total={}",
        m.number_of_items_with_estimated_extent(),
        m.total_extent()
    );
}
