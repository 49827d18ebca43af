// Example: calibrate a height model from a first sample, then refine it.
use dynvirt::{Geometry, HeightModel, ListOptions, PositionAssigner, PositionMode, WindowCalculator};

fn main() {
    let options = ListOptions::default();
    let mut heights = HeightModel::new(1_000, options.item_height);
    println!(
        "nominal: average={} total={}",
        heights.average(),
        heights.total()
    );

    // The first rendered rows come back taller than the nominal height.
    let sample: Vec<Geometry> = (0..10).map(|i| Geometry::new(i, 115.0 + i as f64)).collect();
    let out = heights.record_batch(sample, true);
    println!(
        "initial pass: changed={} average={} total={}",
        out.changed,
        heights.average(),
        heights.total()
    );

    // Map a scroll offset to a window.
    let mut window = WindowCalculator::new();
    let visible = window
        .on_scroll(&heights, 48_000.0, &options)
        .unwrap_or_else(|| window.window(&options, heights.len()));
    println!("window for offset 48000: {visible:?}");

    // A later refinement pass only nudges the average.
    let refine: Vec<Geometry> = (visible.start_index..visible.end_index)
        .map(|i| Geometry::new(i, 140.0))
        .collect();
    heights.record_batch(refine, false);
    println!("after refinement: average={:.2}", heights.average());

    let mut items: Vec<dynvirt::MaterializedItem<usize>> = (visible.start_index..visible.end_index)
        .enumerate()
        .map(|(virtual_index, index)| dynvirt::MaterializedItem {
            payload: index,
            index,
            virtual_index,
            translate_y: 0.0,
            item_height: 0.0,
        })
        .collect();
    PositionAssigner::new(PositionMode::Absolute).stamp(&mut items, &heights);
    for it in items.iter().take(3) {
        println!(
            "item {} at y={} (h={})",
            it.index, it.translate_y, it.item_height
        );
    }
}
