// Example: drive a ListController from a simulated host with a frame clock.
use dynvirt_controller::{Geometry, ListController, ListOptions};

/// Pretend rendering: row height depends on the payload length.
fn rendered_height(text: &str) -> f64 {
    40.0 + 20.0 * (text.len() / 16) as f64
}

fn main() {
    let rows: Vec<String> = (0..5_000)
        .map(|i| "lorem ipsum ".repeat(1 + i % 7))
        .collect();

    let mut list = ListController::new(ListOptions::default().with_item_height(60.0))
        .expect("default options are valid");
    list.subscribe_height_changed(|e| {
        println!(
            "height changed: #{} {} -> {}",
            e.index, e.old_height, e.new_height
        )
    });
    list.set_items(rows, 0);
    println!(
        "window={:?} total={}",
        list.visible_window(),
        list.total_height()
    );

    let mut offset = 0.0;
    for frame in 0..120u64 {
        let now_ms = frame * 16;
        if frame == 1 {
            list.on_rendered(now_ms);
        }
        if (10..60).contains(&frame) {
            offset += 900.0;
            list.on_scroll(offset, now_ms);
        }

        if let Some(request) = list.tick(now_ms) {
            let geometry: Vec<Geometry> = list
                .items()
                .iter()
                .filter(|it| request.indices.contains(&it.index))
                .map(|it| Geometry::new(it.index, rendered_height(&it.payload)))
                .collect();
            match list.complete_measurement(&request, geometry) {
                Ok(out) => println!(
                    "frame {frame}: {:?} pass changed={} total={:.0}",
                    out.kind, out.changed, out.total_height
                ),
                Err(err) => println!("frame {frame}: {err}"),
            }
        }
    }

    let target = list.visible_window().start_index + 3;
    if let Ok(request) = list.update_element_height(target) {
        let _ = list.complete_measurement(&request, [Geometry::new(target, 400.0)]);
    }
    println!(
        "final window={:?} average={:.1} total={:.0}",
        list.visible_window(),
        list.average_height(),
        list.total_height()
    );
}
