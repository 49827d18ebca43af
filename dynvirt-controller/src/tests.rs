use crate::*;

use std::sync::{Arc, Mutex};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn controller(len: usize) -> ListController<u32> {
    let mut c = ListController::new(ListOptions::default()).unwrap();
    c.set_items((0..len as u32).collect(), 0);
    c
}

fn window(start_index: usize, end_index: usize) -> VisibleWindow {
    VisibleWindow {
        start_index,
        end_index,
    }
}

/// Answers a request with the same height for every requested item.
fn uniform(request: &MeasureRequest, height: f64) -> Vec<Geometry> {
    request
        .indices
        .iter()
        .map(|&i| Geometry::new(i, height))
        .collect()
}

fn recorded_events(c: &mut ListController<u32>) -> Arc<Mutex<Vec<HeightChanged>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    c.subscribe_height_changed(move |e| sink.lock().unwrap().push(*e));
    events
}

#[test]
fn initial_window_and_total_height() {
    let c = controller(1000);
    assert_eq!(c.visible_window(), window(0, 30));
    assert_close(c.total_height(), 100_000.0);
    assert_eq!(c.items().len(), 30);
    for (i, it) in c.items().iter().enumerate() {
        assert_eq!(it.index, i);
        assert_eq!(it.virtual_index, i);
        assert_eq!(it.z_index(), i);
        assert_eq!(*it.payload, i as u32);
        assert_close(it.translate_y, i as f64 * 100.0);
        assert_close(it.item_height, 100.0);
    }
    assert_eq!(c.scheduler_state(), SchedulerState::Scheduled);
}

#[test]
fn short_list_materializes_everything() {
    let c = controller(7);
    assert_eq!(c.visible_window(), window(0, 7));
    assert_close(c.total_height(), 700.0);
}

#[test]
fn initial_sample_calibrates_average() {
    let mut c = controller(1000);
    assert_eq!(c.tick(50), None);
    let req = c.tick(100).expect("initial pass");
    assert_eq!(req.kind, MeasureKind::Initial);
    assert_eq!(req.indices, (0..30).collect::<Vec<_>>());
    assert_eq!(c.scheduler_state(), SchedulerState::Measuring);

    let heights = [
        110.0, 130.0, 115.0, 125.0, 120.0, 120.0, 100.0, 140.0, 118.0, 122.0,
    ];
    let answer: Vec<(usize, f64)> = heights.iter().copied().enumerate().collect();
    let out = c.complete_measurement(&req, answer).unwrap();

    assert_eq!(out.first_changed, Some(0));
    assert_close(c.average_height(), 120.0);
    assert_close(c.total_height(), 1200.0 + 990.0 * 120.0);
    assert_close(out.total_height, c.total_height());
    assert_close(c.items()[10].translate_y, 1200.0);
    assert_close(c.items()[11].translate_y, 1320.0);
    assert_close(c.items()[1].item_height, 130.0);
    assert_eq!(c.scheduler_state(), SchedulerState::Idle);
}

#[test]
fn scroll_jump_recomputes_window_after_debounce() {
    let mut c = controller(1000);
    c.on_scroll(50_000.0, 10);
    assert!(c.is_scrolling());
    c.tick(20);
    assert_eq!(c.visible_window(), window(0, 30));

    c.tick(26);
    assert_eq!(c.visible_window(), window(490, 530));
    assert_eq!(c.current_index(), 500);
    assert_eq!(c.items().first().unwrap().index, 490);
    assert_close(c.items().first().unwrap().translate_y, 49_000.0);
    assert_eq!(c.items().len(), 40);
}

#[test]
fn repeated_offset_is_idempotent() {
    let mut c = controller(1000);
    c.on_scroll(12_345.0, 0);
    c.tick(16);
    let window_before = c.visible_window();
    let offsets_before: Vec<f64> = c.items().iter().map(|it| it.translate_y).collect();
    let revision = c.revision();

    c.on_scroll(12_345.0, 40);
    c.tick(56);
    assert_eq!(c.visible_window(), window_before);
    let offsets_after: Vec<f64> = c.items().iter().map(|it| it.translate_y).collect();
    assert_eq!(offsets_after, offsets_before);
    assert_eq!(c.revision(), revision);
}

#[test]
fn throttled_offset_is_applied_when_scrolling_settles() {
    let mut c = controller(1000);
    c.on_scroll(1_000.0, 0);
    c.on_scroll(70_000.0, 5); // dropped by the throttle
    c.tick(16);
    assert_eq!(c.current_index(), 10);

    // Quiet period elapses: the latest offset wins.
    c.tick(5 + 150);
    assert!(!c.is_scrolling());
    assert_eq!(c.current_index(), 700);
    assert_eq!(c.visible_window(), window(690, 730));
}

#[test]
fn continuous_pass_waits_for_scrolling_to_stop() {
    let mut c = controller(1000);
    let req = c.tick(100).unwrap();
    c.complete_measurement(&req, uniform(&req, 100.0)).unwrap();

    c.on_scroll(5_000.0, 200);
    assert_eq!(c.tick(216), None);
    assert_eq!(c.current_index(), 49);
    assert_eq!(c.scheduler_state(), SchedulerState::Scheduled);

    // Due at 316 but the user is still scrolling.
    assert_eq!(c.tick(316), None);
    assert_eq!(c.scheduler_state(), SchedulerState::Idle);

    // Scrolling settles at 350 and schedules a fresh pass.
    assert_eq!(c.tick(350), None);
    let req = c.tick(450).expect("continuous pass");
    assert_eq!(req.kind, MeasureKind::Continuous);
    assert_eq!(req.indices.first(), Some(&39));

    c.complete_measurement(&req, uniform(&req, 200.0)).unwrap();
    assert_close(c.average_height(), 0.7 * 100.0 + 0.3 * 200.0);
    assert_close(c.height_of(39), 200.0);
    assert_close(c.height_of(38), 100.0);
    let first = c.items().first().unwrap();
    assert_close(first.translate_y, 3_900.0);
    assert_close(c.items()[1].translate_y, 4_100.0);
}

#[test]
fn initial_pass_runs_while_scrolling() {
    let mut c = controller(1000);
    c.on_scroll(300.0, 90);
    let req = c.tick(100).expect("initial pass is not suppressed");
    assert!(c.is_scrolling());
    assert_eq!(req.kind, MeasureKind::Initial);
}

/// Scrolls 1000 units (ten nominal rows) per 16 ms frame, answering measurement requests with
/// nominal-height rows. Returns `(offset, anchor)` after each frame and the time the first
/// initial request came back.
fn scroll_steadily(
    c: &mut ListController<u32>,
    frames: u64,
    tick_first: bool,
) -> (Vec<(f64, usize)>, Option<u64>) {
    let mut trace = Vec::new();
    let mut initial_at = None;
    for frame in 1..=frames {
        let now = frame * 16;
        let offset = frame as f64 * 1_000.0;
        let req = if tick_first {
            let req = c.tick(now);
            c.on_scroll(offset, now);
            req
        } else {
            c.on_scroll(offset, now);
            c.tick(now)
        };
        if let Some(req) = req {
            if req.kind == MeasureKind::Initial && initial_at.is_none() {
                initial_at = Some(now);
            }
            c.complete_measurement(&req, uniform(&req, 100.0)).unwrap();
        }
        trace.push((offset, c.current_index()));
    }
    (trace, initial_at)
}

fn assert_window_tracks_offset(trace: &[(f64, usize)]) {
    // From the second frame on the anchor may trail the viewport by at most one frame.
    for &(offset, anchor) in &trace[1..] {
        let target = (offset / 100.0) as usize;
        assert!(anchor <= target, "anchor {anchor} ahead of offset {offset}");
        assert!(anchor + 11 >= target, "anchor {anchor} lags offset {offset}");
    }
}

#[test]
fn window_follows_sustained_scrolling_when_tick_follows_scroll() {
    let mut c = controller(10_000);
    let (trace, _) = scroll_steadily(&mut c, 60, false);
    assert!(c.is_scrolling());
    assert_window_tracks_offset(&trace);
    assert!(c.visible_window().contains(590));
}

#[test]
fn window_follows_sustained_scrolling_when_tick_precedes_scroll() {
    let mut c = controller(10_000);
    let (trace, _) = scroll_steadily(&mut c, 60, true);
    assert!(c.is_scrolling());
    assert_window_tracks_offset(&trace);
    assert!(c.visible_window().contains(590));
}

#[test]
fn initial_pass_is_not_postponed_by_window_changes() {
    for tick_first in [false, true] {
        let mut c = controller(10_000);
        let (_, initial_at) = scroll_steadily(&mut c, 60, tick_first);
        let at = initial_at.expect("initial pass ran during scrolling");
        // Due at 100; the first frame at or after that is 112.
        assert_eq!(at, 112, "tick_first = {tick_first}");
        assert!(c.heights().measured_count() > 0);
    }
}

#[test]
fn window_change_stamps_offsets_from_current_heights() {
    let mut c = controller(1000);
    let req = c.tick(100).unwrap();
    c.complete_measurement(&req, uniform(&req, 120.0)).unwrap();
    for it in c.items() {
        assert_close(it.translate_y, c.offset_of(it.index));
    }

    c.on_scroll(12_000.0, 200);
    c.tick(216);
    assert_eq!(c.current_index(), 99);
    for it in c.items() {
        assert_close(it.translate_y, it.index as f64 * 120.0);
        assert_close(it.item_height, 120.0);
    }
}

#[test]
fn on_rendered_schedules_second_initial_pass_once() {
    let mut c = controller(100);
    let req = c.tick(100).unwrap();
    c.complete_measurement(&req, uniform(&req, 100.0)).unwrap();

    c.on_rendered(120);
    assert_eq!(c.scheduler_state(), SchedulerState::Scheduled);
    let req = c.tick(220).unwrap();
    assert_eq!(req.kind, MeasureKind::Initial);
    c.complete_measurement(&req, uniform(&req, 100.0)).unwrap();

    c.on_rendered(300);
    assert_eq!(c.scheduler_state(), SchedulerState::Idle);
}

#[test]
fn boundary_events_step_the_window() {
    let mut c = controller(100);
    c.on_reached_top(0);
    assert_eq!(c.current_index(), 0);

    c.on_reached_bottom(10);
    assert_eq!(c.current_index(), 6);
    assert_eq!(c.visible_window(), window(0, 36));

    for t in 0..20 {
        c.on_reached_bottom(20 + t);
    }
    assert_eq!(c.current_index(), 80);
    assert_eq!(c.visible_window(), window(70, 100));

    c.on_reached_top(100);
    assert_eq!(c.current_index(), 74);
}

#[test]
fn replacing_with_empty_list_clears_everything() {
    let mut c = controller(50);
    let pending = c.tick(100).unwrap();
    c.set_items(Vec::new(), 150);

    assert!(c.is_empty());
    assert!(c.items().is_empty());
    assert_eq!(c.visible_window(), VisibleWindow::default());
    assert_close(c.total_height(), 0.0);
    assert_eq!(c.scheduler_state(), SchedulerState::Idle);
    assert!(c.heights().cumulative().is_empty());

    c.on_scroll(500.0, 200);
    assert_eq!(c.tick(1_000), None);
    assert!(c.items().is_empty());
    assert!(matches!(
        c.complete_measurement(&pending, uniform(&pending, 80.0)),
        Err(Error::StaleMeasurement { .. })
    ));
}

#[test]
fn replacing_list_resets_average_to_nominal() {
    let mut c = controller(100);
    let req = c.tick(100).unwrap();
    c.complete_measurement(&req, uniform(&req, 60.0)).unwrap();
    assert_close(c.average_height(), 60.0);

    c.set_items((0..10).collect(), 200);
    assert_close(c.average_height(), 100.0);
    assert_close(c.total_height(), 1_000.0);
    assert_eq!(c.visible_window(), window(0, 10));
    assert_eq!(c.scheduler_state(), SchedulerState::Scheduled);
}

#[test]
fn late_result_from_replaced_list_is_discarded() {
    let mut c = controller(100);
    let req = c.tick(100).unwrap();
    c.set_items((0..100).collect(), 110);
    let before = c.total_height();

    let err = c
        .complete_measurement(&req, uniform(&req, 300.0))
        .unwrap_err();
    assert_eq!(
        err,
        Error::StaleMeasurement {
            generation: 1,
            current: 2
        }
    );
    assert_close(c.total_height(), before);
}

#[test]
fn empty_answer_is_unavailable_not_fatal() {
    let mut c = controller(100);
    let req = c.tick(100).unwrap();
    let revision = c.revision();
    assert_eq!(
        c.complete_measurement(&req, Vec::<Geometry>::new()),
        Err(Error::MeasurementUnavailable)
    );
    assert_eq!(c.revision(), revision);
    assert_eq!(c.scheduler_state(), SchedulerState::Idle);
    assert_close(c.average_height(), 100.0);
}

#[test]
fn update_element_height_outside_window_is_rejected() {
    let mut c = controller(1000);
    c.on_scroll(50_000.0, 0);
    c.tick(16);
    let revision = c.revision();
    let events = recorded_events(&mut c);

    assert_eq!(
        c.update_element_height(5),
        Err(Error::NotMaterialized {
            index: 5,
            window: window(490, 530)
        })
    );
    assert_eq!(
        c.update_element_height(1000),
        Err(Error::OutOfRange {
            index: 1000,
            len: 1000
        })
    );
    assert_eq!(c.revision(), revision);
    assert_close(c.height_of(5), 100.0);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn targeted_update_restamps_following_items_and_notifies() {
    let mut c = controller(100);
    let events = recorded_events(&mut c);

    let req = c.update_element_height(5).unwrap();
    assert_eq!(req.kind, MeasureKind::Targeted { index: 5 });
    assert_eq!(req.indices, vec![5]);

    let out = c
        .complete_measurement(&req, [Geometry::new(5, 180.0)])
        .unwrap();
    assert_eq!(out.changed, 1);
    assert_close(c.height_of(5), 180.0);
    assert_close(c.total_height(), 10_080.0);
    assert_close(c.items()[5].translate_y, 500.0);
    assert_close(c.items()[6].translate_y, 680.0);
    assert_close(c.items()[29].translate_y, 2_980.0);
    // Targeted updates leave the average alone.
    assert_close(c.average_height(), 100.0);

    let events = events.lock().unwrap();
    assert_eq!(
        events.as_slice(),
        &[HeightChanged {
            index: 5,
            new_height: 180.0,
            old_height: 100.0
        }]
    );
}

#[test]
fn targeted_update_ignores_jitter() {
    let mut c = controller(100);
    let events = recorded_events(&mut c);
    let revision = c.revision();

    let req = c.update_element_height(3).unwrap();
    let out = c
        .complete_measurement(&req, [Geometry::new(3, 100.8)])
        .unwrap();
    assert_eq!(out.changed, 0);
    assert_eq!(c.revision(), revision);
    assert!(events.lock().unwrap().is_empty());

    let req = c.update_element_height(3).unwrap();
    assert_eq!(
        c.complete_measurement(&req, [Geometry::new(4, 300.0)]),
        Err(Error::MeasurementUnavailable)
    );
}

#[test]
fn unsubscribed_listener_is_not_called() {
    let mut c = controller(100);
    let count = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&count);
    let id = c.subscribe_height_changed(move |_| *sink.lock().unwrap() += 1);
    assert!(c.unsubscribe(id));
    assert!(!c.unsubscribe(id));

    let req = c.update_element_height(0).unwrap();
    c.complete_measurement(&req, [Geometry::new(0, 50.0)])
        .unwrap();
    assert_eq!(*count.lock().unwrap(), 0);
}

#[test]
fn refresh_height_resets_and_resamples() {
    let mut c = controller(100);
    let req = c.tick(100).unwrap();
    c.complete_measurement(&req, uniform(&req, 150.0)).unwrap();
    assert_close(c.total_height(), 15_000.0);
    let generation = c.generation();

    c.refresh_height(200);
    assert_eq!(c.generation(), generation + 1);
    assert_close(c.average_height(), 100.0);
    assert_close(c.total_height(), 10_000.0);
    assert_close(c.items()[3].translate_y, 300.0);
    assert_eq!(c.heights().measured_count(), 0);

    let req = c.tick(300).unwrap();
    assert_eq!(req.kind, MeasureKind::Initial);
}

#[test]
fn fixed_height_mode_never_measures() {
    let mut c = ListController::new(ListOptions::default().with_dynamic_height(false)).unwrap();
    c.set_items((0..100u32).collect(), 0);
    c.on_rendered(10);
    c.on_scroll(4_000.0, 20);
    for t in (0..2_000).step_by(10) {
        assert_eq!(c.tick(t), None);
    }
    assert_eq!(c.current_index(), 40);
}

#[test]
fn absolute_mode_matches_prefix_sums() {
    let mut c = ListController::new(
        ListOptions::default().with_position_mode(PositionMode::Absolute),
    )
    .unwrap();
    c.set_items((0..200u32).collect(), 0);
    let req = c.tick(100).unwrap();
    let answer: Vec<Geometry> = req
        .indices
        .iter()
        .map(|&i| Geometry::new(i, 50.0 + i as f64))
        .collect();
    c.complete_measurement(&req, answer).unwrap();

    for it in c.items() {
        assert_close(it.translate_y, c.offset_of(it.index));
    }

    c.set_position_mode(PositionMode::Cumulative);
    assert_eq!(c.options().position_mode, PositionMode::Cumulative);
    for it in c.items() {
        assert_close(it.translate_y, c.offset_of(it.index));
    }
}

#[test]
fn set_options_validates_and_applies() {
    let mut c = controller(100);
    assert!(matches!(
        c.set_options(ListOptions::default().with_virtual_window_length(0)),
        Err(Error::InvalidConfiguration { .. })
    ));
    assert_eq!(c.visible_window(), window(0, 30));

    c.set_options(ListOptions::default().with_item_height(40.0).with_preload_count(2))
        .unwrap();
    assert_eq!(c.visible_window(), window(0, 22));
    assert_close(c.total_height(), 4_000.0);
    assert_close(c.items()[1].translate_y, 40.0);
}

#[test]
fn invalid_options_are_rejected_at_construction() {
    let err = ListController::<u32>::new(ListOptions::default().with_item_height(0.0))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidConfiguration {
            field: "item_height",
            ..
        }
    ));
}

#[test]
fn ids_are_derived_or_synthesized() {
    let mut c = ListController::new(ListOptions::default())
        .unwrap()
        .with_item_id(|s: &String| s.strip_prefix('#').map(str::to_owned));
    c.set_items(vec!["#alpha".to_owned(), "beta".to_owned()], 0);

    let ids: Vec<&str> = c.source().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "item-1"]);
    assert_eq!(c.source()[1].index, 1);
    assert_eq!(ItemId::synthesized(7).to_string(), "item-7");
}

#[test]
fn materialized_window_is_contiguous_for_any_offset() {
    let mut c = controller(500);
    let mut now = 0u64;
    let mut offset = 0.0;
    while offset < 60_000.0 {
        c.on_scroll(offset, now);
        now += 20;
        c.tick(now);
        let w = c.visible_window();
        assert!(w.len() <= 40);
        assert!(w.end_index <= 500);
        let indices: Vec<usize> = c.items().iter().map(|it| it.index).collect();
        assert_eq!(indices, (w.start_index..w.end_index).collect::<Vec<_>>());
        offset += 733.0;
    }
}
