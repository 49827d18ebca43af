use core::fmt;
use std::sync::Arc;

use dynvirt::{
    Debounce, Error, Geometry, HeightChanged, HeightModel, ListOptions, MaterializedItem,
    MeasureKind, MeasurementScheduler, PositionAssigner, PositionMode, Result, SchedulerState,
    Throttle, VisibleWindow, WindowCalculator,
};

use crate::source::{self, ItemIdFn, SourceItem};
use crate::{HeightChangedListeners, ListenerId};

/// A batched geometry query the host should answer with
/// [`ListController::complete_measurement`].
///
/// The answer may arrive at any later time; requests from a replaced or refreshed list are
/// rejected on completion.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasureRequest {
    pub generation: u64,
    pub kind: MeasureKind,
    /// Source indexes of the items to measure, ascending.
    pub indices: Vec<usize>,
}

/// Result of applying a measurement answer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureOutcome {
    pub kind: MeasureKind,
    /// Number of height table writes.
    pub changed: usize,
    /// Smallest index whose height changed.
    pub first_changed: Option<usize>,
    pub total_height: f64,
}

/// Owns a source list and keeps its materialized window, heights and offsets in sync.
///
/// This type does not hold any UI objects. Hosts drive it by calling:
/// - `set_items` when the list identity changes
/// - `on_scroll` / `on_reached_top` / `on_reached_bottom` when viewport events occur
/// - `on_rendered` after the first paint
/// - `tick(now_ms)` each frame/timer tick, answering any returned [`MeasureRequest`]
///
/// and read back `items()` and `total_height()` to lay out absolutely positioned rows.
pub struct ListController<T> {
    options: ListOptions,
    item_id: Option<ItemIdFn<T>>,
    source: Vec<SourceItem<T>>,

    heights: HeightModel,
    window: WindowCalculator,
    positions: PositionAssigner,
    scheduler: MeasurementScheduler,

    scroll_gate: Throttle,
    recompute: Debounce<f64>,
    scroll_offset: f64,
    is_scrolling: bool,
    last_scroll_ms: Option<u64>,
    rendered_once: bool,

    visible: VisibleWindow,
    materialized: Vec<MaterializedItem<Arc<T>>>,

    generation: u64,
    revision: u64,
    listeners: HeightChangedListeners,
}

impl<T> ListController<T> {
    /// Creates an empty controller. Fails if `options` do not validate.
    pub fn new(options: ListOptions) -> Result<Self> {
        options.validate()?;
        vdebug!(?options, "ListController::new");
        Ok(Self {
            item_id: None,
            source: Vec::new(),
            heights: HeightModel::new(0, options.item_height),
            window: WindowCalculator::new(),
            positions: PositionAssigner::new(options.position_mode),
            scheduler: MeasurementScheduler::new(options.measure_delay_ms),
            scroll_gate: Throttle::new(options.scroll_throttle_ms),
            recompute: Debounce::new(options.recompute_delay_ms),
            scroll_offset: 0.0,
            is_scrolling: false,
            last_scroll_ms: None,
            rendered_once: false,
            visible: VisibleWindow::default(),
            materialized: Vec::new(),
            generation: 0,
            revision: 0,
            listeners: HeightChangedListeners::new(),
            options,
        })
    }

    /// Derives item ids from payloads. Applies to lists assigned after this call.
    pub fn with_item_id(
        mut self,
        item_id: impl Fn(&T) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.item_id = Some(Arc::new(item_id));
        self
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    /// Validates and applies new options, then re-materializes the current window.
    ///
    /// Changing `item_height` resets every height to the new nominal value.
    pub fn set_options(&mut self, options: ListOptions) -> Result<()> {
        options.validate()?;
        let nominal_changed = options.item_height != self.options.item_height;
        self.options = options;
        vdebug!(?options, "ListController::set_options");

        self.scheduler.set_delay_ms(options.measure_delay_ms);
        self.scroll_gate.set_interval_ms(options.scroll_throttle_ms);
        self.recompute.set_delay_ms(options.recompute_delay_ms);
        self.positions.set_mode(options.position_mode);
        if nominal_changed {
            self.heights.set_nominal_height(options.item_height);
            self.positions.clear();
        }
        if !self.source.is_empty() {
            let window = self.window.window(&self.options, self.source.len());
            self.materialize(window);
        }
        Ok(())
    }

    pub fn position_mode(&self) -> PositionMode {
        self.positions.mode()
    }

    /// Switches positioning strategy and re-stamps the window.
    pub fn set_position_mode(&mut self, mode: PositionMode) {
        if self.positions.mode() == mode {
            return;
        }
        self.options.position_mode = mode;
        self.positions.set_mode(mode);
        self.positions.stamp(&mut self.materialized, &self.heights);
        self.revision += 1;
    }

    /// Replaces the source list.
    ///
    /// All measurement state is dropped and in-flight measurement answers become stale. A
    /// non-empty list starts at the top with nominal heights and schedules the initial sample
    /// pass; an empty list clears the window and total height.
    pub fn set_items(&mut self, items: Vec<T>, now_ms: u64) {
        self.generation += 1;
        self.scheduler.reset();
        self.recompute.cancel();
        self.scroll_gate.reset();
        self.positions.clear();
        self.window.reset();
        self.materialized.clear();
        self.scroll_offset = 0.0;
        self.is_scrolling = false;
        self.last_scroll_ms = None;
        self.rendered_once = false;

        self.source = source::assign(items, self.item_id.as_ref());
        self.heights.reset(self.source.len(), self.options.item_height);
        vdebug!(
            len = self.source.len(),
            generation = self.generation,
            "ListController::set_items"
        );

        if self.source.is_empty() {
            self.visible = VisibleWindow::default();
            self.revision += 1;
            return;
        }

        let window = self.window.window(&self.options, self.source.len());
        self.materialize(window);
        if self.options.dynamic_height {
            self.scheduler.request(MeasureKind::Initial, now_ms);
        }
    }

    /// Reports the host's current scroll offset.
    ///
    /// Events inside the throttle interval are dropped, but the offset is remembered and
    /// honored once scrolling settles. Accepted offsets feed a recompute that fires at most
    /// once per `recompute_delay_ms` while events keep coming.
    pub fn on_scroll(&mut self, scroll_offset: f64, now_ms: u64) {
        if self.source.is_empty() {
            return;
        }
        self.scroll_offset = if scroll_offset.is_nan() {
            0.0
        } else {
            scroll_offset.max(0.0)
        };
        self.is_scrolling = true;
        self.last_scroll_ms = Some(now_ms);

        if !self.scroll_gate.accept(now_ms) {
            vtrace!(scroll_offset, now_ms, "on_scroll: throttled");
            return;
        }
        self.recompute.supersede(self.scroll_offset, now_ms);
    }

    /// The viewport reached its top edge: step the window up.
    pub fn on_reached_top(&mut self, now_ms: u64) {
        let next = self
            .window
            .step_toward_top(&self.options, self.source.len());
        self.apply_window_change(next, now_ms);
    }

    /// The viewport reached its bottom edge: step the window down.
    pub fn on_reached_bottom(&mut self, now_ms: u64) {
        let next = self
            .window
            .step_toward_bottom(&self.options, self.source.len());
        self.apply_window_change(next, now_ms);
    }

    /// Reports that the host painted the list. The first report after a list replacement
    /// schedules a second initial sample pass.
    pub fn on_rendered(&mut self, now_ms: u64) {
        if self.source.is_empty() || self.rendered_once {
            return;
        }
        self.rendered_once = true;
        if self.options.dynamic_height {
            self.scheduler.request(MeasureKind::Initial, now_ms);
        }
    }

    /// Advances timers.
    ///
    /// Runs a debounced window recomputation, detects the end of scrolling, and returns a
    /// measurement request when a scheduled pass fires.
    pub fn tick(&mut self, now_ms: u64) -> Option<MeasureRequest> {
        if self.source.is_empty() {
            return None;
        }
        if let Some(offset) = self.recompute.take_ready(now_ms) {
            self.recompute_for_offset(offset, now_ms);
        }
        self.update_scrolling(now_ms);

        let kind = self.scheduler.poll(now_ms, self.is_scrolling)?;
        if self.materialized.is_empty() {
            self.scheduler.finish();
            return None;
        }
        vdebug!(?kind, len = self.materialized.len(), "tick: dispatching measurement");
        Some(MeasureRequest {
            generation: self.generation,
            kind,
            indices: self.materialized.iter().map(|it| it.index).collect(),
        })
    }

    /// Applies the host's answer to a [`MeasureRequest`].
    ///
    /// Empty answers yield [`Error::MeasurementUnavailable`] and answers for an older list
    /// generation yield [`Error::StaleMeasurement`]; neither touches state.
    pub fn complete_measurement<I, G>(
        &mut self,
        request: &MeasureRequest,
        geometry: I,
    ) -> Result<MeasureOutcome>
    where
        I: IntoIterator<Item = G>,
        G: Into<Geometry>,
    {
        if request.generation != self.generation {
            vdebug!(
                generation = request.generation,
                current = self.generation,
                "complete_measurement: discarding stale result"
            );
            return Err(Error::StaleMeasurement {
                generation: request.generation,
                current: self.generation,
            });
        }
        match request.kind {
            MeasureKind::Initial | MeasureKind::Continuous => {
                self.scheduler.finish();
                self.apply_batch(request.kind, geometry)
            }
            MeasureKind::Targeted { index } => self.apply_targeted(index, geometry),
        }
    }

    /// Drops every measurement and re-runs the initial sample pass.
    ///
    /// In-flight measurement answers become stale.
    pub fn refresh_height(&mut self, now_ms: u64) {
        if self.source.is_empty() {
            return;
        }
        vdebug!(len = self.source.len(), "ListController::refresh_height");
        self.generation += 1;
        self.scheduler.reset();
        self.heights.set_nominal_height(self.options.item_height);
        self.positions.clear();
        self.positions.stamp(&mut self.materialized, &self.heights);
        self.revision += 1;
        self.scheduler.request(MeasureKind::Initial, now_ms);
    }

    /// Requests a re-measurement of one materialized item.
    ///
    /// The host answers the returned request like any other. If the height moved by more than
    /// one unit, offsets from `index` on are recomputed and listeners receive a
    /// [`HeightChanged`] event.
    pub fn update_element_height(&mut self, index: usize) -> Result<MeasureRequest> {
        let len = self.source.len();
        if index >= len {
            vwarn!(index, len, "update_element_height: index out of range");
            return Err(Error::OutOfRange { index, len });
        }
        if !self.visible.contains(index) {
            vwarn!(
                index,
                start = self.visible.start_index,
                end = self.visible.end_index,
                "update_element_height: index not materialized"
            );
            return Err(Error::NotMaterialized {
                index,
                window: self.visible,
            });
        }
        Ok(MeasureRequest {
            generation: self.generation,
            kind: MeasureKind::Targeted { index },
            indices: vec![index],
        })
    }

    pub fn subscribe_height_changed(
        &mut self,
        f: impl Fn(&HeightChanged) + Send + Sync + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn items(&self) -> &[MaterializedItem<Arc<T>>] {
        &self.materialized
    }

    pub fn visible_window(&self) -> VisibleWindow {
        self.visible
    }

    pub fn source(&self) -> &[SourceItem<T>] {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Height of the scrollable content region.
    pub fn total_height(&self) -> f64 {
        if self.source.is_empty() {
            return 0.0;
        }
        self.heights.total()
    }

    pub fn average_height(&self) -> f64 {
        self.heights.average()
    }

    pub fn height_of(&self, index: usize) -> f64 {
        self.heights.height_of(index)
    }

    pub fn offset_of(&self, index: usize) -> f64 {
        self.heights.offset_of(index)
    }

    pub fn heights(&self) -> &HeightModel {
        &self.heights
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }

    /// Anchor index of the current window.
    pub fn current_index(&self) -> usize {
        self.window.current_index()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Incremented on every list replacement and refresh.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Incremented whenever the materialized window or its geometry is republished.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn update_scrolling(&mut self, now_ms: u64) {
        if !self.is_scrolling {
            return;
        }
        let Some(last) = self.last_scroll_ms else {
            return;
        };
        if now_ms.saturating_sub(last) < self.options.scroll_idle_ms {
            return;
        }
        vtrace!(now_ms, offset = self.scroll_offset, "scrolling settled");
        self.is_scrolling = false;
        self.last_scroll_ms = None;
        // Trailing edge: throttled offsets never reached the debounce.
        self.recompute.cancel();
        self.recompute_for_offset(self.scroll_offset, now_ms);
        if self.options.measures_continuously() {
            self.scheduler.request(MeasureKind::Continuous, now_ms);
        }
    }

    fn recompute_for_offset(&mut self, offset: f64, now_ms: u64) {
        let next = self.window.on_scroll(&self.heights, offset, &self.options);
        self.apply_window_change(next, now_ms);
    }

    fn apply_window_change(&mut self, next: Option<VisibleWindow>, now_ms: u64) {
        let Some(window) = next else {
            return;
        };
        self.materialize(window);
        if self.options.measures_continuously() {
            self.scheduler.request(MeasureKind::Continuous, now_ms);
        }
    }

    fn materialize(&mut self, window: VisibleWindow) {
        let mut next: Vec<_> = self.source[window.start_index..window.end_index]
            .iter()
            .enumerate()
            .map(|(virtual_index, src)| MaterializedItem {
                payload: Arc::clone(&src.payload),
                index: src.index,
                virtual_index,
                translate_y: 0.0,
                item_height: 0.0,
            })
            .collect();
        // Offsets and heights are filled in by the assigner.
        self.positions.stamp(&mut next, &self.heights);
        vtrace!(
            start = window.start_index,
            end = window.end_index,
            "ListController::materialize"
        );
        self.materialized = next;
        self.visible = window;
        self.revision += 1;
    }

    fn apply_batch<I, G>(&mut self, kind: MeasureKind, geometry: I) -> Result<MeasureOutcome>
    where
        I: IntoIterator<Item = G>,
        G: Into<Geometry>,
    {
        let out = self.heights.record_batch(geometry, kind.is_initial());
        if out.is_empty() {
            vtrace!(?kind, "apply_batch: no geometry available");
            return Err(Error::MeasurementUnavailable);
        }
        if let Some(first) = out.first_changed {
            self.positions.invalidate_from(first);
        }
        self.positions
            .recompute(&mut self.materialized, &self.heights);
        self.revision += 1;
        Ok(MeasureOutcome {
            kind,
            changed: out.changed,
            first_changed: out.first_changed,
            total_height: self.heights.total(),
        })
    }

    fn apply_targeted<I, G>(&mut self, index: usize, geometry: I) -> Result<MeasureOutcome>
    where
        I: IntoIterator<Item = G>,
        G: Into<Geometry>,
    {
        let kind = MeasureKind::Targeted { index };
        let Some(measured) = geometry
            .into_iter()
            .map(Into::into)
            .find(|g: &Geometry| g.index == index)
        else {
            vtrace!(index, "apply_targeted: no geometry available");
            return Err(Error::MeasurementUnavailable);
        };

        let Some(old_height) = self.heights.set_height(index, measured.height) else {
            return Ok(MeasureOutcome {
                kind,
                changed: 0,
                first_changed: None,
                total_height: self.heights.total(),
            });
        };
        self.heights.rebuild_cumulative();
        self.positions.invalidate_from(index);
        self.positions
            .recompute(&mut self.materialized, &self.heights);
        self.revision += 1;

        let event = HeightChanged {
            index,
            new_height: self.heights.height_of(index),
            old_height,
        };
        vdebug!(
            index,
            new_height = event.new_height,
            old_height,
            "height changed"
        );
        self.listeners.emit(&event);
        Ok(MeasureOutcome {
            kind,
            changed: 1,
            first_changed: Some(index),
            total_height: self.heights.total(),
        })
    }
}

impl<T> fmt::Debug for ListController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListController")
            .field("options", &self.options)
            .field("len", &self.source.len())
            .field("visible", &self.visible)
            .field("scroll_offset", &self.scroll_offset)
            .field("is_scrolling", &self.is_scrolling)
            .field("average_height", &self.heights.average())
            .field("total_height", &self.total_height())
            .field("scheduler", &self.scheduler.state())
            .field("generation", &self.generation)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
