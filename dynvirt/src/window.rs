use crate::{HeightModel, ListOptions, VisibleWindow};

/// Maps scroll positions and edge notifications to a materialized window.
///
/// Holds the window anchor (`current_index`): the index the visible range starts at. The
/// materialized window extends `preload_count` items before the anchor and
/// `virtual_window_length + preload_count` items from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowCalculator {
    current_index: usize,
}

impl WindowCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
    }

    /// The window for the current anchor.
    pub fn window(&self, options: &ListOptions, count: usize) -> VisibleWindow {
        VisibleWindow::around(
            self.current_index,
            options.virtual_window_length,
            options.preload_count,
            count,
        )
    }

    /// Recomputes the window for `scroll_offset`.
    ///
    /// Returns `None` when the estimated anchor moved by no more than `preload_count / 3` items
    /// (hysteresis), leaving the anchor untouched.
    pub fn on_scroll(
        &mut self,
        heights: &HeightModel,
        scroll_offset: f64,
        options: &ListOptions,
    ) -> Option<VisibleWindow> {
        let count = heights.len();
        if count == 0 {
            return None;
        }
        let estimated = heights
            .locate_index(scroll_offset)
            .min(max_anchor(options, count));
        let threshold = options.preload_count / 3;
        if estimated.abs_diff(self.current_index) <= threshold {
            vtrace!(
                estimated,
                current = self.current_index,
                threshold,
                "WindowCalculator::on_scroll: within hysteresis"
            );
            return None;
        }
        vtrace!(
            scroll_offset,
            estimated,
            previous = self.current_index,
            "WindowCalculator::on_scroll"
        );
        self.current_index = estimated;
        Some(self.window(options, count))
    }

    /// Moves the anchor one step (a third of the visible length) toward the top.
    ///
    /// Returns `None` when already at the top.
    pub fn step_toward_top(&mut self, options: &ListOptions, count: usize) -> Option<VisibleWindow> {
        let next = self.current_index.saturating_sub(step(options));
        self.move_to(next, options, count)
    }

    /// Moves the anchor one step toward the bottom, stopping at `count - virtual_window_length`.
    ///
    /// Returns `None` when already at the bottom.
    pub fn step_toward_bottom(
        &mut self,
        options: &ListOptions,
        count: usize,
    ) -> Option<VisibleWindow> {
        let next = self
            .current_index
            .saturating_add(step(options))
            .min(max_anchor(options, count));
        self.move_to(next, options, count)
    }

    fn move_to(
        &mut self,
        next: usize,
        options: &ListOptions,
        count: usize,
    ) -> Option<VisibleWindow> {
        if count == 0 || next == self.current_index {
            return None;
        }
        vtrace!(from = self.current_index, to = next, "WindowCalculator::move_to");
        self.current_index = next;
        Some(self.window(options, count))
    }
}

fn max_anchor(options: &ListOptions, count: usize) -> usize {
    count.saturating_sub(options.virtual_window_length)
}

fn step(options: &ListOptions) -> usize {
    (options.virtual_window_length / 3).max(1)
}
