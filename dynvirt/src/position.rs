use std::collections::BTreeMap;

use crate::{HeightModel, MaterializedItem, PositionMode};

/// Memoized offsets, keyed by source index.
///
/// Ordered so that "everything from index `i` on" can be dropped in one split.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionCache {
    offsets: BTreeMap<usize, f64>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.offsets.get(&index).copied()
    }

    pub fn insert(&mut self, index: usize, offset: f64) {
        self.offsets.insert(index, offset);
    }

    pub fn remove(&mut self, index: usize) -> Option<f64> {
        self.offsets.remove(&index)
    }

    /// Drops the entries for `index` and every later index.
    pub fn invalidate_from(&mut self, index: usize) {
        let _ = self.offsets.split_off(&index);
        vtrace!(index, kept = self.offsets.len(), "PositionCache::invalidate_from");
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.offsets.contains_key(&index)
    }
}

/// Stamps `translate_y`/`item_height` onto materialized items.
#[derive(Clone, Debug, Default)]
pub struct PositionAssigner {
    mode: PositionMode,
    cache: PositionCache,
    order: Vec<usize>, // scratch: item slots sorted by source index
}

impl PositionAssigner {
    pub fn new(mode: PositionMode) -> Self {
        Self {
            mode,
            cache: PositionCache::new(),
            order: Vec::new(),
        }
    }

    pub fn mode(&self) -> PositionMode {
        self.mode
    }

    /// Switches strategy. Cached offsets from the previous strategy are dropped.
    pub fn set_mode(&mut self, mode: PositionMode) {
        if self.mode != mode {
            self.mode = mode;
            self.cache.clear();
        }
    }

    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    pub fn invalidate_from(&mut self, index: usize) {
        self.cache.invalidate_from(index);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Assigns offsets, reusing cached values where present.
    pub fn stamp<P>(&mut self, items: &mut [MaterializedItem<P>], heights: &HeightModel) {
        match self.mode {
            PositionMode::Absolute => self.stamp_absolute(items, heights),
            PositionMode::Cumulative => self.stamp_cumulative(items, heights),
        }
    }

    /// Clears the cached offsets of `items` and assigns them from scratch.
    pub fn recompute<P>(&mut self, items: &mut [MaterializedItem<P>], heights: &HeightModel) {
        for item in items.iter() {
            self.cache.remove(item.index);
        }
        self.stamp(items, heights);
    }

    fn stamp_absolute<P>(&mut self, items: &mut [MaterializedItem<P>], heights: &HeightModel) {
        for item in items.iter_mut() {
            let offset = match self.cache.get(item.index) {
                Some(offset) => offset,
                None => {
                    let offset = heights.offset_of(item.index);
                    self.cache.insert(item.index, offset);
                    offset
                }
            };
            item.translate_y = offset;
            item.item_height = heights.height_of(item.index);
        }
    }

    fn stamp_cumulative<P>(&mut self, items: &mut [MaterializedItem<P>], heights: &HeightModel) {
        self.order.clear();
        self.order.extend(0..items.len());
        self.order.sort_unstable_by_key(|&slot| items[slot].index);

        // (index, offset) of the previously stamped item in index order.
        let mut prev: Option<(usize, f64)> = None;
        for &slot in &self.order {
            let index = items[slot].index;
            let offset = match self.cache.get(index) {
                Some(offset) => offset,
                None => {
                    let offset = match prev {
                        _ if index == 0 => 0.0,
                        Some((p, p_off)) if p + 1 == index => p_off + heights.height_of(p),
                        _ => heights.offset_of(index),
                    };
                    self.cache.insert(index, offset);
                    offset
                }
            };
            let item = &mut items[slot];
            item.translate_y = offset;
            item.item_height = heights.height_of(index);
            prev = Some((index, offset));
        }
    }
}
