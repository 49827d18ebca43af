use core::fmt;
use std::sync::Arc;

use dynvirt::HeightChanged;

pub type HeightChangedCallback = Arc<dyn Fn(&HeightChanged) + Send + Sync>;

/// Handle returned by [`HeightChangedListeners::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Observers of material height changes, scoped to the owning controller.
#[derive(Clone, Default)]
pub struct HeightChangedListeners {
    next_id: u64,
    entries: Vec<(ListenerId, HeightChangedCallback)>,
}

impl HeightChangedListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, f: impl Fn(&HeightChanged) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, Arc::new(f)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn emit(&self, event: &HeightChanged) {
        for (_, f) in &self.entries {
            f(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for HeightChangedListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeightChangedListeners")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}
