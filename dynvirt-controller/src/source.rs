use core::fmt;
use std::sync::Arc;

/// Derives a stable id from an item payload. Returning `None` falls back to `item-<index>`.
pub type ItemIdFn<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// Stable key of a source item for the current list identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id given to items whose payload carries none.
    pub fn synthesized(index: usize) -> Self {
        Self(format!("item-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A source list element with its assigned position and identity.
#[derive(Debug)]
pub struct SourceItem<T> {
    pub payload: Arc<T>,
    pub index: usize,
    pub id: ItemId,
}

impl<T> Clone for SourceItem<T> {
    fn clone(&self) -> Self {
        Self {
            payload: Arc::clone(&self.payload),
            index: self.index,
            id: self.id.clone(),
        }
    }
}

/// Wraps every payload, assigning 0-based indexes and ids.
pub(crate) fn assign<T>(items: Vec<T>, item_id: Option<&ItemIdFn<T>>) -> Vec<SourceItem<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, payload)| {
            let id = item_id
                .and_then(|f| f(&payload))
                .map(ItemId)
                .unwrap_or_else(|| ItemId::synthesized(index));
            SourceItem {
                payload: Arc::new(payload),
                index,
                id,
            }
        })
        .collect()
}
