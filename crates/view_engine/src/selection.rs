use std::collections::BTreeSet;

use shared::domain::ItemId;
use tokio::sync::RwLock;
use tracing::info;

/// Process-wide set of selected item ids, independent of filters and orders.
#[derive(Default)]
pub struct SelectionSet {
    ids: RwLock<BTreeSet<ItemId>>,
}

impl SelectionSet {
    /// Replaces the whole selection. Returns the number of distinct ids kept.
    pub async fn replace(&self, ids: impl IntoIterator<Item = ItemId>) -> usize {
        let next: BTreeSet<ItemId> = ids.into_iter().collect();
        let selected = next.len();
        *self.ids.write().await = next;
        info!(selected, "selection saved");
        selected
    }

    #[cfg(test)]
    pub(crate) async fn contains(&self, id: ItemId) -> bool {
        self.ids.read().await.contains(&id)
    }

    /// Members in ascending id order.
    pub async fn snapshot(&self) -> Vec<ItemId> {
        self.ids.read().await.iter().copied().collect()
    }
}
