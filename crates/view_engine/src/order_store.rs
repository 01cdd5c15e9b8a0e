use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use shared::domain::{FilterKey, ItemId};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::ViewError,
    merge::merge,
    universe::{IdMask, Universe},
};

type OrderSlot = Arc<RwLock<Vec<ItemId>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    Key(FilterKey),
    All,
}

/// Custom orders, one independent partial permutation per filter context.
///
/// Every slot is guarded by its own lock. The map lock is held only long enough to find or
/// insert a slot, so work on one key never waits for a scan running under another key. A slot
/// removed by `reset` while still in use is dropped once its last user finishes.
pub struct OrderStore {
    universe: Arc<Universe>,
    orders: RwLock<HashMap<FilterKey, OrderSlot>>,
}

impl OrderStore {
    pub fn new(universe: Arc<Universe>) -> Self {
        Self {
            universe,
            orders: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get_order(&self, key: &FilterKey) -> Vec<ItemId> {
        self.with_order(key, <[ItemId]>::to_vec).await
    }

    /// Runs `f` against the stored order for `key` (empty when unset) under its read lock.
    pub async fn with_order<R>(&self, key: &FilterKey, f: impl FnOnce(&[ItemId]) -> R) -> R {
        match self.slot(key).await {
            Some(slot) => {
                let ids = slot.read().await;
                f(ids.as_slice())
            }
            None => f(&[]),
        }
    }

    /// Replaces the order for `key` wholesale. Repeated ids keep their first position.
    /// Returns the number of ids stored.
    pub async fn set_order(&self, key: &FilterKey, ids: Vec<ItemId>) -> usize {
        let ids = dedup_first(&self.universe, ids);
        let stored = ids.len();
        self.with_order_mut(key, move |order| *order = ids).await;
        info!(key = %key, stored, "custom order saved");
        stored
    }

    /// Moves `dragged` to sit immediately before `target` in the merged view of `key`.
    pub async fn move_item(
        &self,
        key: &FilterKey,
        dragged: ItemId,
        target: ItemId,
    ) -> Result<(), ViewError> {
        for id in [dragged, target] {
            if !self.universe.contains(id) {
                warn!(key = %key, %dragged, %target, "move rejected: unknown item");
                return Err(ViewError::UnknownItem(id));
            }
        }
        if dragged == target {
            return Ok(());
        }

        let universe = Arc::clone(&self.universe);
        let stored = self
            .with_order_mut(key, |order| {
                *order = reposition(&universe, key, order, dragged, target);
                order.len()
            })
            .await;
        info!(key = %key, %dragged, %target, stored, "item moved");
        Ok(())
    }

    /// Returns the number of contexts that held an order.
    pub async fn reset(&self, scope: &ResetScope) -> usize {
        let mut orders = self.orders.write().await;
        let cleared = match scope {
            ResetScope::Key(key) => usize::from(orders.remove(key).is_some()),
            ResetScope::All => {
                let cleared = orders.len();
                orders.clear();
                cleared
            }
        };
        info!(?scope, cleared, "custom order reset");
        cleared
    }

    /// Filter contexts that currently hold an order, sorted.
    #[cfg(test)]
    pub(crate) async fn contexts(&self) -> Vec<FilterKey> {
        let mut keys: Vec<FilterKey> = self.orders.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    async fn with_order_mut<R>(
        &self,
        key: &FilterKey,
        f: impl FnOnce(&mut Vec<ItemId>) -> R,
    ) -> R {
        let slot = match self.slot(key).await {
            Some(slot) => slot,
            None => Arc::clone(self.orders.write().await.entry(key.clone()).or_default()),
        };
        let mut ids = slot.write().await;
        f(&mut *ids)
    }

    async fn slot(&self, key: &FilterKey) -> Option<OrderSlot> {
        self.orders.read().await.get(key).cloned()
    }
}

fn dedup_first(universe: &Universe, ids: Vec<ItemId>) -> Vec<ItemId> {
    let mut seen = IdMask::new(universe);
    let mut unknown = HashSet::new();
    ids.into_iter()
        .filter(|id| {
            if universe.contains(*id) {
                seen.insert(*id)
            } else {
                unknown.insert(*id)
            }
        })
        .collect()
}

/// Computes the stored order after moving `dragged` in front of `target`.
///
/// Only the merged prefix up to the later of the two ids is materialized; the rest of the
/// previous stored order is carried over behind it, which leaves every other position intact.
fn reposition(
    universe: &Universe,
    key: &FilterKey,
    order: &[ItemId],
    dragged: ItemId,
    target: ItemId,
) -> Vec<ItemId> {
    let mut prefix = Vec::new();
    let (mut seen_dragged, mut seen_target) = (false, false);
    for item in merge(universe, order, key) {
        prefix.push(item.id);
        seen_dragged |= item.id == dragged;
        seen_target |= item.id == target;
        if seen_dragged && seen_target {
            break;
        }
    }
    if !seen_target {
        prefix.push(target);
    }

    prefix.retain(|id| *id != dragged);
    let at = prefix
        .iter()
        .position(|id| *id == target)
        .unwrap_or(prefix.len());
    prefix.insert(at, dragged);

    let mut placed = IdMask::new(universe);
    for id in &prefix {
        placed.insert(*id);
    }
    prefix.extend(order.iter().copied().filter(|id| !placed.contains(*id)));
    prefix
}

#[cfg(test)]
#[path = "tests/order_store_tests.rs"]
mod tests;
