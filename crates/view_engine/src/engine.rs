use std::sync::Arc;

use shared::{
    domain::{FilterKey, ItemId},
    protocol::{InitialState, ItemPage},
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    error::ViewError,
    merge::{paginate, PageWindow},
    order_store::{OrderStore, ResetScope},
    selection::SelectionSet,
    universe::Universe,
};

/// All mutable view state of the process, shared by request handlers.
pub struct ViewEngine {
    universe: Arc<Universe>,
    orders: OrderStore,
    selection: SelectionSet,
    active_filter: RwLock<FilterKey>,
}

impl ViewEngine {
    pub fn new(universe: Arc<Universe>) -> Self {
        Self {
            orders: OrderStore::new(Arc::clone(&universe)),
            universe,
            selection: SelectionSet::default(),
            active_filter: RwLock::new(FilterKey::global()),
        }
    }

    pub fn with_universe_size(size: usize) -> Result<Self, ViewError> {
        Ok(Self::new(Arc::new(Universe::new(size)?)))
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// One page of the view for `term`. Malformed paging values fall back to defaults.
    pub async fn query(&self, page: i64, limit: i64, term: &str) -> ItemPage {
        self.query_window(PageWindow::normalize(page, limit), &FilterKey::normalize(term))
            .await
    }

    pub async fn query_window(&self, window: PageWindow, key: &FilterKey) -> ItemPage {
        let page = self
            .orders
            .with_order(key, |order| paginate(&self.universe, order, key, window))
            .await;
        debug!(
            key = %key,
            page = window.page,
            limit = window.limit,
            returned = page.items.len(),
            total = page.total,
            "view queried"
        );
        page
    }

    pub async fn set_order(&self, term: &str, ids: Vec<ItemId>) -> usize {
        self.orders.set_order(&FilterKey::normalize(term), ids).await
    }

    pub async fn move_item(
        &self,
        term: &str,
        dragged: ItemId,
        target: ItemId,
    ) -> Result<(), ViewError> {
        self.orders
            .move_item(&FilterKey::normalize(term), dragged, target)
            .await
    }

    pub async fn reset_order(&self, scope: &ResetScope) -> usize {
        self.orders.reset(scope).await
    }

    pub async fn save_selection(&self, ids: Vec<ItemId>) -> usize {
        self.selection.replace(ids).await
    }

    /// Remembers `term` for [`ViewEngine::initial_state`]. Queries never touch it.
    pub async fn set_active_filter(&self, term: &str) -> FilterKey {
        let key = FilterKey::normalize(term);
        *self.active_filter.write().await = key.clone();
        info!(key = %key, "active filter updated");
        key
    }

    pub async fn active_filter(&self) -> FilterKey {
        self.active_filter.read().await.clone()
    }

    /// First page under the remembered filter plus the current selection.
    pub async fn initial_state(&self) -> InitialState {
        let key = self.active_filter().await;
        let page = self.query_window(PageWindow::default(), &key).await;
        InitialState {
            selected_item_ids: self.selection.snapshot().await,
            initial_items: page.items,
            last_active_search_term: key.as_str().to_owned(),
            total: page.total,
            has_more: page.has_more,
        }
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
