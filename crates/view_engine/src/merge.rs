use std::slice;

use shared::{
    domain::{FilterKey, Item, ItemId},
    protocol::ItemPage,
};

use crate::universe::{IdMask, Universe, ValueFilter};

pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Stable merge of a stored order with the canonical order of one filter context.
///
/// Yields the stored ids that pass the filter first, in stored sequence, then every other
/// filtered item in ascending id order. Stale, unknown and repeated stored ids are skipped.
pub struct MergedView<'a> {
    universe: &'a Universe,
    listed: slice::Iter<'a, ItemId>,
    canonical: slice::Iter<'a, Item>,
    filter: ValueFilter,
    emitted: IdMask,
}

pub fn merge<'a>(universe: &'a Universe, order: &'a [ItemId], key: &FilterKey) -> MergedView<'a> {
    MergedView {
        universe,
        listed: order.iter(),
        canonical: universe.items().iter(),
        filter: ValueFilter::new(key),
        emitted: IdMask::new(universe),
    }
}

impl<'a> Iterator for MergedView<'a> {
    type Item = &'a Item;

    fn next(&mut self) -> Option<Self::Item> {
        for id in self.listed.by_ref() {
            let Some(item) = self.universe.get(*id) else {
                continue;
            };
            if self.filter.matches(item.value) && self.emitted.insert(item.id) {
                return Some(item);
            }
        }

        for item in self.canonical.by_ref() {
            if !self.emitted.contains(item.id) && self.filter.matches(item.value) {
                return Some(item);
            }
        }

        None
    }
}

/// Zero-based page request after permissive normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub limit: usize,
}

impl PageWindow {
    /// Negative pages become 0 and non-positive limits become [`DEFAULT_PAGE_LIMIT`].
    pub fn normalize(page: i64, limit: i64) -> Self {
        let page = usize::try_from(page).unwrap_or(0);
        let limit = match usize::try_from(limit) {
            Ok(0) | Err(_) => DEFAULT_PAGE_LIMIT,
            Ok(limit) => limit,
        };
        Self { page, limit }
    }

    pub fn start(&self) -> usize {
        self.page.saturating_mul(self.limit)
    }

    pub fn end(&self) -> usize {
        self.start().saturating_add(self.limit)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

pub fn paginate(
    universe: &Universe,
    order: &[ItemId],
    key: &FilterKey,
    window: PageWindow,
) -> ItemPage {
    let total = universe.count_matching(key);
    let items = if window.start() >= total {
        Vec::new()
    } else {
        merge(universe, order, key)
            .skip(window.start())
            .take(window.limit)
            .copied()
            .collect()
    };

    ItemPage {
        items,
        total,
        has_more: window.end() < total,
    }
}
