use std::fmt::Write as _;

use shared::domain::{FilterKey, Item, ItemId};

use crate::error::ViewError;

/// The fixed item collection. Item `n` has `id == value == n`, for `n` in `1..=len`.
#[derive(Debug)]
pub struct Universe {
    items: Vec<Item>,
}

impl Universe {
    pub fn new(size: usize) -> Result<Self, ViewError> {
        if size == 0 {
            return Err(ViewError::invalid_input("universe size must be at least 1"));
        }
        let last = i64::try_from(size)
            .map_err(|_| ViewError::invalid_input(format!("universe size {size} is too large")))?;

        let items = (1..=last)
            .map(|n| Item {
                id: ItemId(n),
                value: n,
            })
            .collect();
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.items.get(index)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Items in ascending id order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Items passing the filter for `key`, in ascending id order.
    pub fn filtered<'a>(&'a self, key: &FilterKey) -> impl Iterator<Item = &'a Item> + 'a {
        let mut filter = ValueFilter::new(key);
        self.items.iter().filter(move |item| filter.matches(item.value))
    }

    pub fn count_matching(&self, key: &FilterKey) -> usize {
        if key.is_global() {
            return self.items.len();
        }
        self.filtered(key).count()
    }
}

/// Substring predicate over the decimal rendering of an item's value.
pub(crate) struct ValueFilter {
    term: String,
    buf: String,
}

impl ValueFilter {
    pub(crate) fn new(key: &FilterKey) -> Self {
        Self {
            term: key.as_str().to_owned(),
            buf: String::with_capacity(20),
        }
    }

    pub(crate) fn matches(&mut self, value: i64) -> bool {
        if self.term.is_empty() {
            return true;
        }
        self.buf.clear();
        write!(self.buf, "{value}").is_ok() && self.buf.contains(self.term.as_str())
    }
}

/// Bitset over universe ids, allocated on first insert.
pub(crate) struct IdMask {
    universe_len: usize,
    words: Vec<u64>,
}

impl IdMask {
    pub(crate) fn new(universe: &Universe) -> Self {
        Self {
            universe_len: universe.len(),
            words: Vec::new(),
        }
    }

    fn slot(&self, id: ItemId) -> Option<(usize, u64)> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        if index >= self.universe_len {
            return None;
        }
        Some((index / 64, 1u64 << (index % 64)))
    }

    /// Returns `true` when `id` was not present before. Ids outside the universe are ignored.
    pub(crate) fn insert(&mut self, id: ItemId) -> bool {
        let Some((word, bit)) = self.slot(id) else {
            return false;
        };
        if self.words.is_empty() {
            self.words = vec![0; self.universe_len.div_ceil(64)];
        }
        let fresh = self.words[word] & bit == 0;
        self.words[word] |= bit;
        fresh
    }

    pub(crate) fn contains(&self, id: ItemId) -> bool {
        match self.slot(id) {
            Some((word, bit)) => self.words.get(word).is_some_and(|w| w & bit != 0),
            None => false,
        }
    }
}
