//! Ordered, filterable, paginated view over a fixed item universe.
//!
//! A query filters the universe by a decimal substring, applies the custom order stored for
//! that filter context (listed ids first, everything else in ascending id order) and slices
//! one page out of the result.

pub mod engine;
pub mod error;
pub mod merge;
pub mod order_store;
pub mod selection;
pub mod universe;

pub use engine::ViewEngine;
pub use error::ViewError;
pub use merge::{merge, paginate, MergedView, PageWindow, DEFAULT_PAGE_LIMIT};
pub use order_store::{OrderStore, ResetScope};
pub use selection::SelectionSet;
pub use universe::Universe;
