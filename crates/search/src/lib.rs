//! Filtering and incremental presentation over a flattened IAM catalog.
//!
//! [`Catalog`] flattens a dataset into one [`FlatRecord`] per (service,
//! action) pair, [`FilterSpec`] describes the active criteria and is compiled
//! into a single-pass predicate, and [`Window`] bounds how many matches are
//! materialized at once.

mod catalog;
mod error;
mod filter;
mod window;

pub use catalog::{Catalog, DependentLink, FlatRecord, RecordView, Resolved};
pub use error::{Result, SearchError};
pub use filter::{CompiledFilter, FilterSpec, Selector, TagPredicate, TriState};
pub use window::{Window, DEFAULT_PAGE_SIZE};
