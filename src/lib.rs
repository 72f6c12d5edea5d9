/// LiveView - Incremental Data-View Engine
///
/// A DataView sits between a collection of uniquely identified records and a
/// row-oriented display. It filters, sorts, pages and groups the records into
/// a rows projection, computes per-group totals, and after every change
/// reports the minimal set of row positions that need redrawing.

pub mod value;
pub mod error;
pub mod index;
pub mod aggregate;
pub mod row;
pub mod group;
pub mod filter;
pub mod sort;
pub mod diff;
pub mod event;
pub mod config;
pub mod dataview;

pub use value::{record, records_from_json, Key, Record, Value};
pub use error::{Result, ViewError};
pub use index::IdentityIndex;
pub use aggregate::{Aggregator, AvgAggregator, GroupTotals, MaxAggregator, MinAggregator};
pub use row::Row;
pub use group::{Group, GroupKey, Grouping};
pub use filter::{PagingInfo, PagingOptions, Predicate};
pub use sort::{field_comparator, Comparator, SortKey, SortOrder};
pub use diff::{row_diffs, DiffContext};
pub use event::{Event, RowCountChanged, RowsChanged, SubscriptionId};
pub use config::ViewOptions;
pub use dataview::DataView;
