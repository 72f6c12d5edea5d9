/// Sorting of the source collection.
///
/// Sorts are stable in both directions. A descending sort reverses the
/// collection, sorts ascending and reverses again, which keeps records that
/// compare equal in their original relative order.

use crate::value::{Record, Value};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Caller-supplied total order over records
pub type Comparator = Rc<dyn Fn(&Record, &Record) -> Ordering>;

/// Sort order specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order (smallest first)
    Ascending,
    /// Descending order (largest first)
    Descending,
}

impl SortOrder {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }

    pub fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Ascending)
    }
}

/// What the collection was last sorted by, kept for `DataView::re_sort`.
#[derive(Clone)]
pub enum SortKey {
    Comparator(Comparator),
    Field(String),
}

impl SortKey {
    pub fn comparator(&self) -> Comparator {
        match self {
            SortKey::Comparator(cmp) => Rc::clone(cmp),
            SortKey::Field(field) => field_comparator(field.clone()),
        }
    }
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Comparator(_) => f.write_str("Comparator(..)"),
            SortKey::Field(field) => f.debug_tuple("Field").field(field).finish(),
        }
    }
}

/// Build a comparator over one field using `Value::total_cmp`.
/// Missing fields compare as null.
pub fn field_comparator(field: impl Into<String>) -> Comparator {
    let field = field.into();
    Rc::new(move |a: &Record, b: &Record| {
        let a = a.get(&field).unwrap_or(&Value::Null);
        let b = b.get(&field).unwrap_or(&Value::Null);
        a.total_cmp(b)
    })
}

/// Stable in-place sort of `items` by `cmp` in the given order.
pub fn stable_sort(items: &mut [Rc<Record>], cmp: &Comparator, order: SortOrder) {
    if !order.is_ascending() {
        items.reverse();
    }
    items.sort_by(|a, b| cmp(&**a, &**b));
    if !order.is_ascending() {
        items.reverse();
    }
}
