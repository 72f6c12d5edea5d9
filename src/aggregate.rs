/// Group aggregators.
///
/// Every aggregator follows a three-phase protocol per group:
///
/// 1. `init` resets per-group state
/// 2. `accumulate` folds one member record into that state
/// 3. `store_result` writes the result into the group's `GroupTotals`
///
/// Results are keyed by `(kind, field)`, e.g. `("avg", "price")`.

use crate::value::{Record, Value};
use std::collections::BTreeMap;

/// Per-group accumulator.
pub trait Aggregator {
    /// Reset state before a new group.
    fn init(&mut self);

    /// Fold one member record into the state.
    fn accumulate(&mut self, record: &Record);

    /// Write this aggregator's result into the group's totals.
    fn store_result(&self, totals: &mut GroupTotals);
}

/// Aggregated results for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotals {
    group_value: Value,
    results: BTreeMap<(String, String), Option<f64>>,
}

impl GroupTotals {
    pub fn new(group_value: Value) -> Self {
        GroupTotals {
            group_value,
            results: BTreeMap::new(),
        }
    }

    /// Grouping value of the group these totals belong to
    pub fn group_value(&self) -> &Value {
        &self.group_value
    }

    /// Store a result. `None` means "no valid value seen".
    pub fn insert(&mut self, kind: &str, field: &str, result: Option<f64>) {
        self.results
            .insert((kind.to_string(), field.to_string()), result);
    }

    /// Result for `(kind, field)`, `None` if absent or null.
    pub fn get(&self, kind: &str, field: &str) -> Option<f64> {
        self.results
            .get(&(kind.to_string(), field.to_string()))
            .copied()
            .flatten()
    }

    /// True if a result (possibly null) was stored for `(kind, field)`.
    pub fn contains(&self, kind: &str, field: &str) -> bool {
        self.results
            .contains_key(&(kind.to_string(), field.to_string()))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate `((kind, field), result)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, Option<f64>)> {
        self.results
            .iter()
            .map(|((kind, field), result)| (kind.as_str(), field.as_str(), *result))
    }
}

/// Average of a numeric field.
///
/// Null, NaN and non-numeric values count as seen but contribute to neither
/// the sum nor the denominator. No result is written when a group had no
/// numeric value at all.
#[derive(Debug, Clone)]
pub struct AvgAggregator {
    field: String,
    count: usize,
    non_null_count: usize,
    sum: f64,
}

impl AvgAggregator {
    pub const KIND: &'static str = "avg";

    pub fn new(field: impl Into<String>) -> Self {
        AvgAggregator {
            field: field.into(),
            count: 0,
            non_null_count: 0,
            sum: 0.0,
        }
    }

    /// Records seen in the current group, numeric or not.
    pub fn seen(&self) -> usize {
        self.count
    }
}

impl Aggregator for AvgAggregator {
    fn init(&mut self) {
        self.count = 0;
        self.non_null_count = 0;
        self.sum = 0.0;
    }

    fn accumulate(&mut self, record: &Record) {
        self.count += 1;
        if let Some(v) = record.get(&self.field).and_then(Value::as_number) {
            self.non_null_count += 1;
            self.sum += v;
        }
    }

    fn store_result(&self, totals: &mut GroupTotals) {
        if self.non_null_count != 0 {
            totals.insert(
                Self::KIND,
                &self.field,
                Some(self.sum / self.non_null_count as f64),
            );
        }
    }
}

/// Minimum of a numeric field. Always writes a result, null if nothing valid was seen.
#[derive(Debug, Clone)]
pub struct MinAggregator {
    field: String,
    min: Option<f64>,
}

impl MinAggregator {
    pub const KIND: &'static str = "min";

    pub fn new(field: impl Into<String>) -> Self {
        MinAggregator {
            field: field.into(),
            min: None,
        }
    }
}

impl Aggregator for MinAggregator {
    fn init(&mut self) {
        self.min = None;
    }

    fn accumulate(&mut self, record: &Record) {
        if let Some(v) = record.get(&self.field).and_then(Value::as_number) {
            if self.min.map_or(true, |min| v < min) {
                self.min = Some(v);
            }
        }
    }

    fn store_result(&self, totals: &mut GroupTotals) {
        totals.insert(Self::KIND, &self.field, self.min);
    }
}

/// Maximum of a numeric field. Always writes a result, null if nothing valid was seen.
#[derive(Debug, Clone)]
pub struct MaxAggregator {
    field: String,
    max: Option<f64>,
}

impl MaxAggregator {
    pub const KIND: &'static str = "max";

    pub fn new(field: impl Into<String>) -> Self {
        MaxAggregator {
            field: field.into(),
            max: None,
        }
    }
}

impl Aggregator for MaxAggregator {
    fn init(&mut self) {
        self.max = None;
    }

    fn accumulate(&mut self, record: &Record) {
        if let Some(v) = record.get(&self.field).and_then(Value::as_number) {
            if self.max.map_or(true, |max| v > max) {
                self.max = Some(v);
            }
        }
    }

    fn store_result(&self, totals: &mut GroupTotals) {
        totals.insert(Self::KIND, &self.field, self.max);
    }
}
