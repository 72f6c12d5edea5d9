/// Grouping Engine
///
/// Partitions a row sequence into groups by a key, in first-seen key order,
/// then orders, totals and flattens them into the output rows:
///
/// ```text
/// Group(a)  member  member  Totals(a)  Group(b)  member  Totals(b) ...
/// ```
///
/// Collapsed groups keep their header row but omit their members. Their
/// totals are only computed when collapsed groups are aggregated.

use crate::aggregate::{Aggregator, GroupTotals};
use crate::row::Row;
use crate::value::{Key, Record, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Extracts the grouping value of a record
pub enum GroupKey {
    /// Value of a named field (null when absent)
    Field(String),
    /// Arbitrary function of the record
    Getter(Box<dyn Fn(&Record) -> Value>),
}

impl GroupKey {
    pub fn value_of(&self, record: &Record) -> Value {
        match self {
            GroupKey::Field(field) => record.get(field).cloned().unwrap_or(Value::Null),
            GroupKey::Getter(getter) => getter(record),
        }
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Field(field) => f.debug_tuple("Field").field(field).finish(),
            GroupKey::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

pub type TitleFormatter = Box<dyn Fn(&Group) -> String>;
pub type GroupComparator = Box<dyn Fn(&Group, &Group) -> Ordering>;

/// Grouping configuration: key extractor, title formatter and group order.
///
/// # Examples
///
/// ```
/// use liveview::Grouping;
///
/// let grouping = Grouping::by_field("category")
///     .with_title(|g| format!("{} ({} items)", g.value(), g.count()))
///     .with_comparator(|a, b| a.value().total_cmp(b.value()));
/// ```
pub struct Grouping {
    key: GroupKey,
    formatter: Option<TitleFormatter>,
    comparator: Option<GroupComparator>,
}

impl Grouping {
    pub fn new(key: GroupKey) -> Self {
        Grouping {
            key,
            formatter: None,
            comparator: None,
        }
    }

    /// Group by the value of a field.
    pub fn by_field(field: impl Into<String>) -> Self {
        Self::new(GroupKey::Field(field.into()))
    }

    /// Group by a computed value.
    pub fn by<F>(getter: F) -> Self
    where
        F: Fn(&Record) -> Value + 'static,
    {
        Self::new(GroupKey::Getter(Box::new(getter)))
    }

    /// Title formatter, applied once the group's membership is complete.
    pub fn with_title<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Group) -> String + 'static,
    {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// Order of groups. Without one, groups stay in first-seen order.
    pub fn with_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&Group, &Group) -> Ordering + 'static,
    {
        self.comparator = Some(Box::new(comparator));
        self
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    /// Partition `rows` into titled groups, in first-seen key order.
    pub fn extract_groups(&self, rows: &[Rc<Record>], collapsed: &HashSet<Key>) -> Vec<Group> {
        let mut groups: Vec<Group> = Vec::new();
        let mut groups_by_key: HashMap<Key, usize> = HashMap::new();

        for row in rows {
            let value = self.key.value_of(row);
            let key = Key::from(&value);
            let slot = match groups_by_key.get(&key) {
                Some(&slot) => slot,
                None => {
                    groups.push(Group::new(value, collapsed.contains(&key)));
                    groups_by_key.insert(key, groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[slot].rows.push(Rc::clone(row));
        }

        // Titles only after counts are complete
        for group in groups.iter_mut() {
            group.title = match &self.formatter {
                Some(formatter) => formatter(group),
                None => group.value.to_string(),
            };
        }

        groups
    }

    /// Stable sort of the groups by the configured comparator.
    pub fn sort_groups(&self, groups: &mut [Group]) {
        if let Some(comparator) = &self.comparator {
            groups.sort_by(|a, b| comparator(a, b));
        }
    }
}

impl fmt::Debug for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grouping")
            .field("key", &self.key)
            .field("formatter", &self.formatter.is_some())
            .field("comparator", &self.comparator.is_some())
            .finish()
    }
}

/// One group of the rows projection.
///
/// Members are retained after the group is flattened into rows, so a group
/// obtained from `DataView::get_groups` can be inspected at any time. Groups
/// are rebuilt from scratch on every recomputation; a held `Rc<Group>` is a
/// snapshot and does not track later changes.
#[derive(Debug, Clone)]
pub struct Group {
    value: Value,
    title: String,
    collapsed: bool,
    rows: Vec<Rc<Record>>,
    totals: Option<Rc<GroupTotals>>,
}

impl Group {
    fn new(value: Value, collapsed: bool) -> Self {
        Group {
            value,
            title: String::new(),
            collapsed,
            rows: Vec::new(),
            totals: None,
        }
    }

    /// Grouping value shared by all members
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Number of member records
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Member records in source order
    pub fn rows(&self) -> &[Rc<Record>] {
        &self.rows
    }

    pub fn totals(&self) -> Option<&Rc<GroupTotals>> {
        self.totals.as_ref()
    }

    /// Structural equality used by the row diff: same grouping key, same
    /// count, same collapse state. Values compare as keys, so a NaN group
    /// equals itself.
    pub fn equals(&self, other: &Group) -> bool {
        Key::from(&self.value) == Key::from(&other.value)
            && self.count() == other.count()
            && self.collapsed == other.collapsed
    }
}

/// Run every aggregator over each group and attach the totals.
///
/// Collapsed groups are skipped unless `aggregate_collapsed` is set.
pub fn calculate_totals(
    groups: &mut [Group],
    aggregators: &mut [Box<dyn Aggregator>],
    aggregate_collapsed: bool,
) {
    for group in groups.iter_mut() {
        for aggregator in aggregators.iter_mut() {
            aggregator.init();
        }

        if group.collapsed && !aggregate_collapsed {
            continue;
        }

        for record in &group.rows {
            for aggregator in aggregators.iter_mut() {
                aggregator.accumulate(record);
            }
        }

        let mut totals = GroupTotals::new(group.value.clone());
        for aggregator in aggregators.iter() {
            aggregator.store_result(&mut totals);
        }
        group.totals = Some(Rc::new(totals));
    }
}

/// Flatten groups into output rows. Returns the shared groups alongside the rows.
pub fn flatten_groups(groups: Vec<Group>) -> (Vec<Rc<Group>>, Vec<Row>) {
    let mut shared = Vec::with_capacity(groups.len());
    let mut rows = Vec::new();

    for group in groups {
        let group = Rc::new(group);
        rows.push(Row::Group(Rc::clone(&group)));

        if !group.collapsed {
            rows.extend(group.rows.iter().cloned().map(Row::Item));
        }

        if let Some(totals) = &group.totals {
            rows.push(Row::Totals(Rc::clone(totals)));
        }

        shared.push(group);
    }

    (shared, rows)
}
