/// LiveView DataView
///
/// A DataView owns a collection of uniquely identified records and maintains a
/// derived rows projection: filtered, paged, optionally grouped with totals.
/// Every mutation recomputes the projection, diffs it against the previous
/// one by position, and notifies observers of what changed.

use crate::aggregate::Aggregator;
use crate::config::ViewOptions;
use crate::diff::{row_diffs, DiffContext};
use crate::error::{Result, ViewError};
use crate::event::{Event, RowCountChanged, RowsChanged};
use crate::filter::{filter_and_page, PagingInfo, PagingOptions, Predicate};
use crate::group::{calculate_totals, flatten_groups, Group, Grouping};
use crate::index::IdentityIndex;
use crate::row::Row;
use crate::sort::{stable_sort, SortKey, SortOrder};
use crate::value::{Key, Record};
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Filtered, sorted, paged and grouped projection of a record collection.
///
/// # Examples
///
/// ```
/// use liveview::{record, AvgAggregator, DataView, Grouping, Row, Value};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let mut view = DataView::new();
/// view.set_items(
///     vec![
///         record([("id", Value::Int(1)), ("cat", Value::from("a")), ("v", Value::Int(10))]),
///         record([("id", Value::Int(2)), ("cat", Value::from("a")), ("v", Value::Int(20))]),
///         record([("id", Value::Int(3)), ("cat", Value::from("b")), ("v", Value::Int(5))]),
///     ],
///     None,
/// )
/// .unwrap();
///
/// view.group_by(Some(Grouping::by_field("cat")));
/// view.set_aggregators(vec![Box::new(AvgAggregator::new("v"))], None);
///
/// // Group(a) 1 2 Totals(a) Group(b) 3 Totals(b)
/// assert_eq!(view.get_length(), 7);
/// match view.get_item(3) {
///     Some(Row::Totals(totals)) => assert_eq!(totals.get("avg", "v"), Some(15.0)),
///     other => panic!("expected totals, got {:?}", other),
/// }
///
/// let changed = Rc::new(RefCell::new(Vec::<usize>::new()));
/// let sink = changed.clone();
/// view.on_rows_changed().subscribe(move |args, _view| sink.borrow_mut().extend(&args.rows));
///
/// view.update_item(2, record([("id", Value::Int(2)), ("cat", Value::from("a")), ("v", Value::Int(99))]))
///     .unwrap();
/// // The updated record and both totals rows
/// assert_eq!(*changed.borrow(), vec![2, 3, 6]);
/// ```
pub struct DataView {
    id_field: String,
    /// Source collection
    items: Vec<Rc<Record>>,
    /// Output projection
    rows: Vec<Row>,
    idx_by_id: IdentityIndex,
    /// Row position by id, built on first lookup after a recomputation
    rows_by_id: OnceCell<HashMap<Key, usize>>,
    filter: Option<Predicate>,
    /// Ids touched by `update_item` since the last recomputation
    updated: HashSet<Key>,
    suspend: bool,

    sort_key: Option<SortKey>,
    sort_order: SortOrder,

    grouping: Option<Grouping>,
    groups: Vec<Rc<Group>>,
    collapsed_groups: HashSet<Key>,
    aggregators: Vec<Box<dyn Aggregator>>,
    aggregate_collapsed: bool,

    page_size: usize,
    page_num: usize,
    total_rows: usize,

    on_row_count_changed: Event<RowCountChanged, DataView>,
    on_rows_changed: Event<RowsChanged, DataView>,
    on_paging_info_changed: Event<PagingInfo, DataView>,
}

impl Default for DataView {
    fn default() -> Self {
        Self::new()
    }
}

impl DataView {
    /// Create an empty, unpaged view keyed by the `"id"` field.
    pub fn new() -> Self {
        Self::with_options(ViewOptions::default())
    }

    /// Create an empty view from construction options.
    pub fn with_options(options: ViewOptions) -> Self {
        DataView {
            id_field: options.id_field,
            items: Vec::new(),
            rows: Vec::new(),
            idx_by_id: IdentityIndex::new(),
            rows_by_id: OnceCell::new(),
            filter: None,
            updated: HashSet::new(),
            suspend: false,
            sort_key: None,
            sort_order: SortOrder::Ascending,
            grouping: None,
            groups: Vec::new(),
            collapsed_groups: HashSet::new(),
            aggregators: Vec::new(),
            aggregate_collapsed: options.aggregate_collapsed,
            page_size: options.page_size,
            // Unpaged views have no page; a paged start page is re-clamped by the first refresh
            page_num: if options.page_size == 0 { 0 } else { options.page_num },
            total_rows: 0,
            on_row_count_changed: Event::new(),
            on_rows_changed: Event::new(),
            on_paging_info_changed: Event::new(),
        }
    }

    // ==================== Batching ====================

    /// Suspend recomputation until `end_update`. Calls do not nest.
    pub fn begin_update(&mut self) {
        self.suspend = true;
    }

    /// Resume and recompute once for everything changed while suspended.
    pub fn end_update(&mut self) {
        self.suspend = false;
        self.refresh();
    }

    pub fn is_suspended(&self) -> bool {
        self.suspend
    }

    // ==================== Source collection ====================

    /// Replace the source collection, optionally switching the id field.
    ///
    /// Fails without touching the view if an id is missing or duplicated.
    pub fn set_items(&mut self, items: Vec<Record>, id_field: Option<&str>) -> Result<()> {
        let id_field = id_field.unwrap_or(&self.id_field).to_string();
        let items: Vec<Rc<Record>> = items.into_iter().map(Rc::new).collect();

        let idx_by_id = IdentityIndex::build(&items, &id_field).map_err(|err| {
            log::debug!("set_items rejected: {}", err);
            err
        })?;

        self.id_field = id_field;
        self.items = items;
        self.idx_by_id = idx_by_id;
        self.refresh();
        Ok(())
    }

    pub fn get_items(&self) -> &[Rc<Record>] {
        &self.items
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Replace the record with id `id`. The new record must carry the same id.
    pub fn update_item(&mut self, id: impl Into<Key>, item: Record) -> Result<()> {
        let id = id.into();
        let index = match self.idx_by_id.get(&id) {
            Some(index) if Key::of(&item, &self.id_field) == id => index,
            _ => {
                log::debug!("update_item rejected for id {}", id);
                return Err(ViewError::IdentityMismatch { id });
            }
        };

        self.items[index] = Rc::new(item);
        self.updated.insert(id);
        self.refresh();
        Ok(())
    }

    /// Insert a record before position `index` of the source collection.
    pub fn insert_item(&mut self, index: usize, item: Record) -> Result<()> {
        if index > self.items.len() {
            return Err(ViewError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }

        let id = IdentityIndex::id_of(&item, &self.id_field, index)?;
        self.idx_by_id.check_vacant(&id, index)?;

        self.items.insert(index, Rc::new(item));
        self.idx_by_id.insert(id, index);
        self.refresh();
        Ok(())
    }

    /// Append a record to the source collection.
    pub fn add_item(&mut self, item: Record) -> Result<()> {
        self.insert_item(self.items.len(), item)
    }

    /// Remove the record with id `id`.
    pub fn delete_item(&mut self, id: impl Into<Key>) -> Result<()> {
        let id = id.into();
        let index = self.idx_by_id.remove(&id).ok_or_else(|| {
            log::debug!("delete_item rejected for unknown id {}", id);
            ViewError::UnknownId { id: id.clone() }
        })?;

        self.items.remove(index);
        self.refresh();
        Ok(())
    }

    pub fn get_item_by_id(&self, id: impl Into<Key>) -> Option<&Rc<Record>> {
        self.idx_by_id
            .get(&id.into())
            .and_then(|index| self.items.get(index))
    }

    /// Position of a record in the source collection
    pub fn get_idx_by_id(&self, id: impl Into<Key>) -> Option<usize> {
        self.idx_by_id.get(&id.into())
    }

    pub fn get_item_by_idx(&self, index: usize) -> Option<&Rc<Record>> {
        self.items.get(index)
    }

    // ==================== Filtering and sorting ====================

    /// Install a row predicate.
    pub fn set_filter<F>(&mut self, filter: F)
    where
        F: Fn(&Record) -> bool + 'static,
    {
        self.filter = Some(Box::new(filter));
        self.refresh();
    }

    /// Remove the row predicate.
    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.refresh();
    }

    /// Stable sort of the source collection by `comparator`.
    pub fn sort<F>(&mut self, comparator: F, order: SortOrder)
    where
        F: Fn(&Record, &Record) -> Ordering + 'static,
    {
        self.apply_sort(SortKey::Comparator(Rc::new(comparator)), order);
    }

    /// Stable sort of the source collection by the value of one field.
    pub fn sort_by_field(&mut self, field: impl Into<String>, order: SortOrder) {
        self.apply_sort(SortKey::Field(field.into()), order);
    }

    /// Repeat the most recent sort. No-op if the view was never sorted.
    pub fn re_sort(&mut self) {
        if let Some(key) = self.sort_key.clone() {
            self.apply_sort(key, self.sort_order);
        }
    }

    fn apply_sort(&mut self, key: SortKey, order: SortOrder) {
        let comparator = key.comparator();
        stable_sort(&mut self.items, &comparator, order);
        self.idx_by_id.reorder(&self.items, &self.id_field);

        self.sort_key = Some(key);
        self.sort_order = order;
        self.refresh();
    }

    // ==================== Grouping ====================

    /// Install a grouping, or disable grouping with `None`.
    /// All groups start expanded.
    pub fn group_by(&mut self, grouping: Option<Grouping>) {
        self.grouping = grouping;
        self.collapsed_groups.clear();
        self.refresh();
    }

    /// Install the aggregators computed per group.
    ///
    /// `include_collapsed` decides whether collapsed groups still get totals;
    /// `None` keeps the previous setting.
    pub fn set_aggregators(
        &mut self,
        aggregators: Vec<Box<dyn Aggregator>>,
        include_collapsed: Option<bool>,
    ) {
        self.aggregators = aggregators;
        if let Some(include) = include_collapsed {
            self.aggregate_collapsed = include;
        }
        self.refresh();
    }

    pub fn collapse_group(&mut self, value: impl Into<Key>) {
        self.collapsed_groups.insert(value.into());
        self.refresh();
    }

    pub fn expand_group(&mut self, value: impl Into<Key>) {
        self.collapsed_groups.remove(&value.into());
        self.refresh();
    }

    /// Groups of the latest recomputation, in display order.
    ///
    /// Each group keeps its members, but is a snapshot: the next
    /// recomputation builds new groups and does not update these.
    pub fn get_groups(&self) -> &[Rc<Group>] {
        &self.groups
    }

    // ==================== Paging ====================

    /// Update the page size and/or page number.
    ///
    /// The page number is clamped against the current total row count before
    /// recomputing, then again afterwards if the total moved.
    pub fn set_paging_options(&mut self, options: PagingOptions) {
        if let Some(page_size) = options.page_size {
            self.page_size = page_size;
        }

        if let Some(page_num) = options.page_num {
            self.page_num = self.get_paging_info().clamp_page(page_num);
        }

        let info = self.get_paging_info();
        self.on_paging_info_changed.notify(&info, self);

        self.refresh();
    }

    pub fn get_paging_info(&self) -> PagingInfo {
        PagingInfo {
            page_size: self.page_size,
            page_num: self.page_num,
            total_rows: self.total_rows,
        }
    }

    // ==================== Output rows ====================

    /// Number of output rows
    pub fn get_length(&self) -> usize {
        self.rows.len()
    }

    /// Output row at position `index`
    pub fn get_item(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Output position of the record with id `id`, if it is displayed.
    pub fn get_row_by_id(&self, id: impl Into<Key>) -> Option<usize> {
        let rows_by_id = self.rows_by_id.get_or_init(|| {
            self.rows
                .iter()
                .enumerate()
                .filter_map(|(i, row)| row.id(&self.id_field).map(|id| (id, i)))
                .collect()
        });
        rows_by_id.get(&id.into()).copied()
    }

    // ==================== Notifications ====================

    pub fn on_row_count_changed(&mut self) -> &mut Event<RowCountChanged, DataView> {
        &mut self.on_row_count_changed
    }

    pub fn on_rows_changed(&mut self) -> &mut Event<RowsChanged, DataView> {
        &mut self.on_rows_changed
    }

    pub fn on_paging_info_changed(&mut self) -> &mut Event<PagingInfo, DataView> {
        &mut self.on_paging_info_changed
    }

    // ==================== Recomputation ====================

    /// Recompute the rows projection and notify observers.
    /// Does nothing while updates are suspended.
    pub fn refresh(&mut self) {
        if self.suspend {
            return;
        }

        let count_before = self.rows.len();
        let total_rows_before = self.total_rows;

        let mut diff = self.recalc();

        // The current page no longer exists: go to the last page and redo
        let paging = self.get_paging_info();
        if paging.is_past_end() {
            self.page_num = paging.last_valid_page();
            log::debug!(
                "page {} past end of {} rows, moving to page {}",
                paging.page_num,
                paging.total_rows,
                self.page_num
            );
            diff = self.recalc();
        }

        self.updated.clear();

        log::debug!(
            "refresh: {} rows ({} before), {} total rows, {} changed",
            self.rows.len(),
            count_before,
            self.total_rows,
            diff.len()
        );

        if total_rows_before != self.total_rows {
            let info = self.get_paging_info();
            self.on_paging_info_changed.notify(&info, self);
        }
        if count_before != self.rows.len() {
            let args = RowCountChanged {
                previous: count_before,
                current: self.rows.len(),
            };
            self.on_row_count_changed.notify(&args, self);
        }
        if !diff.is_empty() {
            let args = RowsChanged { rows: diff };
            self.on_rows_changed.notify(&args, self);
        }
    }

    fn recalc(&mut self) -> Vec<usize> {
        self.rows_by_id.take();

        let filtered = filter_and_page(
            &self.items,
            self.filter.as_ref(),
            self.page_size,
            self.page_num,
        );
        self.total_rows = filtered.total_rows;

        self.groups = Vec::new();
        let new_rows = match &self.grouping {
            Some(grouping) => {
                let mut groups = grouping.extract_groups(&filtered.rows, &self.collapsed_groups);
                grouping.sort_groups(&mut groups);
                if !self.aggregators.is_empty() {
                    calculate_totals(&mut groups, &mut self.aggregators, self.aggregate_collapsed);
                }
                let (groups, rows) = flatten_groups(groups);
                self.groups = groups;
                rows
            }
            None => filtered.rows.into_iter().map(Row::Item).collect(),
        };

        let ctx = DiffContext {
            id_field: &self.id_field,
            grouping: self.grouping.is_some(),
            aggregation: !self.aggregators.is_empty(),
            updated: &self.updated,
        };
        let diff = row_diffs(&self.rows, &new_rows, &ctx);

        self.rows = new_rows;
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AvgAggregator, MaxAggregator, MinAggregator};
    use crate::value::{record, Value};
    use std::cell::RefCell;

    fn item(id: i64, cat: &str, v: i64) -> Record {
        record([
            ("id", Value::Int(id)),
            ("cat", Value::from(cat)),
            ("v", Value::Int(v)),
        ])
    }

    fn sample() -> Vec<Record> {
        vec![item(1, "a", 10), item(2, "a", 20), item(3, "b", 5)]
    }

    fn numbered(n: i64) -> Vec<Record> {
        (0..n).map(|i| item(i, if i % 2 == 0 { "even" } else { "odd" }, i)).collect()
    }

    fn view_of(items: Vec<Record>) -> DataView {
        let mut view = DataView::new();
        view.set_items(items, None).unwrap();
        view
    }

    /// Ids of the displayed records, synthetic rows skipped
    fn row_ids(view: &DataView) -> Vec<i64> {
        view.rows()
            .iter()
            .filter_map(|row| row.as_item())
            .map(|r| r.get("id").and_then(Value::as_i64).unwrap())
            .collect()
    }

    fn item_ids(view: &DataView) -> Vec<i64> {
        view.get_items()
            .iter()
            .map(|r| r.get("id").and_then(Value::as_i64).unwrap())
            .collect()
    }

    fn record_rows_changed(view: &mut DataView) -> Rc<RefCell<Vec<Vec<usize>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        view.on_rows_changed()
            .subscribe(move |args, _| sink.borrow_mut().push(args.rows.clone()));
        log
    }

    fn assert_identity_bijection(view: &DataView) {
        let len = view.get_items().len();
        let mut seen = vec![false; len];
        for record in view.get_items() {
            let id = Key::of(record, view.id_field());
            let idx = view.get_idx_by_id(id).unwrap();
            assert!(idx < len);
            assert!(!seen[idx]);
            seen[idx] = true;
        }
    }

    fn assert_paging_invariant(view: &DataView) {
        let info = view.get_paging_info();
        assert!(info.page_num * info.page_size <= info.total_rows);
    }

    #[test]
    fn test_set_items_and_accessors() {
        let view = view_of(sample());

        assert_eq!(view.get_length(), 3);
        assert_eq!(view.get_paging_info().total_rows, 3);
        assert_eq!(view.get_idx_by_id(3), Some(2));
        assert_eq!(
            view.get_item_by_id(2).and_then(|r| r.get("v")),
            Some(&Value::Int(20))
        );
        assert_eq!(
            view.get_item_by_idx(0).and_then(|r| r.get("id")),
            Some(&Value::Int(1))
        );
        assert!(view.get_item(1).unwrap().is_item());
        assert_eq!(view.get_row_by_id(3), Some(2));
        assert_eq!(view.get_row_by_id(99), None);
        assert_identity_bijection(&view);
    }

    #[test]
    fn test_set_items_with_custom_id_field() {
        let mut view = DataView::new();
        view.set_items(
            vec![record([("key", Value::from("x"))]), record([("key", Value::from("y"))])],
            Some("key"),
        )
        .unwrap();

        assert_eq!(view.id_field(), "key");
        assert_eq!(view.get_idx_by_id("y"), Some(1));
    }

    #[test]
    fn test_set_items_failure_leaves_state() {
        let mut view = view_of(sample());

        let err = view
            .set_items(vec![item(7, "a", 1), item(7, "b", 2)], None)
            .unwrap_err();
        assert!(matches!(err, ViewError::DuplicateId { .. }));

        let err = view
            .set_items(vec![record([("v", Value::Int(1))])], None)
            .unwrap_err();
        assert!(matches!(err, ViewError::MissingId { index: 0, .. }));

        // Switching to an id field the records do not have fails too
        assert!(view.set_items(sample(), Some("nope")).is_err());
        assert_eq!(view.id_field(), "id");

        assert_eq!(item_ids(&view), vec![1, 2, 3]);
        assert_eq!(view.get_length(), 3);
        assert_eq!(view.get_idx_by_id(1), Some(0));
    }

    #[test]
    fn test_filter() {
        let mut view = view_of(numbered(10));
        view.set_filter(|r| r.get("v").and_then(Value::as_i64).unwrap_or(0) >= 6);

        assert_eq!(view.get_paging_info().total_rows, 4);
        assert_eq!(row_ids(&view), vec![6, 7, 8, 9]);

        view.clear_filter();
        assert_eq!(view.get_length(), 10);
    }

    #[test]
    fn test_refresh_twice_is_idempotent() {
        let mut view = view_of(sample());
        view.group_by(Some(Grouping::by_field("cat")));
        let changes = record_rows_changed(&mut view);

        view.refresh();
        view.refresh();
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_notification_order() {
        let mut view = DataView::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let sink = log.clone();
        view.on_paging_info_changed()
            .subscribe(move |info, _| sink.borrow_mut().push(format!("paging {}", info.total_rows)));
        let sink = log.clone();
        view.on_row_count_changed().subscribe(move |args, _| {
            sink.borrow_mut().push(format!("count {}->{}", args.previous, args.current))
        });
        let sink = log.clone();
        view.on_rows_changed()
            .subscribe(move |args, _| sink.borrow_mut().push(format!("rows {:?}", args.rows)));

        view.set_items(sample(), None).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["paging 3", "count 0->3", "rows [0, 1, 2]"]
        );
    }

    #[test]
    fn test_handlers_can_read_the_view() {
        let mut view = DataView::new();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        view.on_row_count_changed()
            .subscribe(move |_, view| *sink.borrow_mut() = Some(view.get_length()));

        view.set_items(sample(), None).unwrap();
        assert_eq!(*seen.borrow(), Some(3));
    }

    #[test]
    fn test_update_item_diff() {
        let mut view = view_of(sample());
        let changes = record_rows_changed(&mut view);

        view.update_item(2, item(2, "a", 99)).unwrap();

        assert_eq!(*changes.borrow(), vec![vec![1]]);
        assert_eq!(
            view.get_item_by_id(2).and_then(|r| r.get("v")),
            Some(&Value::Int(99))
        );
    }

    #[test]
    fn test_update_item_mismatch() {
        let mut view = view_of(sample());

        let err = view.update_item(2, item(5, "a", 0)).unwrap_err();
        assert!(matches!(err, ViewError::IdentityMismatch { id: Key::Int(2) }));

        let err = view.update_item(42, item(42, "a", 0)).unwrap_err();
        assert!(matches!(err, ViewError::IdentityMismatch { .. }));

        assert_eq!(
            view.get_item_by_id(2).and_then(|r| r.get("v")),
            Some(&Value::Int(20))
        );
    }

    #[test]
    fn test_delete_unknown_id_leaves_state() {
        let mut view = view_of(sample());
        let changes = record_rows_changed(&mut view);

        let err = view.delete_item(999).unwrap_err();
        assert!(matches!(err, ViewError::UnknownId { id: Key::Int(999) }));

        assert_eq!(view.get_paging_info().total_rows, 3);
        assert_eq!(row_ids(&view), vec![1, 2, 3]);
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_structural_mutations() {
        let mut view = view_of(sample());
        let changes = record_rows_changed(&mut view);

        view.add_item(item(4, "b", 1)).unwrap();
        assert_eq!(row_ids(&view), vec![1, 2, 3, 4]);

        view.insert_item(1, item(5, "c", 2)).unwrap();
        assert_eq!(row_ids(&view), vec![1, 5, 2, 3, 4]);
        assert_identity_bijection(&view);

        view.delete_item(2).unwrap();
        assert_eq!(row_ids(&view), vec![1, 5, 3, 4]);
        assert_identity_bijection(&view);
        assert_eq!(view.get_row_by_id(4), Some(3));

        assert_eq!(
            *changes.borrow(),
            vec![vec![3], vec![1, 2, 3, 4], vec![2, 3]]
        );
    }

    #[test]
    fn test_structural_mutation_failures() {
        let mut view = view_of(sample());

        assert!(matches!(
            view.add_item(item(1, "a", 0)),
            Err(ViewError::DuplicateId { .. })
        ));
        assert!(matches!(
            view.add_item(record([("v", Value::Int(0))])),
            Err(ViewError::MissingId { index: 3, .. })
        ));
        assert!(matches!(
            view.insert_item(9, item(9, "a", 0)),
            Err(ViewError::IndexOutOfRange { index: 9, len: 3 })
        ));

        assert_eq!(item_ids(&view), vec![1, 2, 3]);
        assert_identity_bijection(&view);
    }

    #[test]
    fn test_sort_stability() {
        let items = vec![item(1, "x", 2), item(2, "x", 1), item(3, "x", 2), item(4, "x", 1)];
        let mut view = view_of(items);

        view.sort_by_field("v", SortOrder::Ascending);
        assert_eq!(item_ids(&view), vec![2, 4, 1, 3]);
        assert_identity_bijection(&view);

        view.sort_by_field("v", SortOrder::Descending);
        assert_eq!(item_ids(&view), vec![1, 3, 2, 4]);
        assert_identity_bijection(&view);

        // A comparator treating everything as equal keeps the order as is
        view.sort(|_, _| Ordering::Equal, SortOrder::Descending);
        assert_eq!(item_ids(&view), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_re_sort() {
        let mut view = view_of(sample());
        // Never sorted: no-op
        view.re_sort();
        assert_eq!(item_ids(&view), vec![1, 2, 3]);

        view.sort(
            |a, b| {
                let a = a.get("v").and_then(Value::as_i64);
                let b = b.get("v").and_then(Value::as_i64);
                a.cmp(&b)
            },
            SortOrder::Descending,
        );
        assert_eq!(item_ids(&view), vec![2, 1, 3]);

        view.add_item(item(4, "b", 15)).unwrap();
        assert_eq!(item_ids(&view), vec![2, 1, 3, 4]);

        view.re_sort();
        assert_eq!(item_ids(&view), vec![2, 4, 1, 3]);
        assert_eq!(row_ids(&view), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_paging() {
        let mut view = view_of(numbered(10));
        view.set_paging_options(PagingOptions::new(3, 1));

        assert_eq!(row_ids(&view), vec![3, 4, 5]);
        assert_eq!(
            view.get_paging_info(),
            PagingInfo { page_size: 3, page_num: 1, total_rows: 10 }
        );

        view.set_paging_options(PagingOptions::page_num(3));
        assert_eq!(row_ids(&view), vec![9]);

        view.set_paging_options(PagingOptions::page_size(0));
        assert_eq!(view.get_length(), 10);
        assert_paging_invariant(&view);
    }

    #[test]
    fn test_page_num_clamped_at_set_time() {
        let mut view = view_of(numbered(10));
        view.set_paging_options(PagingOptions::new(3, 50));

        // ceil(10 / 3) = 4 at set time; 4 * 3 > 10, so recomputation moves to page 3
        assert_eq!(view.get_paging_info().page_num, 3);
        assert_eq!(row_ids(&view), vec![9]);
        assert_paging_invariant(&view);
    }

    #[test]
    fn test_page_reclamped_when_filter_shrinks_total() {
        let mut view = view_of(numbered(10));
        view.set_paging_options(PagingOptions::new(3, 3));

        let infos = Rc::new(RefCell::new(Vec::new()));
        let sink = infos.clone();
        view.on_paging_info_changed()
            .subscribe(move |info, _| sink.borrow_mut().push(*info));

        view.set_filter(|r| r.get("id").and_then(Value::as_i64).unwrap_or(0) < 5);

        assert_eq!(
            view.get_paging_info(),
            PagingInfo { page_size: 3, page_num: 1, total_rows: 5 }
        );
        assert_eq!(row_ids(&view), vec![3, 4]);
        assert_eq!(*infos.borrow(), vec![view.get_paging_info()]);
        assert_paging_invariant(&view);
    }

    #[test]
    fn test_paging_notifies_before_recompute() {
        let mut view = view_of(numbered(4));
        let log = Rc::new(RefCell::new(Vec::new()));

        let sink = log.clone();
        view.on_paging_info_changed()
            .subscribe(move |info, view| sink.borrow_mut().push((info.page_size, view.get_length())));

        view.set_paging_options(PagingOptions::page_size(2));
        // Rows are still the unpaged ones when the paging notification fires
        assert_eq!(*log.borrow(), vec![(2, 4)]);
        assert_eq!(view.get_length(), 2);
    }

    #[test]
    fn test_grouping_with_average() {
        let mut view = view_of(sample());
        view.group_by(Some(Grouping::by_field("cat")));
        view.set_aggregators(vec![Box::new(AvgAggregator::new("v"))], None);

        let groups = view.get_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].value(), &Value::from("a"));
        assert_eq!(groups[1].value(), &Value::from("b"));
        assert_eq!(groups[0].totals().unwrap().get("avg", "v"), Some(15.0));
        assert_eq!(groups[1].totals().unwrap().get("avg", "v"), Some(5.0));
        assert_eq!(groups[0].count(), 2);

        let rows = view.rows();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[3].as_totals().unwrap().group_value(), &Value::from("a"));
        assert_eq!(rows[6].as_totals().unwrap().get("avg", "v"), Some(5.0));

        // Group rows are not identity-indexed
        assert_eq!(view.get_row_by_id(3), Some(5));
    }

    #[test]
    fn test_group_comparator_and_multiple_aggregators() {
        let mut view = view_of(sample());
        view.group_by(Some(
            Grouping::by_field("cat")
                .with_title(|g| format!("{} ({})", g.value(), g.count()))
                .with_comparator(|a, b| b.value().total_cmp(a.value())),
        ));
        view.set_aggregators(
            vec![
                Box::new(MinAggregator::new("v")),
                Box::new(MaxAggregator::new("v")),
            ],
            None,
        );

        let groups = view.get_groups();
        assert_eq!(groups[0].title(), "b (1)");
        assert_eq!(groups[1].title(), "a (2)");

        let totals = groups[1].totals().unwrap();
        assert_eq!(totals.get("min", "v"), Some(10.0));
        assert_eq!(totals.get("max", "v"), Some(20.0));
        assert_eq!(row_ids(&view), vec![3, 1, 2]);
    }

    #[test]
    fn test_collapse_with_collapsed_totals() {
        let mut view = view_of(sample());
        view.group_by(Some(Grouping::by_field("cat")));
        view.set_aggregators(vec![Box::new(AvgAggregator::new("v"))], Some(true));

        view.collapse_group("a");

        // Group(a) Totals(a) Group(b) 3 Totals(b)
        let rows = view.rows();
        assert_eq!(rows.len(), 5);
        assert!(rows[0].as_group().unwrap().is_collapsed());
        assert_eq!(rows[1].as_totals().unwrap().get("avg", "v"), Some(15.0));
        assert_eq!(view.get_row_by_id(1), None);
        assert_eq!(row_ids(&view), vec![3]);

        view.expand_group("a");
        assert_eq!(view.get_length(), 7);
    }

    #[test]
    fn test_collapse_without_collapsed_totals() {
        let mut view = view_of(sample());
        view.group_by(Some(Grouping::by_field("cat")));
        view.set_aggregators(vec![Box::new(AvgAggregator::new("v"))], None);

        view.collapse_group("a");

        // Group(a) Group(b) 3 Totals(b)
        let rows = view.rows();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_group());
        assert!(rows[1].is_group());
        assert!(view.get_groups()[0].totals().is_none());
    }

    #[test]
    fn test_set_aggregators_keeps_collapsed_setting() {
        let mut view = view_of(sample());
        view.group_by(Some(Grouping::by_field("cat")));
        view.set_aggregators(vec![Box::new(AvgAggregator::new("v"))], Some(true));
        view.set_aggregators(vec![Box::new(MaxAggregator::new("v"))], None);

        view.collapse_group("a");

        // Group(a) Totals(a) Group(b) 3 Totals(b)
        let rows = view.rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1].as_totals().unwrap().get("max", "v"), Some(20.0));

        view.set_aggregators(vec![Box::new(MaxAggregator::new("v"))], Some(false));
        assert_eq!(view.get_length(), 4);
        assert!(view.get_groups()[0].totals().is_none());
    }

    #[test]
    fn test_nan_group_refresh_is_idempotent() {
        let mut view = view_of(vec![
            record([("id", Value::Int(1)), ("g", Value::Float(f64::NAN))]),
            record([("id", Value::Int(2)), ("g", Value::Float(f64::NAN))]),
        ]);
        view.group_by(Some(Grouping::by_field("g")));
        assert_eq!(view.get_groups().len(), 1);
        let changes = record_rows_changed(&mut view);

        view.refresh();
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_group_by_resets_collapsed_groups() {
        let mut view = view_of(sample());
        view.group_by(Some(Grouping::by_field("cat")));
        view.collapse_group("a");
        // Group(a) Group(b) 3
        assert_eq!(view.get_length(), 3);

        view.group_by(Some(Grouping::by_field("cat")));
        assert_eq!(view.get_length(), 5);

        view.group_by(None);
        assert_eq!(view.get_length(), 3);
        assert!(view.get_groups().is_empty());
    }

    #[test]
    fn test_grouped_update_diff() {
        let mut view = view_of(sample());
        view.group_by(Some(Grouping::by_field("cat")));
        view.set_aggregators(vec![Box::new(AvgAggregator::new("v"))], None);
        let changes = record_rows_changed(&mut view);

        view.update_item(2, item(2, "a", 99)).unwrap();

        // Record 2 plus the totals rows, which are always reported
        assert_eq!(*changes.borrow(), vec![vec![2, 3, 6]]);
        assert_eq!(view.get_groups()[0].totals().unwrap().get("avg", "v"), Some(54.5));
    }

    #[test]
    fn test_batch_update_notifies_once() {
        let mut view = view_of(numbered(6));
        let changes = record_rows_changed(&mut view);

        view.begin_update();
        assert!(view.is_suspended());
        view.update_item(1, item(1, "odd", 100)).unwrap();
        view.update_item(4, item(4, "even", 100)).unwrap();
        view.update_item(5, item(5, "odd", 100)).unwrap();
        assert!(changes.borrow().is_empty());
        view.end_update();

        assert_eq!(*changes.borrow(), vec![vec![1, 4, 5]]);
    }

    #[test]
    fn test_begin_update_does_not_nest() {
        let mut view = view_of(numbered(3));
        let changes = record_rows_changed(&mut view);

        view.begin_update();
        view.begin_update();
        view.add_item(item(3, "odd", 3)).unwrap();
        view.end_update();

        assert_eq!(*changes.borrow(), vec![vec![3]]);
        assert!(!view.is_suspended());
    }

    #[test]
    fn test_with_options_out_of_range_page() {
        let mut view = DataView::with_options(ViewOptions::default().with_paging(10, usize::MAX / 2));
        view.set_items(sample(), None).unwrap();

        assert_eq!(
            view.get_paging_info(),
            PagingInfo { page_size: 10, page_num: 0, total_rows: 3 }
        );
        assert_eq!(row_ids(&view), vec![1, 2, 3]);

        let unpaged = DataView::with_options(ViewOptions::default().with_paging(0, 7));
        assert_eq!(unpaged.get_paging_info().page_num, 0);
    }

    #[test]
    fn test_with_options_keeps_valid_start_page() {
        let mut view = DataView::with_options(ViewOptions::default().with_paging(2, 1));
        view.set_items(numbered(5), None).unwrap();

        assert_eq!(view.get_paging_info().page_num, 1);
        assert_eq!(row_ids(&view), vec![2, 3]);
    }

    #[test]
    fn test_huge_page_size() {
        let mut view = view_of(sample());
        view.set_paging_options(PagingOptions::new(usize::MAX, 1));

        // One page holds everything, so page 1 starts past the end
        assert_eq!(
            view.get_paging_info(),
            PagingInfo { page_size: usize::MAX, page_num: 0, total_rows: 3 }
        );
        assert_eq!(row_ids(&view), vec![1, 2, 3]);
        assert_paging_invariant(&view);
    }

    #[test]
    fn test_with_options() {
        let options = ViewOptions::default().with_id_field("key").with_paging(2, 0);
        let mut view = DataView::with_options(options);
        view.set_items(
            (0..5).map(|i| record([("key", Value::Int(i))])).collect(),
            None,
        )
        .unwrap();

        assert_eq!(view.get_length(), 2);
        assert_eq!(view.get_paging_info().total_rows, 5);
        assert_eq!(view.get_row_by_id(1), Some(1));
    }
}
