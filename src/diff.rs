/// Diff Engine
///
/// Position-aligned comparison of the previous and the new rows projection.
/// The result lists every index of the new rows whose content may differ
/// from the row previously at that index. This is not an edit-distance diff:
/// a row that only moved is reported at each position it affects, which keeps
/// the comparison linear.

use crate::row::Row;
use crate::value::Key;
use std::collections::HashSet;

/// What the diff needs to know about the recomputation that produced the rows
#[derive(Debug, Clone, Copy)]
pub struct DiffContext<'a> {
    pub id_field: &'a str,
    pub grouping: bool,
    pub aggregation: bool,
    /// Ids touched by `update_item` since the previous recomputation
    pub updated: &'a HashSet<Key>,
}

/// Indices of `new_rows` that changed relative to `old_rows`, ascending.
pub fn row_diffs(old_rows: &[Row], new_rows: &[Row], ctx: &DiffContext<'_>) -> Vec<usize> {
    let mut diff = Vec::new();

    for (i, new) in new_rows.iter().enumerate() {
        match old_rows.get(i) {
            None => diff.push(i),
            Some(old) => {
                if row_changed(old, new, ctx) {
                    diff.push(i);
                }
            }
        }
    }

    log::trace!(
        "diff: {} of {} rows changed ({} before)",
        diff.len(),
        new_rows.len(),
        old_rows.len()
    );

    diff
}

fn row_changed(old: &Row, new: &Row, ctx: &DiffContext<'_>) -> bool {
    let either_non_data = old.is_non_data() || new.is_non_data();

    if ctx.grouping && either_non_data {
        match (old, new) {
            (Row::Group(a), Row::Group(b)) => {
                if !b.equals(a) {
                    return true;
                }
            }
            _ if old.is_group() != new.is_group() => return true,
            _ => {}
        }
    }

    // Totals hold arbitrary aggregated payloads and are always treated as dirty
    if ctx.aggregation && either_non_data && (old.is_totals() || new.is_totals()) {
        return true;
    }

    let new_id = new.id(ctx.id_field);
    if old.id(ctx.id_field) != new_id {
        return true;
    }

    new_id.map_or(false, |id| ctx.updated.contains(&id))
}
