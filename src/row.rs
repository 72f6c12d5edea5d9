/// Output rows.
///
/// The rows projection mixes three kinds of entries: data records, group
/// header rows and group totals rows. Consumers match on the variant.

use crate::aggregate::GroupTotals;
use crate::group::Group;
use crate::value::{Key, Record};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Row {
    /// A record from the source collection
    Item(Rc<Record>),
    /// Group header, precedes the group's member rows
    Group(Rc<Group>),
    /// Aggregated totals, follows the group's member rows
    Totals(Rc<GroupTotals>),
}

impl Row {
    pub fn is_item(&self) -> bool {
        matches!(self, Row::Item(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Row::Group(_))
    }

    pub fn is_totals(&self) -> bool {
        matches!(self, Row::Totals(_))
    }

    /// Group and totals rows are synthetic, not backed by a record.
    pub fn is_non_data(&self) -> bool {
        !self.is_item()
    }

    pub fn as_item(&self) -> Option<&Rc<Record>> {
        match self {
            Row::Item(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Rc<Group>> {
        match self {
            Row::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_totals(&self) -> Option<&Rc<GroupTotals>> {
        match self {
            Row::Totals(totals) => Some(totals),
            _ => None,
        }
    }

    /// Id of the backing record. Synthetic rows have none.
    pub fn id(&self, id_field: &str) -> Option<Key> {
        self.as_item().map(|record| Key::of(record, id_field))
    }
}
