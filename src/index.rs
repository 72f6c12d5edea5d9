/// Identity Index
///
/// Maps each record's id to its position in the source collection. The index
/// is a bijection onto `[0, len)` after every successful operation.
///
/// Full rebuilds happen on bulk replacement and sorting. Single-record
/// structural changes patch the existing positions instead:
///
/// - append adds one entry
/// - insert at `I` shifts every position `>= I` up by one
/// - delete at `I` shifts every position `> I` down by one

use crate::error::{Result, ViewError};
use crate::value::{Key, Record};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    positions: HashMap<Key, usize>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        IdentityIndex {
            positions: HashMap::new(),
        }
    }

    /// Build the index for a whole collection.
    ///
    /// Fails on the first record without an id or with an id already seen.
    pub fn build(items: &[Rc<Record>], id_field: &str) -> Result<Self> {
        let mut positions = HashMap::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let id = Self::id_of(item, id_field, index)?;
            if positions.insert(id.clone(), index).is_some() {
                return Err(ViewError::DuplicateId { id, index });
            }
        }

        Ok(IdentityIndex { positions })
    }

    /// Extract the id of `record`, which is about to live at `index`.
    pub fn id_of(record: &Record, id_field: &str, index: usize) -> Result<Key> {
        let id = Key::of(record, id_field);
        if id.is_null() {
            return Err(ViewError::MissingId {
                index,
                field: id_field.to_string(),
            });
        }
        Ok(id)
    }

    /// Refill positions after the collection was reordered.
    ///
    /// The set of ids must be unchanged, so no validation happens here.
    pub fn reorder(&mut self, items: &[Rc<Record>], id_field: &str) {
        for (index, item) in items.iter().enumerate() {
            self.positions.insert(Key::of(item, id_field), index);
        }
    }

    pub fn get(&self, id: &Key) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &Key) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Validate that `id` may be added at `index` without breaking uniqueness.
    pub fn check_vacant(&self, id: &Key, index: usize) -> Result<()> {
        if self.positions.contains_key(id) {
            return Err(ViewError::DuplicateId {
                id: id.clone(),
                index,
            });
        }
        Ok(())
    }

    /// Record a new id at `index`, shifting positions at or after it.
    ///
    /// Callers validate with `check_vacant` before mutating the collection.
    pub fn insert(&mut self, id: Key, index: usize) {
        if index < self.positions.len() {
            for position in self.positions.values_mut() {
                *position = adjust_for_insert(*position, index);
            }
        }
        self.positions.insert(id, index);
    }

    /// Remove `id`, shifting positions after it down. Returns its old position.
    pub fn remove(&mut self, id: &Key) -> Option<usize> {
        let index = self.positions.remove(id)?;
        for position in self.positions.values_mut() {
            if let Some(adjusted) = adjust_for_delete(*position, index) {
                *position = adjusted;
            }
        }
        Some(index)
    }
}

/// Position of an existing entry after a record is inserted at `insert_index`
fn adjust_for_insert(position: usize, insert_index: usize) -> usize {
    if position >= insert_index {
        position + 1
    } else {
        position
    }
}

/// Position of an existing entry after the record at `delete_index` is removed.
/// `None` for the deleted position itself.
fn adjust_for_delete(position: usize, delete_index: usize) -> Option<usize> {
    if position == delete_index {
        None
    } else if position > delete_index {
        Some(position - 1)
    } else {
        Some(position)
    }
}
