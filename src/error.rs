/// Error types for the view engine
///
/// All of these are precondition violations. The operation that raises one
/// is aborted and leaves the view exactly as it was.

use crate::value::Key;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ViewError>;

/// Main error type for view operations
#[derive(Error, Debug)]
pub enum ViewError {
    /// Two records in a collection share an id
    #[error("Duplicate id {id} at index {index}")]
    DuplicateId { id: Key, index: usize },

    /// A record has no value for the id field
    #[error("Record at index {index} is missing id field '{field}'")]
    MissingId { index: usize, field: String },

    /// `update_item` with an unknown id, or a record whose id disagrees
    #[error("Invalid or non-matching id {id}")]
    IdentityMismatch { id: Key },

    /// `delete_item` with an id not present in the collection
    #[error("Unknown id {id}")]
    UnknownId { id: Key },

    /// Insert position past the end of the collection
    #[error("Index {index} out of range [0, {len}]")]
    IndexOutOfRange { index: usize, len: usize },

    /// Input data has the wrong shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// JSON parsing failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
