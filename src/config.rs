/// Construction options for a `DataView`.
///
/// Options can be built in code or loaded from JSON; every field is optional
/// in the JSON form and falls back to its default.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Initial configuration of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Field holding each record's unique id
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Rows per page, 0 for unpaged
    #[serde(default)]
    pub page_size: usize,

    /// Zero-based page number
    #[serde(default)]
    pub page_num: usize,

    /// Whether collapsed groups still contribute to totals
    #[serde(default)]
    pub aggregate_collapsed: bool,
}

fn default_id_field() -> String {
    "id".to_string()
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            id_field: default_id_field(),
            page_size: 0,
            page_num: 0,
            aggregate_collapsed: false,
        }
    }
}

impl ViewOptions {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn with_paging(mut self, page_size: usize, page_num: usize) -> Self {
        self.page_size = page_size;
        self.page_num = page_num;
        self
    }
}
