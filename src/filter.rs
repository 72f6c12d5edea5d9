/// Filter/Page Engine
///
/// Applies the row predicate and the page window to the source collection in
/// a single pass. `total_rows` counts every record that passes the predicate,
/// independent of the window; it is what page clamping is based on.

use crate::value::Record;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Row predicate installed with `DataView::set_filter`
pub type Predicate = Box<dyn Fn(&Record) -> bool>;

/// Paging state. `page_size == 0` means unpaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PagingInfo {
    pub page_size: usize,
    pub page_num: usize,
    pub total_rows: usize,
}

impl PagingInfo {
    /// Number of pages needed for `total_rows`. Zero when unpaged.
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.total_rows.div_ceil(self.page_size)
        }
    }

    /// Clamp a requested page number to `[0, page_count]`.
    pub fn clamp_page(&self, page_num: usize) -> usize {
        if self.page_size == 0 {
            0
        } else {
            page_num.min(self.page_count())
        }
    }

    /// True if the current page starts past the last filtered row.
    pub fn is_past_end(&self) -> bool {
        self.page_size != 0 && self.total_rows < self.page_num.saturating_mul(self.page_size)
    }

    /// Last page that still satisfies `page_num * page_size <= total_rows`.
    pub fn last_valid_page(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.total_rows / self.page_size
        }
    }
}

/// Arguments of `DataView::set_paging_options`. Unset fields keep their value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PagingOptions {
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub page_num: Option<usize>,
}

impl PagingOptions {
    pub fn page_size(page_size: usize) -> Self {
        PagingOptions {
            page_size: Some(page_size),
            page_num: None,
        }
    }

    pub fn page_num(page_num: usize) -> Self {
        PagingOptions {
            page_size: None,
            page_num: Some(page_num),
        }
    }

    pub fn new(page_size: usize, page_num: usize) -> Self {
        PagingOptions {
            page_size: Some(page_size),
            page_num: Some(page_num),
        }
    }
}

/// Output of the filter/page pass
#[derive(Debug, Clone, Default)]
pub struct FilteredRows {
    pub rows: Vec<Rc<Record>>,
    pub total_rows: usize,
}

/// Filter `items` and cut the current page out of the result.
pub fn filter_and_page(
    items: &[Rc<Record>],
    filter: Option<&Predicate>,
    page_size: usize,
    page_num: usize,
) -> FilteredRows {
    if filter.is_none() && page_size == 0 {
        return FilteredRows {
            rows: items.to_vec(),
            total_rows: items.len(),
        };
    }

    // Saturated windows start past any real row count
    let page_start = page_size.saturating_mul(page_num);
    let page_end = page_start.saturating_add(page_size);
    let mut rows = Vec::new();
    let mut matched = 0;

    for item in items {
        if filter.map_or(true, |f| f(item.as_ref())) {
            if page_size == 0 || (matched >= page_start && matched < page_end) {
                rows.push(Rc::clone(item));
            }
            matched += 1;
        }
    }

    log::trace!(
        "filter/page: {} of {} items matched, {} in window",
        matched,
        items.len(),
        rows.len()
    );

    FilteredRows {
        rows,
        total_rows: matched,
    }
}
