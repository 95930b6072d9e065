//! # Paging
//!
//! Offset pages over an already filtered and sorted list. All arithmetic is
//! integer-only; `TotalPages` is a ceiling division.

use serde::{Deserialize, Serialize};

/// Page metadata, sent to clients in the `X-Pagination` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetaData {
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_count: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl MetaData {
    #[must_use]
    pub fn new(current_page: u32, page_size: u32, total_count: u32) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_count.div_ceil(page_size);
        Self {
            current_page,
            total_pages,
            page_size,
            total_count,
            has_previous: current_page > 1,
            has_next: current_page < total_pages,
        }
    }
}

/// One page of items plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub meta: MetaData,
}

impl<T> PagedList<T> {
    /// Cut page `page_number` (1-based) of `page_size` items out of `source`.
    #[must_use]
    pub fn to_paged_list(source: Vec<T>, page_number: u32, page_size: u32) -> Self {
        let page_number = page_number.max(1);
        let page_size = page_size.max(1);
        let total_count = u32::try_from(source.len()).unwrap_or(u32::MAX);
        let skip = (page_number as usize - 1).saturating_mul(page_size as usize);

        let items = source
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .collect();

        Self {
            items,
            meta: MetaData::new(page_number, page_size, total_count),
        }
    }

    /// Transform the items, keeping the metadata.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PagedList<U> {
        PagedList {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
