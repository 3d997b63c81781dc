//! Pagination for catalog results.
//!
//! [`page_window`] computes which page buttons to show: the first page, the
//! last page, the current page and its neighbours, with each run of hidden
//! pages collapsed into a single [`PageSlot::Gap`].
//!
//! ```rust
//! use agro_catalog::prelude::*;
//!
//! let window = page_window(5, 10);
//! assert_eq!(
//!     window,
//!     vec![
//!         PageSlot::Page(1),
//!         PageSlot::Gap,
//!         PageSlot::Page(4),
//!         PageSlot::Page(5),
//!         PageSlot::Page(6),
//!         PageSlot::Gap,
//!         PageSlot::Page(10),
//!     ]
//! );
//! ```
use std::fmt;

use serde::Serialize;

/// One entry of a pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSlot {
    Page(u32),
    /// one or more omitted pages
    Gap,
}

impl fmt::Display for PageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{page}"),
            Self::Gap => f.write_str("…"),
        }
    }
}

/// Computes the page window for `current` out of `total` pages.
///
/// `total` of 0 is treated as 1 and `current` is clamped into `[1, total]`.
/// The result is strictly increasing and never has two adjacent gaps.
pub fn page_window(current: u32, total: u32) -> Vec<PageSlot> {
    let total = total.max(1);
    let current = current.clamp(1, total);

    let mut shown: Vec<u32> = vec![1, total];
    for page in current.saturating_sub(1)..=current.saturating_add(1) {
        if (1..=total).contains(&page) {
            shown.push(page);
        }
    }
    shown.sort_unstable();
    shown.dedup();

    let mut window = Vec::with_capacity(shown.len() * 2);
    let mut previous: Option<u32> = None;
    for page in shown {
        if let Some(prev) = previous
            && page > prev + 1
        {
            window.push(PageSlot::Gap);
        }
        window.push(PageSlot::Page(page));
        previous = Some(page);
    }
    window
}

/// Current page and page count of the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current: u32,
    total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current: 1,
            total_pages: 1,
        }
    }
}

impl Pagination {
    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Moves to `page`, clamped to `[1, total_pages]`. Returns the new current page.
    pub fn go_to(&mut self, page: u32) -> u32 {
        self.current = page.clamp(1, self.total_pages);
        self.current
    }

    /// Back to the first page. Used whenever the search context changes.
    pub fn reset(&mut self) {
        self.current = 1;
    }

    /// Records the page count of the latest result and keeps `current` in range.
    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = total_pages.max(1);
        self.current = self.current.clamp(1, self.total_pages);
    }

    /// Pagination controls are hidden for single-page results.
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }

    pub fn window(&self) -> Vec<PageSlot> {
        page_window(self.current, self.total_pages)
    }
}
