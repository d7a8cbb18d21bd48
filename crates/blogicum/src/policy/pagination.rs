//! Fixed-size page slicing driven by the `?page=` query parameter.
//!
//! A client-supplied page number never causes an error: missing or garbled
//! values select page 1, numbers past the end select the last page, numbers
//! below 1 select page 1. An empty collection still has one (empty) page.

use serde::Serialize;

/// Default number of posts per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Number of pages needed for `total` items.
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    let pages = total.div_ceil(per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Resolve a raw `page` parameter to a page number in `1..=total_pages`.
pub fn resolve_page(raw: Option<&str>, total_pages: u32) -> u32 {
    let last = total_pages.max(1);
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return 1;
    };

    match raw.parse::<i64>() {
        Ok(n) if n < 1 => 1,
        Ok(n) => u32::try_from(n).map_or(last, |n| n.min(last)),
        // Integers too large for i64 are still past the end.
        Err(_) if is_unsigned_integer(raw) => last,
        Err(_) => 1,
    }
}

fn is_unsigned_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// The slice of a collection a page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub total_pages: u32,
    pub total: u64,
    pub per_page: u32,
}

impl PageWindow {
    pub fn new(raw: Option<&str>, total: u64, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_pages(total, per_page);
        Self {
            number: resolve_page(raw, total_pages),
            total_pages,
            total,
            per_page,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

/// One page of results, ready for a template.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub total_pages: u32,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    /// Wrap items already sliced to `window`.
    pub fn from_window(window: PageWindow, items: Vec<T>) -> Self {
        let has_previous = window.number > 1;
        let has_next = window.number < window.total_pages;
        Self {
            items,
            number: window.number,
            total_pages: window.total_pages,
            total: window.total,
            has_previous,
            has_next,
            previous_page: has_previous.then(|| window.number - 1),
            next_page: has_next.then(|| window.number + 1),
        }
    }
}

/// Slice an ordered in-memory collection.
pub fn paginate<T>(items: Vec<T>, page_param: Option<&str>, per_page: u32) -> Page<T> {
    let window = PageWindow::new(page_param, items.len() as u64, per_page);
    let offset = usize::try_from(window.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(window.limit()).unwrap_or(usize::MAX);
    let slice = items.into_iter().skip(offset).take(limit).collect();
    Page::from_window(window, slice)
}
