//! Page arithmetic and page-link windows.

use serde::Serialize;
use std::fmt;

/// Pages shown without ellipses.
const MAX_VISIBLE_PAGES: usize = 5;

/// Number of pages needed for `count` rows.
pub const fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Inclusive zero-based row range `(from, to)` for a zero-based `page`.
pub const fn page_bounds(page: usize, page_size: usize) -> (usize, usize) {
    let from = page.saturating_mul(page_size);
    let to = from.saturating_add(page_size).saturating_sub(1);
    (from, to)
}

/// One entry in a pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

impl fmt::Display for PageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(n) => write!(f, "{}", n),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

/// Page links around the one-based `current` page.
///
/// A single page (or none) yields no links. Up to five pages are all listed;
/// beyond that the first and last page are always shown together with the
/// neighbours of `current`, and gaps become [`PageLink::Ellipsis`].
pub fn page_window(current: usize, total: usize) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }

    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(PageLink::Page).collect();
    }

    let mut links = vec![PageLink::Page(1)];

    if current > 3 {
        links.push(PageLink::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = current.saturating_add(1).min(total - 1);
    links.extend((start..=end).map(PageLink::Page));

    if current.saturating_add(2) < total {
        links.push(PageLink::Ellipsis);
    }

    links.push(PageLink::Page(total));
    links
}

/// Render a window as `1 ... 4 [5] 6 ... 10`.
pub fn render_window(current: usize, total: usize) -> String {
    page_window(current, total)
        .into_iter()
        .map(|link| match link {
            PageLink::Page(n) if n == current => format!("[{}]", n),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A page of results plus the totals needed to navigate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the query across all pages
    pub count: usize,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Cut one page out of an already filtered and ordered list.
    pub fn slice(all: Vec<T>, page: usize, page_size: usize) -> Self {
        let count = all.len();
        let (from, _) = page_bounds(page, page_size);
        let items = all.into_iter().skip(from).take(page_size).collect();
        Self {
            items,
            count,
            page,
            page_size,
        }
    }

    pub const fn total_pages(&self) -> usize {
        total_pages(self.count, self.page_size)
    }

    pub const fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub const fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages()
    }

    /// Zero-based index of the first row on this page.
    pub const fn offset(&self) -> usize {
        page_bounds(self.page, self.page_size).0
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::PageLink::{Ellipsis, Page as P};
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case(0, 9, 0)]
    #[case(1, 9, 1)]
    #[case(9, 9, 1)]
    #[case(10, 9, 2)]
    #[case(27, 9, 3)]
    #[case(5, 0, 0)]
    fn counts_pages(#[case] count: usize, #[case] size: usize, #[case] expected: usize) {
        check!(total_pages(count, size) == expected);
    }

    #[rstest]
    #[case(0, 10, (0, 9))]
    #[case(2, 9, (18, 26))]
    fn bounds(#[case] page: usize, #[case] size: usize, #[case] expected: (usize, usize)) {
        check!(page_bounds(page, size) == expected);
    }

    #[rstest]
    #[case(1, 1, vec![])]
    #[case(2, 4, vec![P(1), P(2), P(3), P(4)])]
    #[case(1, 10, vec![P(1), P(2), Ellipsis, P(10)])]
    #[case(3, 10, vec![P(1), P(2), P(3), P(4), Ellipsis, P(10)])]
    #[case(5, 10, vec![P(1), Ellipsis, P(4), P(5), P(6), Ellipsis, P(10)])]
    #[case(8, 10, vec![P(1), Ellipsis, P(7), P(8), P(9), P(10)])]
    #[case(10, 10, vec![P(1), Ellipsis, P(9), P(10)])]
    fn windows(#[case] current: usize, #[case] total: usize, #[case] expected: Vec<PageLink>) {
        check!(page_window(current, total) == expected);
    }

    #[rstest]
    #[case(usize::MAX, 12, vec![P(1), Ellipsis, P(12)])]
    #[case(usize::MAX - 1, 12, vec![P(1), Ellipsis, P(12)])]
    fn windows_past_the_end(
        #[case] current: usize,
        #[case] total: usize,
        #[case] expected: Vec<PageLink>,
    ) {
        check!(page_window(current, total) == expected);
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let page = Page::slice(vec![1, 2, 3], usize::MAX, usize::MAX);
        check!(page.items.is_empty());
        check!(page.offset() == usize::MAX);
        check!(!page.has_next());
    }

    #[test]
    fn renders_current_page() {
        check!(render_window(5, 10) == "1 ... 4 [5] 6 ... 10");
    }

    #[test]
    fn slices_last_partial_page() {
        let page = Page::slice((0..20).collect::<Vec<_>>(), 2, 9);
        check!(page.items == [18, 19]);
        check!(page.count == 20);
        check!(page.total_pages() == 3);
        check!(page.has_previous());
        check!(!page.has_next());
    }
}
