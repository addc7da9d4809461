use serde::Serialize;

use crate::error::DocSetError;

/// Results shown per page on every search page.
pub const FILES_PER_PAGE: usize = 10;

/// Page links shown on each side of the current page.
const WINDOW_RADIUS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageSet<T> {
    pages: Vec<Vec<T>>,
}

impl<T> Default for PageSet<T> {
    fn default() -> Self {
        Self { pages: Vec::new() }
    }
}

impl<T: Clone> PageSet<T> {
    /// Splits `results` into contiguous chunks of `page_size`; only the last
    /// page may be shorter. Empty input yields zero pages.
    pub fn paginate(results: &[T], page_size: usize) -> Result<Self, DocSetError> {
        if page_size == 0 {
            return Err(DocSetError::InvalidArgument(
                "page size must be a positive integer".into(),
            ));
        }
        Ok(Self {
            pages: results.chunks(page_size).map(<[T]>::to_vec).collect(),
        })
    }
}

impl<T> PageSet<T> {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, index: usize) -> Option<&[T]> {
        self.pages.get(index).map(Vec::as_slice)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.pages.len().checked_sub(1)
    }

    /// Every entry across every page, in original order.
    pub fn entries(&self) -> impl Iterator<Item = &T> {
        self.pages.iter().flatten()
    }

    pub fn total(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    First,
    Prev,
    Next,
    Last,
    /// Zero-based page index, as carried by a page-number link.
    Goto(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PaginationCursor {
    index: usize,
}

impl PaginationCursor {
    pub fn index(self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Moves the cursor and returns `true`, or leaves it alone and returns
    /// `false` when the target is out of range or is the current page.
    pub fn apply(&mut self, nav: Navigation, page_count: usize) -> bool {
        let Some(last) = page_count.checked_sub(1) else {
            return false;
        };
        let target = match nav {
            Navigation::First => 0,
            Navigation::Prev => match self.index.checked_sub(1) {
                Some(prev) => prev,
                None => return false,
            },
            Navigation::Next => self.index.saturating_add(1),
            Navigation::Last => last,
            Navigation::Goto(index) => index,
        };
        if target > last || target == self.index {
            return false;
        }
        self.index = target;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageItem {
    Page {
        index: usize,
        number: usize,
        active: bool,
    },
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationControls {
    pub first_enabled: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub last_enabled: bool,
    pub items: Vec<PageItem>,
}

impl PaginationControls {
    /// Controls for `page_count` pages at `cursor`; `None` hides them, which
    /// happens whenever there is at most one page.
    pub fn build(page_count: usize, cursor: usize) -> Option<Self> {
        if page_count <= 1 {
            return None;
        }
        let cursor = cursor.min(page_count - 1);
        let at_start = cursor == 0;
        let at_end = cursor == page_count - 1;

        let mut items = Vec::new();
        if cursor > WINDOW_RADIUS {
            items.push(PageItem::Ellipsis);
        }
        let start = cursor.saturating_sub(WINDOW_RADIUS);
        let end = page_count.min(cursor + WINDOW_RADIUS + 1);
        items.extend((start..end).map(|index| PageItem::Page {
            index,
            number: index + 1,
            active: index == cursor,
        }));
        if page_count - cursor > WINDOW_RADIUS + 1 {
            items.push(PageItem::Ellipsis);
        }

        Some(Self {
            first_enabled: !at_start,
            prev_enabled: !at_start,
            next_enabled: !at_end,
            last_enabled: !at_end,
            items,
        })
    }

    /// One-based numbers of the page links, in display order.
    pub fn page_numbers(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter_map(|item| match item {
                PageItem::Page { number, .. } => Some(*number),
                PageItem::Ellipsis => None,
            })
            .collect()
    }

    pub fn leading_ellipsis(&self) -> bool {
        matches!(self.items.first(), Some(PageItem::Ellipsis))
    }

    pub fn trailing_ellipsis(&self) -> bool {
        matches!(self.items.last(), Some(PageItem::Ellipsis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn paginate_chunks_with_short_last_page() {
        let input = numbers(23);
        let pages = PageSet::paginate(&input, 10).unwrap();
        assert_eq!(pages.page_count(), 3);
        assert_eq!(pages.page(0).map(<[usize]>::len), Some(10));
        assert_eq!(pages.page(1).map(<[usize]>::len), Some(10));
        assert_eq!(pages.page(2).map(<[usize]>::len), Some(3));
        let flat: Vec<usize> = pages.entries().copied().collect();
        assert_eq!(flat, input);
    }

    #[test]
    fn paginate_page_count_is_ceiling_for_many_sizes() {
        for len in 0..35 {
            for size in 1..12 {
                let input = numbers(len);
                let pages = PageSet::paginate(&input, size).unwrap();
                assert_eq!(pages.page_count(), len.div_ceil(size));
                for i in 0..pages.page_count().saturating_sub(1) {
                    assert_eq!(pages.page(i).map(<[usize]>::len), Some(size));
                }
                assert_eq!(pages.entries().copied().collect::<Vec<_>>(), input);
            }
        }
    }

    #[test]
    fn paginate_empty_input_has_no_pages() {
        let pages = PageSet::<usize>::paginate(&[], FILES_PER_PAGE).unwrap();
        assert!(pages.is_empty());
        assert_eq!(pages.last_index(), None);
        assert!(PaginationControls::build(pages.page_count(), 0).is_none());
    }

    #[test]
    fn paginate_rejects_zero_page_size() {
        let err = PageSet::paginate(&numbers(3), 0).unwrap_err();
        assert!(matches!(err, DocSetError::InvalidArgument(_)));
    }

    #[test]
    fn single_page_hides_controls() {
        let pages = PageSet::paginate(&numbers(10), FILES_PER_PAGE).unwrap();
        assert_eq!(pages.page_count(), 1);
        assert!(PaginationControls::build(pages.page_count(), 0).is_none());
    }

    #[test]
    fn next_at_last_page_is_noop() {
        let mut cursor = PaginationCursor::default();
        assert!(cursor.apply(Navigation::Last, 3));
        assert_eq!(cursor.index(), 2);
        assert!(!cursor.apply(Navigation::Next, 3));
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn prev_at_first_page_is_noop() {
        let mut cursor = PaginationCursor::default();
        assert!(!cursor.apply(Navigation::Prev, 3));
        assert!(!cursor.apply(Navigation::First, 3));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn goto_outside_range_is_noop() {
        let mut cursor = PaginationCursor::default();
        assert!(!cursor.apply(Navigation::Goto(3), 3));
        assert!(cursor.apply(Navigation::Goto(1), 3));
        assert_eq!(cursor.index(), 1);
        assert!(cursor.apply(Navigation::Prev, 3));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn navigation_without_pages_is_noop() {
        let mut cursor = PaginationCursor::default();
        assert!(!cursor.apply(Navigation::Next, 0));
        assert!(!cursor.apply(Navigation::Last, 0));
    }

    #[test]
    fn controls_at_first_page() {
        let controls = PaginationControls::build(10, 0).unwrap();
        assert!(!controls.first_enabled);
        assert!(!controls.prev_enabled);
        assert!(controls.next_enabled);
        assert!(controls.last_enabled);
        assert_eq!(controls.page_numbers(), vec![1, 2, 3]);
        assert!(!controls.leading_ellipsis());
        assert!(controls.trailing_ellipsis());
    }

    #[test]
    fn controls_in_the_middle_show_both_ellipses() {
        let controls = PaginationControls::build(10, 5).unwrap();
        assert_eq!(controls.page_numbers(), vec![4, 5, 6, 7, 8]);
        assert!(controls.leading_ellipsis());
        assert!(controls.trailing_ellipsis());
        assert!(controls.items.contains(&PageItem::Page {
            index: 5,
            number: 6,
            active: true
        }));
    }

    #[test]
    fn controls_at_last_page() {
        let controls = PaginationControls::build(10, 9).unwrap();
        assert_eq!(controls.page_numbers(), vec![8, 9, 10]);
        assert!(controls.leading_ellipsis());
        assert!(!controls.trailing_ellipsis());
        assert!(!controls.next_enabled);
        assert!(!controls.last_enabled);
        assert!(controls.prev_enabled);
    }

    #[test]
    fn controls_for_few_pages_have_no_ellipsis() {
        let controls = PaginationControls::build(3, 1).unwrap();
        assert_eq!(controls.page_numbers(), vec![1, 2, 3]);
        assert!(!controls.leading_ellipsis());
        assert!(!controls.trailing_ellipsis());
    }
}
