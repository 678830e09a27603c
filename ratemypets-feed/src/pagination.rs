//! Page slicing and page-number labels, derived from the post collection on every read.

use std::{
    fmt::{Display, Formatter},
    num::NonZeroUsize,
};

/// Up to this many pages, every page number gets a label.
pub const MAX_VISIBLE_PAGES: usize = 5;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct PageState {
    current_page: usize,
    page_size: NonZeroUsize,
}

impl PageState {
    #[must_use]
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            current_page: 1,
            page_size,
        }
    }

    #[must_use]
    pub fn current_page(self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn page_size(self) -> NonZeroUsize {
        self.page_size
    }

    #[must_use]
    pub fn total_pages(self, len: usize) -> usize {
        total_pages(len, self.page_size)
    }

    /// Moves to `page`, clamped into `1..=total_pages`.
    pub fn set_page(&mut self, page: usize, len: usize) -> usize {
        self.current_page = page.clamp(1, self.total_pages(len));
        self.current_page
    }

    /// Pulls the current page back into range after the collection shrank.
    pub fn clamp(&mut self, len: usize) -> usize {
        self.set_page(self.current_page, len)
    }
}

#[must_use]
pub fn total_pages(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get()).max(1)
}

/// The items shown on the current page.
#[must_use]
pub fn derive<T>(items: &[T], state: PageState) -> &[T] {
    let size = state.page_size.get();
    let start = (state.current_page - 1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum PageLabel {
    Page(usize),
    /// Placeholder for skipped pages. Never a navigation target.
    Ellipsis,
}

impl PageLabel {
    #[must_use]
    pub fn target(self) -> Option<usize> {
        match self {
            PageLabel::Page(page) => Some(page),
            PageLabel::Ellipsis => None,
        }
    }
}

impl Display for PageLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PageLabel::Page(page) => Display::fmt(page, f),
            PageLabel::Ellipsis => f.write_str("..."),
        }
    }
}

/// Labels for the page navigation control.
#[must_use]
pub fn page_labels(current_page: usize, total_pages: usize) -> Vec<PageLabel> {
    use PageLabel::{Ellipsis, Page};

    if total_pages <= MAX_VISIBLE_PAGES {
        return (1..=total_pages).map(Page).collect();
    }

    if current_page <= 3 {
        vec![Page(1), Page(2), Page(3), Ellipsis, Page(total_pages)]
    } else if current_page >= total_pages - 2 {
        vec![
            Page(1),
            Ellipsis,
            Page(total_pages - 2),
            Page(total_pages - 1),
            Page(total_pages),
        ]
    } else {
        vec![Page(1), Ellipsis, Page(current_page), Ellipsis, Page(total_pages)]
    }
}
