// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paged sequence: an ordered container split into fixed-capacity pages.
//!
//! Datasets in the tens of thousands are kept in pages of at most
//! [`DEFAULT_PAGE_CAPACITY`] items so that growth never reallocates one huge
//! block. Logical order is page order, then order within a page.
//!
//! Random access walks the page list, which is cheap because consumers read
//! sequentially through a cursor and there are only a handful of pages.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt::Debug;

/// Default number of items stored per page.
pub const DEFAULT_PAGE_CAPACITY: usize = 30_000;

/// An ordered sequence stored as a list of fixed-capacity pages.
///
/// Supports pushing and popping at both ends. Emptied pages are dropped
/// lazily, so the front and back page are never observed empty by callers.
#[derive(Clone)]
pub struct PagedSequence<T> {
    pages: VecDeque<VecDeque<T>>,
    page_capacity: usize,
}

impl<T> Default for PagedSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PagedSequence<T> {
    /// Create an empty sequence using [`DEFAULT_PAGE_CAPACITY`].
    pub fn new() -> Self {
        Self {
            pages: VecDeque::new(),
            page_capacity: DEFAULT_PAGE_CAPACITY,
        }
    }

    /// Create an empty sequence whose pages hold at most `page_capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `page_capacity` is zero. Use
    /// [`try_with_page_capacity`](Self::try_with_page_capacity) when the
    /// capacity comes from user configuration.
    pub fn with_page_capacity(page_capacity: usize) -> Self {
        assert!(page_capacity > 0, "page capacity must be non-zero");
        Self {
            pages: VecDeque::new(),
            page_capacity,
        }
    }

    /// Create an empty sequence, or `None` if `page_capacity` is zero.
    pub fn try_with_page_capacity(page_capacity: usize) -> Option<Self> {
        (page_capacity > 0).then(|| Self::with_page_capacity(page_capacity))
    }

    /// Build a sequence from a batch of items with the default page capacity.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::from_vec_with_capacity(items, DEFAULT_PAGE_CAPACITY)
    }

    /// Build a sequence from a batch of items, splitting it into pages up front.
    ///
    /// # Panics
    ///
    /// Panics if `page_capacity` is zero.
    pub fn from_vec_with_capacity(items: Vec<T>, page_capacity: usize) -> Self {
        let mut seq = Self::with_page_capacity(page_capacity);
        if items.len() <= page_capacity {
            if !items.is_empty() {
                seq.pages.push_back(VecDeque::from(items));
            }
            return seq;
        }
        let mut rest = items.into_iter();
        loop {
            let page: VecDeque<T> = rest.by_ref().take(page_capacity).collect();
            if page.is_empty() {
                break;
            }
            seq.pages.push_back(page);
        }
        seq
    }

    /// Maximum number of items per page.
    pub fn page_capacity(&self) -> usize {
        self.page_capacity
    }

    /// Number of pages currently allocated.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of items. Linear in the number of pages.
    pub fn len(&self) -> usize {
        self.pages.iter().map(VecDeque::len).sum()
    }

    /// Whether the sequence holds no items.
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(VecDeque::is_empty)
    }

    /// Append an item, opening a new page when the last one is full.
    pub fn push(&mut self, item: T) {
        self.trim_back();
        match self.pages.back_mut() {
            Some(page) if page.len() < self.page_capacity => page.push_back(item),
            _ => {
                let mut page = VecDeque::with_capacity(self.page_capacity.min(64));
                page.push_back(item);
                self.pages.push_back(page);
            }
        }
    }

    /// Prepend an item, opening a new page when the first one is full.
    pub fn unshift(&mut self, item: T) {
        self.trim_front();
        match self.pages.front_mut() {
            Some(page) if page.len() < self.page_capacity => page.push_front(item),
            _ => {
                let mut page = VecDeque::with_capacity(self.page_capacity.min(64));
                page.push_front(item);
                self.pages.push_front(page);
            }
        }
    }

    /// Remove and return the last item, or `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        self.trim_back();
        let item = self.pages.back_mut()?.pop_back();
        self.trim_back();
        item
    }

    /// Remove and return the first item, or `None` when empty.
    pub fn shift(&mut self) -> Option<T> {
        self.trim_front();
        let item = self.pages.front_mut()?.pop_front();
        self.trim_front();
        item
    }

    /// Item at global position `index`, or `None` past the end.
    pub fn peek(&self, index: usize) -> Option<&T> {
        let mut offset = index;
        for page in &self.pages {
            if offset < page.len() {
                return page.get(offset);
            }
            offset -= page.len();
        }
        None
    }

    /// The most recently pushed item (the back of the sequence).
    pub fn last(&self) -> Option<&T> {
        self.pages.iter().rev().find_map(|page| page.back())
    }

    /// The front of the sequence.
    pub fn first(&self) -> Option<&T> {
        self.pages.iter().find_map(|page| page.front())
    }

    /// Iterate items in logical order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.pages.iter().flat_map(|page| page.iter())
    }

    /// Iterate items in logical order starting at `index`.
    ///
    /// Whole pages before `index` are skipped without visiting their items.
    pub fn iter_from(&self, index: usize) -> impl Iterator<Item = &T> + '_ {
        let mut offset = index;
        let mut first_page = self.pages.len();
        for (i, page) in self.pages.iter().enumerate() {
            if offset < page.len() {
                first_page = i;
                break;
            }
            offset -= page.len();
        }
        self.pages
            .iter()
            .skip(first_page)
            .flat_map(|page| page.iter())
            .skip(offset)
    }

    /// Drop all items and pages.
    pub fn clear(&mut self) {
        self.pages.clear();
    }

    fn trim_back(&mut self) {
        while self.pages.back().is_some_and(VecDeque::is_empty) {
            self.pages.pop_back();
        }
    }

    fn trim_front(&mut self) {
        while self.pages.front().is_some_and(VecDeque::is_empty) {
            self.pages.pop_front();
        }
    }
}

impl<T> Debug for PagedSequence<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PagedSequence")
            .field("len", &self.len())
            .field("pages", &self.pages.len())
            .field("page_capacity", &self.page_capacity)
            .finish_non_exhaustive()
    }
}

impl<T> From<Vec<T>> for PagedSequence<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T> FromIterator<T> for PagedSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Self::new();
        seq.extend(iter);
        seq
    }
}

impl<T> Extend<T> for PagedSequence<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T> IntoIterator for PagedSequence<T> {
    type Item = T;
    type IntoIter = core::iter::Flatten<alloc::collections::vec_deque::IntoIter<VecDeque<T>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.into_iter().flatten()
    }
}
