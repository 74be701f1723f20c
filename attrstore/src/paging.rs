/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Paged scan results.

use attrstore_types::AttributeMap;

/// An opaque resume point handed back by a paged scan.
///
/// Feed it to the next [`scan_page`](crate::Dao::scan_page) call to continue
/// where the previous page stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor(AttributeMap);

impl PageCursor {
    pub(crate) fn new(key: AttributeMap) -> Self {
        Self(key)
    }

    pub(crate) fn into_inner(self) -> AttributeMap {
        self.0
    }
}

/// One page of decoded scan results.
#[derive(Debug)]
pub struct Page<T> {
    items: Vec<T>,
    cursor: Option<PageCursor>,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, cursor: Option<PageCursor>) -> Self {
        Self { items, cursor }
    }

    /// The records on this page.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// True when the scan stopped at the page limit and more items may
    /// follow.
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// Splits the page into its records and the cursor for the next page.
    pub fn into_parts(self) -> (Vec<T>, Option<PageCursor>) {
        (self.items, self.cursor)
    }

    /// Discards the cursor and keeps the records.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
