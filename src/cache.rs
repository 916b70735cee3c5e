//! Per-source page cache.
//!
//! Memoises every page fetched from every source, keyed by
//! (source index, page number). Entries are never evicted: a page that is
//! in the cache is never requested from its source again, for the lifetime
//! of the merge session (including across state extraction and injection).
//! Memory therefore grows with the number of distinct pages visited.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};
use crate::source::PageSource;

/// Fetched pages, one map per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCache<H> {
    sources: Vec<BTreeMap<u32, Vec<H>>>,
}

impl<H> PageCache<H> {
    /// An empty cache for `source_count` sources.
    pub fn new(source_count: usize) -> Self {
        Self {
            sources: (0..source_count).map(|_| BTreeMap::new()).collect(),
        }
    }

    /// Number of sources this cache is laid out for.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Cached page, if it was fetched before.
    pub fn get(&self, source: usize, page: u32) -> Option<&[H]> {
        self.sources
            .get(source)
            .and_then(|pages| pages.get(&page))
            .map(Vec::as_slice)
    }

    /// Whether (`source`, `page`) has been fetched.
    pub fn contains(&self, source: usize, page: u32) -> bool {
        self.get(source, page).is_some()
    }

    /// Record a fetched page. Empty pages are stored too, so exhaustion is
    /// remembered.
    pub fn insert(&mut self, source: usize, page: u32, hits: Vec<H>) {
        if let Some(pages) = self.sources.get_mut(source) {
            pages.insert(page, hits);
        }
    }

    /// Total number of cached pages across all sources.
    pub fn len(&self) -> usize {
        self.sources.iter().map(BTreeMap::len).sum()
    }

    /// True when nothing has been fetched yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Clone + Send> PageCache<H> {
    /// Return the cached page for (`index`, `page`), fetching and caching it
    /// on first access.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Source`] if the source fails. Nothing is cached
    /// in that case, so the call can be retried.
    pub async fn fetch<O: Sync>(
        &mut self,
        index: usize,
        source: &dyn PageSource<H, O>,
        page: u32,
        options: &O,
    ) -> Result<Vec<H>> {
        if let Some(hits) = self.get(index, page) {
            tracing::trace!(source = index, page, "page cache hit");
            return Ok(hits.to_vec());
        }

        let hits = source
            .fetch_page(page, options)
            .await
            .map_err(|source| MergeError::Source { index, source })?;
        tracing::debug!(source = index, page, count = hits.len(), "fetched page");

        self.insert(index, page, hits.clone());
        Ok(hits)
    }
}
