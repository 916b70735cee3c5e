//! Trait definition for pluggable paginated sources.
//!
//! Each source serves one already-sorted stream of hits, one page at a time.
//! An empty page signals that the source is exhausted.

use std::future::Future;

use async_trait::async_trait;

use crate::error::SourceError;

/// A paginated, pre-sorted origin of hits.
///
/// Pages must already be sorted in the merge's emission order. The merge
/// never re-requests a page it has seen, so implementations do not need
/// their own caching.
///
/// All implementations must be `Send + Sync` so a merge round can fetch from
/// several sources concurrently.
#[async_trait]
pub trait PageSource<H, O = ()>: Send + Sync {
    /// Fetch page number `page`.
    ///
    /// `options` is forwarded verbatim from the caller of the merge operation.
    ///
    /// # Errors
    ///
    /// Any error is propagated unchanged to the caller of the merge operation.
    async fn fetch_page(&self, page: u32, options: &O) -> Result<Vec<H>, SourceError>;
}

/// Adapts an async closure `(page, options) -> hits` into a [`PageSource`].
pub struct FnSource<F> {
    fetch: F,
}

impl<F> FnSource<F> {
    /// Wrap `fetch` as a page source.
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

#[async_trait]
impl<H, O, F, Fut> PageSource<H, O> for FnSource<F>
where
    H: Send + 'static,
    O: Clone + Send + Sync + 'static,
    F: Fn(u32, O) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<H>, SourceError>> + Send,
{
    async fn fetch_page(&self, page: u32, options: &O) -> Result<Vec<H>, SourceError> {
        (self.fetch)(page, options.clone()).await
    }
}

/// Serves a fixed, pre-sorted list of hits in pages of `page_size`.
#[derive(Debug, Clone)]
pub struct MemorySource<H> {
    hits: Vec<H>,
    page_size: usize,
    first_page: u32,
}

impl<H> MemorySource<H> {
    /// Serve `hits` in pages of `page_size` (at least one hit per page),
    /// numbered from zero.
    pub fn new(hits: Vec<H>, page_size: usize) -> Self {
        Self {
            hits,
            page_size: page_size.max(1),
            first_page: 0,
        }
    }

    /// Number the pages from `first_page` instead of zero.
    pub fn with_first_page(mut self, first_page: u32) -> Self {
        self.first_page = first_page;
        self
    }

    /// Hits on `page`, empty past the end (or before `first_page`).
    pub fn page(&self, page: u32) -> &[H] {
        let Some(index) = page.checked_sub(self.first_page) else {
            return &[];
        };
        let start = (index as usize).saturating_mul(self.page_size);
        if start >= self.hits.len() {
            return &[];
        }
        let end = start.saturating_add(self.page_size).min(self.hits.len());
        &self.hits[start..end]
    }
}

#[async_trait]
impl<H, O> PageSource<H, O> for MemorySource<H>
where
    H: Clone + Send + Sync,
    O: Sync,
{
    async fn fetch_page(&self, page: u32, _options: &O) -> Result<Vec<H>, SourceError> {
        Ok(self.page(page).to_vec())
    }
}
