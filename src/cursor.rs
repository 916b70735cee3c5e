//! Page cursors and direct per-source pagination.
//!
//! A [`PageCursor`] remembers the next page to request from one source, or
//! that the source is exhausted. The merge keeps one per source for its own
//! rounds; direct pagination keeps a second, independent set. Both read and
//! fill the same [`PageCache`], so neither mode fetches a page the other has
//! already seen.

use serde::{Deserialize, Serialize};

use crate::cache::PageCache;
use crate::error::Result;
use crate::source::PageSource;

/// Position of a cursor within one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCursor {
    /// The next page to request.
    Next(u32),
    /// The source returned an empty page; nothing more will be requested.
    Exhausted,
}

impl PageCursor {
    /// Cursor positioned at `first_page`.
    pub fn start(first_page: u32) -> Self {
        Self::Next(first_page)
    }

    /// Page to request next, or `None` once exhausted.
    pub fn next_page(self) -> Option<u32> {
        match self {
            Self::Next(page) => Some(page),
            Self::Exhausted => None,
        }
    }

    /// True once the source has signalled the end of its data.
    pub fn is_exhausted(self) -> bool {
        self == Self::Exhausted
    }

    /// Step past a page that returned `hits`. An empty page exhausts, as
    /// does running past the last addressable page number.
    pub fn advance(&mut self, hits_returned: usize) {
        *self = match *self {
            Self::Next(_) if hits_returned == 0 => Self::Exhausted,
            Self::Next(page) => page.checked_add(1).map_or(Self::Exhausted, Self::Next),
            Self::Exhausted => Self::Exhausted,
        };
    }
}

/// Return the next raw page of one source and move its cursor.
///
/// An exhausted cursor returns an empty page without touching the source.
///
/// # Errors
///
/// Returns [`MergeError::Source`](crate::MergeError::Source) if the fetch
/// fails; the cursor is left where it was.
pub async fn next_source_page<H, O>(
    cache: &mut PageCache<H>,
    cursor: &mut PageCursor,
    index: usize,
    source: &dyn PageSource<H, O>,
    options: &O,
) -> Result<Vec<H>>
where
    H: Clone + Send,
    O: Sync,
{
    let Some(page) = cursor.next_page() else {
        return Ok(Vec::new());
    };
    let hits = cache.fetch(index, source, page, options).await?;
    cursor.advance(hits.len());
    if cursor.is_exhausted() {
        tracing::debug!(source = index, page, "source cursor exhausted");
    }
    Ok(hits)
}
