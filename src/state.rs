//! Serializable merge session state.
//!
//! [`MergeState`] is everything a [`MergeEngine`](crate::MergeEngine)
//! mutates: the page cache, one merge cursor per source and one direct page
//! cursor per source. Extracting it and injecting it into a freshly built
//! engine (same sources, same order) resumes the session exactly.
//!
//! For stateless boundaries such as an HTTP cursor parameter, the state can
//! be packed into an opaque token: JSON, then URL-safe base64 without
//! padding.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cache::PageCache;
use crate::cursor::PageCursor;
use crate::error::{MergeError, Result};

/// One source's position in the global merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeCursor<H> {
    /// Buffered hits not yet emitted, in source order.
    pub buffer: Vec<H>,
    /// Next page the merge will request from this source.
    pub next_page: PageCursor,
}

impl<H> MergeCursor<H> {
    /// Empty buffer positioned at `first_page`.
    pub fn start(first_page: u32) -> Self {
        Self {
            buffer: Vec::new(),
            next_page: PageCursor::start(first_page),
        }
    }

    /// True when the source is exhausted and its buffer drained.
    pub fn is_finished(&self) -> bool {
        self.next_page.is_exhausted() && self.buffer.is_empty()
    }
}

/// Complete mutable state of a merge session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeState<H> {
    /// Every page fetched so far, by either cursor mode.
    pub pages: PageCache<H>,
    /// Per-source state of the global merge.
    pub merge_cursors: Vec<MergeCursor<H>>,
    /// Per-source cursors for direct pagination.
    pub source_cursors: Vec<PageCursor>,
}

impl<H> MergeState<H> {
    /// Initial state for `source_count` sources.
    pub fn new(source_count: usize, first_page: u32) -> Self {
        Self {
            pages: PageCache::new(source_count),
            merge_cursors: (0..source_count)
                .map(|_| MergeCursor::start(first_page))
                .collect(),
            source_cursors: vec![PageCursor::start(first_page); source_count],
        }
    }

    /// Number of sources this state describes, or `None` if its parts
    /// disagree.
    pub fn source_count(&self) -> Option<usize> {
        let count = self.merge_cursors.len();
        (self.pages.source_count() == count && self.source_cursors.len() == count)
            .then_some(count)
    }
}

impl<H: Serialize> MergeState<H> {
    /// Encode this state as an opaque, URL-safe cursor token.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::State`] if a hit fails to serialize.
    pub fn to_token(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| MergeError::State(format!("failed to encode state: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

impl<H: DeserializeOwned> MergeState<H> {
    /// Decode a token produced by [`to_token`](Self::to_token).
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::State`] if the token is not valid base64 or does
    /// not hold a merge state.
    pub fn from_token(token: &str) -> Result<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| MergeError::State(format!("cursor token is not valid base64: {e}")))?;
        serde_json::from_slice(&json)
            .map_err(|e| MergeError::State(format!("cursor token does not hold a merge state: {e}")))
    }
}
