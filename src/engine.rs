//! Merge engine: lazy k-way merge over paginated sources.
//!
//! Each call to [`MergeEngine::get_next`] runs one round:
//!
//! 1. Every source whose buffer is drained (and which is not exhausted) has
//!    its next page loaded, from the page cache when possible and otherwise
//!    from the source; cache misses are fetched concurrently.
//! 2. The round's buffers are folded into a [`Frontier`](crate::frontier::Frontier)
//!    and the safe window is validated.
//! 3. Hits inside the window are emitted in comparator order; the rest stay
//!    buffered for the next round.
//!
//! State is only committed after step 2 succeeds, so a failed round (fetch
//! error or ordering violation) leaves cursors and buffers untouched. Fetched
//! pages are cached even then, so retrying never refetches them.

use std::fmt;

use futures::Stream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::PageCache;
use crate::comparator::Comparator;
use crate::config::MergeConfig;
use crate::cursor::next_source_page;
use crate::error::{MergeError, Result};
use crate::frontier::EmissionPlan;
use crate::source::PageSource;
use crate::state::MergeState;

/// Boxed page source as stored by the engine.
pub type BoxedSource<H, O = ()> = Box<dyn PageSource<H, O>>;

/// Merges N pre-sorted paginated sources into one ordered, duplicate-free
/// stream of chunks.
///
/// The engine is a single cursor: operations take `&mut self`, so calls are
/// serialized by construction.
pub struct MergeEngine<H, O = ()> {
    sources: Vec<BoxedSource<H, O>>,
    comparator: Comparator<H>,
    state: MergeState<H>,
}

impl<H, O> fmt::Debug for MergeEngine<H, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeEngine")
            .field("sources", &self.sources.len())
            .field("cached_pages", &self.state.pages.len())
            .finish_non_exhaustive()
    }
}

impl<H, O> MergeEngine<H, O>
where
    H: Clone + Send + Sync,
    O: Sync,
{
    /// Build an engine over `sources`, ordered by `comparator`, with page
    /// numbering starting at zero.
    pub fn new(sources: Vec<BoxedSource<H, O>>, comparator: Comparator<H>) -> Self {
        let state = MergeState::new(sources.len(), 0);
        Self {
            sources,
            comparator,
            state,
        }
    }

    /// Start every cursor at `first_page` instead of zero.
    ///
    /// Resets the session; call before the first fetch.
    pub fn with_first_page(mut self, first_page: u32) -> Self {
        self.state = MergeState::new(self.sources.len(), first_page);
        self
    }

    /// Number of configured sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// The ordering rule in use.
    pub fn comparator(&self) -> &Comparator<H> {
        &self.comparator
    }

    /// Number of distinct pages fetched so far, by either cursor mode.
    pub fn cached_pages(&self) -> usize {
        self.state.pages.len()
    }

    /// True once every source is exhausted and every merge buffer drained,
    /// i.e. the next [`get_next`](Self::get_next) would return empty without
    /// fetching.
    pub fn is_exhausted(&self) -> bool {
        self.state.merge_cursors.iter().all(|c| c.is_finished())
    }

    /// Return the next globally ordered chunk of hits.
    ///
    /// `options` is forwarded to every source fetch this round. An empty
    /// chunk means every source is exhausted and drained.
    ///
    /// # Errors
    ///
    /// - [`MergeError::Source`] if any fetch fails (the first failing source
    ///   in index order is reported).
    /// - [`MergeError::OrderingViolation`] if a source served data out of the
    ///   configured order.
    ///
    /// In both cases the merge cursors are left as they were.
    pub async fn get_next(&mut self, options: &O) -> Result<Vec<H>> {
        let round = self.load_round(options).await?;

        let plan = {
            let views: Vec<&[H]> = self
                .state
                .merge_cursors
                .iter()
                .zip(&round)
                .map(|(cursor, page)| match page {
                    Some(hits) => hits.as_slice(),
                    None => cursor.buffer.as_slice(),
                })
                .collect();
            EmissionPlan::compute(&self.comparator, &views)?
        };

        let mut chunk = Vec::with_capacity(plan.emitted());
        let mut retained = 0;
        for (index, (cursor, page)) in self
            .state
            .merge_cursors
            .iter_mut()
            .zip(round)
            .enumerate()
        {
            if let Some(hits) = page {
                cursor.next_page.advance(hits.len());
                if cursor.next_page.is_exhausted() {
                    tracing::debug!(source = index, "merge cursor exhausted");
                }
                cursor.buffer = hits;
            }
            let (emitted, kept) = plan.split(index, std::mem::take(&mut cursor.buffer));
            retained += kept.len();
            cursor.buffer = kept;
            chunk.extend(emitted);
        }
        self.comparator.sort(&mut chunk);

        tracing::debug!(emitted = chunk.len(), retained, "merge round complete");
        Ok(chunk)
    }

    /// Return the next raw page of source `index`, independently of the
    /// global merge.
    ///
    /// Shares the page cache with [`get_next`](Self::get_next) but never
    /// touches its cursors or buffers.
    ///
    /// # Errors
    ///
    /// - [`MergeError::UnknownSource`] if `index` is out of range.
    /// - [`MergeError::Source`] if the fetch fails.
    pub async fn get_next_for_source(&mut self, index: usize, options: &O) -> Result<Vec<H>> {
        let source = self
            .sources
            .get(index)
            .ok_or(MergeError::UnknownSource(index))?;
        let cursor = self
            .state
            .source_cursors
            .get_mut(index)
            .ok_or(MergeError::UnknownSource(index))?;
        next_source_page(&mut self.state.pages, cursor, index, source.as_ref(), options).await
    }

    /// Stream every remaining chunk, ending after the first empty one.
    ///
    /// The stream stops at the first error, which it yields.
    pub fn chunks<'a>(&'a mut self, options: &'a O) -> impl Stream<Item = Result<Vec<H>>> + 'a {
        futures::stream::try_unfold(self, move |engine| async move {
            let chunk = engine.get_next(options).await?;
            Ok::<_, MergeError>((!chunk.is_empty()).then_some((chunk, engine)))
        })
    }

    /// Snapshot the engine's complete mutable state.
    pub fn extract_state(&self) -> MergeState<H> {
        self.state.clone()
    }

    /// Replace the engine's state with a snapshot taken from an engine built
    /// over the same sources, in the same order.
    ///
    /// Only the shape is checked; page contents and cursor positions are
    /// trusted as given.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::State`] if the snapshot describes a different
    /// number of sources.
    pub fn inject_state(&mut self, state: MergeState<H>) -> Result<()> {
        match state.source_count() {
            Some(count) if count == self.sources.len() => {
                self.state = state;
                tracing::debug!(
                    sources = count,
                    cached_pages = self.state.pages.len(),
                    "merge state injected"
                );
                Ok(())
            }
            _ => Err(MergeError::State(format!(
                "snapshot does not match the {} configured sources",
                self.sources.len()
            ))),
        }
    }

    /// Load this round's pages: one per source whose buffer is drained and
    /// whose cursor is not exhausted. `None` means the source keeps its
    /// current buffer.
    async fn load_round(&mut self, options: &O) -> Result<Vec<Option<Vec<H>>>> {
        let mut round: Vec<Option<Vec<H>>> = Vec::with_capacity(self.sources.len());
        let mut misses = Vec::new();

        for (index, cursor) in self.state.merge_cursors.iter().enumerate() {
            let page = match cursor.next_page.next_page() {
                Some(page) if cursor.buffer.is_empty() => page,
                _ => {
                    round.push(None);
                    continue;
                }
            };
            match self.state.pages.get(index, page) {
                Some(hits) => {
                    tracing::trace!(source = index, page, "page cache hit");
                    round.push(Some(hits.to_vec()));
                }
                None => {
                    misses.push((index, page));
                    round.push(None);
                }
            }
        }

        if misses.is_empty() {
            return Ok(round);
        }

        let sources = &self.sources;
        let outcomes = futures::future::join_all(misses.into_iter().map(move |(index, page)| async move {
            let outcome = match sources.get(index) {
                Some(source) => source
                    .fetch_page(page, options)
                    .await
                    .map_err(|source| MergeError::Source { index, source }),
                None => Err(MergeError::UnknownSource(index)),
            };
            (index, page, outcome)
        }))
        .await;

        let mut first_error = None;
        for (index, page, outcome) in outcomes {
            match outcome {
                Ok(hits) => {
                    tracing::debug!(source = index, page, count = hits.len(), "fetched page");
                    self.state.pages.insert(index, page, hits.clone());
                    if let Some(slot) = round.get_mut(index) {
                        *slot = Some(hits);
                    }
                }
                Err(err) => {
                    tracing::warn!(source = index, page, error = %err, "page fetch failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(round),
        }
    }
}

impl<H, O> MergeEngine<H, O>
where
    H: Clone + Send + Sync + Serialize,
    O: Sync,
{
    /// Snapshot the state as an opaque, URL-safe cursor token.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::State`] if a hit fails to serialize.
    pub fn extract_token(&self) -> Result<String> {
        self.state.to_token()
    }
}

impl<H, O> MergeEngine<H, O>
where
    H: Clone + Send + Sync + DeserializeOwned,
    O: Sync,
{
    /// Resume from a token produced by [`extract_token`](Self::extract_token).
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::State`] if the token cannot be decoded or does
    /// not match the configured sources.
    pub fn inject_token(&mut self, token: &str) -> Result<()> {
        let state = MergeState::from_token(token)?;
        self.inject_state(state)
    }
}

impl<O: Sync> MergeEngine<Value, O> {
    /// Build an engine over JSON hits from a [`MergeConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Config`] if the configuration is invalid or has
    /// no `sort_key`.
    pub fn from_config(sources: Vec<BoxedSource<Value, O>>, config: &MergeConfig) -> Result<Self> {
        config.validate()?;
        let comparator = config.comparator()?;
        Ok(Self::new(sources, comparator).with_first_page(config.first_page))
    }
}

impl<H, O> MergeEngine<H, O> {
    /// Read-only view of the page cache.
    pub fn page_cache(&self) -> &PageCache<H> {
        &self.state.pages
    }
}
