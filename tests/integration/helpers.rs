//! Shared helpers for integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use paged_merge::{
    BoxedSource, Comparator, MemorySource, MergeEngine, PageSource, SortDirection, SourceError,
};
use serde::{Deserialize, Serialize};

/// A hit with a unique id and a sort value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Hat {
    pub id: String,
    pub popularity: u32,
}

pub(crate) fn hat(id: &str, popularity: u32) -> Hat {
    Hat {
        id: id.to_string(),
        popularity,
    }
}

/// Hats named `{prefix}{index}` with the given popularities.
pub(crate) fn hats(prefix: &str, popularities: &[u32]) -> Vec<Hat> {
    popularities
        .iter()
        .enumerate()
        .map(|(i, p)| hat(&format!("{prefix}{i}"), *p))
        .collect()
}

pub(crate) fn by_popularity_desc() -> Comparator<Hat> {
    Comparator::by_key(|h: &Hat| h.popularity, SortDirection::Desc)
}

pub(crate) fn popularities(hits: &[Hat]) -> Vec<u32> {
    hits.iter().map(|h| h.popularity).collect()
}

/// Pages requested from one source, in request order.
pub(crate) type FetchLog = Arc<Mutex<Vec<u32>>>;

/// In-memory source that records every page it is asked for.
pub(crate) struct CountingSource<H> {
    inner: MemorySource<H>,
    log: FetchLog,
}

impl<H> CountingSource<H> {
    pub(crate) fn new(hits: Vec<H>, page_size: usize) -> (Self, FetchLog) {
        let log = FetchLog::default();
        let source = Self {
            inner: MemorySource::new(hits, page_size),
            log: Arc::clone(&log),
        };
        (source, log)
    }
}

#[async_trait]
impl<H, O> PageSource<H, O> for CountingSource<H>
where
    H: Clone + Send + Sync,
    O: Sync,
{
    async fn fetch_page(&self, page: u32, options: &O) -> Result<Vec<H>, SourceError> {
        self.log.lock().expect("fetch log lock").push(page);
        PageSource::<H, O>::fetch_page(&self.inner, page, options).await
    }
}

/// Build an engine over hat sources, each served with its own page size.
/// Returns the engine and each source's fetch log.
pub(crate) fn counting_engine(
    sources: Vec<(Vec<Hat>, usize)>,
) -> (MergeEngine<Hat>, Vec<FetchLog>) {
    let mut boxed: Vec<BoxedSource<Hat>> = Vec::new();
    let mut logs = Vec::new();
    for (hits, page_size) in sources {
        let (source, log) = CountingSource::new(hits, page_size);
        boxed.push(Box::new(source));
        logs.push(log);
    }
    (MergeEngine::new(boxed, by_popularity_desc()), logs)
}

/// Pages fetched more than once, per source.
pub(crate) fn refetched_pages(logs: &[FetchLog]) -> Vec<(usize, u32)> {
    let mut repeated = Vec::new();
    for (index, log) in logs.iter().enumerate() {
        let pages = log.lock().expect("fetch log lock").clone();
        for (position, page) in pages.iter().enumerate() {
            if pages[..position].contains(page) && !repeated.contains(&(index, *page)) {
                repeated.push((index, *page));
            }
        }
    }
    repeated
}

/// Call `get_next` until it returns empty, collecting every chunk.
pub(crate) async fn drain_chunks<H, O>(engine: &mut MergeEngine<H, O>, options: &O) -> Vec<Vec<H>>
where
    H: Clone + Send + Sync,
    O: Sync,
{
    let mut chunks = Vec::new();
    loop {
        let chunk = engine.get_next(options).await.expect("merge round");
        if chunk.is_empty() {
            return chunks;
        }
        chunks.push(chunk);
    }
}

/// Call `get_next` until it returns empty, concatenating the chunks.
pub(crate) async fn drain<H, O>(engine: &mut MergeEngine<H, O>, options: &O) -> Vec<H>
where
    H: Clone + Send + Sync,
    O: Sync,
{
    drain_chunks(engine, options).await.into_iter().flatten().collect()
}
