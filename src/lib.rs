//! # paged-merge
//!
//! Merges several independently paginated, already-sorted sources into one
//! globally ordered, duplicate-free stream of chunks.
//!
//! Only as many pages are fetched from each source as are needed to prove a
//! chunk correct: a hit is emitted once no source can still hold an unseen
//! hit that sorts before it. Everything the merge knows (fetched pages,
//! buffered hits, cursors) lives in a [`MergeState`] that can be extracted,
//! carried across a stateless boundary as a cursor token, and injected into a
//! new engine to resume.
//!
//! ## Design
//!
//! - [`Comparator`]: one ordering rule, from a typed key, a JSON key path, or
//!   a ranking function (see [`ranking`])
//! - [`PageCache`]: every fetched page, by (source, page); never evicted, so
//!   no page is ever fetched twice
//! - [`frontier`]: the per-round safe window
//! - [`MergeEngine`]: the global merge cursor (`get_next`) and independent
//!   per-source cursors (`get_next_for_source`)
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> paged_merge::Result<()> {
//! use paged_merge::{BoxedSource, Comparator, MemorySource, MergeEngine, SortDirection};
//!
//! let sources: Vec<BoxedSource<u32>> = vec![
//!     Box::new(MemorySource::new(vec![95, 70, 20, 10], 3)),
//!     Box::new(MemorySource::new(vec![60, 15, 9, 5, 2], 3)),
//! ];
//! let mut engine = MergeEngine::new(sources, Comparator::by_key(|v: &u32| *v, SortDirection::Desc));
//! loop {
//!     let chunk = engine.get_next(&()).await?;
//!     if chunk.is_empty() {
//!         break;
//!     }
//!     println!("{chunk:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod comparator;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod frontier;
pub mod key_path;
pub mod ranking;
pub mod source;
pub mod state;

pub use cache::PageCache;
pub use comparator::{Comparator, SortDirection};
pub use config::MergeConfig;
pub use cursor::PageCursor;
pub use engine::{BoxedSource, MergeEngine};
pub use error::{MergeError, Result, SourceError};
pub use key_path::KeyPath;
pub use source::{FnSource, MemorySource, PageSource};
pub use state::{MergeCursor, MergeState};
