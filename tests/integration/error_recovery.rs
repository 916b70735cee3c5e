//! Fetch failures and ordering violations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use paged_merge::{BoxedSource, FnSource, MemorySource, MergeEngine, MergeError, SourceError};

use crate::helpers::{Hat, by_popularity_desc, drain, hat, hats, popularities};

#[derive(Debug, thiserror::Error)]
#[error("rate limited on page {0}")]
struct RateLimited(u32);

/// Source that fails the first `failures` requests, then serves `hits`.
fn flaky(hits: Vec<Hat>, page_size: usize, failures: usize) -> (BoxedSource<Hat>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let pages = MemorySource::new(hits, page_size);
    let source = FnSource::new(move |page: u32, _: ()| {
        let call = counter.fetch_add(1, Ordering::SeqCst);
        let result = if call < failures {
            Err(SourceError::from(RateLimited(page)))
        } else {
            Ok(pages.page(page).to_vec())
        };
        async move { result }
    });
    (Box::new(source), calls)
}

#[tokio::test]
async fn source_failure_surfaces_original_error() {
    let (source, _) = flaky(hats("a", &[3, 2, 1]), 2, 1);
    let mut engine = MergeEngine::new(vec![source], by_popularity_desc());

    let err = engine.get_next(&()).await.unwrap_err();
    let MergeError::Source { index, source } = err else {
        panic!("expected a source error");
    };
    assert_eq!(index, 0);
    assert!(source.downcast_ref::<RateLimited>().is_some());
    assert_eq!(source.to_string(), "rate limited on page 0");
}

#[tokio::test]
async fn failed_round_can_be_retried_without_losing_hits() {
    let (healthy, _) = flaky(hats("a", &[95, 70, 20, 10]), 3, 0);
    let (unstable, calls) = flaky(hats("b", &[60, 15, 9, 5, 2]), 3, 2);
    let mut engine = MergeEngine::new(vec![healthy, unstable], by_popularity_desc());

    assert!(engine.get_next(&()).await.is_err());
    assert!(engine.get_next(&()).await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let merged = drain(&mut engine, &()).await;
    assert_eq!(popularities(&merged), vec![95, 70, 60, 20, 15, 10, 9, 5, 2]);
}

#[tokio::test]
async fn healthy_pages_are_not_refetched_after_a_failure() {
    let (healthy, healthy_calls) = flaky(hats("a", &[9, 8]), 5, 0);
    let (unstable, _) = flaky(hats("b", &[7]), 5, 1);
    let mut engine = MergeEngine::new(vec![healthy, unstable], by_popularity_desc());

    assert!(engine.get_next(&()).await.is_err());
    assert_eq!(healthy_calls.load(Ordering::SeqCst), 1);
    let chunk = engine.get_next(&()).await.expect("retry");
    assert_eq!(popularities(&chunk), vec![9, 8]);
    assert_eq!(healthy_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ascending_data_under_desc_order_is_an_ordering_violation() {
    let source = FnSource::new(|page: u32, _: ()| async move {
        Ok::<_, SourceError>(match page {
            0 => vec![hat("x", 50)],
            1 => vec![hat("y", 5), hat("z", 20)],
            _ => Vec::new(),
        })
    });
    let mut engine = MergeEngine::new(
        vec![Box::new(source) as BoxedSource<Hat>],
        by_popularity_desc(),
    );

    assert_eq!(popularities(&engine.get_next(&()).await.expect("round 1")), vec![50]);
    let err = engine.get_next(&()).await.unwrap_err();
    assert!(matches!(err, MergeError::OrderingViolation(_)));

    // Nothing was committed, so the same violation repeats.
    let err = engine.get_next(&()).await.unwrap_err();
    assert!(matches!(err, MergeError::OrderingViolation(_)));
    assert!(engine.extract_state().merge_cursors[0].buffer.is_empty());
}

#[tokio::test]
async fn unknown_source_index() {
    let (source, _) = flaky(hats("a", &[1]), 1, 0);
    let mut engine = MergeEngine::new(vec![source], by_popularity_desc());
    let err = engine.get_next_for_source(1, &()).await.unwrap_err();
    assert_eq!(err.to_string(), "unknown source index: 1");
}
