//! Suspending and resuming a merge session.

use paged_merge::{BoxedSource, MemorySource, MergeConfig, MergeEngine, MergeError, PageCursor};
use serde_json::{Value, json};

use crate::helpers::{counting_engine, drain, hats, popularities};

fn fixture() -> Vec<(Vec<crate::helpers::Hat>, usize)> {
    vec![
        (hats("a", &[95, 70, 20, 10]), 3),
        (hats("b", &[60, 15, 9, 5, 2]), 3),
    ]
}

#[tokio::test]
async fn injected_state_continues_identically() {
    let (mut original, _) = counting_engine(fixture());
    original.get_next(&()).await.expect("round 1");
    original.get_next_for_source(1, &()).await.expect("source page");
    let snapshot = original.extract_state();

    let (mut resumed, resumed_logs) = counting_engine(fixture());
    resumed.inject_state(snapshot).expect("same shape");

    let expected = drain(&mut original, &()).await;
    let actual = drain(&mut resumed, &()).await;
    assert_eq!(actual, expected);
    assert_eq!(popularities(&actual), vec![15, 10, 9, 5, 2]);

    // Page 0 of both sources came with the snapshot.
    for log in &resumed_logs {
        assert!(!log.lock().expect("fetch log lock").contains(&0));
    }
}

#[tokio::test]
async fn extract_then_inject_on_same_engine_is_a_no_op() {
    let (mut round_tripped, _) = counting_engine(fixture());
    let (mut untouched, _) = counting_engine(fixture());
    round_tripped.get_next(&()).await.expect("round 1");
    untouched.get_next(&()).await.expect("round 1");

    let state = round_tripped.extract_state();
    round_tripped.inject_state(state).expect("same shape");

    assert_eq!(
        drain(&mut round_tripped, &()).await,
        drain(&mut untouched, &()).await
    );
}

#[tokio::test]
async fn token_carries_the_session_across_engines() {
    let (mut first, _) = counting_engine(fixture());
    let chunk = first.get_next(&()).await.expect("round 1");
    assert_eq!(popularities(&chunk), vec![95, 70, 60, 20]);
    let token = first.extract_token().expect("encode token");

    let (mut second, _) = counting_engine(fixture());
    second.inject_token(&token).expect("decode token");
    let state = second.extract_state();
    assert_eq!(state.merge_cursors[0].next_page, PageCursor::Next(1));
    assert_eq!(popularities(&state.merge_cursors[1].buffer), vec![15, 9]);

    assert_eq!(popularities(&drain(&mut second, &()).await), vec![15, 10, 9, 5, 2]);
}

#[tokio::test]
async fn json_hits_resume_from_token() {
    let config = MergeConfig {
        sort_key: Some("stats.popularity".into()),
        ..Default::default()
    };
    let sources = || -> Vec<BoxedSource<Value>> {
        let hits = |values: &[u64]| -> Vec<Value> {
            values
                .iter()
                .map(|v| json!({ "stats": { "popularity": v } }))
                .collect()
        };
        vec![
            Box::new(MemorySource::new(hits(&[95, 50, 20]), 2)),
            Box::new(MemorySource::new(hits(&[85, 15, 9]), 2)),
        ]
    };
    let values = |hits: &[Value]| -> Vec<u64> {
        hits.iter()
            .filter_map(|h| h["stats"]["popularity"].as_u64())
            .collect()
    };

    let mut first = MergeEngine::from_config(sources(), &config).expect("config");
    let head = first.get_next(&()).await.expect("round 1");
    let token = first.extract_token().expect("encode token");

    let mut second = MergeEngine::from_config(sources(), &config).expect("config");
    second.inject_token(&token).expect("decode token");
    let tail = drain(&mut second, &()).await;

    let mut all = values(&head);
    all.extend(values(&tail));
    assert_eq!(all, vec![95, 85, 50, 20, 15, 9]);
}

#[tokio::test]
async fn token_for_other_source_count_is_rejected() {
    let (first, _) = counting_engine(fixture());
    let token = first.extract_token().expect("encode token");

    let (mut three, _) = counting_engine(vec![
        (hats("a", &[1]), 1),
        (hats("b", &[1]), 1),
        (hats("c", &[1]), 1),
    ]);
    let err = three.inject_token(&token).unwrap_err();
    assert!(matches!(err, MergeError::State(_)));
}

#[tokio::test]
async fn corrupt_token_is_rejected() {
    let (mut engine, _) = counting_engine(fixture());
    let err = engine.inject_token("%%%").unwrap_err();
    assert!(matches!(err, MergeError::State(_)));
}
