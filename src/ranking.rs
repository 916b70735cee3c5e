//! Search-ranking comparator for hits carrying ranking details.
//!
//! Wraps [`paged_merge_ranking::compare`] as a [`Comparator`] so it can order
//! a merge like any other rule.

use serde_json::Value;

use crate::comparator::Comparator;

pub use paged_merge_ranking::{RankingInfo, RankingOptions, compare};

/// A hit that exposes ranking details.
pub trait RankedHit {
    /// Ranking details used by [`comparator`].
    fn ranking_info(&self) -> RankingInfo;
}

impl RankedHit for RankingInfo {
    fn ranking_info(&self) -> RankingInfo {
        *self
    }
}

/// JSON hits read their details from a `_rankingInfo` object.
impl RankedHit for Value {
    fn ranking_info(&self) -> RankingInfo {
        paged_merge_ranking::from_json_hit(self)
    }
}

/// Build a comparator ordering hits by their ranking details.
pub fn comparator<H>(options: RankingOptions) -> Comparator<H>
where
    H: RankedHit + 'static,
{
    Comparator::from_fn(move |a: &H, b: &H| compare(&a.ranking_info(), &b.ranking_info(), options))
}
