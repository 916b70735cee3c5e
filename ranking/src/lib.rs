//! # paged-merge-ranking
//!
//! Tie-breaking comparator for search hits that carry per-hit ranking
//! details (typo count, geo distance, proximity, ...), as returned by
//! hosted search indexes.
//!
//! The comparator is a plain function over [`RankingInfo`] values so it can
//! be plugged into any sorter. Criteria are applied in a fixed order and the
//! first one that separates two hits decides:
//!
//! 1. typos (fewer first)
//! 2. geo distance (nearer first), unless [`RankingOptions::ignore_geo`]
//! 3. geo precision (higher first), unless [`RankingOptions::ignore_geo`]
//! 4. first matched word position (earlier first)
//! 5. matched word count (more first)
//! 6. matched filter count (more first)
//! 7. proximity distance (smaller first)
//! 8. exact word count (more first)
//! 9. user score (higher first)

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Ranking details attached to a single search hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankingInfo {
    /// Number of typos the hit matched with.
    pub nb_typos: u32,
    /// Distance in metres from the query's geo point.
    pub geo_distance: f64,
    /// Precision bucket used for the geo distance.
    pub geo_precision: f64,
    /// Position of the first query word matched in the record.
    pub first_matched_word: u32,
    /// Number of query words matched.
    pub words: u32,
    /// Number of filters the hit matched.
    pub filters: u32,
    /// Sum of distances between matched words.
    pub proximity_distance: u32,
    /// Number of words matched exactly.
    pub nb_exact_words: u32,
    /// Custom ranking score supplied by the index owner.
    pub user_score: f64,
}

/// Knobs for [`compare`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingOptions {
    /// Skip the geo distance and geo precision criteria.
    pub ignore_geo: bool,
}

/// Compare two hits' ranking details.
///
/// Returns [`Ordering::Less`] when `a` ranks ahead of `b`.
pub fn compare(a: &RankingInfo, b: &RankingInfo, options: RankingOptions) -> Ordering {
    let geo = || {
        if options.ignore_geo {
            return Ordering::Equal;
        }
        ascending_f64(a.geo_distance, b.geo_distance)
            .then_with(|| descending_f64(a.geo_precision, b.geo_precision))
    };

    a.nb_typos
        .cmp(&b.nb_typos)
        .then_with(geo)
        .then_with(|| a.first_matched_word.cmp(&b.first_matched_word))
        .then_with(|| b.words.cmp(&a.words))
        .then_with(|| b.filters.cmp(&a.filters))
        .then_with(|| a.proximity_distance.cmp(&b.proximity_distance))
        .then_with(|| b.nb_exact_words.cmp(&a.nb_exact_words))
        .then_with(|| descending_f64(a.user_score, b.user_score))
}

/// Read ranking details out of a JSON hit's `_rankingInfo` object.
///
/// Missing or non-numeric fields read as zero; a hit without the object
/// yields [`RankingInfo::default`].
pub fn from_json_hit(hit: &serde_json::Value) -> RankingInfo {
    let Some(info) = hit.get("_rankingInfo") else {
        return RankingInfo::default();
    };
    let uint = |name: &str| {
        info.get(name)
            .and_then(serde_json::Value::as_u64)
            .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX))
    };
    let float = |name: &str| {
        info.get(name)
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0)
    };

    RankingInfo {
        nb_typos: uint("nbTypos"),
        geo_distance: float("geoDistance"),
        geo_precision: float("geoPrecision"),
        first_matched_word: uint("firstMatchedWord"),
        words: uint("words"),
        filters: uint("filters"),
        proximity_distance: uint("proximityDistance"),
        nb_exact_words: uint("nbExactWords"),
        user_score: float("userScore"),
    }
}

fn ascending_f64(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

fn descending_f64(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
