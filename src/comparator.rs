//! Total-order predicates over hits.
//!
//! A [`Comparator`] wraps a single ranking rule. Every predicate the merge
//! needs (`is_after`, `is_before`, sorting) is derived from that one rule, so
//! key-based and function-based configurations behave identically.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Direction in which a sort key is emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest key first.
    Asc,
    /// Largest key first.
    #[default]
    Desc,
}

impl SortDirection {
    /// Orient an ascending key ordering for this direction.
    pub fn apply(self, ascending: Ordering) -> Ordering {
        match self {
            Self::Asc => ascending,
            Self::Desc => ascending.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

type RankFn<H> = dyn Fn(&H, &H) -> Ordering + Send + Sync;

/// Ordering rule over hits of type `H`.
///
/// `rank(a, b) == Less` means `a` is emitted before `b`. Cloning is cheap.
pub struct Comparator<H> {
    rank: Arc<RankFn<H>>,
}

impl<H> Clone for Comparator<H> {
    fn clone(&self) -> Self {
        Self {
            rank: Arc::clone(&self.rank),
        }
    }
}

impl<H> fmt::Debug for Comparator<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator").finish_non_exhaustive()
    }
}

impl<H: 'static> Comparator<H> {
    /// Order hits by a typed key extracted with `key`.
    ///
    /// Keys that do not compare even with themselves (e.g. `NaN`) sort last
    /// in either direction and tie with each other.
    pub fn by_key<K, F>(key: F, direction: SortDirection) -> Self
    where
        K: PartialOrd,
        F: Fn(&H) -> K + Send + Sync + 'static,
    {
        Self::from_fn(move |a, b| {
            let (a, b) = (key(a), key(b));
            match (is_unordered(&a), is_unordered(&b)) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    direction.apply(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
                }
            }
        })
    }

    /// Order hits with a custom ranking function.
    pub fn from_fn<F>(rank: F) -> Self
    where
        F: Fn(&H, &H) -> Ordering + Send + Sync + 'static,
    {
        Self {
            rank: Arc::new(rank),
        }
    }
}

impl<H> Comparator<H> {
    /// Compare two hits in emission order.
    pub fn rank(&self, a: &H, b: &H) -> Ordering {
        (self.rank)(a, b)
    }

    /// True when `a` sorts at or past `b` (strictly past when `eq` is false).
    pub fn is_after(&self, a: &H, b: &H, eq: bool) -> bool {
        match self.rank(a, b) {
            Ordering::Greater => true,
            Ordering::Equal => eq,
            Ordering::Less => false,
        }
    }

    /// True when `a` sorts at or before `b` (strictly before when `eq` is false).
    pub fn is_before(&self, a: &H, b: &H, eq: bool) -> bool {
        match self.rank(a, b) {
            Ordering::Less => true,
            Ordering::Equal => eq,
            Ordering::Greater => false,
        }
    }

    /// Sort hits in emission order. Ties keep their input order.
    pub fn sort(&self, hits: &mut [H]) {
        hits.sort_by(|a, b| self.rank(a, b));
    }

    /// The earlier of two hits; `a` wins ties.
    pub fn earlier<'a>(&self, a: &'a H, b: &'a H) -> &'a H {
        if self.is_after(a, b, false) { b } else { a }
    }
}

fn is_unordered<K: PartialOrd>(key: &K) -> bool {
    key.partial_cmp(key).is_none()
}
