//! Dot-separated field paths over JSON hits.
//!
//! `"meta.popularity"` is split into segments once, when the comparator is
//! built; lookups then walk objects (and numeric segments into arrays)
//! without re-parsing.

use std::cmp::Ordering;
use std::fmt;

use serde_json::{Number, Value};

use crate::comparator::{Comparator, SortDirection};
use crate::error::{MergeError, Result};

/// A parsed dot-separated field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a dot-separated path such as `"stats.popularity"`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Config`] if the path or any segment is empty.
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim();
        if path.is_empty() {
            return Err(MergeError::Config("sort key path must not be empty".into()));
        }
        let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return Err(MergeError::Config(format!(
                "sort key path has an empty segment: {path}"
            )));
        }
        Ok(Self { segments })
    }

    /// Segments of the path in lookup order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve the path inside `hit`. Returns `None` when any step is missing.
    pub fn lookup<'a>(&self, hit: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(hit, |value, segment| match value {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Ascending comparison of two looked-up JSON values.
///
/// Values of different kinds order by kind: missing, null, booleans,
/// numbers, strings, arrays, objects. Numbers compare exactly, integers
/// included; strings lexicographically; booleans with `false` first. Arrays
/// and objects tie with their own kind.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => compare_numbers(a, b),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (as_integer(a), as_integer(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(a), None) => compare_integer_float(a, b.as_f64().unwrap_or_default()),
        (None, Some(b)) => compare_integer_float(b, a.as_f64().unwrap_or_default()).reverse(),
        (None, None) => {
            let (a, b) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Exact comparison of an integer with a finite float.
#[allow(clippy::cast_possible_truncation)]
fn compare_integer_float(int: i128, float: f64) -> Ordering {
    let limit = 2f64.powi(127);
    if float >= limit {
        return Ordering::Less;
    }
    if float < -limit {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal => 0f64.partial_cmp(&(float - whole)).unwrap_or(Ordering::Equal),
        unequal => unequal,
    }
}

impl Comparator<Value> {
    /// Order JSON hits by the value found at a dot-separated field path.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Config`] if `path` is not a valid key path.
    pub fn from_key_path(path: &str, direction: SortDirection) -> Result<Self> {
        let path = KeyPath::parse(path)?;
        Ok(Self::from_fn(move |a, b| {
            direction.apply(compare_values(path.lookup(a), path.lookup(b)))
        }))
    }
}
