//! Safe emission window for one merge round.
//!
//! Every source with buffered hits bounds the round: nothing past the last
//! hit it currently shows may be emitted, because its next page could still
//! hold hits that sort before anything further along. The window therefore
//! runs from the earliest buffered first hit to the earliest buffered last
//! hit, both inclusive.
//!
//! The watermarks are recomputed from scratch each round over borrowed
//! buffers; nothing here mutates merge state.

use crate::comparator::Comparator;
use crate::error::{MergeError, Result};

/// Running watermarks for a single round.
#[derive(Debug)]
pub struct Frontier<'a, H> {
    first_hit: Option<&'a H>,
    earliest_last_hit: Option<(usize, &'a H)>,
}

impl<H> Default for Frontier<'_, H> {
    fn default() -> Self {
        Self {
            first_hit: None,
            earliest_last_hit: None,
        }
    }
}

impl<'a, H> Frontier<'a, H> {
    /// Fresh watermarks with nothing folded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold source `index`'s current buffer into the watermarks.
    ///
    /// Empty buffers contribute nothing.
    pub fn fold(&mut self, cmp: &Comparator<H>, index: usize, buffer: &'a [H]) {
        let (Some(first), Some(last)) = (buffer.first(), buffer.last()) else {
            return;
        };

        self.first_hit = Some(match self.first_hit {
            Some(current) => cmp.earlier(current, first),
            None => first,
        });

        self.earliest_last_hit = Some(match self.earliest_last_hit {
            Some((owner, current)) if !cmp.is_after(current, last, false) => (owner, current),
            _ => (index, last),
        });
    }

    /// Earliest first hit folded so far.
    pub fn first_hit(&self) -> Option<&'a H> {
        self.first_hit
    }

    /// Earliest last hit folded so far.
    pub fn earliest_last_hit(&self) -> Option<&'a H> {
        self.earliest_last_hit.map(|(_, hit)| hit)
    }

    /// Validate the watermarks and return the round's window.
    ///
    /// Returns `Ok(None)` when no buffer contributed.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::OrderingViolation`] if the earliest last hit
    /// sorts strictly before the first hit, which only happens when a source
    /// serves data out of the configured order.
    pub fn window(&self, cmp: &Comparator<H>) -> Result<Option<Window<'a, H>>> {
        let (Some(first), Some((owner, last))) = (self.first_hit, self.earliest_last_hit) else {
            return Ok(None);
        };
        if cmp.is_before(last, first, false) {
            tracing::warn!(source = owner, "buffered page ends before the merge window starts");
            return Err(MergeError::OrderingViolation(format!(
                "source {owner} returned hits out of the configured sort order"
            )));
        }
        Ok(Some(Window { first, last }))
    }
}

/// Inclusive range of hits that may be emitted this round.
#[derive(Debug)]
pub struct Window<'a, H> {
    first: &'a H,
    last: &'a H,
}

impl<'a, H> Window<'a, H> {
    /// Lower edge of the window.
    pub fn first(&self) -> &'a H {
        self.first
    }

    /// Upper edge of the window.
    pub fn last(&self) -> &'a H {
        self.last
    }

    /// Whether `hit` lies inside the window.
    pub fn contains(&self, cmp: &Comparator<H>, hit: &H) -> bool {
        cmp.is_after(hit, self.first, true) && cmp.is_before(hit, self.last, true)
    }
}

/// Which buffered hits a round emits, per source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmissionPlan {
    masks: Vec<Vec<bool>>,
}

impl EmissionPlan {
    /// Decide, for every buffered hit, whether this round emits it.
    ///
    /// `buffers[i]` is source `i`'s buffer as the round sees it. The plan is
    /// computed without touching any state so a failed round leaves the
    /// buffers intact.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::OrderingViolation`] as described in
    /// [`Frontier::window`].
    pub fn compute<H>(cmp: &Comparator<H>, buffers: &[&[H]]) -> Result<Self> {
        let mut frontier = Frontier::new();
        for (index, buffer) in buffers.iter().copied().enumerate() {
            frontier.fold(cmp, index, buffer);
        }

        let masks = match frontier.window(cmp)? {
            Some(window) => buffers
                .iter()
                .map(|buffer| buffer.iter().map(|hit| window.contains(cmp, hit)).collect())
                .collect(),
            None => buffers.iter().map(|buffer| vec![false; buffer.len()]).collect(),
        };
        Ok(Self { masks })
    }

    /// Emission flags for source `index`, one per buffered hit.
    pub fn mask(&self, index: usize) -> &[bool] {
        self.masks.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of hits emitted across all sources.
    pub fn emitted(&self) -> usize {
        self.masks
            .iter()
            .map(|mask| mask.iter().filter(|emit| **emit).count())
            .sum()
    }

    /// Split `buffer` into (emitted, retained) hits for source `index`,
    /// preserving order within each part.
    pub fn split<H>(&self, index: usize, buffer: Vec<H>) -> (Vec<H>, Vec<H>) {
        let mask = self.mask(index);
        let mut emitted = Vec::new();
        let mut retained = Vec::new();
        for (position, hit) in buffer.into_iter().enumerate() {
            if mask.get(position).copied().unwrap_or(false) {
                emitted.push(hit);
            } else {
                retained.push(hit);
            }
        }
        (emitted, retained)
    }
}
