use ahash::AHashSet;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Pair, PointFeature};

/// Correspondence between feature `i` of a pair's first image and feature
/// `j` of its second image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndMatch {
    pub i: u32,
    pub j: u32,
}

impl IndMatch {
    #[inline]
    #[must_use]
    pub fn new(i: u32, j: u32) -> Self {
        Self { i, j }
    }
}

pub type IndMatches = Vec<IndMatch>;

/// Sort and drop repeated index pairs. Returns true if anything was removed.
pub fn deduplicate(matches: &mut IndMatches) -> bool {
    let before = matches.len();
    matches.sort_unstable();
    matches.dedup();
    before != matches.len()
}

/// Drop matches whose `(x_i, y_i, x_j, y_j)` coordinates repeat those of an
/// earlier match, keeping the first one. Matches pointing outside either
/// position list are dropped too. Returns true if anything was removed.
pub fn deduplicate_by_position(
    matches: &mut IndMatches,
    positions_i: &[PointFeature],
    positions_j: &[PointFeature],
) -> bool {
    let before = matches.len();
    let mut seen: AHashSet<[OrderedFloat<f32>; 4]> = AHashSet::with_capacity(matches.len());
    matches.retain(|m| {
        match (positions_i.get(m.i as usize), positions_j.get(m.j as usize)) {
            (Some(a), Some(b)) => seen.insert([
                OrderedFloat(a.x),
                OrderedFloat(a.y),
                OrderedFloat(b.x),
                OrderedFloat(b.y),
            ]),
            _ => false,
        }
    });
    before != matches.len()
}

/// Putative matches of a matching run, keyed by image pair.
///
/// Holds non-empty entries only; an entry is written once and never
/// replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutativeMatches {
    pairs: BTreeMap<Pair, IndMatches>,
}

impl PutativeMatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the matches of `pair`. Returns false (and keeps the existing
    /// state) for an empty list or an already present pair.
    pub fn insert(&mut self, pair: Pair, matches: IndMatches) -> bool {
        if matches.is_empty() || self.pairs.contains_key(&pair) {
            return false;
        }
        self.pairs.insert(pair, matches);
        true
    }

    pub fn get(&self, pair: Pair) -> Option<&[IndMatch]> {
        self.pairs.get(&pair).map(Vec::as_slice)
    }

    pub fn contains(&self, pair: Pair) -> bool {
        self.pairs.contains_key(&pair)
    }

    /// Number of pairs with matches.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Sum of match counts over all pairs.
    pub fn total_matches(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }

    pub fn pairs(&self) -> impl Iterator<Item = Pair> + '_ {
        self.pairs.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pair, &[IndMatch])> + '_ {
        self.pairs.iter().map(|(pair, m)| (*pair, m.as_slice()))
    }

    pub fn into_inner(self) -> BTreeMap<Pair, IndMatches> {
        self.pairs
    }
}

impl IntoIterator for PutativeMatches {
    type Item = (Pair, IndMatches);
    type IntoIter = std::collections::btree_map::IntoIter<Pair, IndMatches>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}
