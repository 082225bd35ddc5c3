use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of an image (view) in a reconstruction.
pub type ImageId = u32;

/// Two images to be matched, in the order they were requested.
///
/// The order is meaningful: matches stored under a pair list the first
/// image's feature index first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pair(pub ImageId, pub ImageId);

impl Pair {
    #[inline]
    #[must_use]
    pub fn new(first: ImageId, second: ImageId) -> Self {
        Self(first, second)
    }

    #[inline]
    #[must_use]
    pub fn first(&self) -> ImageId {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn second(&self) -> ImageId {
        self.1
    }

    #[inline]
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self(self.1, self.0)
    }
}

impl From<(ImageId, ImageId)> for Pair {
    fn from((first, second): (ImageId, ImageId)) -> Self {
        Self(first, second)
    }
}

/// Set of image pairs where every unordered pair appears at most once and
/// no image is paired with itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairSet {
    pairs: BTreeSet<Pair>,
}

impl PairSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `(first, second)`; refused for self pairs and for pairs already
    /// present in either order.
    pub fn insert(&mut self, first: ImageId, second: ImageId) -> bool {
        if first == second {
            return false;
        }
        let pair = Pair(first, second);
        if self.pairs.contains(&pair.reversed()) {
            return false;
        }
        self.pairs.insert(pair)
    }

    /// Whether the images are paired, in either order.
    pub fn contains(&self, a: ImageId, b: ImageId) -> bool {
        self.pairs.contains(&Pair(a, b)) || self.pairs.contains(&Pair(b, a))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in ascending `(first, second)` order.
    pub fn iter(&self) -> impl Iterator<Item = Pair> + '_ {
        self.pairs.iter().copied()
    }

    /// Every image referenced by at least one pair.
    pub fn image_ids(&self) -> BTreeSet<ImageId> {
        self.pairs.iter().flat_map(|p| [p.0, p.1]).collect()
    }
}

impl FromIterator<Pair> for PairSet {
    fn from_iter<I: IntoIterator<Item = Pair>>(iter: I) -> Self {
        let mut set = PairSet::new();
        for pair in iter {
            set.insert(pair.0, pair.1);
        }
        set
    }
}

impl FromIterator<(ImageId, ImageId)> for PairSet {
    fn from_iter<I: IntoIterator<Item = (ImageId, ImageId)>>(iter: I) -> Self {
        iter.into_iter().map(Pair::from).collect()
    }
}

fn sorted_unique(ids: &[ImageId]) -> Vec<ImageId> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// All pairs `(a, b)` with `a < b` among `ids`.
pub fn exhaustive_pairs(ids: &[ImageId]) -> PairSet {
    let ids = sorted_unique(ids);
    let mut pairs = PairSet::new();
    for (k, &a) in ids.iter().enumerate() {
        for &b in &ids[k + 1..] {
            pairs.insert(a, b);
        }
    }
    pairs
}

/// Each image paired with the `overlap` images following it in id order,
/// as for a video sequence.
pub fn contiguous_pairs(ids: &[ImageId], overlap: usize) -> PairSet {
    let ids = sorted_unique(ids);
    let mut pairs = PairSet::new();
    for (k, &a) in ids.iter().enumerate() {
        for &b in ids.iter().skip(k + 1).take(overlap) {
            pairs.insert(a, b);
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_set_refuses_self_and_reverse() {
        let mut pairs = PairSet::new();
        assert!(pairs.insert(1, 2));
        assert!(!pairs.insert(2, 1));
        assert!(!pairs.insert(1, 2));
        assert!(!pairs.insert(3, 3));
        assert_eq!(pairs.len(), 1);
        assert!(pairs.contains(2, 1));
    }

    #[test]
    fn test_pair_keeps_requested_order() {
        let pairs: PairSet = vec![(5, 1), (1, 3)].into_iter().collect();
        let collected: Vec<Pair> = pairs.iter().collect();
        assert_eq!(collected, vec![Pair(1, 3), Pair(5, 1)]);
        assert_eq!(pairs.image_ids().into_iter().collect::<Vec<_>>(), vec![1, 3, 5]);
    }

    #[test]
    fn test_exhaustive_pairs() {
        let pairs = exhaustive_pairs(&[3, 0, 1, 1]);
        let collected: Vec<Pair> = pairs.iter().collect();
        assert_eq!(collected, vec![Pair(0, 1), Pair(0, 3), Pair(1, 3)]);
    }

    #[test]
    fn test_contiguous_pairs() {
        let pairs = contiguous_pairs(&[0, 1, 2, 3], 2);
        let collected: Vec<Pair> = pairs.iter().collect();
        assert_eq!(
            collected,
            vec![Pair(0, 1), Pair(0, 2), Pair(1, 2), Pair(1, 3), Pair(2, 3)]
        );
        assert!(contiguous_pairs(&[0, 1], 0).is_empty());
    }
}
