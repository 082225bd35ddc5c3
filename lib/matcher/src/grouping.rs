use std::collections::{BTreeMap, BTreeSet};

use hashmatch_core::{ImageId, PairSet};

/// Requested pairs grouped by their first image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairGroups {
    /// Every image referenced by a pair, ascending
    pub used: BTreeSet<ImageId>,
    /// First image -> second images, in ascending pair order
    pub groups: BTreeMap<ImageId, Vec<ImageId>>,
}

impl PairGroups {
    /// Group `pairs` by first component as given; no reordering of the two
    /// images of a pair takes place.
    pub fn from_pairs(pairs: &PairSet) -> Self {
        let mut used = BTreeSet::new();
        let mut groups: BTreeMap<ImageId, Vec<ImageId>> = BTreeMap::new();
        for pair in pairs.iter() {
            used.insert(pair.first());
            used.insert(pair.second());
            groups.entry(pair.first()).or_default().push(pair.second());
        }
        Self { used, groups }
    }

    /// Total number of pairs over all groups.
    pub fn pair_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Lowest used image id.
    pub fn first_used(&self) -> Option<ImageId> {
        self.used.iter().next().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_first_image() {
        let pairs: PairSet = [(2, 0), (0, 1), (0, 3), (2, 5)].into_iter().collect();
        let grouped = PairGroups::from_pairs(&pairs);

        assert_eq!(grouped.used.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3, 5]);
        assert_eq!(grouped.groups[&0], vec![1, 3]);
        assert_eq!(grouped.groups[&2], vec![0, 5]);
        assert_eq!(grouped.groups.len(), 2);
        assert_eq!(grouped.pair_count(), 4);
        assert_eq!(grouped.first_used(), Some(0));
    }

    #[test]
    fn test_empty_pairs() {
        let grouped = PairGroups::from_pairs(&PairSet::new());
        assert!(grouped.is_empty());
        assert!(grouped.used.is_empty());
        assert_eq!(grouped.first_used(), None);
    }
}
