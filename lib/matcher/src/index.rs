use ahash::AHashMap;
use rayon::prelude::*;
use std::collections::BTreeSet;

use hashmatch_cascade::HashingEngine;
use hashmatch_core::{DescriptorMatrix, DescriptorScalar, ImageId, RegionProvider};
use tracing::{debug, warn};

/// Hashed descriptions of every used image of a run, keyed by image id.
pub struct HashedIndex<H> {
    entries: AHashMap<ImageId, H>,
}

impl<H> HashedIndex<H> {
    pub fn get(&self, image: ImageId) -> Option<&H> {
        self.entries.get(&image)
    }

    pub fn contains(&self, image: ImageId) -> bool {
        self.entries.contains_key(&image)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hash every used image in parallel.
///
/// Images without regions, or whose descriptors cannot be viewed as
/// `dimension`-wide rows of `T`, get the hash of an empty matrix so that
/// lookups never miss.
pub fn build_index<E, T, P>(
    engine: &E,
    provider: &P,
    used: &BTreeSet<ImageId>,
    dimension: usize,
    zero_mean: &[f32],
) -> HashedIndex<E::Hashed>
where
    E: HashingEngine,
    T: DescriptorScalar,
    P: RegionProvider + ?Sized,
{
    let empty = DescriptorMatrix::<T>::empty(dimension);

    let hashed: Vec<(ImageId, E::Hashed)> = used
        .par_iter()
        .map(|&image| {
            let matrix = match provider.regions(image) {
                Some(regions) => DescriptorMatrix::<T>::from_regions(regions, dimension)
                    .unwrap_or_else(|e| {
                        warn!("Image {} indexed as empty: {}", image, e);
                        empty
                    }),
                None => empty,
            };
            (image, engine.hash(&matrix, zero_mean))
        })
        .collect();

    let entries: AHashMap<ImageId, E::Hashed> = hashed.into_iter().collect();
    debug!("Hashed {} images", entries.len());
    HashedIndex { entries }
}
