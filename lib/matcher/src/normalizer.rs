use std::collections::BTreeSet;

use hashmatch_cascade::HashingEngine;
use hashmatch_core::{DescriptorMatrix, DescriptorScalar, ImageId, RegionProvider};
use tracing::warn;

/// Zero-mean descriptor shared by every image of a run.
///
/// Each used image contributes one row, the engine's zero mean of its own
/// descriptors, or zeros when it has none; the rows are then reduced once
/// more the same way. Images visit in ascending id order.
pub fn compute_zero_mean<E, T, P>(
    provider: &P,
    used: &BTreeSet<ImageId>,
    dimension: usize,
) -> Vec<f32>
where
    E: HashingEngine,
    T: DescriptorScalar,
    P: RegionProvider + ?Sized,
{
    if used.is_empty() || dimension == 0 {
        return vec![0.0; dimension];
    }

    let mut summaries: Vec<f32> = Vec::with_capacity(used.len() * dimension);
    for &image in used {
        let mean = provider
            .regions(image)
            .filter(|regions| !regions.is_empty())
            .and_then(|regions| match DescriptorMatrix::<T>::from_regions(regions, dimension) {
                Ok(matrix) => Some(E::zero_mean(&matrix)),
                Err(e) => {
                    warn!("Image {} left out of the zero mean: {}", image, e);
                    None
                }
            })
            .filter(|mean| mean.len() == dimension);

        match mean {
            Some(mean) => summaries.extend_from_slice(&mean),
            None => summaries.resize(summaries.len() + dimension, 0.0),
        }
    }

    DescriptorMatrix::new(&summaries, used.len(), dimension)
        .map(|stacked| E::zero_mean(&stacked))
        .unwrap_or_else(|_| vec![0.0; dimension])
}
