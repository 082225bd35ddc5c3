use hashmatch_core::{DescriptorMatrix, DescriptorScalar};
use smallvec::SmallVec;

/// A base descriptor found for a query, with its squared Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

impl Neighbor {
    #[inline]
    #[must_use]
    pub fn new(index: usize, distance: f32) -> Self {
        Self { index, distance }
    }
}

/// The nearest base descriptors of one query descriptor, closest first.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryNeighbors {
    pub query: usize,
    pub neighbors: SmallVec<[Neighbor; 2]>,
}

impl QueryNeighbors {
    pub fn new(query: usize, neighbors: impl IntoIterator<Item = Neighbor>) -> Self {
        Self {
            query,
            neighbors: neighbors.into_iter().collect(),
        }
    }
}

/// Hash-accelerated approximate nearest neighbor search over descriptor sets.
///
/// An engine is initialized once per run for a descriptor dimension, then
/// shared read-only by every index build and query of that run.
pub trait HashingEngine: Sized + Send + Sync {
    type Config: Clone + Default + Send + Sync;

    /// Per-image index artifact produced by [`HashingEngine::hash`].
    type Hashed: Send + Sync;

    fn init(dimension: usize, config: &Self::Config) -> Self;

    /// Mean row of `descriptors` as `f32`; empty for an empty matrix.
    fn zero_mean<T: DescriptorScalar>(descriptors: &DescriptorMatrix<'_, T>) -> Vec<f32> {
        mean_row(descriptors)
    }

    /// Build the index artifact of one descriptor set, centered by `zero_mean`.
    fn hash<T: DescriptorScalar>(
        &self,
        descriptors: &DescriptorMatrix<'_, T>,
        zero_mean: &[f32],
    ) -> Self::Hashed;

    /// The `k` nearest base descriptors of each query descriptor.
    ///
    /// Neighbors of a query are sorted by ascending distance. Queries for
    /// which fewer than `k` neighbors were found are left out.
    fn knn<T: DescriptorScalar>(
        &self,
        query_hashed: &Self::Hashed,
        query: &DescriptorMatrix<'_, T>,
        base_hashed: &Self::Hashed,
        base: &DescriptorMatrix<'_, T>,
        k: usize,
    ) -> Vec<QueryNeighbors>;
}

/// Arithmetic mean of the rows of a descriptor matrix.
pub fn mean_row<T: DescriptorScalar>(descriptors: &DescriptorMatrix<'_, T>) -> Vec<f32> {
    if descriptors.is_empty() {
        return Vec::new();
    }
    let mut mean = vec![0.0f32; descriptors.cols()];
    for row in descriptors.iter_rows() {
        for (acc, value) in mean.iter_mut().zip(row) {
            *acc += value.to_f32();
        }
    }
    let inv_rows = 1.0 / descriptors.rows() as f32;
    for acc in &mut mean {
        *acc *= inv_rows;
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_row() {
        let data = [0u8, 10, 4, 20];
        let m = DescriptorMatrix::new(&data, 2, 2).unwrap();
        assert_eq!(mean_row(&m), vec![2.0, 15.0]);
        assert!(mean_row(&DescriptorMatrix::<f32>::empty(4)).is_empty());
    }
}
