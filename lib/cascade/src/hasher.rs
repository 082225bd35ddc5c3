use hashmatch_core::simd::{dot_product_simd, hamming_distance};
use hashmatch_core::{DescriptorMatrix, DescriptorScalar, Error, Result};
use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{HashingEngine, Neighbor, QueryNeighbors};
use crate::hashed::HashedDescriptions;

/// Largest bucket id width that fits the `u16` bucket ids.
pub const MAX_BITS_PER_BUCKET: u8 = 16;

/// Parameters of the cascade hasher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Number of independent bucket tables
    #[serde(default = "default_bucket_groups")]
    pub bucket_groups: usize,
    /// Bits per bucket id; each group has `2^bits_per_bucket` buckets
    #[serde(default = "default_bits_per_bucket")]
    pub bits_per_bucket: u8,
    /// Candidates per query whose exact distance is computed, taken in
    /// ascending hamming distance order
    #[serde(default = "default_top_candidates")]
    pub top_candidates: usize,
    /// Seed of the projection generator
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_bucket_groups() -> usize {
    6
}

fn default_bits_per_bucket() -> u8 {
    10
}

fn default_top_candidates() -> usize {
    10
}

fn default_seed() -> u64 {
    5489
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            bucket_groups: default_bucket_groups(),
            bits_per_bucket: default_bits_per_bucket(),
            top_candidates: default_top_candidates(),
            seed: default_seed(),
        }
    }
}

impl CascadeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bucket_groups == 0 {
            return Err(Error::InvalidConfig(
                "bucket_groups must be at least 1".to_string(),
            ));
        }
        if self.bits_per_bucket == 0 || self.bits_per_bucket > MAX_BITS_PER_BUCKET {
            return Err(Error::InvalidConfig(format!(
                "bits_per_bucket must be in 1..={}, got {}",
                MAX_BITS_PER_BUCKET, self.bits_per_bucket
            )));
        }
        if self.top_candidates < 2 {
            return Err(Error::InvalidConfig(format!(
                "top_candidates must be at least 2, got {}",
                self.top_candidates
            )));
        }
        Ok(())
    }
}

/// Cascade hashing engine.
///
/// Descriptors are centered, then projected on Gaussian random directions:
/// the signs of `dimension` primary projections form a hash code used to
/// rank candidates by hamming distance, and the signs of each group's
/// secondary projections form a bucket id used to gather candidates.
#[derive(Debug, Clone)]
pub struct CascadeHasher {
    dimension: usize,
    bucket_groups: usize,
    bits_per_bucket: u8,
    top_candidates: usize,
    /// `dimension x dimension`, row-major
    primary: Vec<f32>,
    /// `bucket_groups x bits_per_bucket x dimension`, row-major
    secondary: Vec<f32>,
}

impl CascadeHasher {
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn primary_row(&self, bit: usize) -> &[f32] {
        let start = bit * self.dimension;
        &self.primary[start..start + self.dimension]
    }

    #[inline]
    fn secondary_row(&self, group: usize, bit: usize) -> &[f32] {
        let start = (group * self.bits_per_bucket as usize + bit) * self.dimension;
        &self.secondary[start..start + self.dimension]
    }

    fn encode(&self, centered: &[f32], code: &mut [u64], bucket_ids: &mut [u16]) {
        code.fill(0);
        for bit in 0..self.dimension {
            if dot_product_simd(self.primary_row(bit), centered) > 0.0 {
                code[bit / 64] |= 1u64 << (bit % 64);
            }
        }
        for (group, bucket_id) in bucket_ids.iter_mut().enumerate() {
            let mut id = 0u16;
            for bit in 0..self.bits_per_bucket as usize {
                let positive = dot_product_simd(self.secondary_row(group, bit), centered) > 0.0;
                id = (id << 1) | u16::from(positive);
            }
            *bucket_id = id;
        }
    }
}

impl HashingEngine for CascadeHasher {
    type Config = CascadeConfig;
    type Hashed = HashedDescriptions;

    fn init(dimension: usize, config: &CascadeConfig) -> Self {
        let bits_per_bucket = config.bits_per_bucket.clamp(1, MAX_BITS_PER_BUCKET);
        if bits_per_bucket != config.bits_per_bucket {
            warn!(
                "bits_per_bucket {} out of range, using {}",
                config.bits_per_bucket, bits_per_bucket
            );
        }
        let bucket_groups = config.bucket_groups.max(1);

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut sample = |len: usize| -> Vec<f32> {
            (0..len)
                .map(|_| Distribution::<f32>::sample(&StandardNormal, &mut rng))
                .collect()
        };
        let primary = sample(dimension * dimension);
        let secondary = sample(bucket_groups * bits_per_bucket as usize * dimension);

        debug!(
            "cascade hasher initialized: dimension {}, {} bucket groups of {} bits",
            dimension, bucket_groups, bits_per_bucket
        );

        Self {
            dimension,
            bucket_groups,
            bits_per_bucket,
            top_candidates: config.top_candidates.max(1),
            primary,
            secondary,
        }
    }

    fn hash<T: DescriptorScalar>(
        &self,
        descriptors: &DescriptorMatrix<'_, T>,
        zero_mean: &[f32],
    ) -> HashedDescriptions {
        if descriptors.is_empty() {
            return HashedDescriptions::default();
        }
        debug_assert_eq!(descriptors.cols(), self.dimension);

        let mut hashed = HashedDescriptions::with_capacity(
            descriptors.rows(),
            self.dimension,
            self.bucket_groups,
            self.bits_per_bucket,
        );
        let mut centered = vec![0.0f32; self.dimension];
        let mut code = vec![0u64; (self.dimension + 63) / 64];
        let mut bucket_ids = vec![0u16; self.bucket_groups];

        for row in descriptors.iter_rows() {
            for (c, (out, value)) in centered.iter_mut().zip(row).enumerate() {
                *out = value.to_f32() - zero_mean.get(c).copied().unwrap_or(0.0);
            }
            self.encode(&centered, &mut code, &mut bucket_ids);
            hashed.push(&code, &bucket_ids);
        }
        hashed
    }

    fn knn<T: DescriptorScalar>(
        &self,
        query_hashed: &HashedDescriptions,
        query: &DescriptorMatrix<'_, T>,
        base_hashed: &HashedDescriptions,
        base: &DescriptorMatrix<'_, T>,
        k: usize,
    ) -> Vec<QueryNeighbors> {
        let base_len = base_hashed.len().min(base.rows());
        let query_len = query_hashed.len().min(query.rows());
        if k == 0 || base_len == 0 || query_len == 0 {
            return Vec::new();
        }

        let groups = query_hashed.bucket_groups().min(base_hashed.bucket_groups());
        let mut results = Vec::with_capacity(query_len);
        let mut candidates: Vec<u32> = Vec::with_capacity(base_len);
        // hamming_bins[d] holds the candidates at hamming distance d
        let mut hamming_bins: Vec<Vec<u32>> = vec![Vec::new(); self.dimension + 1];
        let mut exact: Vec<(OrderedFloat<f32>, u32)> = Vec::with_capacity(self.top_candidates);

        for q in 0..query_len {
            candidates.clear();
            for group in 0..groups {
                let bucket = query_hashed.bucket_id(q, group);
                candidates.extend(
                    base_hashed
                        .bucket(group, bucket)
                        .iter()
                        .copied()
                        .filter(|&c| (c as usize) < base_len),
                );
            }
            if candidates.len() <= k {
                continue;
            }

            // A candidate shared by several groups is ranked once.
            candidates.sort_unstable();
            candidates.dedup();
            hamming_bins.iter_mut().for_each(Vec::clear);
            let query_code = query_hashed.code(q);
            for &candidate in &candidates {
                let distance =
                    hamming_distance(query_code, base_hashed.code(candidate as usize)) as usize;
                hamming_bins[distance.min(self.dimension)].push(candidate);
            }

            exact.clear();
            let query_row = query.row(q);
            'bins: for bin in &hamming_bins {
                for &candidate in bin {
                    if exact.len() >= self.top_candidates {
                        break 'bins;
                    }
                    let distance = T::squared_l2(query_row, base.row(candidate as usize));
                    exact.push((OrderedFloat(distance), candidate));
                }
            }

            if exact.len() >= k {
                exact.sort_unstable();
                results.push(QueryNeighbors::new(
                    q,
                    exact[..k]
                        .iter()
                        .map(|&(distance, index)| Neighbor::new(index as usize, distance.0)),
                ));
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors(rows: usize, dim: usize, salt: u32) -> Vec<f32> {
        (0..rows * dim)
            .map(|i| {
                let x = (i as u32).wrapping_mul(2654435761).wrapping_add(salt.wrapping_mul(40503));
                (x % 1000) as f32 / 10.0
            })
            .collect()
    }

    #[test]
    fn test_config_validation() {
        assert!(CascadeConfig::default().validate().is_ok());
        let bad = CascadeConfig {
            bits_per_bucket: 17,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidConfig(_))));
        let bad = CascadeConfig {
            top_candidates: 1,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: CascadeConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.bucket_groups, 6);
        assert_eq!(config.bits_per_bucket, 10);
    }

    #[test]
    fn test_projections_are_seeded() {
        let config = CascadeConfig::default();
        let a = CascadeHasher::init(16, &config);
        let b = CascadeHasher::init(16, &config);
        let c = CascadeHasher::init(16, &CascadeConfig { seed: 1, ..config });
        assert_eq!(a.primary, b.primary);
        assert_eq!(a.secondary, b.secondary);
        assert_ne!(a.primary, c.primary);
        assert_eq!(a.primary.len(), 256);
        assert_eq!(a.secondary.len(), 6 * 10 * 16);
    }

    #[test]
    fn test_hash_shape() {
        let hasher = CascadeHasher::init(8, &CascadeConfig::default());
        let data = descriptors(5, 8, 1);
        let m = DescriptorMatrix::new(&data, 5, 8).unwrap();
        let zero_mean = CascadeHasher::zero_mean(&m);
        let hashed = hasher.hash(&m, &zero_mean);

        assert_eq!(hashed.len(), 5);
        assert_eq!(hashed.bucket_groups(), 6);
        for group in 0..6 {
            let filed: usize = (0..1u32 << 10).map(|b| hashed.bucket(group, b as u16).len()).sum();
            assert_eq!(filed, 5);
        }

        let empty = hasher.hash(&DescriptorMatrix::<f32>::empty(8), &zero_mean);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_identical_descriptors_are_nearest() {
        let dim = 32;
        let hasher = CascadeHasher::init(dim, &CascadeConfig::default());
        let data = descriptors(40, dim, 3);
        let m = DescriptorMatrix::new(&data, 40, dim).unwrap();
        let zero_mean = CascadeHasher::zero_mean(&m);
        let hashed = hasher.hash(&m, &zero_mean);

        // Duplicates of the base share hash codes and every bucket id, so
        // the self-match is always ranked first with a zero distance.
        let found = hasher.knn(&hashed, &m, &hashed, &m, 2);
        for qn in &found {
            assert_eq!(qn.neighbors.len(), 2);
            assert_eq!(qn.neighbors[0].index, qn.query);
            assert_eq!(qn.neighbors[0].distance, 0.0);
            assert!(qn.neighbors[0].distance <= qn.neighbors[1].distance);
        }
    }

    #[test]
    fn test_shared_candidates_ranked_once() {
        // Both base rows equal the query, so every group files them in the
        // query's bucket: 12 candidate hits for 2 distinct descriptors.
        let dim = 8;
        let hasher = CascadeHasher::init(dim, &CascadeConfig::default());
        let row: Vec<f32> = (0..dim).map(|v| v as f32 - 3.5).collect();
        let base_data = [row.clone(), row.clone()].concat();
        let base = DescriptorMatrix::new(&base_data, 2, dim).unwrap();
        let query = DescriptorMatrix::new(&row, 1, dim).unwrap();
        let zero_mean = vec![0.0; dim];

        let found = hasher.knn(
            &hasher.hash(&query, &zero_mean),
            &query,
            &hasher.hash(&base, &zero_mean),
            &base,
            2,
        );
        assert_eq!(found.len(), 1);
        let mut indices: Vec<usize> = found[0].neighbors.iter().map(|n| n.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_byte_descriptors() {
        let dim = 16;
        let hasher = CascadeHasher::init(dim, &CascadeConfig::default());
        let data: Vec<u8> = descriptors(30, dim, 9).iter().map(|v| *v as u8).collect();
        let m = DescriptorMatrix::new(&data, 30, dim).unwrap();
        let zero_mean = CascadeHasher::zero_mean(&m);
        let hashed = hasher.hash(&m, &zero_mean);
        let found = hasher.knn(&hashed, &m, &hashed, &m, 2);
        assert!(found.iter().all(|qn| qn.neighbors[0].index == qn.query));
    }

    #[test]
    fn test_knn_with_empty_side() {
        let hasher = CascadeHasher::init(4, &CascadeConfig::default());
        let data = descriptors(3, 4, 2);
        let m = DescriptorMatrix::new(&data, 3, 4).unwrap();
        let hashed = hasher.hash(&m, &[]);
        let empty = HashedDescriptions::default();
        let none = DescriptorMatrix::<f32>::empty(4);

        assert!(hasher.knn(&hashed, &m, &empty, &none, 2).is_empty());
        assert!(hasher.knn(&empty, &none, &hashed, &m, 2).is_empty());
        assert!(hasher.knn(&hashed, &m, &hashed, &m, 0).is_empty());
    }
}
