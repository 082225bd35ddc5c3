//! # hashmatch Cascade
//!
//! Cascade hashing for approximate nearest neighbor search between two
//! descriptor sets.
//!
//! Each descriptor is centered on a zero mean shared by the whole run and
//! projected on Gaussian random directions. The primary projections give a
//! hash code compared by hamming distance; the secondary projections give one
//! bucket id per bucket group. A query gathers the base descriptors sharing
//! one of its buckets, ranks them by hamming distance and computes the exact
//! squared Euclidean distance of the best ranked ones only.
//!
//! ## Example
//!
//! ```rust
//! use hashmatch_cascade::{CascadeConfig, CascadeHasher, HashingEngine};
//! use hashmatch_core::DescriptorMatrix;
//!
//! let data: Vec<f32> = (0..64).map(|v| (v * 7 % 13) as f32).collect();
//! let m = DescriptorMatrix::new(&data, 8, 8).unwrap();
//!
//! let hasher = CascadeHasher::init(8, &CascadeConfig::default());
//! let zero_mean = CascadeHasher::zero_mean(&m);
//! let hashed = hasher.hash(&m, &zero_mean);
//! assert_eq!(hashed.len(), 8);
//!
//! for found in hasher.knn(&hashed, &m, &hashed, &m, 2) {
//!     assert!(found.neighbors[0].distance <= found.neighbors[1].distance);
//! }
//! ```

pub mod engine;
pub mod hashed;
pub mod hasher;

pub use engine::{mean_row, HashingEngine, Neighbor, QueryNeighbors};
pub use hashed::HashedDescriptions;
pub use hasher::{CascadeConfig, CascadeHasher, MAX_BITS_PER_BUCKET};
