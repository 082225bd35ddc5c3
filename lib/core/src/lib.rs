//! # hashmatch Core
//!
//! Core types shared by every hashmatch crate:
//!
//! - [`Pair`] / [`PairSet`] - image pairs requested for matching
//! - [`RegionSet`] - descriptors and positions detected on one image
//! - [`RegionProvider`] / [`RegionStore`] - read access to all region sets of a run
//! - [`DescriptorMatrix`] - validated row-major view over a descriptor buffer
//! - [`DescriptorScalar`] / [`ScalarKind`] - supported descriptor component types
//! - [`IndMatch`] / [`PutativeMatches`] - matching output
//!
//! ## Example
//!
//! ```rust
//! use hashmatch_core::{
//!     DescriptorBuffer, DescriptorMatrix, PointFeature, RegionProvider, RegionSet, RegionStore,
//!     ScalarKind,
//! };
//!
//! let regions = RegionSet::new(
//!     2,
//!     DescriptorBuffer::Byte(vec![10, 20, 30, 40]),
//!     vec![PointFeature::new(1.0, 2.0), PointFeature::new(3.0, 4.0)],
//! )
//! .unwrap();
//!
//! let mut store = RegionStore::new(ScalarKind::Byte);
//! store.insert(0, regions);
//!
//! let view = DescriptorMatrix::<u8>::from_regions(store.regions(0).unwrap(), 2).unwrap();
//! assert_eq!(view.row(1), &[30, 40]);
//! ```

pub mod error;
pub mod matches;
pub mod matrix;
pub mod pair;
pub mod regions;
pub mod scalar;

/// Distance and projection kernels
///
/// Hardware-accelerated where available:
/// - AVX2/FMA on x86_64
/// - NEON on ARM64/Apple Silicon
pub mod simd;

pub use error::{Error, Result};
pub use matches::{deduplicate, deduplicate_by_position, IndMatch, IndMatches, PutativeMatches};
pub use matrix::DescriptorMatrix;
pub use pair::{contiguous_pairs, exhaustive_pairs, ImageId, Pair, PairSet};
pub use regions::{DescriptorBuffer, PointFeature, RegionProvider, RegionSet, RegionStore};
pub use scalar::{DescriptorScalar, ScalarKind, BINARY_TYPE_NAME};
