//! # hashmatch
//!
//! Putative feature matching between many image pairs with cascade hashing.
//!
//! Matching every descriptor of every image pair exhaustively is too slow for
//! large collections. hashmatch hashes the descriptors of each image once,
//! then answers the nearest neighbor queries of every requested pair through
//! the hashed indices, keeps the matches passing the distance ratio test and
//! removes duplicates.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! hashmatch --regions regions.json --output matches.json --ratio 0.8
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use hashmatch::prelude::*;
//!
//! let mut store = RegionStore::new(ScalarKind::Float);
//! for image in 0..2u32 {
//!     let data: Vec<f32> = (0..32).map(|v| ((v * 5 + image) % 11) as f32).collect();
//!     let positions = (0..4).map(|i| PointFeature::new(i as f32, 0.0)).collect();
//!     store.insert(image, RegionSet::new(8, DescriptorBuffer::Float(data), positions).unwrap());
//! }
//!
//! let pairs = exhaustive_pairs(&store.image_ids());
//! let matcher = CascadeHashingMatcher::from_config(&MatcherConfig::default()).unwrap();
//! let matches = matcher.match_pairs(&store, &pairs, &NoProgress);
//!
//! for (pair, found) in matches.iter() {
//!     println!("{:?}: {} matches", pair, found.len());
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `hashmatch-core` - pairs, region sets, descriptor views, matches, distance kernels
//! - `hashmatch-cascade` - the hashing engine trait and the cascade hasher
//! - `hashmatch-matcher` - the pairwise matching pipeline
//! - `hashmatch-storage` - region datasets, pair lists and match files

// Re-export core types
pub use hashmatch_core::{
    contiguous_pairs, exhaustive_pairs, DescriptorBuffer, DescriptorMatrix, DescriptorScalar,
    Error, ImageId, IndMatch, IndMatches, Pair, PairSet, PointFeature, PutativeMatches,
    RegionProvider, RegionSet, RegionStore, Result, ScalarKind,
};

// Re-export the hashing engine
pub use hashmatch_cascade::{CascadeConfig, CascadeHasher, HashingEngine};

// Re-export the matcher
pub use hashmatch_matcher::{
    CancellationToken, CascadeHashingMatcher, MatcherConfig, MatchingProgress, MatchingReport,
    NoProgress, PairOutcome, PairwiseMatcher, ProgressSink, RunStatus,
};

// Re-export storage
pub use hashmatch_storage::{
    load_matches, load_regions, read_pairs, save_matches, save_pairs, save_regions,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        contiguous_pairs, exhaustive_pairs, CancellationToken, CascadeConfig,
        CascadeHashingMatcher, DescriptorBuffer, Error, ImageId, IndMatch, MatcherConfig,
        MatchingProgress, NoProgress, Pair, PairSet, PointFeature, PutativeMatches,
        RegionProvider, RegionSet, RegionStore, Result, ScalarKind,
    };
}

/// SIMD-optimized distance kernels
pub mod simd {
    pub use hashmatch_core::simd::{dot_product_simd, hamming_distance, squared_l2_simd, squared_l2_u8};
}
