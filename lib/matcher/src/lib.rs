//! # hashmatch Matcher
//!
//! Putative feature matching of many image pairs through a hashing engine.
//!
//! A run goes through four phases:
//!
//! 1. group the requested pairs by first image ([`PairGroups`])
//! 2. compute the zero-mean descriptor shared by all used images
//! 3. hash every used image once, in parallel ([`build_index`])
//! 4. for each first image, in ascending order, match its second images in
//!    parallel: k-NN through the engine, ratio test, deduplication
//!
//! Progress and cancellation go through a [`ProgressSink`].

pub mod config;
pub mod grouping;
pub mod index;
pub mod matcher;
pub mod normalizer;
pub mod progress;
pub mod ratio;

pub use config::MatcherConfig;
pub use grouping::PairGroups;
pub use index::{build_index, HashedIndex};
pub use matcher::{
    CascadeHashingMatcher, MatchingReport, PairOutcome, PairwiseMatcher, RunStatus,
};
pub use normalizer::compute_zero_mean;
pub use progress::{CancellationToken, MatchingProgress, NoProgress, ProgressSink};
pub use ratio::{passes_ratio_test, ratio_test_filter};
