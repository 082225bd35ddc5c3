//! File formats of hashmatch: region datasets, pair lists and putative
//! match files.

pub mod dataset;
pub mod format;
pub mod matches;
pub mod pairs;

pub use dataset::{load_regions, save_regions, ImageRegions, RegionsFile};
pub use format::{write_atomic, FileFormat};
pub use matches::{load_matches, save_matches, MatchesFile, PairMatches};
pub use pairs::{parse_pairs, read_pairs, save_pairs, write_pairs};
