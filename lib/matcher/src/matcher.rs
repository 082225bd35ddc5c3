use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use hashmatch_cascade::{CascadeHasher, HashingEngine};
use hashmatch_core::{
    deduplicate, deduplicate_by_position, DescriptorMatrix, DescriptorScalar, ImageId, IndMatch,
    IndMatches, Pair, PairSet, PutativeMatches, RegionProvider, RegionSet, Result, ScalarKind,
};
use tracing::{debug, error, info, warn};

use crate::config::MatcherConfig;
use crate::grouping::PairGroups;
use crate::index::{build_index, HashedIndex};
use crate::normalizer::compute_zero_mean;
use crate::progress::ProgressSink;
use crate::ratio::ratio_test_filter;

/// Neighbors requested per query descriptor.
const NEIGHBORS: usize = 2;

/// How the processing of one requested pair ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairOutcome {
    /// The first image has no regions
    SkippedEmptyFirst,
    /// The two images do not share a descriptor type
    SkippedTypeMismatch,
    /// Cancellation was requested before the pair started
    SkippedCancelled,
    /// Matches were stored under the pair
    Inserted,
    /// No match survived filtering
    SkippedEmptyResult,
}

/// How a whole run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunStatus {
    #[default]
    Completed,
    Cancelled,
    /// Bit-packed descriptors, declined without work
    BinaryDescriptors,
    /// The provider's descriptor type is not supported
    UnknownScalarType,
}

/// Tally of pair outcomes for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingReport {
    pub status: RunStatus,
    pub requested: usize,
    pub inserted: usize,
    pub skipped_empty_first: usize,
    pub skipped_type_mismatch: usize,
    pub skipped_cancelled: usize,
    pub skipped_empty_result: usize,
    /// Matches over all inserted pairs
    pub total_matches: usize,
}

impl MatchingReport {
    fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: PairOutcome, pairs: usize) {
        let slot = match outcome {
            PairOutcome::SkippedEmptyFirst => &mut self.skipped_empty_first,
            PairOutcome::SkippedTypeMismatch => &mut self.skipped_type_mismatch,
            PairOutcome::SkippedCancelled => &mut self.skipped_cancelled,
            PairOutcome::Inserted => &mut self.inserted,
            PairOutcome::SkippedEmptyResult => &mut self.skipped_empty_result,
        };
        *slot += pairs;
    }

    /// Pairs that reached a terminal outcome.
    pub fn accounted(&self) -> usize {
        self.inserted
            + self.skipped_empty_first
            + self.skipped_type_mismatch
            + self.skipped_cancelled
            + self.skipped_empty_result
    }
}

/// Result of one second image of a group.
struct PairResult {
    pair: Pair,
    outcome: PairOutcome,
    matches: IndMatches,
}

/// State shared by the pairs of one first-image group.
struct GroupContext<'a, H, T> {
    first: ImageId,
    regions: &'a RegionSet,
    matrix: Option<DescriptorMatrix<'a, T>>,
    hashed: Option<&'a H>,
}

/// Putative matching of image pairs through a hashing engine.
///
/// Every used image is hashed once; each requested pair `(I, J)` then
/// queries `J`'s descriptors against `I`'s, keeps the nearest neighbors that
/// pass the distance ratio test and stores them as `(index in I, index in J)`
/// after removing duplicate indices and duplicate positions.
#[derive(Debug, Clone)]
pub struct PairwiseMatcher<E: HashingEngine> {
    distance_ratio: f32,
    engine_config: E::Config,
}

/// Matcher backed by the cascade hasher.
pub type CascadeHashingMatcher = PairwiseMatcher<CascadeHasher>;

impl CascadeHashingMatcher {
    pub fn from_config(config: &MatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.distance_ratio, config.cascade))
    }
}

impl<E: HashingEngine> PairwiseMatcher<E> {
    pub fn new(distance_ratio: f32, engine_config: E::Config) -> Self {
        Self {
            distance_ratio,
            engine_config,
        }
    }

    /// Matcher with the engine's default configuration.
    pub fn with_ratio(distance_ratio: f32) -> Self {
        Self::new(distance_ratio, E::Config::default())
    }

    pub fn distance_ratio(&self) -> f32 {
        self.distance_ratio
    }

    pub fn engine_config(&self) -> &E::Config {
        &self.engine_config
    }

    /// Match every pair of `pairs`; see [`PairwiseMatcher::match_pairs_with_report`].
    pub fn match_pairs<P, S>(&self, provider: &P, pairs: &PairSet, progress: &S) -> PutativeMatches
    where
        P: RegionProvider + ?Sized,
        S: ProgressSink + ?Sized,
    {
        self.match_pairs_with_report(provider, pairs, progress).0
    }

    /// Match every pair of `pairs` and tally how each pair ended.
    ///
    /// Never fails: binary descriptors and unknown descriptor types give an
    /// empty collection, and on cancellation the pairs finished so far are
    /// kept.
    pub fn match_pairs_with_report<P, S>(
        &self,
        provider: &P,
        pairs: &PairSet,
        progress: &S,
    ) -> (PutativeMatches, MatchingReport)
    where
        P: RegionProvider + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let mut report = MatchingReport::new(pairs.len());

        if provider.is_binary() {
            warn!("Cascade hashing does not support binary descriptors, no pair matched");
            report.status = RunStatus::BinaryDescriptors;
            return (PutativeMatches::new(), report);
        }

        let kind = match provider.scalar_kind() {
            Ok(kind) => kind,
            Err(e) => {
                error!("Cannot match regions: {}", e);
                report.status = RunStatus::UnknownScalarType;
                return (PutativeMatches::new(), report);
            }
        };

        let grouped = PairGroups::from_pairs(pairs);
        let matches = match kind {
            ScalarKind::Byte => self.run::<u8, P, S>(provider, &grouped, progress, &mut report),
            ScalarKind::Float => self.run::<f32, P, S>(provider, &grouped, progress, &mut report),
        };
        report.total_matches = matches.total_matches();

        info!(
            "Matched {} of {} pairs ({} matches)",
            report.inserted, report.requested, report.total_matches
        );
        (matches, report)
    }

    fn run<T, P, S>(
        &self,
        provider: &P,
        grouped: &PairGroups,
        progress: &S,
        report: &mut MatchingReport,
    ) -> PutativeMatches
    where
        T: DescriptorScalar,
        P: RegionProvider + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let mut matches = PutativeMatches::new();
        if grouped.is_empty() {
            return matches;
        }

        // Empty images may carry any dimension, so the first non-empty image
        // decides; the first known image only when every image is empty.
        let known: Vec<&RegionSet> = grouped
            .used
            .iter()
            .filter_map(|&image| provider.regions(image))
            .collect();
        let dimension = known
            .iter()
            .find(|regions| !regions.is_empty())
            .or_else(|| known.first())
            .map_or(0, |regions| regions.descriptor_dimension());

        info!(
            "Hashing {} images ({} descriptors, dimension {})",
            grouped.used.len(),
            T::KIND,
            dimension
        );
        let zero_mean = compute_zero_mean::<E, T, P>(provider, &grouped.used, dimension);
        let engine = E::init(dimension, &self.engine_config);
        let index = build_index::<E, T, P>(&engine, provider, &grouped.used, dimension, &zero_mean);

        let total = grouped.pair_count();
        progress.restart(total, "Matching pairs");
        let mut started = 0;

        for (&first, seconds) in &grouped.groups {
            if progress.is_cancelled() {
                info!("Matching cancelled, {} pairs not started", total - started);
                report.status = RunStatus::Cancelled;
                report.record(PairOutcome::SkippedCancelled, total - started);
                break;
            }
            started += seconds.len();

            let regions = match provider.regions(first) {
                Some(regions) if !regions.is_empty() => regions,
                _ => {
                    debug!("Image {} has no regions, skipping {} pairs", first, seconds.len());
                    progress.increment(seconds.len());
                    report.record(PairOutcome::SkippedEmptyFirst, seconds.len());
                    continue;
                }
            };

            let group = GroupContext {
                first,
                regions,
                matrix: DescriptorMatrix::<T>::from_regions(regions, dimension).ok(),
                hashed: index.get(first),
            };

            let results: Vec<PairResult> = seconds
                .par_iter()
                .map(|&second| {
                    self.match_second::<T, P, S>(
                        &engine, &index, provider, &group, second, dimension, progress,
                    )
                })
                .collect();

            for result in results {
                report.record(result.outcome, 1);
                if result.outcome == PairOutcome::Inserted {
                    matches.insert(result.pair, result.matches);
                }
            }
        }

        if report.status != RunStatus::Cancelled && progress.is_cancelled() {
            report.status = RunStatus::Cancelled;
        }
        matches
    }

    #[allow(clippy::too_many_arguments)]
    fn match_second<T, P, S>(
        &self,
        engine: &E,
        index: &HashedIndex<E::Hashed>,
        provider: &P,
        group: &GroupContext<'_, E::Hashed, T>,
        second: ImageId,
        dimension: usize,
        progress: &S,
    ) -> PairResult
    where
        T: DescriptorScalar,
        P: RegionProvider + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let pair = Pair(group.first, second);
        if progress.is_cancelled() {
            return PairResult {
                pair,
                outcome: PairOutcome::SkippedCancelled,
                matches: IndMatches::new(),
            };
        }

        let (outcome, matches) = self.match_pair(engine, index, provider, group, second, dimension);
        progress.increment(1);
        PairResult {
            pair,
            outcome,
            matches,
        }
    }

    fn match_pair<T, P>(
        &self,
        engine: &E,
        index: &HashedIndex<E::Hashed>,
        provider: &P,
        group: &GroupContext<'_, E::Hashed, T>,
        second: ImageId,
        dimension: usize,
    ) -> (PairOutcome, IndMatches)
    where
        T: DescriptorScalar,
        P: RegionProvider + ?Sized,
    {
        let Some(regions_j) = provider.regions(second) else {
            return (PairOutcome::SkippedEmptyResult, IndMatches::new());
        };
        if regions_j.scalar_kind() != group.regions.scalar_kind() {
            return (PairOutcome::SkippedTypeMismatch, IndMatches::new());
        }

        let (Some(matrix_i), Some(hashed_i), Some(hashed_j)) =
            (group.matrix.as_ref(), group.hashed, index.get(second))
        else {
            return (PairOutcome::SkippedTypeMismatch, IndMatches::new());
        };
        let matrix_j = match DescriptorMatrix::<T>::from_regions(regions_j, dimension) {
            Ok(matrix) => matrix,
            Err(e) => {
                warn!("Pair ({}, {}) skipped: {}", group.first, second, e);
                return (PairOutcome::SkippedTypeMismatch, IndMatches::new());
            }
        };

        // J queries, I is the base: matches come back as (base, query).
        let found = engine.knn(hashed_j, &matrix_j, hashed_i, matrix_i, NEIGHBORS);
        let mut matches: IndMatches = ratio_test_filter(&found, self.distance_ratio)
            .into_iter()
            .map(|(query, base)| IndMatch::new(base as u32, query as u32))
            .collect();

        deduplicate(&mut matches);
        deduplicate_by_position(&mut matches, group.regions.positions(), regions_j.positions());

        if matches.is_empty() {
            (PairOutcome::SkippedEmptyResult, matches)
        } else {
            (PairOutcome::Inserted, matches)
        }
    }
}
