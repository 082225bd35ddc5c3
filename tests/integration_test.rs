// Integration tests for hashmatch
use hashmatch::prelude::*;
use hashmatch::{load_matches, load_regions, save_matches, save_pairs, save_regions, IndMatches};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::process::Command;
use tempfile::tempdir;

const DIM: usize = 32;
const COUNT: usize = 300;

/// Row `j` of the shuffled image is row `source(j)` of the original.
fn source(j: usize) -> usize {
    (j * 7 + 3) % COUNT
}

fn positions(image: u32) -> Vec<PointFeature> {
    (0..COUNT)
        .map(|i| PointFeature::new(i as f32, image as f32 * 1000.0))
        .collect()
}

fn float_descriptors(rng: &mut StdRng) -> Vec<f32> {
    (0..COUNT * DIM).map(|_| rng.random_range(0.0..100.0f32)).collect()
}

/// Image 0 random, image 1 a shuffled noisy copy of image 0, image 2 unrelated.
fn float_store() -> RegionStore {
    let mut rng = StdRng::seed_from_u64(42);
    let original = float_descriptors(&mut rng);
    let shuffled: Vec<f32> = (0..COUNT)
        .flat_map(|j| {
            let row = &original[source(j) * DIM..(source(j) + 1) * DIM];
            row.iter().map(|v| v + 0.01).collect::<Vec<_>>()
        })
        .collect();
    let unrelated = float_descriptors(&mut rng);

    let mut store = RegionStore::new(ScalarKind::Float);
    for (image, data) in [original, shuffled, unrelated].into_iter().enumerate() {
        let image = image as u32;
        let regions = RegionSet::new(DIM, DescriptorBuffer::Float(data), positions(image)).unwrap();
        store.insert(image, regions);
    }
    store
}

fn byte_store() -> RegionStore {
    let mut rng = StdRng::seed_from_u64(7);
    let original: Vec<u8> = (0..COUNT * DIM).map(|_| rng.random::<u8>()).collect();
    let shuffled: Vec<u8> = (0..COUNT)
        .flat_map(|j| original[source(j) * DIM..(source(j) + 1) * DIM].to_vec())
        .collect();

    let mut store = RegionStore::new(ScalarKind::Byte);
    store.insert(0, RegionSet::new(DIM, DescriptorBuffer::Byte(original), positions(0)).unwrap());
    store.insert(1, RegionSet::new(DIM, DescriptorBuffer::Byte(shuffled), positions(1)).unwrap());
    store
}

/// Smaller buckets so a few hundred descriptors still share them.
fn matcher() -> CascadeHashingMatcher {
    let config = MatcherConfig {
        cascade: CascadeConfig {
            bits_per_bucket: 6,
            ..Default::default()
        },
        ..Default::default()
    };
    CascadeHashingMatcher::from_config(&config).unwrap()
}

fn correct(matches: &IndMatches) -> usize {
    matches
        .iter()
        .filter(|m| m.i as usize == source(m.j as usize))
        .count()
}

#[test]
fn test_recovers_shuffled_float_descriptors() {
    let store = float_store();
    let pairs: PairSet = [(0, 1)].into_iter().collect();
    let progress = MatchingProgress::new();

    let (matches, report) = matcher().match_pairs_with_report(&store, &pairs, &progress);
    let found = matches.get(Pair(0, 1)).unwrap().to_vec();

    assert_eq!(report.inserted, 1);
    assert_eq!(progress.count(), 1);
    assert!(found.len() >= COUNT * 8 / 10, "only {} matches", found.len());
    assert!(correct(&found) * 100 >= found.len() * 95);
}

#[test]
fn test_recovers_shuffled_byte_descriptors() {
    let store = byte_store();
    let pairs: PairSet = [(0, 1)].into_iter().collect();

    let matches = matcher().match_pairs(&store, &pairs, &NoProgress);
    let found = matches.get(Pair(0, 1)).unwrap().to_vec();

    assert!(found.len() >= COUNT * 8 / 10, "only {} matches", found.len());
    // Exact duplicates sit at distance zero, so every kept match is right.
    assert_eq!(correct(&found), found.len());
}

#[test]
fn test_reversed_pair_swaps_indices() {
    let store = byte_store();
    let forward = matcher().match_pairs(&store, &[(0, 1)].into_iter().collect(), &NoProgress);
    let backward = matcher().match_pairs(&store, &[(1, 0)].into_iter().collect(), &NoProgress);

    let backward = backward.get(Pair(1, 0)).unwrap();
    assert!(forward.get(Pair(1, 0)).is_none());
    // Under (1, 0) the first index belongs to image 1.
    assert!(backward.iter().all(|m| source(m.i as usize) == m.j as usize));
}

#[test]
fn test_exhaustive_matching_is_deterministic() {
    let store = float_store();
    let pairs = exhaustive_pairs(&store.image_ids());
    assert_eq!(pairs.len(), 3);

    let first = matcher().match_pairs(&store, &pairs, &NoProgress);
    let second = matcher().match_pairs(&store, &pairs, &NoProgress);
    assert_eq!(first, second);
    for pair in first.pairs() {
        assert!(pairs.contains(pair.first(), pair.second()));
    }
}

#[test]
fn test_cancelled_run_returns_nothing_new() {
    let store = float_store();
    let token = CancellationToken::new();
    let progress = MatchingProgress::with_token(token.clone());
    token.cancel();

    let matches = matcher().match_pairs(&store, &exhaustive_pairs(&[0, 1, 2]), &progress);
    assert!(matches.is_empty());
    assert_eq!(progress.count(), 0);
}

#[test]
fn test_file_pipeline() {
    let dir = tempdir().unwrap();
    let regions_path = dir.path().join("regions.json");
    let matches_path = dir.path().join("matches.bin");

    save_regions(&regions_path, &byte_store()).unwrap();
    let store = load_regions(&regions_path).unwrap();
    let matches = matcher().match_pairs(&store, &exhaustive_pairs(&store.image_ids()), &NoProgress);
    save_matches(&matches_path, &matches).unwrap();

    assert_eq!(load_matches(&matches_path).unwrap(), matches);
}

#[test]
fn test_command_line() {
    let dir = tempdir().unwrap();
    let regions_path = dir.path().join("regions.json");
    let pairs_path = dir.path().join("pairs.txt");
    let config_path = dir.path().join("config.json");
    let output_path = dir.path().join("matches.json");

    save_regions(&regions_path, &byte_store()).unwrap();
    save_pairs(&pairs_path, &[(0, 1)].into_iter().collect()).unwrap();
    std::fs::write(&config_path, r#"{"cascade": {"bits_per_bucket": 6}}"#).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_hashmatch"))
        .arg("--regions")
        .arg(&regions_path)
        .arg("--pairs")
        .arg(&pairs_path)
        .arg("--config")
        .arg(&config_path)
        .arg("--output")
        .arg(&output_path)
        .args(["--threads", "2", "--log-level", "warn"])
        .status()
        .unwrap();
    assert!(status.success());

    let matches = load_matches(&output_path).unwrap();
    assert_eq!(matches.pairs().collect::<Vec<_>>(), vec![Pair(0, 1)]);

    let status = Command::new(env!("CARGO_BIN_EXE_hashmatch"))
        .arg("--regions")
        .arg(&regions_path)
        .arg("--output")
        .arg(dir.path().join("matches.txt"))
        .args(["--log-level", "error"])
        .status()
        .unwrap();
    assert!(!status.success());
}
