use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use hashmatch_core::{contiguous_pairs, exhaustive_pairs};
use hashmatch_matcher::{CascadeHashingMatcher, MatcherConfig, MatchingProgress, RunStatus};
use hashmatch_storage::{load_regions, read_pairs, save_matches, FileFormat};

/// Putative feature matching of image pairs with cascade hashing
#[derive(Parser, Debug)]
#[command(name = "hashmatch")]
#[command(about = "Cascade hashing feature matching", long_about = None)]
struct Args {
    /// Region dataset (.json or .bin)
    #[arg(short, long)]
    regions: PathBuf,

    /// Pair list file, one `I J K ...` line per first image
    #[arg(short, long, conflicts_with = "contiguous")]
    pairs: Option<PathBuf>,

    /// Pair each image with its next N images instead of all images
    #[arg(long)]
    contiguous: Option<usize>,

    /// Output match file (.json or .bin)
    #[arg(short, long)]
    output: PathBuf,

    /// Matcher configuration (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Nearest to second nearest distance ratio [default: 0.8]
    #[arg(long)]
    ratio: Option<f32>,

    /// Seed of the hashing projections [default: 5489]
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting hashmatch v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading matcher configuration {:?}", path))?;
            serde_json::from_str::<MatcherConfig>(&text)
                .with_context(|| format!("parsing matcher configuration {:?}", path))?
        }
        None => MatcherConfig::default(),
    };
    if let Some(ratio) = args.ratio {
        config.distance_ratio = ratio;
    }
    if let Some(seed) = args.seed {
        config.cascade.seed = seed;
    }
    let matcher = CascadeHashingMatcher::from_config(&config)?;
    // Fail on a bad output path before doing any work.
    FileFormat::from_path(&args.output)?;

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let regions = load_regions(&args.regions)?;
    let ids = regions.image_ids();
    let pairs = match (&args.pairs, args.contiguous) {
        (Some(path), _) => read_pairs(path)?,
        (None, Some(overlap)) => contiguous_pairs(&ids, overlap),
        (None, None) => exhaustive_pairs(&ids),
    };
    info!("Matching {} pairs over {} images", pairs.len(), ids.len());

    let progress = MatchingProgress::new();
    let (matches, report) = matcher.match_pairs_with_report(&regions, &pairs, &progress);

    match report.status {
        RunStatus::BinaryDescriptors => {
            bail!("binary descriptors cannot be matched by cascade hashing")
        }
        RunStatus::UnknownScalarType => {
            bail!("unsupported descriptor type {:?}", regions.descriptor_type())
        }
        RunStatus::Cancelled => warn!("Matching was cancelled, saving partial results"),
        RunStatus::Completed => {}
    }

    info!(
        "Pairs: {} inserted, {} without matches, {} empty first image, {} type mismatch, {} cancelled",
        report.inserted,
        report.skipped_empty_result,
        report.skipped_empty_first,
        report.skipped_type_mismatch,
        report.skipped_cancelled
    );

    save_matches(&args.output, &matches)?;
    info!("Wrote {} matches to {:?}", report.total_matches, args.output);
    Ok(())
}
