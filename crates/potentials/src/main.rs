use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use potentials_core::{describe_track, ConfigManager, DuplicateFinder};
use potentials_library::{
    ExportFileSource, LibraryService, LibraryTrack, SnapshotStore, DEFAULT_SNAPSHOT_NAME,
};

/// Checks tracks against your saved library, using a cached library index.
#[derive(Parser, Debug)]
#[command(name = "potentials")]
#[command(about = "Find tracks you have already saved")]
struct Args {
    /// Path to the potentials config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Ignore the library snapshot and rebuild the index from the source
    #[arg(long)]
    no_cache: bool,

    /// JSON file of tracks to check against the library
    #[arg(long)]
    candidates: Option<PathBuf>,

    /// Also match by song, album and artist names (overrides the config file)
    #[arg(short, long)]
    aggressive: bool,

    /// Print every composite key held by the search tree
    #[arg(long)]
    dump_tree: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ConfigManager::new(Some(args.config.clone()));
    let settings = config
        .load()
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let source = Arc::new(ExportFileSource::new(
        &settings.source.library_export,
        settings.source.page_size,
    ));
    let snapshots = SnapshotStore::new(&settings.cache.cache_dir, DEFAULT_SNAPSHOT_NAME);
    let library = LibraryService::new(source, snapshots, settings.cache.lifetime());

    if args.no_cache {
        library.rebuild_from_source().await?;
    } else {
        library.ensure_ready().await?;
    }
    log::info!(
        "Library index holds {} tracks, fresh until {}",
        library.track_count(),
        library.expires_at()
    );

    if args.dump_tree {
        let mut keys: Vec<String> = library.dump_tree().into_iter().collect();
        keys.sort();
        for key in keys {
            println!("{}", key);
        }
    }

    if let Some(path) = &args.candidates {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read candidates from {:?}", path))?;
        let candidates: Vec<LibraryTrack> = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse candidates in {:?}", path))?;

        let mut duplicates_config = settings.duplicates;
        duplicates_config.aggressive |= args.aggressive;

        let finder = DuplicateFinder::new(library.clone(), duplicates_config);
        let duplicates = finder.find(&candidates).await?;
        for duplicate in &duplicates {
            println!("[DUPLICATE] {}", describe_track(&duplicate.candidate));
        }
        log::info!(
            "Found {} duplicate tracks among {} candidates.",
            duplicates.len(),
            candidates.len()
        );
    }

    Ok(())
}
