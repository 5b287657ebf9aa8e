use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use wb_config::PipelineConfig;
use wb_core::chunk::{self, ChunkManifest};
use wb_core::history::HistoryStore;
use wb_core::polygon::PolygonContext;
use wb_runtime::tracing_init::init_tracing;

#[derive(Parser)]
#[command(name = "waterbodies", about = "Waterbody time-series pipeline tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split the polygon set into area-balanced work chunks
    Chunks {
        /// Path to a waterbodies.toml config file
        #[arg(short, long)]
        config: PathBuf,
        /// Number of chunks to allocate
        #[arg(short, long)]
        n_chunks: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chunks { config, n_chunks } => run_chunks(&config, n_chunks),
    }
}

fn run_chunks(config_path: &Path, n_chunks: usize) -> Result<()> {
    let config_path = config_path
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("config path '{}': {e}", config_path.display()))?;
    let config = PipelineConfig::load(&config_path)?;
    let base_dir = config_path
        .parent()
        .expect("config path must have a parent directory");

    let _guard = init_tracing(&config.logging, base_dir)?;

    let chunks_config = config
        .chunks
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("config has no [chunks] section"))?;

    let contexts_path = resolve(base_dir, &chunks_config.contexts);
    let raw = std::fs::read_to_string(&contexts_path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", contexts_path.display()))?;
    let contexts: Vec<PolygonContext> = serde_json::from_str(&raw)?;
    tracing::info!(domain = "sys", total = contexts.len(), "loaded polygon contexts");

    let store = HistoryStore::new(resolve(base_dir, &config.run.output_dir));
    let existing = chunks_config.missing_only.then_some(&store);
    let filtered = chunk::filter_contexts(
        contexts,
        chunks_config.filter_region.as_deref(),
        existing,
        None,
    );
    tracing::info!(domain = "sys", kept = filtered.len(), "filtered polygon contexts");

    let manifest = ChunkManifest {
        chunks: chunk::alloc_chunks(filtered, n_chunks).map_err(|e| anyhow::anyhow!("{e}"))?,
    };

    let manifest_dir = resolve(base_dir, &chunks_config.manifest_dir);
    std::fs::create_dir_all(&manifest_dir)?;
    let stem = config_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("chunks");
    let manifest_path = manifest_dir.join(format!("{stem}_{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&manifest_path, serde_json::to_string(&manifest)?)?;
    tracing::info!(domain = "sys", path = %manifest_path.display(), "wrote chunk manifest");

    // The job submission layer reads the manifest location from stdout.
    println!("{}", serde_json::json!({ "chunks_path": manifest_path }));
    Ok(())
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}
