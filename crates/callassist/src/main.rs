use anyhow::Result;
use callassist_assistant::Orchestrator;
use callassist_common::{logger, AppConfig};
use callassist_knowledge::generate_bfsi_dataset;
use callassist_vector::{build_index, embedder_from_config, ArtifactStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "callassist")]
#[command(about = "CallAssist - tiered BFSI call-center question answering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the synthetic BFSI dataset
    GenerateDataset {
        /// Output file (defaults to DATASET_PATH)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Embed the dataset and publish a new index build
    BuildIndex {
        /// Source dataset file
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Artifact directory
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },

    /// Answer a single query
    Ask {
        query: String,

        /// Similarity a dataset match must exceed
        #[arg(long)]
        threshold: Option<f32>,

        /// Never call the generative model
        #[arg(long)]
        no_fallback: bool,

        /// Do not pass the nearest record to the generative model
        #[arg(long)]
        no_context: bool,
    },

    /// Show the current index build
    Stats {
        /// Artifact directory
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI overrides are applied as env vars so AppConfig stays the single source
    load_dotenv_from_project_root();

    match cli.command {
        Commands::GenerateDataset { output } => {
            if let Some(path) = &output {
                std::env::set_var("DATASET_PATH", path);
            }
            let config = init(false)?;

            let dataset = generate_bfsi_dataset();
            dataset.save(&config.dataset_path)?;

            tracing::info!("Wrote {} records to {}", dataset.len(), config.dataset_path.display());
            println!("Wrote {} records to {}", dataset.len(), config.dataset_path.display());
        }
        Commands::BuildIndex { dataset, index_dir } => {
            if let Some(path) = &dataset {
                std::env::set_var("DATASET_PATH", path);
            }
            if let Some(dir) = &index_dir {
                std::env::set_var("INDEX_DIR", dir);
            }
            let config = init(true)?;

            tracing::info!("Building index from {}", config.dataset_path.display());
            let embedder = embedder_from_config(&config).await?;
            let manifest = build_index(&config, embedder, true).await?;

            println!(
                "Published build {} ({} vectors, dimension {}, model {})",
                manifest.build_id, manifest.count, manifest.dimension, manifest.embedding_model
            );
        }
        Commands::Ask {
            query,
            threshold,
            no_fallback,
            no_context,
        } => {
            if let Some(threshold) = threshold {
                std::env::set_var("SIMILARITY_THRESHOLD", threshold.to_string());
            }
            if no_fallback {
                std::env::set_var("FALLBACK_ENABLED", "false");
            }
            if no_context {
                std::env::set_var("FALLBACK_CONTEXT", "false");
            }
            let config = init(true)?;

            let orchestrator = Orchestrator::from_config(&config).await?;
            let answer = orchestrator.answer(&query).await;

            println!("{}", answer.render());
            println!("(similarity: {:.2})", answer.similarity);
        }
        Commands::Stats { index_dir } => {
            if let Some(dir) = &index_dir {
                std::env::set_var("INDEX_DIR", dir);
            }
            let config = init(false)?;

            let manifest = ArtifactStore::new(&config.index_dir).read_manifest()?;
            println!("Build:      {}", manifest.build_id);
            println!("Model:      {}", manifest.embedding_model);
            println!("Dimension:  {}", manifest.dimension);
            println!("Records:    {}", manifest.count);
            println!("Created at: {}", manifest.created_at.to_rfc3339());
        }
    }

    Ok(())
}

/// Load config with overrides applied, create directories and start logging
///
/// Only commands that embed or answer keep a log file.
fn init(log_to_file: bool) -> Result<AppConfig> {
    let config = AppConfig::from_env()?;
    config.ensure_directories()?;
    if log_to_file {
        logger::setup_logging(&config.log_dir, &config.log_level)?;
    } else {
        logger::setup_console_logging(&config.log_level)?;
    }

    tracing::info!("CallAssist starting...");
    tracing::debug!("Configuration: {:?}", config);
    Ok(config)
}
