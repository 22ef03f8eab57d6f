use clap::{Parser, Subcommand};
use chest_analyzer::{
    cache::InMemoryCache,
    config::{HttpConfigSource, Settings, TierConfigStore},
    models::UserProfile,
    ChestAnalyzer,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "chest-analyzer")]
#[clap(about = "Score user chest potential and recommend reward tiers", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single user profile from a JSON file
    Analyze {
        /// Path to a UserProfile JSON file
        #[clap(short, long)]
        profile: PathBuf,
    },

    /// Analyze a batch of profiles from a JSON array file
    Batch {
        /// Path to a JSON file holding an array of UserProfile records
        #[clap(short, long)]
        profiles: PathBuf,

        /// Override the worker pool size
        #[clap(short, long)]
        concurrency: Option<usize>,
    },

    /// Print the effective tier configuration snapshot
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::new().unwrap_or_else(|_| {
        info!("Using default settings");
        Settings::default()
    });

    if let Commands::Batch {
        concurrency: Some(concurrency),
        ..
    } = &cli.command
    {
        settings.batch.max_concurrency = *concurrency;
    }

    if let Err(e) = settings.validate() {
        error!("Invalid settings: {}", e);
        return Err(anyhow::anyhow!(e));
    }

    let source = Arc::new(HttpConfigSource::new(
        settings.config_source.base_url.clone(),
        Duration::from_secs(settings.config_source.timeout_seconds),
    )?);
    let backend = Arc::new(InMemoryCache::new());
    let store = Arc::new(TierConfigStore::new(
        source,
        Some(backend.clone() as Arc<dyn chest_analyzer::CacheBackend>),
        settings.refresh_ttl(),
        settings.config_ttl(),
    ));

    match cli.command {
        Commands::Analyze { profile } => {
            let raw = std::fs::read_to_string(&profile)?;
            let profile: UserProfile = serde_json::from_str(&raw)?;

            let analyzer = ChestAnalyzer::new(&settings, store, backend);
            match analyzer.analyze_user(&profile).await {
                Ok(analysis) => println!("{}", serde_json::to_string_pretty(&analysis)?),
                Err(e) => {
                    error!("Analysis failed: {}", e);
                    return Err(anyhow::anyhow!(e));
                }
            }
        }

        Commands::Batch { profiles, .. } => {
            let raw = std::fs::read_to_string(&profiles)?;
            let profiles: Vec<UserProfile> = serde_json::from_str(&raw)?;

            let analyzer = ChestAnalyzer::new(&settings, store, backend);
            let outcome = analyzer.analyze_batch(&profiles).await;

            println!("{}", serde_json::to_string_pretty(&outcome)?);
            println!("{}", serde_json::to_string_pretty(&analyzer.metrics())?);
        }

        Commands::Config => {
            let snapshot = store.current().await;
            println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
        }
    }

    Ok(())
}
