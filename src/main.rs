use anyhow::Context;
use bucketmirror::{mirror_bucket, HttpStore, MirrorConfig, MirrorError, ObjectStore, S3Store};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bucketmirror")]
#[command(about = "Mirror an S3-compatible bucket onto the local filesystem", long_about = None)]
#[command(version)]
struct Args {
    /// Bucket to mirror
    #[arg(short, long, env = "S3_BUCKET")]
    bucket: String,

    /// Output directory (relative paths resolve against the working directory)
    #[arg(short, long, env = "OUTPUT_DIRECTORY")]
    output: PathBuf,

    /// Custom S3-compatible endpoint (MinIO, R2, ...)
    #[arg(long, env = "S3_ENDPOINT")]
    endpoint: Option<String>,

    /// Access the endpoint without credentials over plain HTTP(S)
    #[arg(long, env = "S3_ANONYMOUS")]
    anonymous: bool,

    /// Maximum concurrent fetches and writes
    #[arg(long, env = "MAX_IN_FLIGHT", default_value_t = 16)]
    max_in_flight: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

async fn build_store(args: &Args) -> Result<Arc<dyn ObjectStore>, MirrorError> {
    if args.anonymous {
        let endpoint = args.endpoint.as_deref().ok_or_else(|| {
            MirrorError::Config("--anonymous requires --endpoint (S3_ENDPOINT)".to_string())
        })?;
        info!("Using anonymous access to {}", endpoint);
        return Ok(Arc::new(HttpStore::new(endpoint)));
    }
    Ok(Arc::new(S3Store::from_env(args.endpoint.as_deref()).await))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error.
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bucketmirror={}", log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let output_root = if args.output.is_absolute() {
        args.output.clone()
    } else {
        std::env::current_dir()
            .context("Failed to resolve the working directory")?
            .join(&args.output)
    };

    info!("🪣 bucketmirror");
    info!("Bucket: {}", args.bucket);
    info!("Output directory: {}", output_root.display());

    let config = MirrorConfig {
        bucket: args.bucket.clone(),
        output_root,
        max_in_flight: args.max_in_flight,
    };

    let result = async {
        let store = build_store(&args).await?;
        mirror_bucket(&config, store).await
    }
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}
