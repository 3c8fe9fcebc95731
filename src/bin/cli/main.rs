use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use storage_gateway::client::{DEFAULT_BASE_URL, GatewayClient};

#[derive(Parser, Debug)]
#[command(name = "storage-gateway-cli")]
#[command(about = "CLI for interacting with the storage gateway", long_about = None)]
struct Cli {
    /// Gateway URL
    #[arg(short, long, env = "GATEWAY_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bucket operations
    Bucket {
        #[command(subcommand)]
        command: BucketCommands,
    },

    /// Upload a file
    Put {
        /// Bucket name
        bucket: String,
        /// File path to upload
        file: PathBuf,
        /// Object key; defaults to the file name
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Download an object
    Get {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Output file path; defaults to the last key segment
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List objects in a bucket
    List {
        /// Bucket name
        bucket: String,
    },

    /// Delete an object
    Delete {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },

    /// Generate a presigned download URL
    Presign {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Lifetime in seconds
        #[arg(short, long)]
        expires_in: Option<u64>,
    },

    /// Show aggregate storage statistics
    Stats,

    /// Show gateway health
    Health,
}

#[derive(Subcommand, Debug)]
enum BucketCommands {
    /// List buckets
    List,

    /// Create a bucket
    Create {
        /// Bucket name
        bucket: String,
    },

    /// Delete an empty bucket
    Delete {
        /// Bucket name
        bucket: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn default_output(key: &str) -> PathBuf {
    PathBuf::from(key.rsplit('/').next().unwrap_or(key))
}

async fn run(client: &GatewayClient, command: Commands) -> Result<()> {
    match command {
        Commands::Bucket { command } => match command {
            BucketCommands::List => print_json(&client.list_buckets().await?),
            BucketCommands::Create { bucket } => print_json(&client.create_bucket(&bucket).await?),
            BucketCommands::Delete { bucket } => print_json(&client.delete_bucket(&bucket).await?),
        },
        Commands::Put { bucket, file, key } => {
            let receipt = client
                .upload_file(&bucket, &file, key.as_deref())
                .await
                .with_context(|| format!("Failed to upload {}", file.display()))?;
            print_json(&receipt)
        }
        Commands::Get {
            bucket,
            key,
            output,
        } => {
            let output = output.unwrap_or_else(|| default_output(&key));
            let written = client
                .download_to(&bucket, &key, &output)
                .await
                .with_context(|| format!("Failed to download {}/{}", bucket, key))?;
            println!("Wrote {} bytes to {}", written, output.display());
            Ok(())
        }
        Commands::List { bucket } => print_json(&client.list_objects(&bucket).await?),
        Commands::Delete { bucket, key } => print_json(&client.delete_object(&bucket, &key).await?),
        Commands::Presign {
            bucket,
            key,
            expires_in,
        } => print_json(&client.presigned_url(&bucket, &key, expires_in).await?),
        Commands::Stats => print_json(&client.stats().await?),
        Commands::Health => print_json(&client.health().await?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = GatewayClient::new(cli.url);

    run(&client, cli.command).await
}
