//! Docket command-line interface.
//!
//! `docket serve` wires the orchestrator together (in-memory store, remote
//! extraction client, default validator, webhook notifier) and runs the API
//! server. `docket fingerprint` prints content fingerprints for local files,
//! which is handy for checking what the dedup layer will consider identical.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docket::batch::BatchProcessor;
use docket::config::DocketConfig;
use docket::extract::{DefaultUploadValidator, RemoteExtractor};
use docket::notify::Notifier;
use docket::store::MemoryStore;

#[derive(Parser)]
#[command(name = "docket", version, about = "Content-deduplicating batch extraction orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the batch submission API server
    Serve {
        /// IP address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, default_value_t = 8100)]
        port: u16,

        /// Path to a docket.toml config file (otherwise discovered in the
        /// current directory and its ancestors)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the content fingerprint of one or more files
    Fingerprint {
        /// Files to fingerprint
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Emit one JSON object per file instead of plain text
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DocketConfig> {
    match path {
        Some(path) => {
            let config =
                DocketConfig::from_toml_file(path).with_context(|| format!("loading {}", path.display()))?;
            tracing::info!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => match DocketConfig::discover()? {
            Some(config) => {
                tracing::info!("Loaded config from discovered docket.toml");
                Ok(config)
            }
            None => {
                tracing::info!("No config file found, using defaults");
                Ok(DocketConfig::default())
            }
        },
    }
}

async fn serve(host: String, port: u16, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path.as_ref())?;

    let extractor = RemoteExtractor::new(config.extractor.base_url.clone(), config.extractor_timeout())
        .context("building extraction client")?;
    let notifier = Notifier::new(config.notify_timeout(), config.notifications.queue_capacity)
        .context("building notifier")?;
    let validator = DefaultUploadValidator::new(config.max_file_bytes);

    let processor = Arc::new(BatchProcessor::new(
        Arc::new(MemoryStore::new()),
        Arc::new(extractor),
        Arc::new(validator),
        Arc::new(notifier),
        config,
    ));

    docket::api::serve(&host, port, processor).await?;
    Ok(())
}

fn fingerprint_files(files: &[PathBuf], json: bool) -> anyhow::Result<()> {
    for path in files {
        let content = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let fp = docket::fingerprint::fingerprint(&content);
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "file": path.display().to_string(),
                    "fingerprint": fp.as_str(),
                    "bytes": content.len(),
                })
            );
        } else {
            println!("{fp}  {}", path.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port, config } => serve(host, port, config).await,
        Command::Fingerprint { files, json } => fingerprint_files(&files, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve_defaults() {
        let cli = Cli::try_parse_from(["docket", "serve"]).unwrap();
        match cli.command {
            Command::Serve { host, port, config } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8100);
                assert!(config.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_cli_requires_fingerprint_operand() {
        assert!(Cli::try_parse_from(["docket", "fingerprint"]).is_err());
    }

    #[test]
    fn test_fingerprint_files_prints_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "hello").unwrap();
        fingerprint_files(&[path.clone()], false).unwrap();
        fingerprint_files(&[path], true).unwrap();
    }

    #[test]
    fn test_load_config_missing_explicit_path_errors() {
        let missing = PathBuf::from("/nonexistent/docket.toml");
        assert!(load_config(Some(&missing)).is_err());
    }
}
