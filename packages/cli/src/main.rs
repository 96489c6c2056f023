//! Command-line client for the dataset registry.

mod client;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use common::ContentHash;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::client::{ApiClient, Source};

#[derive(Parser, Debug)]
#[command(name = "registry", version, about = "Manage datasets on a registry server")]
struct Cli {
    /// Base URL of the registry server.
    #[arg(long, env = "REGISTRY_URL", default_value = "http://localhost:8005", global = true)]
    server: String,

    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every dataset with its state and verified host count.
    List {
        /// Print the raw JSON response.
        #[arg(long)]
        json: bool,
    },

    /// Upload a file as a new dataset.
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },

    /// Change a dataset's title and/or description.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a dataset and its local copy.
    Delete { id: String },

    /// Register a copy you host. The registry fetches and fingerprints it.
    Contribute {
        /// Dataset id.
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Public link to your copy.
        #[arg(long)]
        link: String,
        /// Compare a local copy against the dataset's fingerprint first.
        #[arg(long)]
        check: Option<PathBuf>,
    },

    /// Show where downloads of a dataset are currently served from.
    Source { id: String },

    /// Print the SHA-256 fingerprint of a local file.
    Hash { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let server = cli.server;
    let api = || {
        tracing::debug!(%server, "Using registry");
        ApiClient::new(&server)
    };

    match cli.command {
        Commands::Hash { file } => println!("{}", fingerprint(&file)?),
        Commands::List { json } => {
            let datasets = api()?.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&datasets)?);
            } else {
                for dataset in &datasets {
                    println!("{}", summary_line(dataset));
                }
            }
        }
        Commands::Upload {
            file,
            title,
            description,
        } => {
            let dataset = api()?.upload(&title, &description, &file)?;
            println!("{}", dataset["id"].as_str().unwrap_or_default());
        }
        Commands::Edit {
            id,
            title,
            description,
        } => {
            if title.is_none() && description.is_none() {
                anyhow::bail!("nothing to change: pass --title and/or --description");
            }
            println!("{}", api()?.edit(&id, title.as_deref(), description.as_deref())?);
        }
        Commands::Delete { id } => println!("{}", api()?.delete(&id)?),
        Commands::Contribute {
            id,
            name,
            email,
            link,
            check,
        } => {
            let api = api()?;
            if let Some(local) = check {
                let expected = api
                    .list()?
                    .into_iter()
                    .find(|d| d["id"] == id.as_str())
                    .and_then(|d| d["contentFingerprint"].as_str().map(str::to_string))
                    .with_context(|| format!("Dataset {id} not found"))?;
                let actual = fingerprint(&local)?;
                if actual.to_hex() != expected {
                    anyhow::bail!("local copy does not match: expected {expected}, got {actual}");
                }
            }
            println!("{}", api.contribute(&id, &name, &email, &link)?);
        }
        Commands::Source { id } => match api()?.source(&id)? {
            Source::Local => println!("local"),
            Source::Mirror(link) => println!("{link}"),
        },
    }
    Ok(())
}

fn fingerprint(path: &Path) -> anyhow::Result<ContentHash> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ContentHash::compute(&bytes))
}

/// One line per dataset: id, state, host count and title.
fn summary_line(dataset: &Value) -> String {
    format!(
        "{:<40} {:<12} {:>3}  {}",
        dataset["id"].as_str().unwrap_or_default(),
        dataset["state"].as_str().unwrap_or_default(),
        dataset["verifiedHostCount"].as_u64().unwrap_or_default(),
        dataset["title"].as_str().unwrap_or_default(),
    )
}
