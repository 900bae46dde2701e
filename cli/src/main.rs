//! Udyam CLI
//!
//! Command-line tools for the Udyam registration form.
//!
//! # Usage
//!
//! ```bash
//! udyam scrape --snapshot step1.html --snapshot step2.html
//! udyam schema --format json
//! udyam validate -f record.json
//! udyam fill
//! udyam fill --answers answers.yaml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod client;
mod commands;
mod config;
mod extract;
mod output;

#[derive(Parser)]
#[command(name = "udyam")]
#[command(version)]
#[command(about = "Udyam registration form command line", long_about = None)]
struct Cli {
    /// Registration API endpoint URL
    #[arg(long, env = "UDYAM_API_URL")]
    api_url: Option<String>,

    /// Postal PIN lookup service URL
    #[arg(long, env = "UDYAM_PIN_URL")]
    pin_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the Schema Document from the registration page
    Scrape {
        /// Page to fetch when no snapshots are given
        #[arg(long, default_value = commands::scrape::DEFAULT_SOURCE)]
        url: String,
        /// Saved HTML of step 1, then step 2
        #[arg(long = "snapshot")]
        snapshots: Vec<PathBuf>,
        /// Directory receiving schema.json
        #[arg(long, env = "OUT_DIR", default_value = "public")]
        out_dir: PathBuf,
    },
    /// Show the Schema Document served by the API
    Schema {
        /// Local schema file used when the API is unreachable
        #[arg(long)]
        schema_file: Option<PathBuf>,
    },
    /// Check a JSON record against the server rules
    Validate {
        /// JSON object of field values
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Fill in and submit the form step by step
    Fill {
        /// Non-interactive answers (YAML or JSON mapping of field name to value)
        #[arg(long)]
        answers: Option<PathBuf>,
        /// Local schema file used when the API is unreachable
        #[arg(long)]
        schema_file: Option<PathBuf>,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = cli.profile.as_deref();
    let command = match cli.command {
        Commands::Config { action } => return commands::config::handle(action, profile).await,
        other => other,
    };

    let config = config::Config::load(profile)?;
    let api_url = cli
        .api_url
        .or(config.api_url)
        .unwrap_or_else(|| client::DEFAULT_API_URL.to_string());
    let pin_url = cli
        .pin_url
        .or(config.pin_lookup_url)
        .unwrap_or_else(|| client::DEFAULT_PIN_URL.to_string());
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(output::OutputFormat::from_name))
        .unwrap_or(output::OutputFormat::Table);

    let client = client::ApiClient::new(&api_url)?;
    match command {
        Commands::Scrape { url, snapshots, out_dir } => commands::scrape::handle(&url, &snapshots, &out_dir).await,
        Commands::Schema { schema_file } => commands::schema::handle(&client, schema_file.as_deref(), format).await,
        Commands::Validate { file } => commands::validate::handle(&client, &file, format).await,
        Commands::Fill { answers, schema_file } => {
            commands::fill::handle(&client, &pin_url, answers.as_deref(), schema_file.as_deref()).await
        }
        Commands::Config { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
