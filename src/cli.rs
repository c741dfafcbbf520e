//! Command-line front end. Prints results as pretty JSON on stdout.

use crate::config::{self, Config, LlmProvider};
use crate::logging;
use crate::media::{MediaItem, MediaType};
use crate::service::MediaScout;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mediascout")]
#[command(version, about = "Search-augmented AI lookup for books, films, series and more", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/mediascout/config.toml)
    #[arg(long, env = "MEDIASCOUT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override the chat endpoint for this run
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override the model for this run
    #[arg(short = 'm', long, global = true)]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for media works
    Search {
        /// Free-text query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Restrict results to one type (Book, Movie, "TV Series", Comic, "Short Drama", Music, Other)
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,
    },
    /// Recommend currently trending titles
    Trending,
    /// Check catalog items (a JSON array of items) for new releases
    Updates {
        /// Path to the items file
        items: PathBuf,
    },
    /// Switch the language-model provider and save the config
    Provider {
        /// moonshot, openai, deepseek, qwen, google, mistral or custom
        name: String,
    },
    /// Print the config file location
    ConfigPath,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };
    let config = config::load_or_create_config_at(&path)?;
    let _log_guard = logging::init(&config.logging)?;

    let mut runtime = config.clone();
    runtime.llm = runtime.llm.with_overrides(cli.base_url.clone(), cli.model.clone());

    let scout = MediaScout::new();

    match cli.command {
        Commands::Search { query, media_type } => {
            let type_filter = media_type
                .as_deref()
                .map(|label| {
                    MediaType::parse(label).ok_or_else(|| anyhow!("Unknown media type: {label}"))
                })
                .transpose()?;
            let items = scout.search(&runtime, &query.join(" "), type_filter).await;
            print_json(&items)?;
        }
        Commands::Trending => {
            print_json(&scout.trending(&runtime).await)?;
        }
        Commands::Updates { items } => {
            let content = std::fs::read_to_string(&items)
                .with_context(|| format!("Failed to read items file: {}", items.display()))?;
            let items: Vec<MediaItem> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse items file: {}", items.display()))?;
            print_json(&scout.check_updates(&runtime, &items).await)?;
        }
        Commands::Provider { name } => {
            let provider = LlmProvider::from_name(&name)
                .ok_or_else(|| anyhow!("Unknown provider: {name}"))?;
            let mut config: Config = config;
            config.llm.select_provider(provider);
            config::save_config_at(&config, &path)?;
            println!(
                "Provider set to {:?} ({} / {})",
                provider, config.llm.base_url, config.llm.model
            );
        }
        Commands::ConfigPath => {
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
