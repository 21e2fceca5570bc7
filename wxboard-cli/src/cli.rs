use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use wxboard_core::{Config, ProviderId, WeatherBoard, top_cities};

use crate::render;

/// Suggestions requested per search, as many as the dashboard lists.
const SUGGESTION_LIMIT: usize = 8;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxboard", version, about = "Weather dashboard in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Suggest cities matching a partial name.
    Search {
        query: String,

        /// Maximum number of suggestions to request.
        #[arg(long, default_value_t = SUGGESTION_LIMIT)]
        limit: usize,
    },

    /// List the quick-access cities.
    Top,

    /// Show current weather, tomorrow and the past week for a city.
    Show {
        /// Search token, e.g. "Paris,France".
        city: String,

        /// Also keep the current conditions in this week's snapshot history.
        #[arg(long)]
        save: bool,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List recent searches, newest first.
    Recent,

    /// List this week's saved snapshots for a city.
    Snapshots { city: String },

    /// Drop saved snapshots from before this week.
    Purge,

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather".
        provider: String,
    },
}

impl Cli {
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider)?,
            Command::Top => print!("{}", render::Candidates(&top_cities())),
            Command::Search { query, limit } => {
                let board = WeatherBoard::from_config(&config)?;
                let candidates = board.resolver().search(&query, limit).await;
                if candidates.is_empty() {
                    println!("No cities found for \"{query}\".");
                } else {
                    print!("{}", render::Candidates(&candidates));
                }
            }
            Command::Show { city, save, json } => {
                let board = WeatherBoard::from_config(&config)?;
                let report = board.report(&city).await?;

                if save {
                    board.save_snapshot(&city, &report.current)?;
                    tracing::debug!(city = %city, "snapshot saved");
                }

                if json {
                    let value = render::report_json(&report);
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&value).context("Failed to serialize report")?
                    );
                } else {
                    print!("{}", render::Report(&report));
                }
            }
            Command::Recent => {
                let board = WeatherBoard::from_config(&config)?;
                let entries = board.store().search_entries();
                if entries.is_empty() {
                    println!("No recent searches.");
                }
                for entry in entries {
                    println!("{}  {}", entry.searched_at.format("%Y-%m-%d %H:%M"), entry.city);
                }
            }
            Command::Snapshots { city } => {
                let board = WeatherBoard::from_config(&config)?;
                let snapshots = board.store().weather_history(&city);
                if snapshots.is_empty() {
                    println!("No snapshots for {city} this week.");
                }
                for snapshot in &snapshots {
                    println!("{}", render::SnapshotLine(snapshot));
                }
            }
            Command::Purge => {
                let board = WeatherBoard::from_config(&config)?;
                board.store().purge_old_data()?;
                println!("Removed snapshots from before this week.");
            }
        }

        Ok(())
    }
}

/// Prompt for an API key and store it in the config file.
///
/// Starts from the file on disk so environment overrides are not persisted.
fn configure(provider: &str) -> anyhow::Result<()> {
    let provider_id = ProviderId::try_from(provider)?;
    if !provider_id.requires_api_key() {
        println!("{} needs no configuration.", provider_id.label());
        return Ok(());
    }

    let mut config = Config::load()?;
    if config.is_provider_configured(provider_id) {
        println!("Replacing the existing {} key.", provider_id.label());
    }

    let api_key = Password::new(&format!("{} API key:", provider_id.label()))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(provider_id, api_key.trim().to_string());
    config.save()?;

    println!(
        "Saved {} key to {}",
        provider_id.label(),
        Config::config_file_path()?.display()
    );
    Ok(())
}
