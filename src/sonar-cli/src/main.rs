use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deezer_provider::{DeezerCatalog, DeezerConfig};
use sonar_audio::{event_channel, SimulatedAudio};
use sonar_core::{init_logging, AppDirs, CatalogClient, Config, Track, ValidationError};
use sonar_ui::projector::format_duration;
use sonar_ui::{run_ui, Theme, UiContext};

#[derive(Debug, Parser)]
#[command(
    name = "sonar",
    version,
    about = "Search a music catalog and listen to track previews"
)]
struct Cli {
    /// Catalog base URL override (takes precedence over config)
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one search and print the results
    Search(SearchCommand),
    /// Show the config file location and the effective settings
    Config,
}

#[derive(Debug, Parser, Clone)]
struct SearchCommand {
    /// Search terms
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
    /// Print the tracks as JSON
    #[arg(long)]
    json: bool,
}

impl SearchCommand {
    fn text(&self) -> String {
        self.query.join(" ")
    }
}

fn apply_overrides(config: &mut Config, base_url: Option<&str>) -> Result<(), ValidationError> {
    if let Some(url) = base_url {
        config.catalog.base_url = url.trim().to_string();
    }
    config.validate()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let mut config = Config::load_or_default(&dirs)?;
    apply_overrides(&mut config, cli.base_url.as_deref())?;

    // The alternate screen owns the terminal; keep log lines off it.
    if cli.command.is_none() {
        config.logging.console = false;
    }
    let _logging = init_logging(&config.logging, &dirs)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match cli.command {
        Some(Command::Config) => print_config(&config, &dirs)?,
        Some(Command::Search(search)) => runtime.block_on(run_search(&config, &search))?,
        None => {
            tracing::info!(
                "Launching Sonar with catalog {} (config dir: {})",
                config.catalog.base_url,
                dirs.config_dir().display()
            );
            runtime.block_on(run_interactive(&config))?;
        }
    }

    Ok(())
}

fn catalog(config: &Config) -> Result<DeezerCatalog> {
    DeezerCatalog::new(DeezerConfig::from(&config.catalog)).context("failed to build catalog client")
}

async fn run_interactive(config: &Config) -> Result<()> {
    let catalog = catalog(config)?;
    let (audio_tx, audio_rx) = event_channel();
    let audio = SimulatedAudio::new(
        audio_tx,
        Duration::from_secs(config.playback.preview_seconds),
    );

    let context = UiContext {
        catalog: Arc::new(catalog),
        audio: Arc::new(audio),
        audio_events: audio_rx,
        debounce: config.search.debounce(),
        theme: Theme::from_config(config.ui.theme.as_deref()),
    };
    run_ui(context).await?;
    Ok(())
}

async fn run_search(config: &Config, command: &SearchCommand) -> Result<()> {
    let query = command.text();
    let catalog = catalog(config)?;
    tracing::info!(catalog = catalog.id(), query = %query, "one-shot search");

    let tracks = catalog
        .search(&query)
        .await
        .with_context(|| format!("search for \"{query}\" failed"))?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&tracks)?);
        return Ok(());
    }
    if tracks.is_empty() {
        println!("No tracks found for \"{query}\".");
        return Ok(());
    }
    for (index, track) in tracks.iter().enumerate() {
        println!("{}", describe_track(index + 1, track));
    }
    Ok(())
}

fn describe_track(position: usize, track: &Track) -> String {
    let mut line = format!(
        "{position:>2}. {} - {} ({}) [{}]",
        track.title,
        track.artist_name,
        track.album_title,
        format_duration(track.duration_seconds)
    );
    if !track.has_preview() {
        line.push_str(" no preview");
    }
    line
}

fn print_config(config: &Config, dirs: &AppDirs) -> Result<()> {
    let path = Config::config_path(dirs);
    let marker = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("Config file: {}{}", path.display(), marker);
    println!("Log dir: {}", dirs.log_dir().display());
    println!();
    print!(
        "{}",
        toml::to_string_pretty(config).context("failed to render config")?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonar_core::TrackId;

    fn track(preview: Option<&str>) -> Track {
        Track {
            id: TrackId(3135556),
            title: "Harder, Better, Faster, Stronger".into(),
            artist_name: "Daft Punk".into(),
            album_title: "Discovery".into(),
            cover_url: None,
            duration_seconds: 224,
            preview_url: preview.map(str::to_string),
        }
    }

    #[test]
    fn search_joins_query_words() {
        let cli = Cli::parse_from(["sonar", "search", "daft", "punk"]);
        match cli.command {
            Some(Command::Search(search)) => {
                assert_eq!(search.text(), "daft punk");
                assert!(!search.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn search_requires_a_query() {
        assert!(Cli::try_parse_from(["sonar", "search"]).is_err());
    }

    #[test]
    fn base_url_is_global() {
        let cli = Cli::parse_from(["sonar", "config", "--base-url", "http://localhost:8080"]);
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:8080"));
        assert!(matches!(cli.command, Some(Command::Config)));

        let cli = Cli::parse_from(["sonar"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn base_url_override_is_validated() {
        let mut config = Config::default();
        apply_overrides(&mut config, Some(" http://127.0.0.1:9000 ")).expect("valid override");
        assert_eq!(config.catalog.base_url, "http://127.0.0.1:9000");

        let err = apply_overrides(&mut config, Some("ftp://catalog")).expect_err("invalid scheme");
        assert!(matches!(err, ValidationError::InvalidBaseUrl(_)));
    }

    #[test]
    fn no_override_keeps_config() {
        let mut config = Config::default();
        apply_overrides(&mut config, None).expect("defaults are valid");
        assert_eq!(
            config.catalog.base_url,
            sonar_core::DEFAULT_CATALOG_BASE_URL
        );
    }

    #[test]
    fn describes_tracks() {
        assert_eq!(
            describe_track(1, &track(Some("https://cdn/1.mp3"))),
            " 1. Harder, Better, Faster, Stronger - Daft Punk (Discovery) [3:44]"
        );
        assert!(describe_track(12, &track(None)).ends_with("[3:44] no preview"));
    }
}
