use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use distrotv_bridge::config::Config;
use distrotv_bridge::feed::{build_client, FeedStore};
use distrotv_bridge::output::Playlist;
use distrotv_bridge::projector::Projector;
use distrotv_bridge::util::atomic_write;

/// Get the default config file path (~/.config/distrotv-bridge/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("distrotv-bridge")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "distrotv-bridge",
    about = "Generate an M3U playlist and XMLTV guide from the DistroTV live catalog"
)]
struct Args {
    /// Config file (defaults to ~/.config/distrotv-bridge/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output path for the M3U playlist
    #[arg(long, value_name = "FILE")]
    playlist: Option<PathBuf>,

    /// Output path for the XMLTV guide
    #[arg(long, value_name = "FILE")]
    guide: Option<PathBuf>,

    /// Public URL of the guide, written to the playlist header as url-tvg
    #[arg(long, value_name = "URL")]
    guide_url: Option<String>,

    /// Only write the playlist
    #[arg(long)]
    no_guide: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(playlist) = &self.playlist {
            config.playlist_path = playlist.clone();
        }
        if let Some(guide) = &self.guide {
            config.guide_path = guide.clone();
        }
        if let Some(url) = &self.guide_url {
            config.guide_url = Some(url.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    args.apply(&mut config);

    let client = build_client().context("Failed to build HTTP client")?;
    let store = Arc::new(FeedStore::new(client.clone(), &config.feed_url));
    let projector = Projector::new(store, client, &config.epg_url);

    write_playlist(&projector, &config).await?;

    if !args.no_guide {
        write_guide(&projector, &config).await?;
    }

    Ok(())
}

async fn write_playlist(projector: &Projector, config: &Config) -> Result<()> {
    let stations = match projector.list_channels().await {
        Ok(stations) => stations,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(());
        }
    };

    if stations.is_empty() {
        println!("No channels available, playlist not written.");
        return Ok(());
    }

    let content = Playlist::new(&stations)
        .with_guide_url(config.guide_url.as_deref())
        .render();
    atomic_write(&config.playlist_path, content.as_bytes())?;

    tracing::info!(
        channels = stations.len(),
        path = %config.playlist_path.display(),
        "Playlist written"
    );
    println!(
        "Wrote {} channels to {}",
        stations.len(),
        config.playlist_path.display()
    );
    Ok(())
}

async fn write_guide(projector: &Projector, config: &Config) -> Result<()> {
    let guide = match projector.build_epg().await {
        Ok(guide) => guide,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(());
        }
    };

    if guide.is_empty() {
        println!("No guide data available, guide not written.");
        return Ok(());
    }

    let xml = guide.to_xml().context("Failed to render XMLTV guide")?;
    atomic_write(&config.guide_path, xml.as_bytes())?;

    tracing::info!(
        channels = guide.channels.len(),
        programmes = guide.programmes.len(),
        path = %config.guide_path.display(),
        "Guide written"
    );
    println!(
        "Wrote guide for {} channels ({} programmes) to {}",
        guide.channels.len(),
        guide.programmes.len(),
        config.guide_path.display()
    );
    Ok(())
}
