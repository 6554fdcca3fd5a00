use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use vodcat::{build_composer, log_directives, Config, ListingKind, PageRoute};
use vodcat_core::{SystemClock, TokenSigner};

#[derive(Parser)]
#[command(name = "vodcat")]
#[command(version, about = "Catalog aggregation, playback signing and structured data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to vodcat.toml, config/vodcat.toml, /etc/vodcat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve rendered pages over HTTP
    #[cfg(feature = "api")]
    Serve {
        /// Port to listen on (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Render a video page
    Video {
        slug: String,
    },
    /// Render a listing page
    List {
        /// category, actor, tag, director, studio or search
        kind: String,
        slug: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Render search results
    Search {
        term: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Render the home page
    Home,
    /// Sign a playback path with the site's current signing parameters
    Sign {
        path: String,
    },
    /// Print the effective configuration
    Config {
        /// Write it to this file instead
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; the configured level replaces the provisional one once loaded
    let from_env = EnvFilter::try_from_default_env().ok();
    let pinned = from_env.is_some() || cli.verbose;
    let provisional = from_env.unwrap_or_else(|| {
        EnvFilter::new(log_directives(if cli.verbose { "debug" } else { "info" }))
    });
    let (filter, filter_handle) = reload::Layer::new(provisional);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.config.as_ref())?;
    if !pinned {
        filter_handle.reload(EnvFilter::try_new(config.logging.directives())?)?;
    }

    let composer = Arc::new(build_composer(&config)?);

    match cli.command {
        #[cfg(feature = "api")]
        Commands::Serve { port } => {
            info!("🚀 vodcat starting...");
            info!("{}", config.summary());
            let port = port.unwrap_or(config.server.port);
            vodcat::api::ApiServer::new(composer, config.server.host.clone(), port)
                .start()
                .await?;
        }

        Commands::Video { slug } => {
            let payload = composer.video_page(&slug).await?;
            print_json(&payload)?;
        }

        Commands::List { kind, slug, page } => {
            let kind: ListingKind = kind.parse()?;
            let payload = composer
                .listing_page(kind, &PageRoute::new(slug, page))
                .await?;
            print_json(&payload)?;
        }

        Commands::Search { term, page } => {
            let payload = composer
                .listing_page(ListingKind::Search, &PageRoute::new(term, page))
                .await?;
            print_json(&payload)?;
        }

        Commands::Home => {
            let payload = composer.home_page().await?;
            print_json(&payload)?;
        }

        Commands::Sign { path } => {
            let site = composer.catalog().website_config().await?;
            let signer =
                TokenSigner::from_website(&site)?.with_scheme(config.signing.scheme);
            let signed = signer.sign(&path, &SystemClock)?;
            println!("{}{}", site.video_url, signed);
        }

        Commands::Config { output } => match output {
            Some(path) => config.save(path)?,
            None => print!("{}", toml::to_string_pretty(&config)?),
        },
    }

    Ok(())
}
