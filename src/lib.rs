pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod render;
pub mod services;
pub mod state;
pub mod wizard;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
pub use config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use domain::MediaKind;
use render::ConsoleSink;
use state::Clients;
use wizard::{RequestWizard, WizardSettings};

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        print_help();
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        return cli::cmd_init();
    }

    config.validate()?;

    if matches!(command, Commands::Serve) {
        if !config.server.enabled {
            anyhow::bail!("The webhook server is disabled (server.enabled = false)");
        }
        let state = Arc::new(api::AppState::new(prometheus_handle));
        return api::serve(&config, state).await;
    }

    let clients = Clients::from_config(&config)?;
    let sink = Arc::new(ConsoleSink::new());
    let wizard = RequestWizard::new(clients.backends(), sink, WizardSettings::from(&config));

    match command {
        Commands::MovieAdd { query } => cli::cmd_movie_add(&wizard, &query.join(" ")).await,
        Commands::SeriesAdd { query } => cli::cmd_series_add(&wizard, &query.join(" ")).await,
        Commands::MovieStatus { query, watch } => {
            cli::cmd_status(&wizard, MediaKind::Movie, &query.join(" "), watch).await
        }
        Commands::SeriesStatus { query, watch } => {
            cli::cmd_status(&wizard, MediaKind::Series, &query.join(" "), watch).await
        }
        Commands::Check => cli::cmd_check(&clients).await,
        Commands::Serve | Commands::Init => Ok(()),
    }
}

fn print_help() {
    println!("Slavarr - movie and series requests for Radarr and Sonarr");
    println!();
    println!("Usage: slavarr <command> [args]");
    println!();
    println!("Commands:");
    println!("  serve                   Run the webhook receiver");
    println!("  movie-add <query>       Search Radarr and request a movie");
    println!("  series-add <query>      Search Sonarr and request a series");
    println!("  movie-status <query>    Show a movie's download status (--watch to follow)");
    println!("  series-status <query>   Show a series' download status (--watch to follow)");
    println!("  check                   Check connectivity to every backend");
    println!("  init                    Create default config file");
    println!();
    println!("Configuration: config.toml, then RADARR_*, SONARR_*, PLEX_*, TRANSMISSION_* env vars");
}
