//! Builds the collaborator set from configuration.

use std::sync::Arc;
use tracing::info;

use crate::clients::build_http_client;
use crate::clients::plex::PlexClient;
use crate::clients::radarr::RadarrClient;
use crate::clients::sonarr::SonarrClient;
use crate::clients::transmission::{TransmissionClient, TransmissionConfig};
use crate::config::Config;
use crate::services::Backends;

/// The concrete clients behind [`Backends`], kept for health checks.
#[derive(Debug, Clone)]
pub struct Clients {
    pub radarr: Arc<RadarrClient>,

    pub sonarr: Option<Arc<SonarrClient>>,

    pub plex: Option<Arc<PlexClient>>,

    pub transmission: Option<Arc<TransmissionClient>>,
}

impl Clients {
    /// One shared HTTP client for every service, so connections are pooled.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = build_http_client(config.general.request_timeout_seconds)?;

        let radarr = Arc::new(RadarrClient::new(
            http.clone(),
            &config.movies.url,
            &config.movies.api_key,
        ));

        let sonarr = config.series.enabled.then(|| {
            Arc::new(SonarrClient::new(
                http.clone(),
                &config.series.url,
                &config.series.api_key,
            ))
        });

        let plex = config.library.enabled.then(|| {
            Arc::new(PlexClient::new(
                http.clone(),
                &config.library.url,
                &config.library.token,
                config.library.movies_section_id,
                config.library.shows_section_id,
            ))
        });

        let transmission = config.transfer.enabled.then(|| {
            Arc::new(TransmissionClient::new(
                http.clone(),
                TransmissionConfig {
                    url: config.transfer.url.clone(),
                    username: config.transfer.username.clone(),
                    password: config.transfer.password.clone(),
                },
            ))
        });

        info!(
            series = sonarr.is_some(),
            library = plex.is_some(),
            transfer = transmission.is_some(),
            "Backend clients initialized"
        );

        Ok(Self {
            radarr,
            sonarr,
            plex,
            transmission,
        })
    }

    #[must_use]
    pub fn backends(&self) -> Backends {
        let mut backends = Backends::new(self.radarr.clone());
        if let Some(sonarr) = &self.sonarr {
            backends = backends.with_series(sonarr.clone());
        }
        if let Some(plex) = &self.plex {
            backends = backends.with_library(plex.clone());
        }
        if let Some(transmission) = &self.transmission {
            backends = backends.with_transfer(transmission.clone());
        }
        backends
    }
}
