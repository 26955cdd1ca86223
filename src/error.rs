//! Error taxonomy of the request wizard.

use thiserror::Error;

/// Errors surfaced by the core services.
///
/// Each variant maps to a fixed piece of user-facing text through
/// [`RequestError::user_message`]; details only go to the log.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Selection session expired or already used")]
    SessionExpired,

    #[error("{service} error: {message}")]
    Backend { service: String, message: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl From<anyhow::Error> for RequestError {
    fn from(err: anyhow::Error) -> Self {
        Self::Backend {
            service: "backend".to_string(),
            message: format!("{err:#}"),
        }
    }
}

impl RequestError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn movies(err: impl std::fmt::Display) -> Self {
        Self::backend("Radarr", err)
    }

    pub fn series(err: impl std::fmt::Display) -> Self {
        Self::backend("Sonarr", err)
    }

    pub fn library(err: impl std::fmt::Display) -> Self {
        Self::backend("Plex", err)
    }

    pub fn transfer(err: impl std::fmt::Display) -> Self {
        Self::backend("Transmission", err)
    }

    fn backend(service: &str, err: impl std::fmt::Display) -> Self {
        Self::Backend {
            service: service.to_string(),
            message: format!("{err:#}"),
        }
    }

    /// Whether the wizard that produced this error can continue.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Text shown to the user in the chat transport.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::Validation(msg) => msg.clone(),
            Self::SessionExpired => {
                "This request has expired or was already submitted. Start a new search."
                    .to_string()
            }
            Self::Backend { service, .. } => {
                format!("❌ Request failed. Check {service} settings.")
            }
            Self::Render(_) => "Could not update the status message.".to_string(),
            Self::NotConfigured(what) => format!("{what} is not configured."),
        }
    }
}

pub type RequestResult<T> = Result<T, RequestError>;
