//! CLI module - the interactive terminal front-end.
//!
//! Argument parsing uses clap; the add commands then drive the request
//! wizard over stdin, one numbered prompt at a time.

mod commands;

use clap::{Parser, Subcommand};

/// Slavarr - movie and series requests for Radarr and Sonarr
#[derive(Parser)]
#[command(name = "slavarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the webhook receiver
    #[command(alias = "-d", alias = "--daemon")]
    Serve,

    /// Search Radarr and request a movie
    #[command(alias = "movie")]
    MovieAdd {
        /// Movie title to search
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Search Sonarr and request a series or some of its seasons
    #[command(alias = "series")]
    SeriesAdd {
        /// Series title to search
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show the status of a movie in Radarr (and Transmission if downloading)
    MovieStatus {
        /// Movie title to check
        #[arg(required = true)]
        query: Vec<String>,
        /// Keep the status updated until it finishes
        #[arg(long)]
        watch: bool,
    },

    /// Show the status of a series in Sonarr (and Transmission if downloading)
    SeriesStatus {
        /// Series title to check
        #[arg(required = true)]
        query: Vec<String>,
        /// Keep the status updated until it finishes
        #[arg(long)]
        watch: bool,
    },

    /// Check connectivity to every configured backend
    #[command(alias = "-c", alias = "--check")]
    Check,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_query() {
        let cli = Cli::try_parse_from(["slavarr", "movie-add", "The", "Matrix"]).unwrap();
        match cli.command {
            Some(Commands::MovieAdd { query }) => assert_eq!(query.join(" "), "The Matrix"),
            _ => panic!("expected movie-add"),
        }
    }

    #[test]
    fn test_parse_status_watch() {
        let cli =
            Cli::try_parse_from(["slavarr", "series-status", "--watch", "Severance"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::SeriesStatus { watch: true, .. })
        ));
    }

    #[test]
    fn test_query_is_required() {
        assert!(Cli::try_parse_from(["slavarr", "series-add"]).is_err());
    }
}
