pub mod cli;
pub mod toml_config;

pub use toml_config::AppConfig;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use crate::domain::model::BookStatus;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "book-feed")]
#[command(about = "Discover books one swipe at a time")]
pub struct CliConfig {
    #[arg(long, help = "TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Directory holding the signed-in session")]
    pub session_dir: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Walk the discovery feed
    Feed {
        #[arg(long, default_value = "5")]
        count: usize,
        #[arg(long, help = "Like every book shown")]
        like: bool,
    },
    /// Search the catalog
    Search {
        query: String,
        #[arg(long, default_value = "15")]
        max: u32,
    },
    /// Show the library grouped by status
    Library,
    /// Add a book to the library
    Add {
        google_books_id: String,
        #[arg(long, default_value = "want_to_read")]
        status: BookStatus,
    },
    /// Change the reading status of a library entry
    Status {
        user_book_id: uuid::Uuid,
        status: BookStatus,
    },
    /// Remove a library entry
    Remove { user_book_id: uuid::Uuid },
    /// Rate and review a book
    Review {
        google_books_id: String,
        rating: i32,
        #[arg(long)]
        text: Option<String>,
    },
    /// Show profile stats
    Profile,
    /// Sign in with an identity-provider token
    SignIn {
        #[arg(long)]
        id_token: String,
        #[arg(long, default_value = "apple")]
        provider: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign in as the demo user (debug builds only)
    DemoSignIn,
    SignOut,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.session_dir {
            validation::validate_path("session_dir", dir)?;
        }
        match &self.command {
            Command::Feed { count, .. } => validation::validate_positive_number("count", *count, 1),
            Command::Search { query, max } => {
                validation::validate_non_empty_string("query", query)?;
                validation::validate_range("max", *max, 1, 40)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_command() {
        let cli = CliConfig::try_parse_from(["book-feed", "--verbose", "feed", "--count", "3"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Feed { count: 3, like: false }));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_parse_status_values() {
        let cli = CliConfig::try_parse_from(["book-feed", "add", "abc", "--status", "reading"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Add { status: BookStatus::Reading, .. }
        ));

        let bad = CliConfig::try_parse_from(["book-feed", "add", "abc", "--status", "lost"]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_count() {
        let cli = CliConfig::try_parse_from(["book-feed", "feed", "--count", "0"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
