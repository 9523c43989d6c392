pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::auth::{AuthClient, SessionStore};
pub use adapters::google_books::GoogleBooksClient;
pub use adapters::supabase::SupabaseClient;
pub use config::{cli::LocalStorage, AppConfig};
pub use core::{DiscoverySession, LibraryService, PrefetchQueue, TopicFeed};
pub use domain::model::{AuthSession, Book, BookStatus, SwipeType};
pub use utils::error::{BookFeedError, Result};
