use crate::adapters::google_books::DEFAULT_BASE_URL;
use crate::utils::error::{BookFeedError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TOPICS: &[&str] = &[
    "fiction",
    "mystery",
    "science fiction",
    "romance",
    "biography",
    "history",
    "self help",
    "fantasy",
    "thriller",
    "literary fiction",
    "philosophy",
    "psychology",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub backend: BackendConfig,
    pub feed: FeedConfig,
    pub network: NetworkConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub order_by: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            order_by: "relevance".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub batch_size: u32,
    pub prefetch_threshold: usize,
    pub topics: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            prefetch_threshold: 3,
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub timeout_seconds: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { timeout_seconds: 15 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub dir: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: ".book-feed".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the TOML file at `path`, or the defaults when no path is given,
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BookFeedError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BookFeedError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SUPABASE_URL") {
            self.backend.url = url;
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            self.backend.anon_key = key;
        }
        if let Some(key) = lookup("GOOGLE_BOOKS_API_KEY") {
            self.catalog.api_key = Some(key);
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("catalog.base_url", &self.catalog.base_url)?;
        validation::validate_range("feed.batch_size", self.feed.batch_size, 1, 40)?;
        validation::validate_positive_number("feed.prefetch_threshold", self.feed.prefetch_threshold, 1)?;
        validation::validate_positive_number("network.timeout_seconds", self.network.timeout_seconds as usize, 1)?;
        validation::validate_path("session.dir", &self.session.dir)?;

        if self.feed.topics.iter().all(|t| t.trim().is_empty()) {
            return Err(BookFeedError::InvalidConfigValueError {
                field: "feed.topics".to_string(),
                value: format!("{:?}", self.feed.topics),
                reason: "At least one topic is required".to_string(),
            });
        }

        if !self.backend.url.is_empty() {
            validation::validate_url("backend.url", &self.backend.url)?;
        }

        Ok(())
    }

    /// Checks that real backend credentials are configured.
    pub fn check_backend_credentials(&self) -> Result<()> {
        validation::validate_credential("backend.url", &self.backend.url)?;
        validation::validate_credential("backend.anon_key", &self.backend.anon_key)?;
        validation::validate_url("backend.url", &self.backend.url)
    }

    /// Release builds refuse to start without backend credentials; debug
    /// builds only warn and run against whatever is configured.
    pub fn ensure_backend_credentials(&self, release: bool) -> Result<()> {
        match self.check_backend_credentials() {
            Ok(()) => Ok(()),
            Err(e) if release => Err(e),
            Err(e) => {
                tracing::warn!("Backend not configured ({}), remote features will fall back", e);
                Ok(())
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_seconds)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
