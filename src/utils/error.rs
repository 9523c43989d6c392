use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookFeedError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Server returned HTTP {status}")]
    HttpStatusError { status: u16 },

    #[error("Too many requests, rate limited by remote service")]
    RateLimitedError,

    #[error("Not authorized for this request")]
    UnauthorizedError,

    #[error("No data returned from server")]
    NoDataError,

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, BookFeedError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    RemoteService,
    Authentication,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BookFeedError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BookFeedError::HttpError(_) => ErrorCategory::Network,
            BookFeedError::HttpStatusError { .. }
            | BookFeedError::RateLimitedError
            | BookFeedError::NoDataError => ErrorCategory::RemoteService,
            BookFeedError::UnauthorizedError | BookFeedError::AuthError { .. } => {
                ErrorCategory::Authentication
            }
            BookFeedError::ConfigError { .. }
            | BookFeedError::MissingConfigError { .. }
            | BookFeedError::InvalidConfigValueError { .. }
            | BookFeedError::UrlError(_) => ErrorCategory::Configuration,
            BookFeedError::SerializationError(_) | BookFeedError::ValidationError { .. } => {
                ErrorCategory::Data
            }
            BookFeedError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::RemoteService => ErrorSeverity::Medium,
            ErrorCategory::Authentication | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BookFeedError::HttpError(e) => e.is_timeout() || e.is_connect(),
            BookFeedError::RateLimitedError => true,
            BookFeedError::HttpStatusError { status } => *status >= 500,
            _ => false,
        }
    }

    /// Process exit code for the CLI: 2 when a retry may help, 3 for
    /// configuration and system faults, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_transient() {
            return 2;
        }
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium | ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BookFeedError::HttpError(e) if e.is_timeout() => {
                "The request timed out. Check your connection.".to_string()
            }
            BookFeedError::HttpError(_) => "Could not reach the server.".to_string(),
            BookFeedError::HttpStatusError { status } => format!("Server error (HTTP {}).", status),
            BookFeedError::RateLimitedError => {
                "Too many requests. Please try again later.".to_string()
            }
            BookFeedError::UnauthorizedError => {
                "You must be signed in to perform this action.".to_string()
            }
            BookFeedError::NoDataError => "No data returned from server.".to_string(),
            BookFeedError::AuthError { .. } => "Authentication with server failed.".to_string(),
            BookFeedError::ValidationError { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check your network connection and retry",
            ErrorCategory::RemoteService => "Wait a moment and retry the command",
            ErrorCategory::Authentication => "Run `book-feed sign-in` to refresh your session",
            ErrorCategory::Configuration => {
                "Set SUPABASE_URL and SUPABASE_ANON_KEY or fix the config file"
            }
            ErrorCategory::Data => "Check the input values",
            ErrorCategory::System => "Check file permissions for the session directory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_category() {
        assert_eq!(
            BookFeedError::RateLimitedError.severity(),
            ErrorSeverity::Medium
        );
        assert_eq!(
            BookFeedError::MissingConfigError {
                field: "backend.url".to_string()
            }
            .severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(
            BookFeedError::UnauthorizedError.category(),
            ErrorCategory::Authentication
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(BookFeedError::RateLimitedError.is_transient());
        assert!(BookFeedError::HttpStatusError { status: 503 }.is_transient());
        assert!(!BookFeedError::HttpStatusError { status: 404 }.is_transient());
        assert!(!BookFeedError::NoDataError.is_transient());
    }

    #[test]
    fn test_exit_codes_separate_retryable_failures() {
        assert_eq!(BookFeedError::HttpStatusError { status: 503 }.exit_code(), 2);
        assert_eq!(BookFeedError::RateLimitedError.exit_code(), 2);
        assert_eq!(BookFeedError::HttpStatusError { status: 404 }.exit_code(), 1);
        assert_eq!(BookFeedError::UnauthorizedError.exit_code(), 1);
        assert_eq!(
            BookFeedError::ConfigError {
                message: "bad".to_string()
            }
            .exit_code(),
            3
        );
    }
}
