// Adapters layer: concrete clients for the external services behind the domain ports.

pub mod auth;
pub mod google_books;
pub mod supabase;

use reqwest::{Response, StatusCode};

use crate::utils::error::{BookFeedError, Result};

/// Maps non-success responses onto the crate's error variants.
pub(crate) fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::debug!("{} returned {}", response.url().path(), status);
    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(BookFeedError::RateLimitedError),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BookFeedError::UnauthorizedError),
        other => Err(BookFeedError::HttpStatusError {
            status: other.as_u16(),
        }),
    }
}
