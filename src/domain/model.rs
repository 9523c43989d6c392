use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use crate::utils::error::BookFeedError;

const HOOK_LIMIT: usize = 120;
const HOOK_CUT: usize = 117;

/// A catalog entry as returned by the book search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub categories: Vec<String>,
    pub average_rating: Option<f64>,
    pub page_count: Option<u32>,
    pub published_date: Option<String>,
    pub thumbnail_url: Option<String>,
    pub large_cover_url: Option<String>,
    pub info_link: Option<String>,
}

impl Book {
    pub fn author_display(&self) -> String {
        self.authors.join(", ")
    }

    pub fn genre_display(&self) -> &str {
        self.categories
            .first()
            .map(String::as_str)
            .unwrap_or("General")
    }

    /// Short teaser shown on the feed card.
    pub fn hook(&self) -> String {
        let Some(desc) = &self.description else {
            return String::new();
        };
        if desc.chars().count() > HOOK_LIMIT {
            let cut: String = desc.chars().take(HOOK_CUT).collect();
            format!("{}...", cut)
        } else {
            desc.clone()
        }
    }

    pub fn rating_display(&self) -> String {
        match self.average_rating {
            Some(rating) => format!("{:.1}", rating),
            None => "—".to_string(),
        }
    }

    pub fn page_count_display(&self) -> String {
        match self.page_count {
            Some(pages) => format!("{} pages", pages),
            None => "—".to_string(),
        }
    }

    pub fn high_quality_image_url(&self) -> Option<Url> {
        [&self.large_cover_url, &self.thumbnail_url]
            .into_iter()
            .flatten()
            .find(|u| !u.is_empty())
            .and_then(|u| Url::parse(u).ok())
    }

    pub fn purchase_links(&self) -> PurchaseLinks {
        let term = format!("{} {}", self.title, self.author_display());
        let term = term.trim();
        if term.is_empty() {
            return PurchaseLinks::default();
        }

        PurchaseLinks {
            amazon: Url::parse_with_params(
                "https://www.amazon.com/s",
                &[("k", term), ("i", "stripbooks"), ("ref", "nb_sb_noss")],
            )
            .ok(),
            apple_books: Url::parse_with_params("https://books.apple.com/us/search", &[("term", term)])
                .ok(),
            bookshop: Url::parse_with_params("https://bookshop.org/search", &[("keywords", term)])
                .ok(),
        }
    }
}

/// Store search pages for a book, offered after a "buy" swipe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurchaseLinks {
    pub amazon: Option<Url>,
    pub apple_books: Option<Url>,
    pub bookshop: Option<Url>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeType {
    Like,
    Dislike,
    Buy,
}

impl SwipeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeType::Like => "like",
            SwipeType::Dislike => "dislike",
            SwipeType::Buy => "buy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    WantToRead,
    Reading,
    Read,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [BookStatus::WantToRead, BookStatus::Reading, BookStatus::Read];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::WantToRead => "want_to_read",
            BookStatus::Reading => "reading",
            BookStatus::Read => "read",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BookStatus::WantToRead => "Want to Read",
            BookStatus::Reading => "Reading",
            BookStatus::Read => "Read",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BookStatus {
    type Err = BookFeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(|c: char| c == '-' || c == ' ', "_").as_str() {
            "want_to_read" => Ok(BookStatus::WantToRead),
            "reading" => Ok(BookStatus::Reading),
            "read" => Ok(BookStatus::Read),
            _ => Err(BookFeedError::ValidationError {
                message: format!(
                    "Unknown status '{}', expected want_to_read, reading or read",
                    s
                ),
            }),
        }
    }
}

/// A row of the `user_books` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBook {
    pub id: Uuid,
    pub user_id: Uuid,
    pub google_books_id: String,
    pub status: BookStatus,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Filled from the catalog after loading; not a backend column.
    #[serde(skip)]
    pub book: Option<Book>,
}

impl PartialEq for UserBook {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.status == other.status && self.updated_at == other.updated_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub google_books_id: String,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub const MIN_RATING: i32 = 1;
    pub const MAX_RATING: i32 = 5;

    pub fn is_valid(&self) -> bool {
        (Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub books_read: usize,
    pub reviews_written: usize,
    pub total_books: usize,
}

/// Signed-in user as returned by the token exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl AuthSession {
    pub const DEMO_USER_ID: Uuid = Uuid::from_u128(1);

    pub fn demo() -> Self {
        Self {
            user_id: Self::DEMO_USER_ID,
            display_name: Some("Demo User".to_string()),
            access_token: "demo_access_token".to_string(),
            refresh_token: None,
        }
    }
}
