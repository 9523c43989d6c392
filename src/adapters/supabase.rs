use std::collections::HashSet;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters::check_status;
use crate::domain::model::{BookStatus, Review, SwipeType, UserBook};
use crate::domain::ports::UserStore;
use crate::utils::error::{BookFeedError, Result};

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";

const USER_BOOKS: &str = "user_books";
const REVIEWS: &str = "reviews";
const SWIPE_HISTORY: &str = "swipe_history";

#[derive(Serialize)]
struct NewUserBook<'a> {
    user_id: Uuid,
    google_books_id: &'a str,
    status: BookStatus,
}

#[derive(Serialize)]
struct StatusPatch {
    status: BookStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ReviewUpsert<'a> {
    user_id: Uuid,
    google_books_id: &'a str,
    rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    review_text: Option<&'a str>,
}

#[derive(Serialize)]
struct NewSwipe<'a> {
    user_id: Uuid,
    google_books_id: &'a str,
    action: SwipeType,
}

#[derive(Deserialize)]
struct SwipedId {
    google_books_id: String,
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// PostgREST client for the per-user tables of the hosted backend.
#[derive(Debug)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, anon_key))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: RwLock::new(None),
        }
    }

    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token;
        }
    }

    fn request(&self, method: Method, table: &str, prefer: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.anon_key)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", prefer);

        let token = self.access_token.read().ok().and_then(|guard| guard.clone());
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        check_status(response)
    }

    async fn first_row<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let rows: Vec<T> = self.send(request).await?.json().await?;
        rows.into_iter().next().ok_or(BookFeedError::NoDataError)
    }
}

#[async_trait]
impl UserStore for SupabaseClient {
    async fn fetch_user_books(
        &self,
        user_id: Uuid,
        status: Option<BookStatus>,
    ) -> Result<Vec<UserBook>> {
        let mut query = vec![("user_id", eq(user_id)), ("order", "added_at.desc".to_string())];
        if let Some(status) = status {
            query.push(("status", eq(status.as_str())));
        }

        let request = self
            .request(Method::GET, USER_BOOKS, PREFER_REPRESENTATION)
            .query(&query);
        Ok(self.send(request).await?.json().await?)
    }

    async fn add_user_book(
        &self,
        user_id: Uuid,
        google_books_id: &str,
        status: BookStatus,
    ) -> Result<UserBook> {
        let request = self
            .request(Method::POST, USER_BOOKS, PREFER_REPRESENTATION)
            .json(&NewUserBook {
                user_id,
                google_books_id,
                status,
            });
        self.first_row(request).await
    }

    async fn update_book_status(&self, book_id: Uuid, status: BookStatus) -> Result<()> {
        let request = self
            .request(Method::PATCH, USER_BOOKS, PREFER_REPRESENTATION)
            .query(&[("id", eq(book_id))])
            .json(&StatusPatch {
                status,
                updated_at: Utc::now(),
            });
        self.send(request).await?;
        Ok(())
    }

    async fn delete_user_book(&self, book_id: Uuid) -> Result<()> {
        let request = self
            .request(Method::DELETE, USER_BOOKS, PREFER_REPRESENTATION)
            .query(&[("id", eq(book_id))]);
        self.send(request).await?;
        Ok(())
    }

    async fn fetch_review(&self, user_id: Uuid, google_books_id: &str) -> Result<Option<Review>> {
        let request = self
            .request(Method::GET, REVIEWS, PREFER_REPRESENTATION)
            .query(&[
                ("user_id", eq(user_id)),
                ("google_books_id", eq(google_books_id)),
            ]);
        let reviews: Vec<Review> = self.send(request).await?.json().await?;
        Ok(reviews.into_iter().next())
    }

    async fn fetch_user_reviews(&self, user_id: Uuid) -> Result<Vec<Review>> {
        let request = self
            .request(Method::GET, REVIEWS, PREFER_REPRESENTATION)
            .query(&[
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        Ok(self.send(request).await?.json().await?)
    }

    async fn upsert_review(
        &self,
        user_id: Uuid,
        google_books_id: &str,
        rating: i32,
        review_text: Option<&str>,
    ) -> Result<Review> {
        let request = self
            .request(Method::POST, REVIEWS, PREFER_UPSERT)
            .json(&ReviewUpsert {
                user_id,
                google_books_id,
                rating,
                review_text,
            });
        self.first_row(request).await
    }

    async fn delete_review(&self, review_id: Uuid) -> Result<()> {
        let request = self
            .request(Method::DELETE, REVIEWS, PREFER_REPRESENTATION)
            .query(&[("id", eq(review_id))]);
        self.send(request).await?;
        Ok(())
    }

    async fn record_swipe(
        &self,
        user_id: Uuid,
        google_books_id: &str,
        action: SwipeType,
    ) -> Result<()> {
        let request = self
            .request(Method::POST, SWIPE_HISTORY, PREFER_REPRESENTATION)
            .json(&NewSwipe {
                user_id,
                google_books_id,
                action,
            });
        self.send(request).await?;
        Ok(())
    }

    async fn fetch_swiped_book_ids(&self, user_id: Uuid) -> Result<HashSet<String>> {
        let request = self
            .request(Method::GET, SWIPE_HISTORY, PREFER_REPRESENTATION)
            .query(&[
                ("user_id", eq(user_id)),
                ("select", "google_books_id".to_string()),
            ]);
        let rows: Vec<SwipedId> = self.send(request).await?.json().await?;
        Ok(rows.into_iter().map(|r| r.google_books_id).collect())
    }
}
