use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::model::{Book, BookStatus, Review, SwipeType, UserBook, UserStats};
use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// One page of a catalog search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub start_index: u32,
    pub max_results: u32,
    pub order_by: String,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            start_index: 0,
            max_results: 20,
            order_by: "relevance".to_string(),
        }
    }

    pub fn start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }
}

#[async_trait]
pub trait BookCatalog: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Book>>;

    async fn volume(&self, id: &str) -> Result<Book>;

    /// Books sharing the first category of `book`, or its first author when
    /// it has no category. `book` itself is never part of the result.
    async fn similar(&self, book: &Book, max_results: u32) -> Result<Vec<Book>> {
        let query = match book.categories.first() {
            Some(category) => format!("subject:{}", category),
            None => format!(
                "inauthor:{}",
                book.authors.first().map(String::as_str).unwrap_or_default()
            ),
        };

        let results = self
            .search(&SearchRequest::new(query).max_results(max_results + 1))
            .await?;
        Ok(results.into_iter().filter(|b| b.id != book.id).collect())
    }
}

/// Produces batches of candidate books for the discovery feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn next_batch(&self) -> Result<Vec<Book>>;
}

/// Per-user collections kept by the hosted backend.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn fetch_user_books(
        &self,
        user_id: Uuid,
        status: Option<BookStatus>,
    ) -> Result<Vec<UserBook>>;

    async fn add_user_book(
        &self,
        user_id: Uuid,
        google_books_id: &str,
        status: BookStatus,
    ) -> Result<UserBook>;

    async fn update_book_status(&self, book_id: Uuid, status: BookStatus) -> Result<()>;

    async fn delete_user_book(&self, book_id: Uuid) -> Result<()>;

    async fn fetch_review(&self, user_id: Uuid, google_books_id: &str) -> Result<Option<Review>>;

    async fn fetch_user_reviews(&self, user_id: Uuid) -> Result<Vec<Review>>;

    async fn upsert_review(
        &self,
        user_id: Uuid,
        google_books_id: &str,
        rating: i32,
        review_text: Option<&str>,
    ) -> Result<Review>;

    async fn delete_review(&self, review_id: Uuid) -> Result<()>;

    async fn record_swipe(
        &self,
        user_id: Uuid,
        google_books_id: &str,
        action: SwipeType,
    ) -> Result<()>;

    async fn fetch_swiped_book_ids(&self, user_id: Uuid) -> Result<HashSet<String>>;

    async fn fetch_user_stats(&self, user_id: Uuid) -> Result<UserStats> {
        let (books, reviews) = tokio::try_join!(
            self.fetch_user_books(user_id, None),
            self.fetch_user_reviews(user_id)
        )?;

        Ok(UserStats {
            books_read: books
                .iter()
                .filter(|b| b.status == BookStatus::Read)
                .count(),
            reviews_written: reviews.len(),
            total_books: books.len(),
        })
    }
}
