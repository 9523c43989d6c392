//! In-memory fakes for the domain ports, shared by the core unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::model::{Book, BookStatus, Review, SwipeType, UserBook};
use crate::domain::ports::{BookCatalog, FeedSource, SearchRequest, UserStore};
use crate::utils::error::{BookFeedError, Result};

pub fn book(id: &str) -> Book {
    Book {
        id: id.to_string(),
        title: format!("Book {}", id),
        authors: vec!["Author".to_string()],
        description: Some(format!("About {}", id)),
        categories: vec!["Fiction".to_string()],
        average_rating: Some(4.0),
        page_count: Some(100),
        published_date: None,
        thumbnail_url: Some(format!("https://covers.example/{}.jpg", id)),
        large_cover_url: None,
        info_link: None,
    }
}

pub fn books(ids: &[&str]) -> Vec<Book> {
    ids.iter().map(|id| book(id)).collect()
}

pub enum Step {
    Batch(Vec<Book>),
    Delayed(Duration, Vec<Book>),
    Fail,
}

/// Feed that replays a fixed script, one step per call. An exhausted script
/// yields empty batches.
pub struct ScriptedFeed {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn next_batch(&self) -> Result<Vec<Book>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Batch(books)) => Ok(books),
            Some(Step::Delayed(delay, books)) => {
                tokio::time::sleep(delay).await;
                Ok(books)
            }
            Some(Step::Fail) => Err(BookFeedError::HttpStatusError { status: 500 }),
            None => Ok(Vec::new()),
        }
    }
}

/// Catalog that records every search and answers from a fixed table.
#[derive(Default)]
pub struct RecordingCatalog {
    requests: Mutex<Vec<SearchRequest>>,
    volumes: HashMap<String, Book>,
    results: Vec<Book>,
}

impl RecordingCatalog {
    pub fn with_volumes(volumes: Vec<Book>) -> Self {
        Self {
            volumes: volumes.into_iter().map(|b| (b.id.clone(), b)).collect(),
            ..Self::default()
        }
    }

    pub fn with_results(results: Vec<Book>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookCatalog for RecordingCatalog {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Book>> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.results.clone())
    }

    async fn volume(&self, id: &str) -> Result<Book> {
        self.volumes
            .get(id)
            .cloned()
            .ok_or(BookFeedError::HttpStatusError { status: 404 })
    }
}

/// Backend kept in memory. `fail` makes every call return a server error.
#[derive(Default)]
pub struct MemoryStore {
    pub swipes: Mutex<Vec<(Uuid, String, SwipeType)>>,
    pub user_books: Mutex<Vec<UserBook>>,
    pub reviews: Mutex<Vec<Review>>,
    pub history: HashSet<String>,
    pub fail: AtomicBool,
}

impl MemoryStore {
    pub fn with_history(ids: &[&str]) -> Self {
        Self {
            history: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(BookFeedError::HttpStatusError { status: 500 })
        } else {
            Ok(())
        }
    }

    pub fn swipe_log(&self) -> Vec<(String, SwipeType)> {
        self.swipes
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id, action)| (id.clone(), *action))
            .collect()
    }

    pub fn library_ids(&self) -> Vec<String> {
        self.user_books
            .lock()
            .unwrap()
            .iter()
            .map(|b| b.google_books_id.clone())
            .collect()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn fetch_user_books(
        &self,
        user_id: Uuid,
        status: Option<BookStatus>,
    ) -> Result<Vec<UserBook>> {
        self.check()?;
        Ok(self
            .user_books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id && status.map_or(true, |s| b.status == s))
            .cloned()
            .collect())
    }

    async fn add_user_book(
        &self,
        user_id: Uuid,
        google_books_id: &str,
        status: BookStatus,
    ) -> Result<UserBook> {
        self.check()?;
        let now = Utc::now();
        let row = UserBook {
            id: Uuid::new_v4(),
            user_id,
            google_books_id: google_books_id.to_string(),
            status,
            added_at: now,
            updated_at: now,
            book: None,
        };
        self.user_books.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_book_status(&self, book_id: Uuid, status: BookStatus) -> Result<()> {
        self.check()?;
        for row in self.user_books.lock().unwrap().iter_mut() {
            if row.id == book_id {
                row.status = status;
                row.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn delete_user_book(&self, book_id: Uuid) -> Result<()> {
        self.check()?;
        self.user_books.lock().unwrap().retain(|b| b.id != book_id);
        Ok(())
    }

    async fn fetch_review(&self, user_id: Uuid, google_books_id: &str) -> Result<Option<Review>> {
        self.check()?;
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.google_books_id == google_books_id)
            .cloned())
    }

    async fn fetch_user_reviews(&self, user_id: Uuid) -> Result<Vec<Review>> {
        self.check()?;
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_review(
        &self,
        user_id: Uuid,
        google_books_id: &str,
        rating: i32,
        review_text: Option<&str>,
    ) -> Result<Review> {
        self.check()?;
        let mut reviews = self.reviews.lock().unwrap();
        let now = Utc::now();
        reviews.retain(|r| !(r.user_id == user_id && r.google_books_id == google_books_id));
        let review = Review {
            id: Uuid::new_v4(),
            user_id,
            google_books_id: google_books_id.to_string(),
            rating,
            review_text: review_text.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        reviews.push(review.clone());
        Ok(review)
    }

    async fn delete_review(&self, review_id: Uuid) -> Result<()> {
        self.check()?;
        self.reviews.lock().unwrap().retain(|r| r.id != review_id);
        Ok(())
    }

    async fn record_swipe(
        &self,
        user_id: Uuid,
        google_books_id: &str,
        action: SwipeType,
    ) -> Result<()> {
        self.check()?;
        self.swipes
            .lock()
            .unwrap()
            .push((user_id, google_books_id.to_string(), action));
        Ok(())
    }

    async fn fetch_swiped_book_ids(&self, _user_id: Uuid) -> Result<HashSet<String>> {
        self.check()?;
        Ok(self.history.clone())
    }
}
