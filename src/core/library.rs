use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::domain::model::{AuthSession, Book, BookStatus, Review, UserBook, UserStats};
use crate::domain::ports::{BookCatalog, SearchRequest, UserStore};
use crate::utils::error::{BookFeedError, Result};

pub const SEARCH_MAX_RESULTS: u32 = 15;
pub const DEFAULT_LOOKUP_WORKERS: usize = 5;

/// The user's books grouped by reading status, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    pub want_to_read: Vec<UserBook>,
    pub reading: Vec<UserBook>,
    pub read: Vec<UserBook>,
}

impl Library {
    pub fn from_books(books: Vec<UserBook>) -> Self {
        let mut library = Self::default();
        for book in books {
            match book.status {
                BookStatus::WantToRead => library.want_to_read.push(book),
                BookStatus::Reading => library.reading.push(book),
                BookStatus::Read => library.read.push(book),
            }
        }
        library
    }

    pub fn section(&self, status: BookStatus) -> &[UserBook] {
        match status {
            BookStatus::WantToRead => &self.want_to_read,
            BookStatus::Reading => &self.reading,
            BookStatus::Read => &self.read,
        }
    }

    pub fn len(&self) -> usize {
        self.want_to_read.len() + self.reading.len() + self.read.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub display_name: String,
    pub stats: UserStats,
}

/// Library, review and profile operations for the signed-in user.
///
/// Every call goes to the backend; nothing is cached here, so a failed call
/// leaves whatever the caller already holds untouched.
pub struct LibraryService {
    store: Arc<dyn UserStore>,
    catalog: Arc<dyn BookCatalog>,
    session: Option<AuthSession>,
    lookups: Arc<Semaphore>,
}

impl LibraryService {
    pub fn new(
        store: Arc<dyn UserStore>,
        catalog: Arc<dyn BookCatalog>,
        session: Option<AuthSession>,
    ) -> Self {
        Self {
            store,
            catalog,
            session,
            lookups: Arc::new(Semaphore::new(DEFAULT_LOOKUP_WORKERS)),
        }
    }

    fn user_id(&self) -> Result<Uuid> {
        self.session
            .as_ref()
            .map(|s| s.user_id)
            .ok_or_else(|| BookFeedError::AuthError {
                message: "Not signed in".to_string(),
            })
    }

    /// Lists the library and attaches catalog details to each entry.
    /// A failed lookup leaves that entry's `book` empty.
    pub async fn fetch_library(&self) -> Result<Library> {
        let user_id = self.user_id()?;
        let mut books = self.store.fetch_user_books(user_id, None).await?;

        let mut handles = Vec::with_capacity(books.len());
        for (index, entry) in books.iter().enumerate() {
            let catalog = Arc::clone(&self.catalog);
            let semaphore = Arc::clone(&self.lookups);
            let id = entry.google_books_id.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (index, None);
                };
                match catalog.volume(&id).await {
                    Ok(book) => (index, Some(book)),
                    Err(e) => {
                        tracing::warn!("Could not load details for {}: {}", id, e);
                        (index, None)
                    }
                }
            }));
        }

        for handle in handles {
            match handle.await {
                Ok((index, book)) => books[index].book = book,
                Err(e) => tracing::error!("Task join error: {}", e),
            }
        }

        let library = Library::from_books(books);
        tracing::debug!("Loaded library with {} books", library.len());
        Ok(library)
    }

    pub async fn add_book(&self, book: &Book, status: BookStatus) -> Result<UserBook> {
        let user_id = self.user_id()?;
        let mut entry = self.store.add_user_book(user_id, &book.id, status).await?;
        entry.book = Some(book.clone());
        tracing::info!("Added '{}' to {}", book.title, status.display_name());
        Ok(entry)
    }

    pub async fn update_status(&self, user_book_id: Uuid, status: BookStatus) -> Result<()> {
        self.user_id()?;
        self.store.update_book_status(user_book_id, status).await
    }

    pub async fn remove(&self, user_book_id: Uuid) -> Result<()> {
        self.user_id()?;
        self.store.delete_user_book(user_book_id).await
    }

    /// Catalog search. A blank query returns nothing without a request.
    pub async fn search(&self, query: &str) -> Result<Vec<Book>> {
        self.search_with_limit(query, SEARCH_MAX_RESULTS).await
    }

    pub async fn search_with_limit(&self, query: &str, max_results: u32) -> Result<Vec<Book>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let request = SearchRequest::new(query).max_results(max_results);
        self.catalog.search(&request).await
    }

    pub async fn review_for(&self, google_books_id: &str) -> Result<Option<Review>> {
        let user_id = self.user_id()?;
        self.store.fetch_review(user_id, google_books_id).await
    }

    /// Creates or replaces the user's review of a book. Blank text is
    /// stored as no text.
    pub async fn save_review(
        &self,
        google_books_id: &str,
        rating: i32,
        text: Option<&str>,
    ) -> Result<Review> {
        if !(Review::MIN_RATING..=Review::MAX_RATING).contains(&rating) {
            return Err(BookFeedError::ValidationError {
                message: format!(
                    "Rating must be between {} and {}, got {}",
                    Review::MIN_RATING,
                    Review::MAX_RATING,
                    rating
                ),
            });
        }
        let user_id = self.user_id()?;
        let text = text.map(str::trim).filter(|t| !t.is_empty());
        self.store
            .upsert_review(user_id, google_books_id, rating, text)
            .await
    }

    pub async fn delete_review(&self, review_id: Uuid) -> Result<()> {
        self.user_id()?;
        self.store.delete_review(review_id).await
    }

    pub async fn profile(&self) -> Result<Profile> {
        let user_id = self.user_id()?;
        let stats = self.store.fetch_user_stats(user_id).await?;
        let display_name = self
            .session
            .as_ref()
            .and_then(|s| s.display_name.clone())
            .unwrap_or_else(|| "Reader".to_string());
        Ok(Profile {
            display_name,
            stats,
        })
    }
}
