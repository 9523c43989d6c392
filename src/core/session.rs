use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::queue::{PrefetchQueue, DEFAULT_PREFETCH_THRESHOLD};
use crate::core::recorder::InteractionRecorder;
use crate::core::samples::sample_books;
use crate::core::seen::SeenSet;
use crate::domain::model::{Book, PurchaseLinks, SwipeType};
use crate::domain::ports::{FeedSource, UserStore};

/// One pass through the discovery feed: the book on screen, the books
/// already passed, and the lookahead queue behind them.
pub struct DiscoverySession {
    queue: PrefetchQueue,
    recorder: InteractionRecorder,
    current: Option<Book>,
    history: Vec<Book>,
    in_flight: Vec<JoinHandle<()>>,
}

impl DiscoverySession {
    pub async fn start(
        feed: Arc<dyn FeedSource>,
        store: Arc<dyn UserStore>,
        user_id: Option<Uuid>,
    ) -> Self {
        Self::start_with_threshold(feed, store, user_id, DEFAULT_PREFETCH_THRESHOLD).await
    }

    /// Loads the seen set, fills the queue once and shows the first book.
    /// The feed never starts empty: an unreachable or exhausted catalog is
    /// replaced by the built-in samples.
    pub async fn start_with_threshold(
        feed: Arc<dyn FeedSource>,
        store: Arc<dyn UserStore>,
        user_id: Option<Uuid>,
        threshold: usize,
    ) -> Self {
        let seen = SeenSet::load(store.as_ref(), user_id).await;
        let mut queue = PrefetchQueue::new(feed, seen).with_threshold(threshold);

        match queue.refill().await {
            Ok(0) => {
                tracing::info!("Catalog returned nothing new, showing sample books");
                queue.load_placeholders(sample_books());
            }
            Ok(added) => tracing::info!("Discovery feed loaded with {} books", added),
            Err(e) => {
                tracing::warn!("Catalog unavailable, showing sample books: {}", e);
                queue.load_placeholders(sample_books());
            }
        }

        let mut session = Self {
            queue,
            recorder: InteractionRecorder::new(store, user_id),
            current: None,
            history: Vec::new(),
            in_flight: Vec::new(),
        };
        session.current = session.queue.next_item();
        session
    }

    pub fn current(&self) -> Option<&Book> {
        self.current.as_ref()
    }

    pub fn queue(&self) -> &PrefetchQueue {
        &self.queue
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Moves to the next book. When the queue has run dry this waits for
    /// the pending refill, then falls back to unseen sample books.
    pub async fn advance(&mut self) -> Option<&Book> {
        if let Some(book) = self.current.take() {
            self.history.push(book);
        }

        let mut next = self.queue.next_item();
        if next.is_none() {
            self.queue.settle().await;
            next = self.queue.next_item();
        }
        if next.is_none() {
            let unseen: Vec<Book> = sample_books()
                .into_iter()
                .filter(|b| !self.queue.is_seen(&b.id))
                .collect();
            if self.queue.load_placeholders(unseen) > 0 {
                tracing::info!("Feed exhausted, continuing with sample books");
            }
            next = self.queue.next_item();
        }

        self.current = next;
        self.current.as_ref()
    }

    /// Steps back to the previously shown book. Returns `false` at the start
    /// of the history.
    pub fn previous(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        if let Some(current) = self.current.replace(previous) {
            self.queue.push_front(current);
        }
        true
    }

    /// Swipe up: pass on the book without recording anything.
    pub async fn skip(&mut self) -> Option<&Book> {
        self.advance().await
    }

    /// Swipe left.
    pub async fn dislike(&mut self) -> Option<&Book> {
        self.record(SwipeType::Dislike);
        self.advance().await
    }

    /// Double tap: like, save to the library and move on.
    pub async fn like(&mut self) -> Option<&Book> {
        if let Some(id) = self.record(SwipeType::Like) {
            self.save_to_library(&id);
        }
        self.advance().await
    }

    /// Swipe right: like [`like`](Self::like) but stays on the book and
    /// returns where to buy it. Call [`dismiss_purchase`](Self::dismiss_purchase)
    /// to move on.
    pub fn buy(&mut self) -> Option<PurchaseLinks> {
        let id = self.record(SwipeType::Buy)?;
        self.save_to_library(&id);
        self.current.as_ref().map(Book::purchase_links)
    }

    pub async fn dismiss_purchase(&mut self) -> Option<&Book> {
        self.advance().await
    }

    /// Waits for background interaction writes started by this session.
    pub async fn flush(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!("Interaction task panicked: {}", e);
                }
            }
        }
        self.queue.settle().await;
    }

    fn record(&mut self, action: SwipeType) -> Option<String> {
        let id = self.current.as_ref()?.id.clone();
        self.queue.mark_seen(&id);
        let handle = self.recorder.record_swipe(&id, action);
        self.track(handle);
        Some(id)
    }

    fn save_to_library(&mut self, id: &str) {
        let handle = self.recorder.save_to_library(id);
        self.track(handle);
    }

    fn track(&mut self, handle: Option<JoinHandle<()>>) {
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.extend(handle);
    }
}
