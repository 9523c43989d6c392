use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use crate::core::seen::SeenSet;
use crate::domain::model::Book;
use crate::domain::ports::FeedSource;
use crate::utils::error::Result;

pub const DEFAULT_PREFETCH_THRESHOLD: usize = 3;

#[derive(Debug, Default)]
struct FeedState {
    queue: VecDeque<Book>,
    seen: SeenSet,
}

impl FeedState {
    /// Appends books that are neither seen nor already queued.
    fn append_unseen(&mut self, batch: Vec<Book>) -> usize {
        let mut queued: HashSet<String> = self.queue.iter().map(|b| b.id.clone()).collect();
        let mut added = 0;
        for book in batch {
            if self.seen.contains(&book.id) || !queued.insert(book.id.clone()) {
                continue;
            }
            self.queue.push_back(book);
            added += 1;
        }
        added
    }
}

fn lock(state: &Mutex<FeedState>) -> MutexGuard<'_, FeedState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Lookahead buffer of upcoming feed items.
///
/// Popping below the threshold schedules a background refill. Only one refill
/// runs at a time: scheduling a new one aborts the one in flight. The state
/// mutex is shared with that task only and never held across an await.
pub struct PrefetchQueue {
    source: Arc<dyn FeedSource>,
    state: Arc<Mutex<FeedState>>,
    threshold: usize,
    pending: Option<JoinHandle<()>>,
}

impl PrefetchQueue {
    pub fn new(source: Arc<dyn FeedSource>, seen: SeenSet) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(FeedState {
                queue: VecDeque::new(),
                seen,
            })),
            threshold: DEFAULT_PREFETCH_THRESHOLD,
            pending: None,
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn len(&self) -> usize {
        lock(&self.state).queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn queued_ids(&self) -> Vec<String> {
        lock(&self.state).queue.iter().map(|b| b.id.clone()).collect()
    }

    pub fn mark_seen(&self, id: &str) -> bool {
        lock(&self.state).seen.mark_seen(id)
    }

    pub fn is_seen(&self, id: &str) -> bool {
        lock(&self.state).seen.contains(id)
    }

    pub fn seen_count(&self) -> usize {
        lock(&self.state).seen.len()
    }

    /// Puts `book` back at the head, e.g. when stepping back in the feed.
    pub fn push_front(&self, book: Book) {
        lock(&self.state).queue.push_front(book);
    }

    /// Appends placeholder content without consulting the seen set.
    /// Books already queued are still skipped.
    pub fn load_placeholders(&self, books: Vec<Book>) -> usize {
        let mut state = lock(&self.state);
        let mut queued: HashSet<String> = state.queue.iter().map(|b| b.id.clone()).collect();
        let mut added = 0;
        for book in books {
            if queued.insert(book.id.clone()) {
                state.queue.push_back(book);
                added += 1;
            }
        }
        added
    }

    /// Fetches one batch in the foreground and appends the unseen books.
    ///
    /// Any background refill in flight is cancelled first. On error the queue
    /// is left exactly as it was.
    pub async fn refill(&mut self) -> Result<usize> {
        self.cancel_pending();
        let batch = self.source.next_batch().await?;
        let fetched = batch.len();
        let added = lock(&self.state).append_unseen(batch);
        tracing::debug!("Refill appended {} of {} fetched books", added, fetched);
        Ok(added)
    }

    /// Pops the head of the queue, scheduling a refill when running low.
    ///
    /// An empty pop leaves a refill already in flight alone so that callers
    /// can [`settle`](Self::settle) on it.
    pub fn next_item(&mut self) -> Option<Book> {
        let (item, remaining) = {
            let mut state = lock(&self.state);
            let item = state.queue.pop_front();
            if let Some(book) = &item {
                state.seen.mark_seen(book.id.as_str());
            }
            (item, state.queue.len())
        };

        if item.is_none() && self.is_refilling() {
            return None;
        }
        if remaining < self.threshold {
            self.request_refill();
        }
        item
    }

    /// Starts a background refill, replacing any refill still in flight.
    pub fn request_refill(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime, skipping background refill");
            return;
        };

        self.cancel_pending();
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        self.pending = Some(runtime.spawn(async move {
            match source.next_batch().await {
                Ok(batch) => {
                    let added = lock(&state).append_unseen(batch);
                    tracing::debug!("Background refill appended {} books", added);
                }
                Err(e) => {
                    tracing::warn!("Background refill failed, queue unchanged: {}", e);
                }
            }
        }));
    }

    pub fn is_refilling(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Waits for the refill in flight, if any.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.pending.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!("Refill task panicked: {}", e);
                }
            }
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                tracing::debug!("Cancelling in-flight refill");
            }
            handle.abort();
        }
    }
}

impl Drop for PrefetchQueue {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{book, books, ScriptedFeed, Step};
    use crate::utils::error::BookFeedError;
    use std::time::Duration;

    fn queue_with(steps: Vec<Step>, seen: &[&str]) -> (PrefetchQueue, Arc<ScriptedFeed>) {
        let feed = Arc::new(ScriptedFeed::new(steps));
        let seen: SeenSet = seen.iter().map(|s| s.to_string()).collect();
        (PrefetchQueue::new(feed.clone(), seen), feed)
    }

    #[tokio::test]
    async fn test_refill_skips_seen_and_duplicate_ids() {
        let (mut queue, _) = queue_with(
            vec![
                Step::Batch(books(&["a", "b", "c", "b"])),
                Step::Batch(books(&["c", "d"])),
            ],
            &["b"],
        );

        assert_eq!(queue.refill().await.unwrap(), 2);
        assert_eq!(queue.refill().await.unwrap(), 1);
        assert_eq!(queue.queued_ids(), vec!["a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_failed_refill_leaves_queue_unchanged() {
        let (mut queue, _) = queue_with(vec![Step::Batch(books(&["a", "b"])), Step::Fail], &[]);

        queue.refill().await.unwrap();
        let result = queue.refill().await;

        assert!(matches!(result, Err(BookFeedError::HttpStatusError { status: 500 })));
        assert_eq!(queue.queued_ids(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_next_item_is_fifo_and_prefetches_below_threshold() {
        let (mut queue, feed) = queue_with(
            vec![
                Step::Batch(books(&["a", "b", "c", "d", "e"])),
                Step::Batch(books(&["f", "g"])),
            ],
            &[],
        );
        queue.refill().await.unwrap();

        assert_eq!(queue.next_item().map(|b| b.id), Some("a".to_string()));
        assert_eq!(queue.next_item().map(|b| b.id), Some("b".to_string()));
        assert!(!queue.is_refilling());
        assert_eq!(feed.calls(), 1);

        // Two left, below the threshold of three.
        assert_eq!(queue.next_item().map(|b| b.id), Some("c".to_string()));
        queue.settle().await;

        assert_eq!(feed.calls(), 2);
        assert_eq!(queue.queued_ids(), vec!["d", "e", "f", "g"]);
        assert!(queue.is_seen("a") && queue.is_seen("c"));
    }

    #[tokio::test]
    async fn test_new_refill_cancels_the_one_in_flight() {
        let (mut queue, feed) = queue_with(
            vec![
                Step::Delayed(Duration::from_millis(200), books(&["slow"])),
                Step::Batch(books(&["fast"])),
            ],
            &[],
        );

        queue.request_refill();
        tokio::task::yield_now().await;
        queue.request_refill();
        queue.settle().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(feed.calls(), 2);
        assert_eq!(queue.queued_ids(), vec!["fast"]);
    }

    #[tokio::test]
    async fn test_popped_items_are_not_requeued_by_refill() {
        let (mut queue, _) = queue_with(
            vec![Step::Batch(books(&["a"])), Step::Batch(books(&["a", "b"]))],
            &[],
        );
        queue.refill().await.unwrap();

        assert_eq!(queue.next_item().map(|b| b.id), Some("a".to_string()));
        queue.settle().await;
        assert_eq!(queue.queued_ids(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_empty_queue_pops_none_and_requests_refill() {
        let (mut queue, feed) = queue_with(vec![Step::Fail], &[]);

        assert!(queue.next_item().is_none());
        queue.settle().await;
        assert_eq!(feed.calls(), 1);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_empty_pop_keeps_refill_in_flight() {
        let (mut queue, feed) = queue_with(
            vec![
                Step::Delayed(Duration::from_millis(50), books(&["a"])),
                Step::Batch(books(&["b"])),
            ],
            &[],
        );

        queue.request_refill();
        assert!(queue.next_item().is_none());
        assert!(queue.is_refilling());
        queue.settle().await;

        assert_eq!(feed.calls(), 1);
        assert_eq!(queue.queued_ids(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_placeholders_and_push_front() {
        let (queue, _) = queue_with(vec![], &["a"]);

        assert_eq!(queue.load_placeholders(books(&["a", "b", "a"])), 2);
        queue.push_front(book("z"));
        assert_eq!(queue.queued_ids(), vec!["z", "a", "b"]);
    }

    #[test]
    fn test_next_item_without_runtime_still_pops() {
        let (mut queue, feed) = queue_with(vec![], &[]);
        queue.load_placeholders(books(&["a"]));

        assert_eq!(queue.next_item().map(|b| b.id), Some("a".to_string()));
        assert!(!queue.is_refilling());
        assert_eq!(feed.calls(), 0);
    }
}
