use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::model::Book;
use crate::domain::ports::{BookCatalog, FeedSource, SearchRequest};
use crate::utils::error::Result;

const FALLBACK_TOPIC: &str = "fiction";

/// Feed source that cycles through subject searches.
///
/// Topics are visited round-robin. Every full rotation moves each topic one
/// page further, so a long session keeps getting new results per subject.
pub struct TopicFeed {
    catalog: Arc<dyn BookCatalog>,
    topics: Vec<String>,
    batch_size: u32,
    order_by: String,
    turn: AtomicUsize,
}

impl TopicFeed {
    pub fn new(catalog: Arc<dyn BookCatalog>, topics: Vec<String>, batch_size: u32) -> Self {
        let mut topics: Vec<String> = topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            topics.push(FALLBACK_TOPIC.to_string());
        }

        Self {
            catalog,
            topics,
            batch_size: batch_size.max(1),
            order_by: "relevance".to_string(),
            turn: AtomicUsize::new(0),
        }
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    fn next_request(&self) -> SearchRequest {
        let turn = self.turn.fetch_add(1, Ordering::Relaxed);
        let topic = &self.topics[turn % self.topics.len()];
        let page = (turn / self.topics.len()) as u32;

        SearchRequest::new(format!("subject:{}", topic))
            .start_index(page.saturating_mul(self.batch_size))
            .max_results(self.batch_size)
            .order_by(self.order_by.clone())
    }
}

#[async_trait]
impl FeedSource for TopicFeed {
    async fn next_batch(&self) -> Result<Vec<Book>> {
        let request = self.next_request();
        tracing::debug!("Fetching feed batch for {:?}", request.query);
        self.catalog.search(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::RecordingCatalog;

    #[tokio::test]
    async fn test_rotates_topics_and_pages() {
        let catalog = Arc::new(RecordingCatalog::default());
        let feed = TopicFeed::new(
            catalog.clone(),
            vec!["fiction".to_string(), " ".to_string(), "history".to_string()],
            10,
        );

        for _ in 0..5 {
            feed.next_batch().await.unwrap();
        }

        let seen: Vec<(String, u32, u32)> = catalog
            .requests()
            .into_iter()
            .map(|r| (r.query, r.start_index, r.max_results))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("subject:fiction".to_string(), 0, 10),
                ("subject:history".to_string(), 0, 10),
                ("subject:fiction".to_string(), 10, 10),
                ("subject:history".to_string(), 10, 10),
                ("subject:fiction".to_string(), 20, 10),
            ]
        );
    }

    #[test]
    fn test_empty_topic_list_falls_back() {
        let feed = TopicFeed::new(Arc::new(RecordingCatalog::default()), vec![], 0);
        assert_eq!(feed.topics(), ["fiction".to_string()]);
        assert_eq!(feed.next_request().max_results, 1);
    }
}
