use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::model::{BookStatus, SwipeType};
use crate::domain::ports::UserStore;
use crate::utils::error::Result;

/// Persists feed interactions in the background.
///
/// Calls return immediately; failures are logged and dropped. Without a
/// signed-in user nothing is sent. The returned handle may be ignored.
#[derive(Clone)]
pub struct InteractionRecorder {
    store: Arc<dyn UserStore>,
    user_id: Option<Uuid>,
}

impl InteractionRecorder {
    pub fn new(store: Arc<dyn UserStore>, user_id: Option<Uuid>) -> Self {
        Self { store, user_id }
    }

    pub fn record_swipe(&self, google_books_id: &str, action: SwipeType) -> Option<JoinHandle<()>> {
        let user_id = self.user_id?;
        let store = Arc::clone(&self.store);
        let id = google_books_id.to_string();
        let what = format!("{} swipe on {}", action.as_str(), id);
        spawn_logged(what, async move { store.record_swipe(user_id, &id, action).await })
    }

    pub fn save_to_library(&self, google_books_id: &str) -> Option<JoinHandle<()>> {
        let user_id = self.user_id?;
        let store = Arc::clone(&self.store);
        let id = google_books_id.to_string();
        let what = format!("library add of {}", id);
        spawn_logged(what, async move {
            store
                .add_user_book(user_id, &id, BookStatus::WantToRead)
                .await
                .map(|_| ())
        })
    }
}

fn spawn_logged<F>(what: String, task: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::warn!("No async runtime, dropping {}", what);
        return None;
    };

    Some(runtime.spawn(async move {
        match task.await {
            Ok(()) => tracing::debug!("Recorded {}", what),
            Err(e) => tracing::warn!("Failed to record {}: {}", what, e),
        }
    }))
}
