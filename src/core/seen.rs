use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::ports::UserStore;

/// Ids of books already shown to the user in this session or earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the user's swipe history. Any failure, or no user at all,
    /// yields an empty set.
    pub async fn load(store: &dyn UserStore, user_id: Option<Uuid>) -> Self {
        let Some(user_id) = user_id else {
            tracing::debug!("No signed-in user, starting with an empty seen set");
            return Self::new();
        };

        match store.fetch_swiped_book_ids(user_id).await {
            Ok(ids) => {
                tracing::debug!("Loaded {} previously swiped books", ids.len());
                Self { ids }
            }
            Err(e) => {
                tracing::warn!("Could not load swipe history, continuing without it: {}", e);
                Self::new()
            }
        }
    }

    /// Returns `true` when the id was not seen before.
    pub fn mark_seen(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for SeenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::MemoryStore;
    use crate::domain::model::AuthSession;

    #[tokio::test]
    async fn test_load_uses_remote_history() {
        let store = MemoryStore::with_history(&["a", "b"]);
        let seen = SeenSet::load(&store, Some(AuthSession::DEMO_USER_ID)).await;
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("a"));
    }

    #[tokio::test]
    async fn test_load_fails_open() {
        let failing = MemoryStore::failing();
        assert!(SeenSet::load(&failing, Some(AuthSession::DEMO_USER_ID)).await.is_empty());

        let store = MemoryStore::with_history(&["a"]);
        assert!(SeenSet::load(&store, None).await.is_empty());
    }

    #[test]
    fn test_mark_seen_is_idempotent() {
        let mut once = SeenSet::new();
        assert!(once.mark_seen("a"));

        let mut twice = SeenSet::new();
        assert!(twice.mark_seen("a"));
        assert!(!twice.mark_seen("a"));

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
        assert!(twice.contains("a"));
        assert!(!twice.contains("b"));
    }
}
