use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::model::AuthSession;
use crate::domain::ports::Storage;
use crate::utils::error::{BookFeedError, Result};
use crate::utils::validation::validate_non_empty_string;

pub const SESSION_FILE: &str = "session.json";
const FALLBACK_DISPLAY_NAME: &str = "Reader";

#[derive(Serialize)]
struct IdTokenGrant<'a> {
    provider: &'a str,
    id_token: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
}

/// Exchanges an identity-provider token for a backend session.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    pub async fn exchange_id_token(
        &self,
        provider: &str,
        id_token: &str,
        display_name: Option<String>,
    ) -> Result<AuthSession> {
        validate_non_empty_string("id_token", id_token)?;

        tracing::debug!("Exchanging {} identity token", provider);
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "id_token")])
            .header("apikey", &self.anon_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&IdTokenGrant { provider, id_token })
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(BookFeedError::AuthError {
                message: format!("token exchange returned {}", response.status()),
            });
        }

        let body: TokenResponse = response.json().await?;
        let user_id = Uuid::parse_str(&body.user.id).map_err(|_| BookFeedError::AuthError {
            message: format!("invalid user id from server: {}", body.user.id),
        })?;

        Ok(AuthSession {
            user_id,
            display_name,
            access_token: body.access_token,
            refresh_token: body.refresh_token,
        })
    }
}

/// Persists the signed-in session between runs.
pub struct SessionStore<S: Storage> {
    storage: S,
}

impl<S: Storage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// A missing or unreadable session file means nobody is signed in.
    pub async fn restore(&self) -> Option<AuthSession> {
        let data = self.storage.read_file(SESSION_FILE).await.ok()?;
        match serde_json::from_slice(&data) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Ignoring corrupt session file: {}", e);
                None
            }
        }
    }

    /// Stores `session`, keeping the previously stored display name when the
    /// provider did not send one.
    pub async fn save(&self, mut session: AuthSession) -> Result<AuthSession> {
        if session.display_name.is_none() {
            let previous = self.restore().await.and_then(|s| s.display_name);
            session.display_name =
                Some(previous.unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string()));
        }

        let data = serde_json::to_vec_pretty(&session)?;
        self.storage.write_file(SESSION_FILE, &data).await?;
        tracing::info!("Signed in as {}", session.user_id);
        Ok(session)
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.remove_file(SESSION_FILE).await?;
        tracing::info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn auth_client(server: &MockServer) -> AuthClient {
        AuthClient::new(server.base_url(), "anon-key", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_exchange_id_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "id_token")
                .header("apikey", "anon-key")
                .body_contains("\"provider\":\"apple\"")
                .body_contains("\"id_token\":\"abc\"");
            then.status(200).json_body(serde_json::json!({
                "access_token": "access",
                "refresh_token": "refresh",
                "user": {"id": "00000000-0000-0000-0000-000000000001"}
            }));
        });

        let session = auth_client(&server)
            .exchange_id_token("apple", "abc", Some("Ada".to_string()))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(session.user_id, AuthSession::DEMO_USER_ID);
        assert_eq!(session.access_token, "access");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(session.display_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_exchange_rejects_bad_status_and_user_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v1/token").body_contains("\"id_token\":\"denied\"");
            then.status(400);
        });
        server.mock(|when, then| {
            when.method(POST).path("/auth/v1/token").body_contains("\"id_token\":\"weird\"");
            then.status(200).json_body(serde_json::json!({
                "access_token": "a",
                "user": {"id": "not-a-uuid"}
            }));
        });

        let client = auth_client(&server);
        assert!(matches!(
            client.exchange_id_token("apple", "denied", None).await,
            Err(BookFeedError::AuthError { .. })
        ));
        assert!(matches!(
            client.exchange_id_token("apple", "weird", None).await,
            Err(BookFeedError::AuthError { .. })
        ));
        assert!(client.exchange_id_token("apple", "  ", None).await.is_err());
    }

    #[tokio::test]
    async fn test_session_store_save_restore_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(LocalStorage::new(dir.path().to_string_lossy().to_string()));

        assert!(store.restore().await.is_none());

        let saved = store.save(AuthSession::demo()).await.unwrap();
        assert_eq!(store.restore().await, Some(saved));

        store.clear().await.unwrap();
        assert!(store.restore().await.is_none());
        // Clearing twice is fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_display_name_falls_back_to_previous_then_reader() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(LocalStorage::new(dir.path().to_string_lossy().to_string()));

        let mut anonymous = AuthSession::demo();
        anonymous.display_name = None;
        let first = store.save(anonymous.clone()).await.unwrap();
        assert_eq!(first.display_name.as_deref(), Some("Reader"));

        let mut named = AuthSession::demo();
        named.display_name = Some("Ada".to_string());
        store.save(named).await.unwrap();

        let again = store.save(anonymous).await.unwrap();
        assert_eq!(again.display_name.as_deref(), Some("Ada"));
    }
}
