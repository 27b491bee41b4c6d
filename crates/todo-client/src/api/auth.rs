//! Auth API.

use crate::client::TodoClient;
use crate::error::{Error, Result};
use crate::request::RequestOptions;
use crate::session::{StorageKey, TokenPair};
use crate::types::{ApiResponse, LoginPayload, LoginRequest};

/// Auth API client.
pub struct AuthApi {
    client: TodoClient,
}

impl AuthApi {
    pub(crate) fn new(client: TodoClient) -> Self {
        Self { client }
    }

    /// Log in and persist the session.
    ///
    /// With `remember`, the email is kept as the remembered login identifier;
    /// without it, any previously remembered identifier is forgotten.
    pub async fn login(&self, email: &str, password: &str, remember: bool) -> Result<TokenPair> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let path = self.client.inner().login_path.clone();
        let response: ApiResponse<LoginPayload> = self
            .client
            .post(&path, &request, RequestOptions::anonymous())
            .await?;

        let LoginPayload {
            access_token,
            refresh_token,
            user,
        } = response.payload;
        let pair = TokenPair::new(access_token, refresh_token);
        self.client.store_session(&pair).await?;

        let store = self.client.store();
        match user {
            Some(user) => {
                let json = serde_json::to_string(&user)
                    .map_err(|e| Error::Store(format!("Failed to serialize user info: {}", e)))?;
                store.set(StorageKey::UserInfo, &json).await?;
            }
            None => store.remove(StorageKey::UserInfo).await?,
        }

        if remember {
            store.set(StorageKey::RememberedLogin, email).await?;
        } else {
            store.remove(StorageKey::RememberedLogin).await?;
        }

        tracing::info!(email, "Logged in");
        Ok(pair)
    }

    /// End the session locally. There is no server-side logout.
    ///
    /// The navigator is not called; the caller asked for this.
    pub async fn logout(&self) {
        self.client.clear_session().await;
    }

    /// Refresh the access token, sharing any exchange already in flight.
    pub async fn refresh(&self) -> Result<String> {
        let client = &self.client;
        client
            .inner()
            .coordinator
            .refresh(|| client.refresh_token())
            .await
    }

    /// The stored token pair, if a session exists.
    pub async fn session(&self) -> Result<Option<TokenPair>> {
        self.client.store().token_pair().await
    }

    /// The remembered login identifier, if any.
    pub async fn remembered_login(&self) -> Result<Option<String>> {
        self.client.store().get(StorageKey::RememberedLogin).await
    }

    /// The user info stored at login, if any.
    pub async fn user_info(&self) -> Result<Option<serde_json::Value>> {
        match self.client.store().get(StorageKey::UserInfo).await? {
            Some(json) => Ok(serde_json::from_str(&json).ok()),
            None => Ok(None),
        }
    }
}
