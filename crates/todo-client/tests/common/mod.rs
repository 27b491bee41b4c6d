//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use todo_client::{InMemoryTokenStore, Severity, StorageKey, TodoClient, TokenStore};
use wiremock::MockServer;

pub const REFRESH_PATH: &str = "/api/auth/manager/reset/token";
pub const LOGIN_PATH: &str = "/api/auth/manager/login";

/// A client wired to a mock server, with recording hooks.
pub struct Harness {
    pub server: MockServer,
    pub client: TodoClient,
    pub store: Arc<InMemoryTokenStore>,
    pub notices: Arc<Mutex<Vec<(String, Severity)>>>,
    pub redirects: Arc<AtomicUsize>,
}

impl Harness {
    /// Start a mock server and a client whose store holds the given tokens.
    pub async fn start(access: Option<&str>, refresh: Option<&str>) -> Self {
        let server = MockServer::start().await;
        Self::with_server(server, access, refresh).await
    }

    pub async fn with_server(server: MockServer, access: Option<&str>, refresh: Option<&str>) -> Self {
        let uri = server.uri();
        Self::with_base_url(server, &uri, access, refresh).await
    }

    pub async fn with_base_url(
        server: MockServer,
        base_url: &str,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> Self {
        let store = Arc::new(InMemoryTokenStore::new());
        if let Some(access) = access {
            store.set(StorageKey::AccessToken, access).await.unwrap();
        }
        if let Some(refresh) = refresh {
            store.set(StorageKey::RefreshToken, refresh).await.unwrap();
        }

        let notices = Arc::new(Mutex::new(Vec::new()));
        let redirects = Arc::new(AtomicUsize::new(0));

        let captured = notices.clone();
        let counter = redirects.clone();
        let client = TodoClient::builder()
            .base_url(base_url)
            .token_store(store.clone())
            .notifier(Arc::new(move |message: &str, severity: Severity| {
                captured.lock().unwrap().push((message.to_string(), severity));
            }))
            .navigator(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .unwrap();

        Self {
            server,
            client,
            store,
            notices,
            redirects,
        }
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }

    pub fn notice_messages(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    /// Authorization headers of every received request to `path`.
    pub async fn authorizations(&self, path: &str) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .map(|r| {
                r.headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .collect()
    }

    pub async fn request_count(&self, path: &str) -> usize {
        self.authorizations(path).await.len()
    }

    pub async fn stored(&self, key: StorageKey) -> Option<String> {
        self.store.get(key).await.unwrap()
    }
}

/// Success envelope around `payload`.
pub fn envelope(payload: Value) -> Value {
    json!({
        "message": "Success",
        "code": "SUCCESS",
        "statusCode": 200,
        "errors": null,
        "payload": payload,
    })
}

/// A todo item as the server renders it.
pub fn todo_json(id: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Todo {}", id),
        "image": null,
        "content": "content",
        "completed": false,
        "tags": [],
        "createdAt": "2025-01-02T03:04:05.000Z",
        "updatedAt": "2025-01-02T03:04:05.000Z",
    })
}

pub fn token_envelope(access: &str, refresh: &str) -> Value {
    envelope(json!({ "accessToken": access, "refreshToken": refresh }))
}

pub fn unauthorized_body() -> Value {
    json!({ "message": "Unauthorized", "statusCode": 401 })
}
