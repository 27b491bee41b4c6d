//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::{AuthApi, HealthApi, TodosApi};
use crate::error::{ApiError, Error, ErrorBody, Result, UNKNOWN_ERROR_CODE};
use crate::hooks::{LoggingNavigator, SharedNavigator, SharedNotifier, TracingNotifier};
use crate::interceptor::{self, Credential, Verdict};
use crate::messages;
use crate::refresh::RefreshCoordinator;
use crate::request::{FileUpload, FormPart, RequestBody, RequestDescriptor, RequestOptions};
use crate::session::{InMemoryTokenStore, SharedTokenStore, StorageKey, TokenPair};
use crate::types::{ApiResponse, DownloadedFile, RefreshTokenRequest};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for file downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Default path prefix every endpoint lives under.
pub const DEFAULT_API_PREFIX: &str = "api";

/// Default refresh-exchange endpoint, relative to the API prefix.
pub const DEFAULT_REFRESH_ENDPOINT: &str = "auth/manager/reset/token";

/// Default login endpoint, relative to the API prefix.
pub const DEFAULT_LOGIN_ENDPOINT: &str = "auth/manager/login";

/// Todo API client.
///
/// Cloning is cheap; clones share the HTTP pool, the token store and the
/// refresh coordinator, so at most one refresh exchange is in flight across
/// all of them.
///
/// # Example
///
/// ```no_run
/// use todo_client::{ListTodosQuery, TodoClient};
///
/// # async fn example() -> todo_client::Result<()> {
/// let client = TodoClient::builder()
///     .base_url("http://localhost:3000")
///     .build()?;
///
/// let page = client.todos().list(ListTodosQuery::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TodoClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL including the API prefix, always ending in `/`.
    pub(crate) base_url: Url,
    /// Request timeout.
    pub(crate) timeout: Duration,
    pub(crate) refresh_path: String,
    pub(crate) login_path: String,
    pub(crate) store: SharedTokenStore,
    pub(crate) notifier: SharedNotifier,
    pub(crate) navigator: SharedNavigator,
    pub(crate) coordinator: RefreshCoordinator,
    /// Default bearer for future requests; set by login and refresh, cleared
    /// when the session ends. Falls back to the token store when unset.
    pub(crate) bearer: RwLock<Option<String>>,
}

/// Outcome of a single trip through the pipeline.
enum Attempt {
    Done(reqwest::Response),
    /// Recoverable 401. Carries the bearer the client attached, if it
    /// attached one; caller-supplied credentials are `None`.
    Refresh { sent: Option<String> },
}

impl TodoClient {
    /// Get access to the inner client state (for API implementations).
    pub(crate) fn inner(&self) -> &ClientInner {
        &self.inner
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL (including the API prefix).
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The token store backing this client.
    pub fn store(&self) -> &SharedTokenStore {
        &self.inner.store
    }

    /// Whether a refresh exchange is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the todos API.
    pub fn todos(&self) -> TodosApi {
        TodosApi::new(self.clone())
    }

    /// Access the auth API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the health API.
    pub fn health(&self) -> HealthApi {
        HealthApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Generic request helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.execute(RequestDescriptor::get(path).with_options(options))
            .await
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_query<T, Q>(
        &self,
        path: &str,
        query: &Q,
        options: RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let request = RequestDescriptor::get(path)
            .query(query)?
            .with_options(options);
        self.execute(request).await
    }

    /// Make a POST request.
    pub async fn post<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let request = RequestDescriptor::post(path).json(body)?.with_options(options);
        self.execute(request).await
    }

    /// Make a PATCH request.
    pub async fn patch<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let request = RequestDescriptor::patch(path).json(body)?.with_options(options);
        self.execute(request).await
    }

    /// Make a DELETE request carrying a JSON body.
    pub async fn delete_with_body<T, B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let request = RequestDescriptor::delete(path).json(body)?.with_options(options);
        self.execute(request).await
    }

    /// Upload a file as multipart form data.
    ///
    /// The file goes in the `file` field; `target` is sent as `path` when given.
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file: FileUpload,
        target: Option<&str>,
        options: RequestOptions,
    ) -> Result<T> {
        let mut parts = vec![FormPart::File {
            name: "file".to_string(),
            file,
        }];
        if let Some(target) = target {
            parts.push(FormPart::Text {
                name: "path".to_string(),
                value: target.to_string(),
            });
        }
        let request = RequestDescriptor::post(path)
            .multipart(parts)
            .with_options(options);
        self.execute(request).await
    }

    /// Download a file the server returns as a base64 `payload`.
    ///
    /// `file_name` only picks the MIME type; it is not sent. The timeout
    /// defaults to [`DOWNLOAD_TIMEOUT`].
    pub async fn download_file<B>(
        &self,
        path: &str,
        body: &B,
        file_name: Option<&str>,
        options: RequestOptions,
    ) -> Result<DownloadedFile>
    where
        B: serde::Serialize + ?Sized,
    {
        let mut request = RequestDescriptor::post(path).json(body)?;
        request.timeout = Some(DOWNLOAD_TIMEOUT);
        let request = request.with_options(options);

        let envelope: ApiResponse<Option<String>> = self.execute(request).await?;
        let encoded = envelope
            .payload
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::Decode("response carries no base64 payload".to_string()))?;
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Decode(format!("invalid base64 payload: {}", e)))?;

        let mime_type = file_name
            .map(|name| mime_guess::from_path(name).first_or_octet_stream().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        tracing::debug!(path, size = bytes.len(), mime_type = %mime_type, "File downloaded");

        Ok(DownloadedFile {
            bytes,
            mime_type,
            file_name: file_name.map(str::to_string),
        })
    }

    /// Send a request and decode its JSON body.
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        let response = self.send(request).await?;
        decode(response).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request through the full pipeline.
    ///
    /// A recoverable 401 is never returned: the caller gets either the
    /// response to the replayed request or a terminal error.
    pub async fn send(&self, request: RequestDescriptor) -> Result<reqwest::Response> {
        match self.attempt(&request).await? {
            Attempt::Done(response) => Ok(response),
            Attempt::Refresh { sent } => {
                let replay = self.recover(request, sent).await?;
                match self.attempt(&replay).await? {
                    Attempt::Done(response) => Ok(response),
                    // Unreachable for a retried request; fail closed anyway.
                    Attempt::Refresh { .. } => Err(Error::Unauthorized(ApiError::new(
                        401,
                        messages::UNAUTHORIZED,
                        UNKNOWN_ERROR_CODE,
                    ))),
                }
            }
        }
    }

    /// One trip: attach credentials, transmit, classify.
    async fn attempt(&self, request: &RequestDescriptor) -> Result<Attempt> {
        let mut outbound = request.clone();
        let token = if interceptor::wants_token(&outbound) {
            self.access_token().await
        } else {
            None
        };
        let credential = interceptor::apply_credentials(&mut outbound, token.as_deref());
        let sent = match credential {
            Credential::Bearer => sent_bearer(&outbound.headers),
            _ => None,
        };

        let url = self.url(&outbound.path)?;
        let mut builder = self
            .inner
            .http
            .request(outbound.method.clone(), url)
            .headers(outbound.headers)
            .timeout(outbound.timeout.unwrap_or(self.inner.timeout));
        if !outbound.query.is_empty() {
            builder = builder.query(&outbound.query);
        }
        match &outbound.body {
            Some(RequestBody::Json(body)) => builder = builder.json(body),
            Some(RequestBody::Multipart(parts)) => {
                builder = builder.multipart(crate::request::build_form(parts)?)
            }
            None => {}
        }

        tracing::debug!(
            method = %outbound.method,
            path = %outbound.path,
            retried = outbound.retried,
            "API request"
        );

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(method = %outbound.method, path = %outbound.path, error = %e, "Network error");
                return Err(interceptor::transport_error(&e));
            }
        };

        let status = response.status();
        tracing::debug!(path = %outbound.path, status = status.as_u16(), "API response");
        if status.is_success() {
            return Ok(Attempt::Done(response));
        }

        let bytes = response.bytes().await.unwrap_or_default();
        match interceptor::classify(
            request,
            status,
            ErrorBody::parse(&bytes),
            &self.inner.refresh_path,
        ) {
            Verdict::Refresh => Ok(Attempt::Refresh { sent }),
            Verdict::EndSession(error) => {
                tracing::warn!(path = %outbound.path, "Refresh endpoint rejected the session");
                self.end_session().await;
                Err(error)
            }
            Verdict::Reject { error, notices } => {
                for notice in notices {
                    self.inner.notifier.notify(&notice.message, notice.severity);
                }
                Err(error)
            }
        }
    }

    /// Turn a recoverable 401 into a replayable request with a fresh token.
    async fn recover(
        &self,
        mut request: RequestDescriptor,
        sent: Option<String>,
    ) -> Result<RequestDescriptor> {
        let session = match self.inner.store.token_pair().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session");
                None
            }
        };
        if session.is_none() {
            self.end_session().await;
            return Err(Error::session_expired(
                messages::NO_VALID_SESSION,
                "NO_VALID_SESSION",
            ));
        }

        request.retried = true;

        // The token was rotated after this request left; no new exchange needed.
        if let Some(sent) = sent.as_deref()
            && !self.inner.coordinator.is_refreshing()
            && let Some(current) = self.access_token().await
            && sent != current
        {
            tracing::debug!(path = %request.path, "Replaying with already-rotated token");
            request.set_bearer(&current);
            return Ok(request);
        }

        let token = self
            .inner
            .coordinator
            .refresh(|| self.refresh_token())
            .await?;
        request.set_bearer(&token);
        Ok(request)
    }

    /// Run one refresh exchange against the auth endpoint.
    ///
    /// This bypasses single-flight coordination; use [`AuthApi::refresh`] to
    /// refresh outside the 401 path. Any failure ends the session.
    pub async fn refresh_token(&self) -> Result<String> {
        let refresh_token = match self.inner.store.get(StorageKey::RefreshToken).await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                self.end_session().await;
                return Err(Error::session_expired(
                    messages::NO_REFRESH_TOKEN,
                    "NO_REFRESH_TOKEN",
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read refresh token");
                self.end_session().await;
                return Err(Error::session_expired(
                    messages::NO_REFRESH_TOKEN,
                    "NO_REFRESH_TOKEN",
                ));
            }
        };

        match self.exchange(&refresh_token).await {
            Ok(pair) => {
                tracing::info!("Access token refreshed");
                Ok(pair.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.end_session().await;
                Err(Error::SessionExpired(e.api_error()))
            }
        }
    }

    /// POST the refresh token and persist the pair the server hands back.
    async fn exchange(&self, refresh_token: &str) -> Result<TokenPair> {
        let request = RequestDescriptor::post(self.inner.refresh_path.as_str())
            .json(&RefreshTokenRequest { refresh_token })?
            .skip_auth();

        let response = match self.attempt(&request).await? {
            Attempt::Done(response) => response,
            Attempt::Refresh { .. } => {
                return Err(Error::Unauthorized(ApiError::new(
                    401,
                    messages::UNAUTHORIZED,
                    UNKNOWN_ERROR_CODE,
                )));
            }
        };
        let envelope: ApiResponse<TokenPair> = decode(response).await?;
        self.store_session(&envelope.payload).await?;
        Ok(envelope.payload)
    }

    /// Persist a new token pair and make it the default bearer.
    pub(crate) async fn store_session(&self, pair: &TokenPair) -> Result<()> {
        self.inner.store.save_token_pair(pair).await?;
        *self.inner.bearer.write() = Some(pair.access_token.clone());
        Ok(())
    }

    /// Unrecoverable auth failure: clear session state and go to login.
    ///
    /// The remembered login identifier survives.
    pub async fn end_session(&self) {
        self.clear_session().await;
        self.inner.navigator.redirect_to_login();
    }

    /// Drop the tokens and user info without redirecting.
    pub async fn clear_session(&self) {
        *self.inner.bearer.write() = None;
        for key in StorageKey::SESSION {
            if let Err(e) = self.inner.store.remove(key).await {
                tracing::warn!(key = key.as_str(), error = %e, "Failed to clear session value");
            }
        }
        tracing::info!("Session cleared");
    }

    /// Current access token: the default bearer, else the stored one.
    async fn access_token(&self) -> Option<String> {
        let cached = self.inner.bearer.read().clone();
        if cached.is_some() {
            return cached;
        }
        match self.inner.store.get(StorageKey::AccessToken).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read access token");
                None
            }
        }
    }

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner.base_url.join(path).map_err(Error::from)
    }
}

/// Decode a success body.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| interceptor::transport_error(&e))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
}

fn sent_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Builder for creating a TodoClient.
pub struct ClientBuilder {
    base_url: Option<String>,
    api_prefix: String,
    auth_token: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    refresh_endpoint: String,
    login_endpoint: String,
    store: Option<SharedTokenStore>,
    notifier: Option<SharedNotifier>,
    navigator: Option<SharedNavigator>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            refresh_endpoint: DEFAULT_REFRESH_ENDPOINT.to_string(),
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_string(),
            store: None,
            notifier: None,
            navigator: None,
        }
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the path prefix all endpoints live under (empty for none).
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Seed the default bearer token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the refresh-exchange endpoint.
    pub fn refresh_endpoint(mut self, path: impl Into<String>) -> Self {
        self.refresh_endpoint = path.into();
        self
    }

    /// Set the login endpoint.
    pub fn login_endpoint(mut self, path: impl Into<String>) -> Self {
        self.login_endpoint = path.into();
        self
    }

    /// Set the token store. Defaults to an in-memory store.
    pub fn token_store(mut self, store: SharedTokenStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the notification sink. Defaults to logging.
    pub fn notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set the navigator invoked when a session ends. Defaults to logging.
    pub fn navigator(mut self, navigator: SharedNavigator) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<TodoClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let prefix = self.api_prefix.trim_matches('/');
        if !prefix.is_empty() {
            base_url = base_url.join(&format!("{}/", prefix))?;
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("todo-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let store = self.store.unwrap_or_else(|| {
            tracing::debug!("No token store configured; session will not persist");
            Arc::new(InMemoryTokenStore::new())
        });

        Ok(TodoClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                refresh_path: self.refresh_endpoint.trim_matches('/').to_string(),
                login_path: self.login_endpoint.trim_matches('/').to_string(),
                store,
                notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(LoggingNavigator)),
                coordinator: RefreshCoordinator::new(),
                bearer: RwLock::new(self.auth_token.filter(|t| !t.is_empty())),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = ClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_appends_prefix() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000")
            .build()
            .unwrap();

        assert_eq!(client.base_url().as_str(), "http://localhost:3000/api/");
    }

    #[test]
    fn test_builder_without_prefix() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000/")
            .api_prefix("")
            .build()
            .unwrap();

        assert_eq!(client.base_url().as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_builder_keeps_base_path() {
        let client = ClientBuilder::new()
            .base_url("http://example.com/todo-app")
            .api_prefix("/v2/")
            .build()
            .unwrap();

        assert_eq!(client.base_url().as_str(), "http://example.com/todo-app/v2/");
    }

    #[test]
    fn test_url_building() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000")
            .build()
            .unwrap();

        let url = client.url("todos").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/todos");

        let url = client.url("/todos/3").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/todos/3");
    }

    #[test]
    fn test_endpoints_are_normalized() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000")
            .refresh_endpoint("/auth/refresh/")
            .build()
            .unwrap();

        assert_eq!(client.inner().refresh_path, "auth/refresh");
        assert_eq!(client.inner().login_path, DEFAULT_LOGIN_ENDPOINT);
    }

    #[test]
    fn test_sent_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(sent_bearer(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(sent_bearer(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(sent_bearer(&headers).as_deref(), Some("abc"));
    }
}
