//! Authenticated HTTP client for the Todo API.
//!
//! Every request passes through a small pipeline: credentials are attached,
//! the request is sent, and failures are classified. A 401 on an
//! authenticated request triggers a single-flight token refresh; requests
//! that hit 401 while a refresh is running wait for it and are replayed with
//! the new token. Callers only ever see the replayed response or a terminal
//! error.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo_client::{CreateTodoRequest, FileTokenStore, ListTodosQuery, Result, TodoClient};
//!
//! # async fn example() -> Result<()> {
//! let client = TodoClient::builder()
//!     .base_url("http://localhost:3000")
//!     .token_store(Arc::new(FileTokenStore::new("/tmp/todo-session.json")))
//!     .build()?;
//!
//! client.auth().login("me@example.com", "secret", true).await?;
//!
//! let id = client
//!     .todos()
//!     .create(CreateTodoRequest::new("Buy milk", "2 litres"))
//!     .await?;
//! let todo = client.todos().detail(id).await?;
//! println!("{}: {}", todo.id, todo.title);
//!
//! let page = client.todos().list(ListTodosQuery::default()).await?;
//! println!("{} todos", page.total_count.unwrap_or(0));
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`interceptor`]: request stage (credentials) and response stage (classification)
//! - [`refresh`]: single-flight refresh coordination
//! - [`session`]: durable token store
//! - [`hooks`]: notification and navigation seams

pub mod api;
pub mod client;
pub mod error;
pub mod hooks;
pub mod interceptor;
pub mod messages;
pub mod refresh;
pub mod request;
pub mod session;
pub mod types;

pub use client::{
    ClientBuilder, DEFAULT_API_PREFIX, DEFAULT_LOGIN_ENDPOINT, DEFAULT_REFRESH_ENDPOINT,
    DOWNLOAD_TIMEOUT, TodoClient,
};
pub use error::{ApiError, Error, Result};
pub use hooks::{Navigator, NotificationSink, Severity};
pub use refresh::RefreshCoordinator;
pub use request::{BasicAuth, FileUpload, FormPart, RequestBody, RequestDescriptor, RequestOptions};
pub use session::{FileTokenStore, InMemoryTokenStore, SharedTokenStore, StorageKey, TokenPair, TokenStore};
pub use types::*;
