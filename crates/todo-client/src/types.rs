//! Request and response types for the Todo API.
//!
//! These types mirror the server's API contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Standard response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Human readable status message.
    #[serde(default)]
    pub message: String,
    /// Machine readable status code (e.g. `SUCCESS`).
    #[serde(default)]
    pub code: String,
    /// HTTP status echoed by the server.
    #[serde(default)]
    pub status_code: u16,
    /// Error details, if any.
    #[serde(default)]
    pub errors: Option<Vec<String>>,
    /// The actual response data.
    pub payload: T,
}

/// Payload of list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPayload<T> {
    pub list: Vec<T>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// Payload returned by create and update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IdPayload {
    pub id: u64,
}

/// Payload returned by delete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeletedPayload {
    pub deleted: u64,
}

/// A file decoded from a base64 download response.
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    /// Guessed from the requested file name; `application/octet-stream` otherwise.
    pub mime_type: String,
    pub file_name: Option<String>,
}

impl std::fmt::Debug for DownloadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadedFile")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Todos
// ─────────────────────────────────────────────────────────────────────────────

/// A todo item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Missing or null tags decode as an empty list.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sortable columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBy {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query parameters for listing todos.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTodosQuery {
    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Items per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Title substring filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
}

impl ListTodosQuery {
    pub fn validate(&self) -> Result<()> {
        if self.page == Some(0) {
            return Err(Error::InvalidRequest("page must be at least 1".to_string()));
        }
        if self.size == Some(0) {
            return Err(Error::InvalidRequest("size must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Request to create a todo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl CreateTodoRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Same rules as the server's create DTO: both strings non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(Error::InvalidRequest("title should not be empty".to_string()));
        }
        if self.content.is_empty() {
            return Err(Error::InvalidRequest("content should not be empty".to_string()));
        }
        Ok(())
    }
}

/// Request to update a todo. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl UpdateTodoRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.image.is_none()
            && self.content.is_none()
            && self.completed.is_none()
            && self.tags.is_none()
    }
}

/// Body of the bulk delete endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTodosRequest {
    pub ids: Vec<u64>,
}

impl DeleteTodosRequest {
    pub fn validate(&self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(Error::InvalidRequest(
                "ids must contain at least 1 element".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Login credentials.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Login response payload: a token pair plus whatever the server says about
/// the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, alias = "userInfo")]
    pub user: Option<serde_json::Value>,
}

/// Refresh exchange body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}
