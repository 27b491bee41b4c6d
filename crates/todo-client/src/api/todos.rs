//! Todos API.

use crate::client::TodoClient;
use crate::error::Result;
use crate::request::RequestOptions;
use crate::types::{
    ApiResponse, CreateTodoRequest, DeleteTodosRequest, DeletedPayload, IdPayload,
    ListPayload, ListTodosQuery, TodoItem, UpdateTodoRequest,
};

const TODOS: &str = "todos";

/// Todos API client.
pub struct TodosApi {
    client: TodoClient,
    options: RequestOptions,
}

impl TodosApi {
    pub(crate) fn new(client: TodoClient) -> Self {
        Self {
            client,
            options: RequestOptions::default(),
        }
    }

    /// Use these options for every call made through this handle.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// List todos, one page at a time.
    pub async fn list(&self, query: ListTodosQuery) -> Result<ListPayload<TodoItem>> {
        query.validate()?;
        let response: ApiResponse<ListPayload<TodoItem>> = self
            .client
            .get_with_query(TODOS, &query, self.options.clone())
            .await?;
        Ok(response.payload)
    }

    /// List todos whose title contains `keyword`.
    pub async fn search(&self, keyword: &str) -> Result<ListPayload<TodoItem>> {
        self.list(ListTodosQuery {
            keyword: Some(keyword.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Get a todo by ID.
    pub async fn detail(&self, id: u64) -> Result<TodoItem> {
        let response: ApiResponse<TodoItem> = self
            .client
            .get(&format!("{}/{}", TODOS, id), self.options.clone())
            .await?;
        Ok(response.payload)
    }

    /// Create a todo. Returns the new ID.
    pub async fn create(&self, request: CreateTodoRequest) -> Result<u64> {
        request.validate()?;
        let response: ApiResponse<IdPayload> = self
            .client
            .post(TODOS, &request, self.options.clone())
            .await?;
        Ok(response.payload.id)
    }

    /// Update a todo. Returns its ID.
    ///
    /// An empty request is sent as-is; the server treats it as a no-op.
    pub async fn update(&self, id: u64, request: UpdateTodoRequest) -> Result<u64> {
        let response: ApiResponse<IdPayload> = self
            .client
            .patch(&format!("{}/{}", TODOS, id), &request, self.options.clone())
            .await?;
        Ok(response.payload.id)
    }

    /// Mark a todo as done or not done.
    pub async fn set_completed(&self, id: u64, completed: bool) -> Result<u64> {
        self.update(
            id,
            UpdateTodoRequest {
                completed: Some(completed),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a single todo. Returns the number of rows deleted.
    pub async fn delete(&self, id: u64) -> Result<u64> {
        self.delete_many(vec![id]).await
    }

    /// Delete several todos at once. Returns the number of rows deleted.
    pub async fn delete_many(&self, ids: Vec<u64>) -> Result<u64> {
        let request = DeleteTodosRequest { ids };
        request.validate()?;
        let response: ApiResponse<DeletedPayload> = self
            .client
            .delete_with_body(TODOS, &request, self.options.clone())
            .await?;
        Ok(response.payload.deleted)
    }
}
