//! API endpoint implementations.

mod auth;
mod health;
mod todos;

pub use auth::AuthApi;
pub use health::HealthApi;
pub use todos::TodosApi;
