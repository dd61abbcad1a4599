//! User accounts: storage, flows and HTTP routes.

pub mod dto;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use axum::Router;

use crate::state::AppState;

pub use repo::{RepositoryError, UserRepository};
pub use repo_types::{User, UserId};

pub fn router() -> Router<AppState> {
    handlers::routes()
}
