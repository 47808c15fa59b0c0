//! Service layer: operations that coordinate the API client with local state.

pub mod auth;

pub use auth::AuthService;
