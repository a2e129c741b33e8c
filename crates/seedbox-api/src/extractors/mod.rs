//! Custom Axum extractors.

pub mod auth;
pub mod host;

pub use auth::AuthUser;
pub use host::RequestBase;
