//! Core type definitions used across the Seedbox workspace.

pub mod bytes;
pub mod id;

pub use bytes::format_bytes;
pub use id::{TransferId, UserId};
