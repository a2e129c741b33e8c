//! Sandbox browsing, delivery lookup, and deletion.

pub mod service;

pub use service::FileService;
