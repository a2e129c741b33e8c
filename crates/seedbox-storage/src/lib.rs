//! # seedbox-storage
//!
//! Filesystem access for Seedbox. Every user owns one sandbox directory;
//! all user-supplied paths pass through [`SandboxPathResolver`] before any
//! filesystem call is made.

pub mod layout;
pub mod listing;
pub mod mime;
pub mod providers;
pub mod sandbox;

pub use layout::SandboxLayout;
pub use listing::{DirEntry, DirListing, FileEntry, FileMeta};
pub use providers::local::LocalSandbox;
pub use sandbox::SandboxPathResolver;
