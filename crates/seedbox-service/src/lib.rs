//! # seedbox-service
//!
//! Business logic for Seedbox. Services follow constructor injection: all
//! collaborators arrive as `Arc`s at construction time and no state is
//! global.
//!
//! - [`QuotaGuard`] recomputes usage by walking a user's sandbox
//! - [`SessionRegistry`] owns transfer sessions and reconciles them against
//!   the engine
//! - [`FileService`] browses, opens, and deletes sandbox paths
//! - [`LinkBuilder`] and [`DirectLinkService`] mint and redeem capability links

pub mod context;
pub mod file;
pub mod link;
pub mod quota;
pub mod transfer;

pub use context::RequestContext;
pub use file::FileService;
pub use link::{ArtifactLinks, DirectLinkService, DirectTarget, FileLinks, LinkBuilder};
pub use quota::QuotaGuard;
pub use transfer::{RegistrySettings, SessionRegistry};
