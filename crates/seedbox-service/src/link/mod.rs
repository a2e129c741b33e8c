//! Delivery URLs and capability-link redemption.

pub mod builder;
pub mod resolver;

pub use builder::{ArtifactLinks, FileLinks, LinkBuilder};
pub use resolver::{DirectLinkService, DirectTarget};
