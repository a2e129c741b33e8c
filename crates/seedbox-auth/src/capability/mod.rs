//! Capability links: signed, time-boxed bearer tokens for one resource.

pub mod payload;
pub mod service;

pub use payload::{CapabilityPayload, CapabilityResource};
pub use service::{CapabilityTokenService, IssuedCapability, VerifiedCapability};
