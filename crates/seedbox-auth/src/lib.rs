//! # seedbox-auth
//!
//! Authentication primitives for Seedbox.
//!
//! ## Modules
//!
//! - `jwt`: login access tokens that carry the caller's user id
//! - `capability`: signed, time-boxed links that grant access to one
//!   artifact or file without a login session

pub mod capability;
pub mod jwt;

pub use capability::{
    CapabilityPayload, CapabilityResource, CapabilityTokenService, IssuedCapability,
    VerifiedCapability,
};
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
