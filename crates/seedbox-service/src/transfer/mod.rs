//! Transfer session management.

pub mod monitor;
pub mod registry;

pub use registry::{RegistrySettings, SessionRegistry};
