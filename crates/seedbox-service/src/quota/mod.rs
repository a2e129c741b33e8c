//! Storage quota enforcement.

pub mod guard;

pub use guard::QuotaGuard;
