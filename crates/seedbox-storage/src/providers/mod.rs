//! Storage providers.

pub mod local;
