//! # seedbox-database
//!
//! Account store access. The [`AccountStore`] trait is the narrow surface
//! the rest of Seedbox consumes (get a user, rewrite its cached usage);
//! [`UserRepository`] implements it over PostgreSQL and
//! [`MemoryAccountStore`] implements it in-process for development and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryAccountStore;
pub use repositories::UserRepository;
pub use store::AccountStore;
