//! # seedbox-entity
//!
//! Domain entity models for Seedbox. `User` mirrors the account store's
//! table row; everything else is an in-memory value object owned by the
//! session registry or computed on demand.

pub mod delivery;
pub mod storage;
pub mod transfer;
pub mod user;
