//! # seedbox-engine
//!
//! The narrow interface Seedbox consumes from a bulk-transfer engine, plus
//! [`SimulatedEngine`], an in-process engine that writes synthetic payloads
//! for development and tests.
//!
//! Peer and piece acquisition are the engine's business. Seedbox only reads
//! metadata and counters, receives per-transfer notifications, and detaches
//! transfers without touching their files.

pub mod event;
pub mod simulated;
pub mod traits;

pub use event::{TransferEvent, TransferStats};
pub use simulated::{SimulatedEngine, SimulationPacing};
pub use traits::{AddTransfer, EngineFile, EngineHandle, EngineTransfer, TransferEngine};
