//! Engine capability interface.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use seedbox_core::result::AppResult;
use seedbox_core::types::TransferId;
use seedbox_entity::transfer::TransferDescriptor;

use crate::event::{TransferEvent, TransferStats};

/// One file of a transfer as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFile {
    /// File name.
    pub name: String,
    /// Path relative to the transfer's download directory.
    pub path: String,
    /// Size in bytes.
    pub length: u64,
}

/// Parameters for starting a transfer.
#[derive(Debug, Clone)]
pub struct AddTransfer {
    /// What to fetch.
    pub descriptor: TransferDescriptor,
    /// Directory the engine writes into.
    pub download_dir: PathBuf,
    /// Announce URLs to use in addition to any in the descriptor.
    pub trackers: Vec<String>,
}

/// A live transfer inside the engine.
pub trait EngineTransfer: Send + Sync + fmt::Debug {
    /// Content identifier.
    fn id(&self) -> TransferId;
    /// Display name, once metadata is known.
    fn name(&self) -> Option<String>;
    /// Aggregate length in bytes (0 until metadata is known).
    fn length(&self) -> u64;
    /// Files in index order (empty until metadata is known).
    fn files(&self) -> Vec<EngineFile>;
    /// Current counters.
    fn stats(&self) -> TransferStats;
    /// Whether every byte has been written.
    fn is_done(&self) -> bool;
}

/// A transfer handed back by [`TransferEngine::add`].
#[derive(Debug)]
pub struct EngineHandle {
    /// The live transfer.
    pub transfer: Arc<dyn EngineTransfer>,
    /// Notifications for this transfer. Closed once the transfer is removed.
    pub events: mpsc::Receiver<TransferEvent>,
}

/// A bulk-transfer engine.
#[async_trait]
pub trait TransferEngine: Send + Sync + fmt::Debug + 'static {
    /// Engine adapter name, for logs.
    fn name(&self) -> &str;

    /// Begin a transfer. Adding a content id that is already live fails
    /// with `Conflict`.
    async fn add(&self, request: AddTransfer) -> AppResult<EngineHandle>;

    /// Every transfer the engine currently holds.
    fn transfers(&self) -> Vec<Arc<dyn EngineTransfer>>;

    /// Look up a live transfer.
    fn get(&self, id: &TransferId) -> Option<Arc<dyn EngineTransfer>>;

    /// Stop and detach a transfer, keeping already-written files. Returns
    /// `false` if the engine did not hold it.
    async fn remove(&self, id: &TransferId) -> AppResult<bool>;
}
