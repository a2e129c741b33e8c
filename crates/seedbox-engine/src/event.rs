//! Per-transfer notifications.

/// Live counters reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransferStats {
    /// Fraction complete, 0.0..=1.0.
    pub progress: f64,
    /// Bytes written so far.
    pub downloaded: u64,
    /// Download rate in bytes/s.
    pub download_speed: u64,
    /// Upload rate in bytes/s.
    pub upload_speed: u64,
    /// Connected peers.
    pub num_peers: u32,
}

/// A notification on a transfer's event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// Name, length, and files are now known.
    MetadataResolved,
    /// Counters changed.
    Progress(TransferStats),
    /// Every byte has been written.
    Completed,
    /// The engine hit a failure on this transfer.
    Error(String),
}
