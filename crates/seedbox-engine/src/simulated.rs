//! In-process engine used for development and testing.
//!
//! Simulates a bulk-transfer engine without any network activity. Tests
//! drive transfers explicitly through [`SimulatedEngine::resolve_metadata`],
//! [`SimulatedEngine::write_piece`], [`SimulatedEngine::complete`] and
//! [`SimulatedEngine::fail`]. With [`SimulationPacing`] set, every added
//! transfer is driven automatically: one synthetic file is written chunk by
//! chunk and then completed.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use seedbox_core::config::EngineConfig;
use seedbox_core::error::{AppError, ErrorKind};
use seedbox_core::result::AppResult;
use seedbox_core::types::TransferId;

use crate::event::{TransferEvent, TransferStats};
use crate::traits::{AddTransfer, EngineFile, EngineHandle, EngineTransfer, TransferEngine};

/// Automatic playback settings.
#[derive(Debug, Clone, Copy)]
pub struct SimulationPacing {
    /// Bytes written per tick.
    pub chunk_bytes: u64,
    /// Delay between ticks.
    pub tick: Duration,
    /// Payload size when the descriptor has no length hint.
    pub default_length: u64,
}

impl SimulationPacing {
    /// Pacing from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            chunk_bytes: config.simulated_chunk_bytes.max(1),
            tick: Duration::from_millis(config.simulated_tick_millis),
            default_length: config.simulated_default_length,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    name: Option<String>,
    files: Vec<EngineFile>,
    written: Vec<u64>,
    stats: TransferStats,
    done: bool,
}

/// A transfer held by the simulated engine.
#[derive(Debug)]
pub struct SimulatedTransfer {
    id: TransferId,
    download_dir: PathBuf,
    trackers: Vec<String>,
    state: Mutex<SimState>,
    events: Mutex<Option<mpsc::Sender<TransferEvent>>>,
}

impl SimulatedTransfer {
    fn state(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Trackers the transfer was started with.
    pub fn trackers(&self) -> Vec<String> {
        self.trackers.clone()
    }

    async fn emit(&self, event: TransferEvent) {
        let sender = self
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(sender) = sender {
            if sender.send(event).await.is_err() {
                debug!(transfer_id = %self.id, "Event receiver dropped");
            }
        }
    }

    fn close(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

impl EngineTransfer for SimulatedTransfer {
    fn id(&self) -> TransferId {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        self.state().name.clone()
    }

    fn length(&self) -> u64 {
        self.state().files.iter().map(|f| f.length).sum()
    }

    fn files(&self) -> Vec<EngineFile> {
        self.state().files.clone()
    }

    fn stats(&self) -> TransferStats {
        self.state().stats
    }

    fn is_done(&self) -> bool {
        self.state().done
    }
}

#[derive(Debug)]
struct Inner {
    transfers: DashMap<TransferId, Arc<SimulatedTransfer>>,
    event_buffer: usize,
    pacing: Option<SimulationPacing>,
}

/// Simulated bulk-transfer engine.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    inner: Arc<Inner>,
}

impl SimulatedEngine {
    /// Engine driven only by explicit calls.
    pub fn new(event_buffer: usize) -> Self {
        Self::build(event_buffer, None)
    }

    /// Engine that drives every added transfer to completion on its own.
    pub fn with_pacing(event_buffer: usize, pacing: SimulationPacing) -> Self {
        Self::build(event_buffer, Some(pacing))
    }

    fn build(event_buffer: usize, pacing: Option<SimulationPacing>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transfers: DashMap::new(),
                event_buffer: event_buffer.max(1),
                pacing,
            }),
        }
    }

    fn transfer(&self, id: &TransferId) -> AppResult<Arc<SimulatedTransfer>> {
        self.inner
            .transfers
            .get(id)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| AppError::not_found(format!("Transfer not in engine: {id}")))
    }

    /// Concrete handle for assertions in tests.
    pub fn simulated(&self, id: &TransferId) -> Option<Arc<SimulatedTransfer>> {
        self.inner.transfers.get(id).map(|t| Arc::clone(t.value()))
    }

    /// Publish metadata: name and file list.
    pub async fn resolve_metadata(
        &self,
        id: &TransferId,
        name: impl Into<String>,
        files: Vec<EngineFile>,
    ) -> AppResult<()> {
        let transfer = self.transfer(id)?;
        {
            let mut state = transfer.state();
            state.name = Some(name.into());
            state.written = vec![0; files.len()];
            state.files = files;
        }
        transfer.emit(TransferEvent::MetadataResolved).await;
        Ok(())
    }

    /// Append `data` to file `index` on disk and report progress.
    pub async fn write_piece(&self, id: &TransferId, index: usize, data: &[u8]) -> AppResult<()> {
        let transfer = self.transfer(id)?;
        let relative = transfer
            .state()
            .files
            .get(index)
            .map(|f| f.path.clone())
            .ok_or_else(|| AppError::not_found(format!("No file {index} in transfer {id}")))?;

        let path = transfer.download_dir.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;

        let stats = {
            let mut state = transfer.state();
            if let Some(written) = state.written.get_mut(index) {
                *written += data.len() as u64;
            }
            let downloaded: u64 = state.written.iter().sum();
            let length: u64 = state.files.iter().map(|f| f.length).sum();
            state.stats = TransferStats {
                progress: if length == 0 {
                    0.0
                } else {
                    (downloaded as f64 / length as f64).min(1.0)
                },
                downloaded,
                download_speed: data.len() as u64,
                upload_speed: 0,
                num_peers: 1,
            };
            state.stats
        };

        transfer.emit(TransferEvent::Progress(stats)).await;
        Ok(())
    }

    /// Mark the transfer done and notify.
    pub async fn complete(&self, id: &TransferId) -> AppResult<()> {
        let transfer = self.transfer(id)?;
        {
            let mut state = transfer.state();
            state.done = true;
            state.stats.progress = 1.0;
            state.stats.download_speed = 0;
        }
        transfer.emit(TransferEvent::Completed).await;
        Ok(())
    }

    /// Report an engine-side failure.
    pub async fn fail(&self, id: &TransferId, message: impl Into<String>) -> AppResult<()> {
        let transfer = self.transfer(id)?;
        transfer.emit(TransferEvent::Error(message.into())).await;
        Ok(())
    }

    fn spawn_playback(&self, id: TransferId, name: String, length: u64, pacing: SimulationPacing) {
        let engine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(pacing.tick).await;
            let file = EngineFile {
                name: format!("{name}.bin"),
                path: format!("{name}/{name}.bin"),
                length,
            };
            if engine.resolve_metadata(&id, name.clone(), vec![file]).await.is_err() {
                return;
            }

            let mut remaining = length;
            while remaining > 0 {
                tokio::time::sleep(pacing.tick).await;
                let chunk = remaining.min(pacing.chunk_bytes);
                let data = vec![0u8; chunk as usize];
                match engine.write_piece(&id, 0, &data).await {
                    Ok(()) => remaining -= chunk,
                    Err(e) if e.kind == ErrorKind::NotFound => return,
                    Err(e) => {
                        let _ = engine.fail(&id, e.message.clone()).await;
                        return;
                    }
                }
            }

            let _ = engine.complete(&id).await;
        });
    }
}

/// Make a display name safe to use as a single path segment.
fn safe_segment(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl TransferEngine for SimulatedEngine {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn add(&self, request: AddTransfer) -> AppResult<EngineHandle> {
        let id = request.descriptor.info_hash.clone();
        let (tx, rx) = mpsc::channel(self.inner.event_buffer);

        let mut trackers = request.descriptor.trackers.clone();
        for tracker in request.trackers {
            if !trackers.contains(&tracker) {
                trackers.push(tracker);
            }
        }

        let transfer = Arc::new(SimulatedTransfer {
            id: id.clone(),
            download_dir: request.download_dir,
            trackers,
            state: Mutex::new(SimState::default()),
            events: Mutex::new(Some(tx)),
        });

        match self.inner.transfers.entry(id.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::conflict(format!("Transfer already in engine: {id}")));
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&transfer));
            }
        }

        info!(
            transfer_id = %id,
            trackers = transfer.trackers.len(),
            dir = %transfer.download_dir.display(),
            "Simulated transfer added"
        );

        if let Some(pacing) = self.inner.pacing {
            let name = safe_segment(
                request.descriptor.display_name.as_deref().unwrap_or(id.as_str()),
                id.as_str(),
            );
            let length = request.descriptor.exact_length.unwrap_or(pacing.default_length);
            self.spawn_playback(id, name, length, pacing);
        }

        Ok(EngineHandle {
            transfer,
            events: rx,
        })
    }

    fn transfers(&self) -> Vec<Arc<dyn EngineTransfer>> {
        self.inner
            .transfers
            .iter()
            .map(|t| Arc::clone(t.value()) as Arc<dyn EngineTransfer>)
            .collect()
    }

    fn get(&self, id: &TransferId) -> Option<Arc<dyn EngineTransfer>> {
        self.inner
            .transfers
            .get(id)
            .map(|t| Arc::clone(t.value()) as Arc<dyn EngineTransfer>)
    }

    async fn remove(&self, id: &TransferId) -> AppResult<bool> {
        match self.inner.transfers.remove(id) {
            Some((_, transfer)) => {
                transfer.close();
                info!(transfer_id = %id, "Simulated transfer removed, files kept");
                Ok(true)
            }
            None => {
                warn!(transfer_id = %id, "Remove requested for unknown transfer");
                Ok(false)
            }
        }
    }
}
