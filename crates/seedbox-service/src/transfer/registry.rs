//! The in-memory transfer session registry.
//!
//! Maps content identifiers to owned sessions and keeps them consistent with
//! the engine's live view. Sessions are process-local and lost on restart.
//!
//! Concurrent admissions of the same descriptor may race; the entry API
//! reserves the slot atomically, so the loser of a race observes the
//! winner's session instead of creating a second one. Each reservation
//! carries a ticket so late completions or rollbacks never remove a newer
//! session that reused the same id.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};

use seedbox_core::config::EngineConfig;
use seedbox_core::error::AppError;
use seedbox_core::result::AppResult;
use seedbox_core::types::{TransferId, UserId};
use seedbox_engine::{AddTransfer, EngineTransfer, TransferEngine};
use seedbox_entity::transfer::{Artifact, TransferDescriptor, TransferSession, TransferState};
use seedbox_storage::SandboxLayout;

use super::monitor;
use crate::quota::QuotaGuard;

/// Tunables for the registry.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Announce URLs handed to the engine on every admission.
    pub trackers: Vec<String>,
    /// Progress step, in percent, for logging and quota checks.
    pub progress_step_percent: u8,
}

impl RegistrySettings {
    /// Settings from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            trackers: config.trackers.clone(),
            progress_step_percent: config.progress_check_step_percent,
        }
    }
}

#[derive(Debug)]
pub(crate) struct SessionEntry {
    pub(crate) session: TransferSession,
    pub(crate) attached: bool,
    pub(crate) ticket: u64,
}

pub(crate) struct RegistryInner {
    pub(crate) sessions: DashMap<TransferId, SessionEntry>,
    pub(crate) engine: Arc<dyn TransferEngine>,
    pub(crate) quota: Arc<QuotaGuard>,
    pub(crate) layout: SandboxLayout,
    pub(crate) settings: RegistrySettings,
    next_ticket: AtomicU64,
}

/// Owns every live transfer session in the process.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("engine", &self.inner.engine.name())
            .field("sessions", &self.inner.sessions.len())
            .finish()
    }
}

/// The single error for "missing" and "owned by someone else".
pub(crate) fn session_not_found() -> AppError {
    AppError::not_found("Transfer not found")
}

impl SessionRegistry {
    /// Creates a new registry around an engine adapter.
    pub fn new(
        engine: Arc<dyn TransferEngine>,
        quota: Arc<QuotaGuard>,
        layout: SandboxLayout,
        settings: RegistrySettings,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: DashMap::new(),
                engine,
                quota,
                layout,
                settings,
                next_ticket: AtomicU64::new(1),
            }),
        }
    }

    /// Admit a transfer for `owner`.
    ///
    /// When `size_hint` (or the descriptor's own length hint) is known the
    /// quota is checked first. A live session for the same descriptor and
    /// owner is returned as-is; one owned by another user is a `Conflict`.
    pub async fn admit(
        &self,
        descriptor: TransferDescriptor,
        owner: UserId,
        size_hint: Option<u64>,
    ) -> AppResult<TransferSession> {
        let id = descriptor.info_hash.clone();

        if let Some(existing) = self.existing_for(&id, owner)? {
            return Ok(existing);
        }

        if let Some(estimate) = size_hint.or(descriptor.exact_length) {
            let decision = self.inner.quota.admit(owner, estimate).await?;
            QuotaGuard::ensure_allowed(&decision)?;
        }

        let sandbox = self.inner.layout.open(owner).await?;
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);

        match self.inner.sessions.entry(id.clone()) {
            Entry::Occupied(slot) => {
                let entry = slot.get();
                if entry.session.owner == owner {
                    return Ok(entry.session.clone());
                }
                return Err(AppError::conflict("Transfer is already active for another user"));
            }
            Entry::Vacant(slot) => {
                slot.insert(SessionEntry {
                    session: TransferSession::initializing(descriptor.clone(), owner),
                    attached: false,
                    ticket,
                });
            }
        }

        info!(transfer_id = %id, user_id = %owner, "Transfer admitted");

        let request = AddTransfer {
            descriptor,
            download_dir: sandbox.root().to_path_buf(),
            trackers: self.inner.settings.trackers.clone(),
        };

        let handle = match self.inner.engine.add(request).await {
            Ok(handle) => handle,
            Err(e) => {
                self.inner.sessions.remove_if(&id, |_, entry| entry.ticket == ticket);
                warn!(transfer_id = %id, error = %e, "Engine rejected transfer");
                return Err(e);
            }
        };

        let attached = match self.inner.sessions.get_mut(&id) {
            Some(mut entry) if entry.ticket == ticket => {
                entry.attached = true;
                apply_live(&mut entry.session, handle.transfer.as_ref());
                Some(entry.session.clone())
            }
            _ => None,
        };

        match attached {
            Some(session) => {
                tokio::spawn(monitor::run(Arc::clone(&self.inner), id, ticket, handle.events));
                Ok(session)
            }
            None => {
                // Stopped while the engine was starting it.
                self.inner.engine.remove(&id).await?;
                Err(session_not_found())
            }
        }
    }

    fn existing_for(&self, id: &TransferId, owner: UserId) -> AppResult<Option<TransferSession>> {
        match self.inner.sessions.get(id) {
            Some(entry) if entry.session.owner == owner => Ok(Some(entry.session.clone())),
            Some(_) => Err(AppError::conflict("Transfer is already active for another user")),
            None => Ok(None),
        }
    }

    /// Fetch a session, re-derived from the engine's live view.
    ///
    /// A missing session and one owned by someone other than `requester`
    /// produce the same `NotFound`.
    pub fn get(&self, id: &TransferId, requester: Option<UserId>) -> AppResult<TransferSession> {
        let mut entry = self
            .inner
            .sessions
            .get_mut(id)
            .ok_or_else(session_not_found)?;

        if let Some(requester) = requester {
            if entry.session.owner != requester {
                return Err(session_not_found());
            }
        }

        if let Some(live) = self.inner.engine.get(id) {
            apply_live(&mut entry.session, live.as_ref());
        }
        Ok(entry.session.clone())
    }

    /// Sessions owned by `user`, refreshed from the engine. Entries whose
    /// transfer vanished from the engine are dropped.
    pub fn list(&self, user: UserId) -> Vec<TransferSession> {
        let mut sessions = Vec::new();
        let mut stale = Vec::new();

        for mut entry in self.inner.sessions.iter_mut() {
            if entry.session.owner != user {
                continue;
            }
            match self.inner.engine.get(entry.key()) {
                Some(live) => apply_live(&mut entry.session, live.as_ref()),
                None if entry.attached => {
                    stale.push((entry.key().clone(), entry.ticket));
                    continue;
                }
                None => {}
            }
            sessions.push(entry.session.clone());
        }

        for (id, ticket) in stale {
            if self
                .inner
                .sessions
                .remove_if(&id, |_, entry| entry.ticket == ticket)
                .is_some()
            {
                info!(transfer_id = %id, "Dropped session no longer held by the engine");
            }
        }

        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sessions
    }

    /// Stop a session: detach from the engine, keep files, drop the entry.
    pub async fn stop(&self, id: &TransferId, requester: Option<UserId>) -> AppResult<TransferSession> {
        self.inner.terminate(id, requester, None).await
    }

    /// Remove a session. Same terminal transition as [`Self::stop`].
    pub async fn remove(&self, id: &TransferId, requester: Option<UserId>) -> AppResult<TransferSession> {
        self.inner.terminate(id, requester, None).await
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.sessions.is_empty()
    }
}

impl RegistryInner {
    /// Detach from the engine, then remove the entry (optionally pinned to
    /// a ticket) and report the session as `Stopped`.
    ///
    /// If the engine refuses to detach, the entry stays registered so the
    /// transfer remains visible and can be stopped again.
    pub(crate) async fn terminate(
        &self,
        id: &TransferId,
        requester: Option<UserId>,
        ticket: Option<u64>,
    ) -> AppResult<TransferSession> {
        let (held, attached) = match self.sessions.get(id) {
            Some(entry)
                if requester.is_none_or(|r| entry.session.owner == r)
                    && ticket.is_none_or(|t| entry.ticket == t) =>
            {
                (entry.ticket, entry.attached)
            }
            _ => return Err(session_not_found()),
        };

        let live = if attached { self.engine.get(id) } else { None };
        if attached {
            if let Err(e) = self.engine.remove(id).await {
                warn!(transfer_id = %id, error = %e, "Engine refused to detach transfer");
                return Err(e);
            }
        }

        // An entry that was never attached is picked up by `admit`, which
        // detaches the engine transfer once it notices the ticket is gone.
        let (_, entry) = self
            .sessions
            .remove_if(id, |_, entry| entry.ticket == held)
            .ok_or_else(session_not_found)?;

        let mut session = entry.session;
        if let Some(live) = live {
            apply_live(&mut session, live.as_ref());
        }
        session.state = TransferState::Stopped;
        session.download_speed = 0;
        session.upload_speed = 0;
        info!(transfer_id = %id, user_id = %session.owner, "Transfer stopped, files kept");
        Ok(session)
    }

    /// Completion: recompute the owner's usage, detach from the engine and
    /// drop the entry.
    pub(crate) async fn finish(&self, id: &TransferId, ticket: u64) {
        let owner = match self.sessions.get_mut(id) {
            Some(mut entry) if entry.ticket == ticket => {
                if let Some(live) = self.engine.get(id) {
                    apply_live(&mut entry.session, live.as_ref());
                }
                entry.session.state = TransferState::Completed;
                entry.session.owner
            }
            _ => return,
        };

        match self.quota.usage(owner).await {
            Ok(snapshot) => info!(
                user_id = %owner,
                used_bytes = snapshot.used_bytes,
                quota_bytes = snapshot.quota_bytes,
                "Storage usage updated after completion"
            ),
            Err(e) => warn!(user_id = %owner, error = %e, "Usage recompute after completion failed"),
        }

        if let Err(e) = self.engine.remove(id).await {
            warn!(transfer_id = %id, error = %e, "Failed to detach completed transfer");
        }

        self.sessions.remove_if(id, |_, entry| entry.ticket == ticket);
        info!(transfer_id = %id, user_id = %owner, "Transfer completed, detached from engine");
    }

    /// Run `f` on the entry if it still belongs to `ticket`.
    pub(crate) fn update<R>(
        &self,
        id: &TransferId,
        ticket: u64,
        f: impl FnOnce(&mut TransferSession) -> R,
    ) -> Option<R> {
        match self.sessions.get_mut(id) {
            Some(mut entry) if entry.ticket == ticket => Some(f(&mut entry.session)),
            _ => None,
        }
    }
}

/// Copy metadata and counters from the engine's live transfer.
pub(crate) fn apply_live(session: &mut TransferSession, live: &dyn EngineTransfer) {
    if let Some(name) = live.name() {
        session.name = name;
        session.artifacts = live
            .files()
            .into_iter()
            .enumerate()
            .map(|(index, file)| Artifact {
                index,
                name: file.name,
                length: file.length,
                path: file.path,
            })
            .collect();
        session.length = live.length();
        if session.state == TransferState::Initializing {
            session.state = TransferState::Active;
        }
    }

    let stats = live.stats();
    session.progress = stats.progress;
    session.downloaded = stats.downloaded;
    session.download_speed = stats.download_speed;
    session.upload_speed = stats.upload_speed;
    session.num_peers = stats.num_peers;
}
