//! Per-session consumer of engine notifications.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use seedbox_core::types::{TransferId, format_bytes};
use seedbox_engine::TransferEvent;

use super::registry::{RegistryInner, apply_live};

/// Drain `events` for one session until it terminates or the channel closes.
pub(crate) async fn run(
    inner: Arc<RegistryInner>,
    id: TransferId,
    ticket: u64,
    mut events: mpsc::Receiver<TransferEvent>,
) {
    let step = u32::from(inner.settings.progress_step_percent.max(1));
    let mut last_step = 0u32;

    while let Some(event) = events.recv().await {
        match event {
            TransferEvent::MetadataResolved => {
                let live = inner.engine.get(&id);
                let resolved = inner.update(&id, ticket, |session| {
                    if let Some(live) = live.as_deref() {
                        apply_live(session, live);
                    }
                    (session.name.clone(), session.artifacts.len(), session.length)
                });
                let Some((name, files, length)) = resolved else {
                    break;
                };
                info!(
                    transfer_id = %id,
                    name = %name,
                    files,
                    length = %format_bytes(length),
                    "Transfer metadata resolved"
                );
            }
            TransferEvent::Progress(stats) => {
                let snapshot = inner.update(&id, ticket, |session| {
                    session.progress = stats.progress;
                    session.downloaded = stats.downloaded;
                    session.download_speed = stats.download_speed;
                    session.upload_speed = stats.upload_speed;
                    session.num_peers = stats.num_peers;
                    (session.owner, session.outstanding_bytes(), session.percent())
                });
                let Some((owner, outstanding, percent)) = snapshot else {
                    break;
                };

                let reached = (percent.max(0.0) as u32) / step;
                if reached <= last_step {
                    continue;
                }
                last_step = reached;

                info!(
                    transfer_id = %id,
                    progress = percent,
                    downloaded = %format_bytes(stats.downloaded),
                    speed = %format!("{}/s", format_bytes(stats.download_speed)),
                    peers = stats.num_peers,
                    "Transfer progress"
                );

                match inner.quota.monitor(owner, outstanding).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(
                            transfer_id = %id,
                            user_id = %owner,
                            outstanding = %format_bytes(outstanding),
                            "Storage quota would be exceeded, stopping transfer"
                        );
                        if let Err(e) = inner.terminate(&id, None, Some(ticket)).await {
                            warn!(transfer_id = %id, error = %e, "Failed to stop transfer over quota");
                        }
                        break;
                    }
                    Err(e) => {
                        warn!(transfer_id = %id, error = %e, "Quota check failed, transfer continues");
                    }
                }
            }
            TransferEvent::Completed => {
                inner.finish(&id, ticket).await;
                break;
            }
            TransferEvent::Error(message) => {
                error!(transfer_id = %id, error = %message, "Engine reported transfer error");
                if inner
                    .update(&id, ticket, |session| session.error = Some(message))
                    .is_none()
                {
                    break;
                }
            }
        }
    }
}
