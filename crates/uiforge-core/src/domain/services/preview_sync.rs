//! Debounced, last-write-wins delivery of the active code to the preview renderer.
//!
//! Pushes land in a single slot tagged with a monotonically increasing sequence
//! number. One worker task waits for a quiet period, hands the newest payload to
//! the transport and keeps at most one exchange in flight. An acknowledgement for
//! a payload that has been superseded meanwhile is dropped on arrival and the
//! newer payload is sent next, so the renderer never ends on an older push.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::domain::models::PreviewTransportBox;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewStatus {
    /// Sequence number of the payload most recently handed to the transport.
    pub sent_seq: u64,
    /// Sequence number of the newest payload the renderer acknowledged.
    pub applied_seq: u64,
    /// Acknowledgements dropped because a newer push superseded them.
    pub discarded: u64,
    pub failures: u64,
}

#[derive(Debug, Clone)]
struct PendingPush {
    seq: u64,
    code: String,
}

pub struct PreviewSync {
    next_seq: u64,
    slot: watch::Sender<Option<PendingPush>>,
    status: watch::Receiver<PreviewStatus>,
    worker: JoinHandle<()>,
}

impl PreviewSync {
    /// Spawns the delivery worker, so this must run inside a tokio runtime.
    pub fn new(transport: PreviewTransportBox, quiet_period: Duration) -> PreviewSync {
        let (slot_tx, slot_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(PreviewStatus::default());
        let worker = tokio::spawn(run_worker(transport, slot_rx, status_tx, quiet_period));

        return PreviewSync {
            next_seq: 0,
            slot: slot_tx,
            status: status_rx,
            worker,
        };
    }

    /// Queues `code` for delivery and returns its push sequence number.
    /// Never waits on the network.
    pub fn push(&mut self, code: &str) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.slot.send_replace(Some(PendingPush {
            seq,
            code: code.to_string(),
        }));
        tracing::debug!(seq, bytes = code.len(), "queued preview push");

        return seq;
    }

    pub fn last_pushed_seq(&self) -> u64 {
        return self.next_seq;
    }

    pub fn status(&self) -> PreviewStatus {
        return self.status.borrow().clone();
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewStatus> {
        return self.status.clone();
    }
}

impl Drop for PreviewSync {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker(
    transport: PreviewTransportBox,
    mut slot: watch::Receiver<Option<PendingPush>>,
    status: watch::Sender<PreviewStatus>,
    quiet_period: Duration,
) {
    loop {
        if slot.changed().await.is_err() {
            return;
        }

        // Every push inside the quiet period restarts it.
        loop {
            tokio::select! {
                changed = slot.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = time::sleep(quiet_period) => break,
            }
        }

        let pending = match slot.borrow_and_update().clone() {
            Some(pending) => pending,
            None => continue,
        };

        status.send_modify(|s| s.sent_seq = pending.seq);
        let result = transport.sync(&pending.code).await;

        let latest = slot
            .borrow()
            .as_ref()
            .map_or(pending.seq, |newest| newest.seq);
        if pending.seq < latest {
            tracing::debug!(
                seq = pending.seq,
                latest,
                "discarding acknowledgement for superseded preview push"
            );
            status.send_modify(|s| s.discarded += 1);
            continue;
        }

        match result {
            Ok(()) => {
                tracing::debug!(seq = pending.seq, "preview synced");
                status.send_modify(|s| s.applied_seq = pending.seq);
            }
            Err(err) => {
                tracing::warn!(seq = pending.seq, error = %err, "preview sync failed");
                status.send_modify(|s| s.failures += 1);
            }
        }
    }
}
