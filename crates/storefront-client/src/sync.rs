//! Remote Sync: mirrors local cart mutations to the Order Gateway.
//!
//! Pushes are dispatched on a worker task, decoupled from the state
//! transition that produced them. A failed push is reported as a notice and
//! is neither retried nor rolled back locally.

use parking_lot::Mutex;
use std::sync::Arc;
use storefront_core::cart::CartPush;
use storefront_data::OrderGateway;
use storefront_session::SessionToken;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::notify::{Notice, Notifier};

enum SyncJob {
    Push {
        session: SessionToken,
        push: CartPush,
    },
    Flush(oneshot::Sender<()>),
}

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub pushed: u64,
    pub failed: u64,
}

/// Handle to the Remote Sync worker.
pub struct RemoteSync {
    tx: Mutex<Option<mpsc::UnboundedSender<SyncJob>>>,
    worker: Mutex<Option<JoinHandle<SyncStats>>>,
}

impl RemoteSync {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(gateway: Arc<dyn OrderGateway>, notifier: Arc<dyn Notifier>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(rx, gateway, notifier));
        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a push carrying the session it was made under.
    ///
    /// Returns false once the worker has been shut down.
    pub fn enqueue(&self, session: SessionToken, push: CartPush) -> bool {
        let tx = self.tx.lock();
        match tx.as_ref() {
            Some(tx) => tx.send(SyncJob::Push { session, push }).is_ok(),
            None => false,
        }
    }

    /// Wait until every push queued so far has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        let sent = {
            let tx = self.tx.lock();
            tx.as_ref()
                .map(|tx| tx.send(SyncJob::Flush(done_tx)).is_ok())
                .unwrap_or(false)
        };
        if sent {
            let _ = done_rx.await;
        }
    }

    /// Stop accepting pushes, drain the queue and join the worker.
    pub async fn shutdown(&self) -> SyncStats {
        self.tx.lock().take();
        let worker = self.worker.lock().take();
        match worker {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Remote Sync worker panicked");
                SyncStats::default()
            }),
            None => SyncStats::default(),
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<SyncJob>,
    gateway: Arc<dyn OrderGateway>,
    notifier: Arc<dyn Notifier>,
) -> SyncStats {
    let mut stats = SyncStats::default();

    while let Some(job) = rx.recv().await {
        match job {
            SyncJob::Push { session, push } => {
                match gateway.mutate_cart(&session, &push).await {
                    Ok(()) => {
                        stats.pushed += 1;
                        tracing::debug!(
                            product_id = %push.product_id,
                            size = %push.size,
                            quantity = push.quantity,
                            "Cart push mirrored"
                        );
                    }
                    Err(e) => {
                        stats.failed += 1;
                        tracing::warn!(
                            product_id = %push.product_id,
                            size = %push.size,
                            quantity = push.quantity,
                            error = %e,
                            "Cart push failed"
                        );
                        notifier.notify(Notice::error(e.user_message()));
                    }
                }
            }
            SyncJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    tracing::debug!(pushed = stats.pushed, failed = stats.failed, "Remote Sync stopped");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChannelNotifier;
    use storefront_data::{GatewayError, MemoryGateway, Operation};

    fn push(quantity: u32) -> CartPush {
        CartPush {
            product_id: "a".into(),
            size: "M".into(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_pushes_apply_in_order() {
        let gateway = MemoryGateway::new();
        let (notifier, _rx) = ChannelNotifier::channel();
        let sync = RemoteSync::spawn(Arc::new(gateway.clone()), Arc::new(notifier));

        let token = SessionToken::new("t");
        assert!(sync.enqueue(token.clone(), push(1)));
        assert!(sync.enqueue(token.clone(), push(3)));
        sync.flush().await;

        assert_eq!(gateway.server_cart().quantity(&"a".into(), "M"), 3);
        let stats = sync.shutdown().await;
        assert_eq!(stats, SyncStats { pushed: 2, failed: 0 });
    }

    #[tokio::test]
    async fn test_failure_becomes_notice() {
        let gateway = MemoryGateway::new();
        gateway.fail(Operation::MutateCart, GatewayError::Transport("offline".into()));
        let (notifier, mut rx) = ChannelNotifier::channel();
        let sync = RemoteSync::spawn(Arc::new(gateway.clone()), Arc::new(notifier));

        sync.enqueue(SessionToken::new("t"), push(1));
        sync.flush().await;

        let notice = rx.try_recv().unwrap();
        assert!(notice.message.contains("offline"));
        // Attempted exactly once.
        assert_eq!(gateway.calls_to(Operation::MutateCart).len(), 1);
        assert_eq!(sync.shutdown().await.failed, 1);
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_is_refused() {
        let sync = RemoteSync::spawn(
            Arc::new(MemoryGateway::new()),
            Arc::new(crate::notify::LogNotifier),
        );
        sync.shutdown().await;
        assert!(!sync.enqueue(SessionToken::new("t"), push(1)));
        sync.flush().await;
    }
}
