//! The I/O worker and the maintenance (timer) worker, each a `tokio::spawn`
//! loop selecting against a shutdown watch, following the pattern this
//! lineage uses for its periodic background tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::node::Node;

const MAINTENANCE_TICK: Duration = Duration::from_millis(500);

pub fn spawn_io_loop(node: Arc<Node>, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = node.run_io_loop() => {}
            _ = shutdown.changed() => {}
        }
    })
}

/// Drives handshake retry/timeout and idle-to-Suspend sweeps (§4.4, §3).
pub fn spawn_maintenance_loop(
    node: Arc<Node>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(MAINTENANCE_TICK) => {
                    node.retry_or_drop_handshakes().await;
                    node.suspend_idle_sessions().await;
                    node.retry_unacknowledged_messages().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() { return; }
                }
            }
        }
    })
}
