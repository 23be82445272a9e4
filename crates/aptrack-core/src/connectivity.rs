// ── Registry connectivity ──
//
// Home Assistant announces `online`/`offline` on its status topic. When it
// comes back online it has forgotten every discovered entity, so the next
// poll cycle has to recreate them all. The flag is set only on an
// offline -> online transition and consumed read-and-clear by the tracker.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug)]
struct Inner {
    last_online: bool,
    reconfigure_all: bool,
}

/// Shared between the status listener task and the tracker loop.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    inner: Mutex<Inner>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityMonitor {
    /// The registry is assumed online at startup.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                last_online: true,
                reconfigure_all: false,
            }),
        }
    }

    /// Record one status notification.
    pub fn observe(&self, online: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if online && !inner.last_online {
            info!("registry came back online, scheduling full reconfiguration");
            inner.reconfigure_all = true;
        } else {
            debug!(online, "registry status");
        }
        inner.last_online = online;
    }

    /// Return and clear the pending reconfiguration flag.
    pub fn take_reconfigure_all(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut inner.reconfigure_all)
    }

    pub fn is_online(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_online
    }

    /// Feed status notifications into the monitor until cancelled or the
    /// sender side closes.
    pub async fn listen(&self, mut status: mpsc::Receiver<bool>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                message = status.recv() => match message {
                    Some(online) => self.observe(online),
                    None => break,
                },
            }
        }
        debug!("connectivity listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn online_at_startup_does_not_reconfigure() {
        let monitor = ConnectivityMonitor::new();
        monitor.observe(true);
        monitor.observe(true);
        assert!(!monitor.take_reconfigure_all());
    }

    #[test]
    fn offline_to_online_sets_flag_once() {
        let monitor = ConnectivityMonitor::new();
        monitor.observe(false);
        assert!(!monitor.is_online());
        assert!(!monitor.take_reconfigure_all());

        monitor.observe(true);
        monitor.observe(true);
        assert!(monitor.take_reconfigure_all());
        assert!(!monitor.take_reconfigure_all());
    }

    #[test]
    fn flag_survives_until_taken() {
        let monitor = ConnectivityMonitor::new();
        monitor.observe(false);
        monitor.observe(true);
        monitor.observe(false);
        assert!(monitor.take_reconfigure_all());
    }

    #[tokio::test]
    async fn listener_consumes_channel_until_closed() {
        let monitor = Arc::new(ConnectivityMonitor::new());
        let (tx, rx) = mpsc::channel(4);

        let task = {
            let monitor = Arc::clone(&monitor);
            tokio::spawn(async move { monitor.listen(rx, CancellationToken::new()).await })
        };

        tx.send(false).await.ok();
        tx.send(true).await.ok();
        drop(tx);
        task.await.ok();

        assert!(monitor.take_reconfigure_all());
    }

    #[tokio::test]
    async fn listener_stops_on_cancel() {
        let monitor = ConnectivityMonitor::new();
        let (_tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        monitor.listen(rx, cancel).await;
    }
}
