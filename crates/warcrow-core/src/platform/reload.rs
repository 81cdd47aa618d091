use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::Reloader;

/// Resolves when a scheduled reload fires.
#[derive(Debug)]
pub struct ReloadSignal(oneshot::Receiver<()>);

impl ReloadSignal {
    /// Wait for the reload. Returns false if the reloader was dropped
    /// without ever scheduling one.
    pub async fn wait(self) -> bool {
        self.0.await.is_ok()
    }
}

/// Reloader that fires a one-shot signal after the requested delay.
///
/// The host awaits the `ReloadSignal` and restarts itself. Only the first
/// scheduled reload fires; there is nothing to reload twice.
#[derive(Debug)]
pub struct ChannelReloader {
    tx: Mutex<Option<oneshot::Sender<()>>>,
    scheduled: AtomicUsize,
}

impl ChannelReloader {
    pub fn new() -> (Self, ReloadSignal) {
        let (tx, rx) = oneshot::channel();
        let reloader = Self {
            tx: Mutex::new(Some(tx)),
            scheduled: AtomicUsize::new(0),
        };
        (reloader, ReloadSignal(rx))
    }

    /// Number of times a reload was requested.
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }
}

impl Reloader for ChannelReloader {
    fn schedule_reload(&self, delay: Duration) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        let Some(tx) = self.tx.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            warn!("Reload already scheduled");
            return;
        };

        info!(delay_ms = delay.as_millis() as u64, "Reload scheduled");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    fire(tx);
                });
            }
            Err(_) => {
                // No timer available outside a runtime; fire now.
                fire(tx);
            }
        }
    }
}

fn fire(tx: oneshot::Sender<()>) {
    if tx.send(()).is_err() {
        debug!("Reload signal receiver is gone");
    }
}
