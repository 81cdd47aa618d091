//! Background stale-data checks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::StaleDataGuard;

/// Buffer size for the alert channel.
const ALERT_BUFFER_SIZE: usize = 8;

/// Buffer size for visibility notifications. Extra notifications while a
/// check is pending are dropped; one check covers them all.
const VISIBILITY_BUFFER_SIZE: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckTrigger {
    Interval,
    Visibility,
}

#[derive(Debug, Clone)]
pub struct StaleAlert {
    pub unit_id: Option<String>,
    pub trigger: CheckTrigger,
    pub detected_at: DateTime<Utc>,
}

/// Handle to the background check task.
///
/// An alert is sent when a check first finds stale data. No further alerts
/// are sent until a check comes back clean. Dropping the handle stops the
/// task.
pub struct StaleWatcher {
    visibility_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl StaleWatcher {
    /// Start checking every `period`, beginning immediately.
    pub fn spawn(guard: Arc<StaleDataGuard>, period: Duration) -> (Self, mpsc::Receiver<StaleAlert>) {
        let (alert_tx, alert_rx) = mpsc::channel(ALERT_BUFFER_SIZE);
        let (visibility_tx, visibility_rx) = mpsc::channel(VISIBILITY_BUFFER_SIZE);

        let handle = tokio::spawn(run_checks(guard, period, visibility_rx, alert_tx));
        (
            Self {
                visibility_tx,
                handle,
            },
            alert_rx,
        )
    }

    /// Report that the app regained foreground visibility.
    pub fn notify_visible(&self) {
        if self.visibility_tx.try_send(()).is_err() {
            debug!("Visibility check already pending");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

async fn run_checks(
    guard: Arc<StaleDataGuard>,
    period: Duration,
    mut visibility_rx: mpsc::Receiver<()>,
    alert_tx: mpsc::Sender<StaleAlert>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut alerted = false;

    info!(period_ms = period.as_millis() as u64, "Stale data watcher started");
    loop {
        let trigger = tokio::select! {
            _ = ticker.tick() => CheckTrigger::Interval,
            event = visibility_rx.recv() => match event {
                Some(()) => CheckTrigger::Visibility,
                None => break,
            },
        };

        let snapshot = guard.check_cached();
        debug!(?trigger, detected = snapshot.detected, "Stale data check");

        if !snapshot.detected {
            alerted = false;
            continue;
        }
        if alerted {
            continue;
        }

        let alert = StaleAlert {
            unit_id: snapshot.matched_unit,
            trigger,
            detected_at: Utc::now(),
        };
        if alert_tx.send(alert).await.is_err() {
            break;
        }
        alerted = true;
    }
    info!("Stale data watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryKey;
    use crate::models::UnitEntry;
    use crate::platform::{ChannelReloader, MemoryCacheStorage, MemoryServiceWorkers};
    use crate::store::CompanionStore;

    const PERIOD: Duration = Duration::from_secs(30);

    fn guard() -> Arc<StaleDataGuard> {
        let (reloader, _signal) = ChannelReloader::new();
        Arc::new(StaleDataGuard::new(
            CompanionStore::in_memory(),
            Arc::new(MemoryServiceWorkers::new()),
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(reloader),
        ))
    }

    fn cache_units(guard: &StaleDataGuard, points: u32) {
        guard
            .store()
            .queries()
            .set_data(QueryKey::new(["units"]), &vec![UnitEntry::new("aide", "Aide", points)])
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_alerts_on_first_check() {
        let guard = guard();
        cache_units(&guard, 15);

        let (_watcher, mut alerts) = StaleWatcher::spawn(guard, PERIOD);
        let alert = alerts.recv().await.unwrap();
        assert_eq!(alert.unit_id.as_deref(), Some("aide"));
        assert_eq!(alert.trigger, CheckTrigger::Interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_repeat_alerts() {
        let guard = guard();
        cache_units(&guard, 15);

        let (_watcher, mut alerts) = StaleWatcher::spawn(guard, PERIOD);
        assert!(alerts.recv().await.is_some());

        let next = tokio::time::timeout(PERIOD * 3, alerts.recv()).await;
        assert!(next.is_err(), "expected no repeated alert");
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_triggers_check() {
        let guard = guard();
        cache_units(&guard, 25);

        let (watcher, mut alerts) = StaleWatcher::spawn(guard.clone(), PERIOD);
        let quiet = tokio::time::timeout(Duration::from_secs(1), alerts.recv()).await;
        assert!(quiet.is_err());

        cache_units(&guard, 15);
        watcher.notify_visible();
        let alert = alerts.recv().await.unwrap();
        assert_eq!(alert.trigger, CheckTrigger::Visibility);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_picks_up_new_stale_data() {
        let guard = guard();
        let (_watcher, mut alerts) = StaleWatcher::spawn(guard.clone(), PERIOD);
        tokio::time::sleep(Duration::from_secs(1)).await;

        cache_units(&guard, 15);
        let alert = tokio::time::timeout(PERIOD * 2, alerts.recv())
            .await
            .expect("alert within two periods")
            .unwrap();
        assert_eq!(alert.trigger, CheckTrigger::Interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_alerts_dropped() {
        let guard = guard();
        cache_units(&guard, 15);

        let (watcher, alerts) = StaleWatcher::spawn(guard, PERIOD);
        drop(alerts);
        tokio::time::sleep(PERIOD).await;
        assert!(!watcher.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_period() {
        let guard = guard();
        let period = Duration::from_millis(250);
        let (_watcher, mut alerts) = StaleWatcher::spawn(guard.clone(), period);
        tokio::time::sleep(Duration::from_millis(100)).await;

        cache_units(&guard, 15);
        let alert = tokio::time::timeout(period * 2, alerts.recv())
            .await
            .expect("alert within two periods")
            .unwrap();
        assert_eq!(alert.trigger, CheckTrigger::Interval);
    }
}
