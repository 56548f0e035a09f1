//! Polling update coordinator
//!
//! Entities do not poll the cloud themselves. A single coordinator refreshes
//! the hub on a fixed interval and broadcasts the outcome; every entity
//! subscribes and re-reads its device cache on notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::hub::PetLibroHub;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Outcome of one refresh cycle, broadcast to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorMessage {
    /// All devices refreshed; entities should re-read their state
    Updated,
    /// At least one device failed to refresh
    UpdateFailed,
}

/// Schedules hub refreshes and fans the outcome out to entities
pub struct UpdateCoordinator {
    hub: Arc<PetLibroHub>,
    interval: Duration,
    tx: broadcast::Sender<CoordinatorMessage>,
    last_update_success: AtomicBool,
}

impl UpdateCoordinator {
    pub fn new(hub: Arc<PetLibroHub>, interval: Duration) -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            hub,
            interval,
            tx,
            last_update_success: AtomicBool::new(true),
        }
    }

    pub fn hub(&self) -> &Arc<PetLibroHub> {
        &self.hub
    }

    /// Subscribe to refresh outcomes
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorMessage> {
        self.tx.subscribe()
    }

    /// Whether the most recent refresh cycle succeeded
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    /// Run one refresh cycle and broadcast the outcome
    pub async fn refresh(&self) {
        let ok = self.hub.refresh_devices().await;
        self.last_update_success.store(ok, Ordering::SeqCst);

        let message = if ok {
            debug!("Refresh cycle complete");
            CoordinatorMessage::Updated
        } else {
            warn!("Refresh cycle finished with errors");
            CoordinatorMessage::UpdateFailed
        };
        // send only fails when no entity is subscribed yet
        let _ = self.tx.send(message);
    }

    /// Refresh outside the schedule, e.g. after a command
    pub async fn request_refresh(&self) {
        self.refresh().await;
    }

    /// Spawn the periodic polling loop
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick fires immediately
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        })
    }
}
