//! Single-flight refresh controller.
//!
//! Owns the fetch state machine and the poll timer:
//!
//! ```text
//! Idle ──trigger──▶ Fetching ──ok──▶ Succeeded
//!                      │
//!                      └──err──▶ Failed(kind, message)
//! ```
//!
//! `Succeeded` and `Failed` are resting states: any trigger may leave them.
//! A trigger that arrives while `Fetching` is dropped, not queued.
//!
//! Every transition happens under one async mutex. The provider call is the
//! only suspension point and runs with the lock released. Observers follow
//! along through a `watch` channel of [`RefreshStatus`].

use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tallybar_core::{Clock, CoreError, ErrorKind, Period, UsageProvider, UsageSnapshot, aggregate};
use tallybar_fetch::SecretStore;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::config_store::{ConfigStore, interval_from_minutes};
use crate::credentials;
use crate::error::StoreError;
use crate::scheduler::{ScheduledTask, Scheduler};
use crate::snapshot_store::SnapshotStore;

// ============================================================================
// State
// ============================================================================

/// Where the controller is in its fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RefreshState {
    /// Nothing has been attempted yet.
    #[default]
    Idle,
    /// A provider call is in flight.
    Fetching,
    /// The last fetch produced a snapshot.
    Succeeded,
    /// The last attempt failed.
    Failed {
        /// Classification of the failure.
        kind: ErrorKind,
        /// Human-readable description.
        message: String,
    },
}

impl RefreshState {
    /// Returns true while a fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        matches!(self, RefreshState::Fetching)
    }

    /// Error message of a failed attempt.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            RefreshState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Error kind of a failed attempt.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            RefreshState::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    fn failed(error: &CoreError) -> Self {
        RefreshState::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Everything an observer needs to render the current usage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefreshStatus {
    /// Fetch cycle state.
    pub state: RefreshState,
    /// Last good snapshot, kept across failures.
    pub snapshot: Option<UsageSnapshot>,
    /// When the last good snapshot was fetched.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// When the current or most recent attempt started.
    pub fetch_started_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    delay: Option<Duration>,
    handle: Option<Box<dyn ScheduledTask>>,
}

// ============================================================================
// Controller
// ============================================================================

/// Collaborators the controller is built from.
pub struct RefreshDeps {
    /// Usage backend.
    pub provider: Arc<dyn UsageProvider>,
    /// Token storage.
    pub secrets: Arc<dyn SecretStore>,
    /// Username, allowance, interval.
    pub config: Arc<dyn ConfigStore>,
    /// Last-good snapshot cache.
    pub snapshots: Arc<dyn SnapshotStore>,
    /// Timer source.
    pub scheduler: Arc<dyn Scheduler>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

struct Inner {
    deps: RefreshDeps,
    status: Mutex<RefreshStatus>,
    timer: StdMutex<TimerSlot>,
    publisher: watch::Sender<RefreshStatus>,
}

/// Drives fetches for one provider and publishes the results.
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct RefreshController {
    inner: Arc<Inner>,
}

impl RefreshController {
    /// Creates an idle controller. No timer runs until [`start`](Self::start)
    /// or [`set_poll_interval`](Self::set_poll_interval).
    pub fn new(deps: RefreshDeps) -> Self {
        let (publisher, _) = watch::channel(RefreshStatus::default());
        Self {
            inner: Arc::new(Inner {
                deps,
                status: Mutex::new(RefreshStatus::default()),
                timer: StdMutex::new(TimerSlot::default()),
                publisher,
            }),
        }
    }

    /// Subscribes to status changes.
    pub fn subscribe(&self) -> watch::Receiver<RefreshStatus> {
        self.inner.publisher.subscribe()
    }

    /// Current status.
    pub async fn status(&self) -> RefreshStatus {
        self.inner.status.lock().await.clone()
    }

    /// Loads the cached snapshot, arms the poll timer, and triggers a first
    /// fetch if credentials are present.
    pub async fn start(&self) {
        if let Some(cached) = self.inner.deps.snapshots.load().await {
            let mut status = self.inner.status.lock().await;
            if status.snapshot.is_none() {
                info!(period = %cached.period, "Restored cached snapshot");
                status.last_fetched_at = Some(cached.fetched_at);
                status.snapshot = Some(cached);
                self.inner.publish(&status);
            }
        }

        let config = self.inner.deps.config.get().await;
        self.inner.reschedule(interval_from_minutes(config.refresh_interval_minutes));

        if self.is_configured().await {
            self.spawn_refresh();
        }
    }

    /// Fetches once unless a fetch is already in flight.
    ///
    /// Returns `false` if the trigger was dropped because of an in-flight
    /// fetch, `true` otherwise (including a not-configured failure).
    pub async fn refresh(&self) -> bool {
        self.inner.refresh().await
    }

    /// Runs [`refresh`](Self::refresh) on its own task.
    pub fn spawn_refresh(&self) -> tokio::task::JoinHandle<bool> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.refresh().await })
    }

    /// Persists a new poll interval and restarts the timer from now.
    ///
    /// An in-flight fetch is left alone. If credentials are present an
    /// immediate fetch is triggered (and dropped if one is running).
    ///
    /// # Errors
    ///
    /// Returns an error if the interval cannot be persisted.
    pub async fn set_poll_interval(&self, minutes: u32) -> Result<(), StoreError> {
        let mut config = self.inner.deps.config.get().await;
        config.refresh_interval_minutes = minutes;
        self.inner.deps.config.set(config).await?;
        info!(minutes, "Poll interval changed");

        self.inner.reschedule(interval_from_minutes(minutes));

        if self.is_configured().await {
            self.spawn_refresh();
        }
        Ok(())
    }

    /// Persists a new included allowance and re-derives the held snapshot.
    ///
    /// No network call is made.
    ///
    /// # Errors
    ///
    /// Returns an error if the allowance cannot be persisted. Failing to
    /// re-persist the snapshot is only logged.
    pub async fn set_allowance(&self, allowance: i64) -> Result<(), StoreError> {
        let mut config = self.inner.deps.config.get().await;
        config.included_allowance = allowance;
        self.inner.deps.config.set(config).await?;
        info!(allowance, "Included allowance changed");

        let mut status = self.inner.status.lock().await;
        if let Some(current) = status.snapshot.as_ref() {
            let updated = current.with_allowance(allowance);
            self.inner.persist(&updated).await;
            status.snapshot = Some(updated);
            self.inner.publish(&status);
        }
        Ok(())
    }

    /// Persists the username. Takes effect on the next fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the username cannot be persisted.
    pub async fn set_username(&self, username: &str) -> Result<(), StoreError> {
        let mut config = self.inner.deps.config.get().await;
        config.username = username.trim().to_string();
        self.inner.deps.config.set(config).await
    }

    /// Stores or (with `None`) deletes the token. Takes effect on the next fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret store rejects the change.
    pub async fn set_token(&self, token: Option<&str>) -> Result<(), StoreError> {
        let secrets = self.inner.deps.secrets.as_ref();
        match token {
            Some(token) => credentials::store_token(secrets, token).await,
            None => credentials::delete_token(secrets).await,
        }
    }

    /// Returns true if both a username and a token are present.
    pub async fn is_configured(&self) -> bool {
        let config = self.inner.deps.config.get().await;
        credentials::resolve(&config, self.inner.deps.secrets.as_ref())
            .await
            .is_some()
    }

    /// Cancels the poll timer. In-flight fetches run to completion.
    pub fn stop(&self) {
        self.inner.reschedule(None);
    }
}

impl Inner {
    fn publish(&self, status: &RefreshStatus) {
        self.publisher.send_replace(status.clone());
    }

    async fn persist(&self, snapshot: &UsageSnapshot) {
        if let Err(e) = self.deps.snapshots.save(snapshot).await {
            warn!(error = %e, "Failed to persist snapshot");
        }
    }

    async fn refresh(&self) -> bool {
        let config = self.deps.config.get().await;
        let credentials = credentials::resolve(&config, self.deps.secrets.as_ref()).await;

        let credentials = {
            let mut status = self.status.lock().await;
            if status.state.is_fetching() {
                debug!("Fetch already in flight, ignoring trigger");
                return false;
            }

            let Some(credentials) = credentials else {
                debug!("Username or token missing, not fetching");
                status.state = RefreshState::failed(&CoreError::NotConfigured);
                self.publish(&status);
                return true;
            };

            status.state = RefreshState::Fetching;
            status.fetch_started_at = Some(self.deps.clock.now());
            self.publish(&status);
            credentials
        };

        let period = Period::current(self.deps.clock.as_ref());
        debug!(provider = self.deps.provider.id(), period = %period, "Fetching usage");
        let result = self.deps.provider.fetch_raw(period, &credentials).await;

        let mut status = self.status.lock().await;
        match result {
            Ok(items) => {
                let fetched_at = self.deps.clock.now();
                let allowance = self.deps.config.get().await.included_allowance;
                let snapshot =
                    aggregate(&items, period, self.deps.provider.id(), allowance, fetched_at);
                info!(
                    consumed = snapshot.included_consumed,
                    allowance = snapshot.included_allowance,
                    billed_amount = snapshot.billed_amount,
                    "Usage refreshed"
                );

                self.persist(&snapshot).await;
                status.state = RefreshState::Succeeded;
                status.last_fetched_at = Some(fetched_at);
                status.snapshot = Some(snapshot);
            }
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "Usage fetch failed");
                status.state = RefreshState::failed(&e);
            }
        }
        self.publish(&status);
        true
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, TimerSlot> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancels the pending tick and, for `Some(delay)`, arms a new one.
    fn reschedule(self: &Arc<Self>, delay: Option<Duration>) {
        let mut slot = self.lock_timer();
        if let Some(handle) = slot.handle.take() {
            handle.cancel();
        }
        slot.generation += 1;
        slot.delay = delay;

        match delay {
            Some(delay) => {
                debug!(delay_secs = delay.as_secs(), generation = slot.generation, "Timer armed");
                slot.handle = Some(self.arm(delay, slot.generation));
            }
            None => debug!("Timer disabled, manual refresh only"),
        }
    }

    fn arm(self: &Arc<Self>, delay: Duration, generation: u64) -> Box<dyn ScheduledTask> {
        let weak = Arc::downgrade(self);
        self.deps
            .scheduler
            .schedule_after(delay, Box::new(move || Self::tick(&weak, generation)))
    }

    /// Timer callback: re-arms, then fetches on a separate task so that
    /// cancelling the timer can never abort the fetch.
    fn tick(weak: &Weak<Self>, generation: u64) {
        let Some(inner) = weak.upgrade() else {
            return;
        };

        {
            let mut slot = inner.lock_timer();
            if slot.generation != generation {
                debug!(generation, current = slot.generation, "Dropping stale tick");
                return;
            }
            let Some(delay) = slot.delay else {
                return;
            };
            slot.handle = Some(inner.arm(delay, generation));
        }

        debug!(generation, "Poll tick");
        tokio::spawn(async move {
            inner.refresh().await;
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_timer().handle.take() {
            handle.cancel();
        }
    }
}
