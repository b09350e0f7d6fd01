//! One-shot timers behind a trait.
//!
//! The refresh controller re-arms its own timer after every tick, so a
//! scheduler only needs "run this once after a delay" plus cancellation.
//! [`TokioScheduler`] is the real implementation; [`ManualScheduler`] runs
//! on virtual time and only fires when told to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Work to run when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a pending timer.
pub trait ScheduledTask: Send + Sync {
    /// Prevents the task from running. Has no effect once it has fired.
    fn cancel(&self);
}

/// Something that can run a task once after a delay.
pub trait Scheduler: Send + Sync {
    /// Runs `task` once after `delay`.
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> Box<dyn ScheduledTask>;
}

// ============================================================================
// Tokio Scheduler
// ============================================================================

/// Scheduler backed by `tokio::time::sleep`.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Creates a scheduler.
    pub fn new() -> Self {
        Self
    }
}

struct TokioTimer {
    handle: JoinHandle<()>,
}

impl ScheduledTask for TokioTimer {
    fn cancel(&self) {
        self.handle.abort();
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> Box<dyn ScheduledTask> {
        trace!(delay_secs = delay.as_secs(), "Scheduling timer");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        Box::new(TokioTimer { handle })
    }
}

// ============================================================================
// Manual Scheduler
// ============================================================================

struct PendingTimer {
    due: Duration,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    task: TimerTask,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingTimer>,
}

/// Deterministic scheduler driven by [`ManualScheduler::advance`].
///
/// Time starts at zero and only moves when advanced. Timers due at the same
/// instant fire in the order they were scheduled.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

struct ManualTimer {
    cancelled: Arc<AtomicBool>,
}

impl ScheduledTask for ManualTimer {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl ManualScheduler {
    /// Creates a scheduler at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Due times of timers that are neither fired nor cancelled, earliest first.
    pub fn pending(&self) -> Vec<Duration> {
        let state = self.lock();
        let mut due: Vec<_> = state
            .pending
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .map(|t| t.due)
            .collect();
        due.sort();
        due
    }

    /// Moves time forward by `by`, firing every timer that comes due.
    ///
    /// Tasks run without the scheduler's lock held, so they may schedule
    /// further timers; those fire too if they fall inside the window.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now + by;

        loop {
            let next = {
                let mut state = self.lock();
                state.pending.retain(|t| !t.cancelled.load(Ordering::SeqCst));
                let earliest = state
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                earliest.map(|i| {
                    let timer = state.pending.swap_remove(i);
                    state.now = timer.due;
                    timer
                })
            };

            match next {
                Some(timer) => (timer.task)(),
                None => break,
            }
        }

        self.lock().now = target;
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> Box<dyn ScheduledTask> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = state.now + delay;
        state.pending.push(PendingTimer {
            due,
            seq,
            cancelled: Arc::clone(&cancelled),
            task,
        });
        Box::new(ManualTimer { cancelled })
    }
}

// ============================================================================
// Tests
// ============================================================================
