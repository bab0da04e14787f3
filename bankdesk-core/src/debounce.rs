//! Cancellable quiet-period timer
//!
//! Each `schedule` restarts the timer; only the task passed with the last
//! call runs, once, after the quiet period. `cancel` (or drop) stops a
//! pending timer without running anything.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Observable state of a [`Debouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    /// Timer running, task not yet started
    Pending,
}

#[derive(Debug)]
pub struct Debouncer {
    period: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            timer: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start or restart the timer. `task` runs once the period elapses
    /// without another call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let period = self.period;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(period).await;
            // Detach so that a later restart cannot abort a task already running.
            tokio::spawn(task);
        });

        if let Some(previous) = self.timer().replace(handle) {
            previous.abort();
        }
    }

    /// Stop a pending timer. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.timer().take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn state(&self) -> DebounceState {
        match self.timer().as_ref() {
            Some(handle) if !handle.is_finished() => DebounceState::Pending,
            _ => DebounceState::Idle,
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
