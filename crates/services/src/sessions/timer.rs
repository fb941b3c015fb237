//! One-second countdown driver.
//!
//! The timer is a tokio task that pushes a unit tick into a bounded channel.
//! It does not track remaining time itself; the session decrements and
//! reconciles on each tick it receives.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Period between countdown ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const TICK_BUFFER: usize = 4;

/// Receiving end of a running timer.
pub type TickReceiver = mpsc::Receiver<()>;

/// Handle to a running tick task.
///
/// Cancelling or dropping the handle aborts the task and closes the channel.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
    cancelled: bool,
}

impl TimerHandle {
    /// Spawn a timer on the current tokio runtime.
    ///
    /// The first tick arrives one `period` after the call.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(period: Duration) -> (Self, TickReceiver) {
        let (tx, rx) = mpsc::channel(TICK_BUFFER);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        (
            Self {
                task,
                cancelled: false,
            },
            rx,
        )
    }

    /// Stop delivering ticks. Safe to call more than once.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            self.task.abort();
            self.cancelled = true;
            tracing::debug!("countdown timer cancelled");
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let started = Instant::now();
        let (_handle, mut ticks) = TimerHandle::start(TICK_PERIOD);
        for _ in 0..3 {
            ticks.recv().await.unwrap();
        }
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_closes_the_channel() {
        let (mut handle, mut ticks) = TimerHandle::start(TICK_PERIOD);
        ticks.recv().await.unwrap();

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());

        let mut late = 0;
        while ticks.recv().await.is_some() {
            late += 1;
        }
        assert!(late <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_ticks() {
        let (handle, mut ticks) = TimerHandle::start(TICK_PERIOD);
        drop(handle);
        let mut late = 0;
        while ticks.recv().await.is_some() {
            late += 1;
        }
        assert!(late <= 1);
    }
}
