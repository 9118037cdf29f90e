use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// One second of exam time.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task that emits one tick per period over a channel.
///
/// The task owns nothing but the sender; whoever holds the `ExamTimer`
/// applies ticks to session state. Dropping the timer cancels the task.
#[derive(Debug)]
pub struct ExamTimer {
    handle: Option<JoinHandle<()>>,
    ticks: mpsc::UnboundedReceiver<()>,
}

impl ExamTimer {
    /// Spawn the ticking task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let (tx, ticks) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(period_secs = period.as_secs_f64(), "exam timer started");
        Self {
            handle: Some(handle),
            ticks,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Number of ticks queued since the last drain.
    pub fn drain(&mut self) -> u64 {
        let mut count = 0;
        while self.ticks.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    /// Wait for the next tick. Returns `false` once the timer is cancelled
    /// and no queued ticks remain.
    pub async fn next_tick(&mut self) -> bool {
        if self.handle.is_none() {
            return self.ticks.try_recv().is_ok();
        }
        self.ticks.recv().await.is_some()
    }

    /// Stop the task. Returns `true` only for the call that actually stopped it.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                tracing::debug!("exam timer cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for ExamTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
