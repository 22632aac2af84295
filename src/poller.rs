//! Scheduled background tasks whose lifetime is tied to a handle.
//!
//! Dropping (or cancelling) the [`PollHandle`] aborts the task, including
//! any request it has in flight, so a torn-down view can never be updated
//! by a late response.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

pub struct PollHandle {
    name: &'static str,
    task: JoinHandle<()>,
}

impl PollHandle {
    #[cfg(test)]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }

    /// Wait for a one-shot task to complete.
    pub async fn join(mut self) {
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            debug!("Cancelling scheduled task '{}'", self.name);
        }
        self.task.abort();
    }
}

/// Run `tick` now and then every `period`. A slow tick delays the next one
/// rather than causing a burst.
pub fn every<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            debug!("Running scheduled task '{}'", name);
            tick().await;
        }
    });
    PollHandle { name, task }
}

/// Run `task` once after `delay`.
pub fn after<Fut>(name: &'static str, delay: Duration, task: Fut) -> PollHandle
where
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        time::sleep(delay).await;
        debug!("Running delayed task '{}'", name);
        task.await;
    });
    PollHandle { name, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_every_ticks_immediately_and_repeats() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handle = every("test", Duration::from_secs(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(25)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(handle.name(), "test");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticking() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handle = every("dropped", Duration::from_secs(1), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_millis(1500)).await;
        let seen = count.load(Ordering::SeqCst);
        assert_eq!(seen, 2);

        drop(handle);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_runs_once_and_cancel_prevents_it() {
        let count = Arc::new(AtomicUsize::new(0));

        let counter = count.clone();
        let handle = after("once", Duration::from_secs(3), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.join().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let counter = count.clone();
        let handle = after("cancelled", Duration::from_secs(3), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.cancel();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
