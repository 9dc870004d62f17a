//! Periodic background tasks on tokio timers.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns a background task; dropping the handle cancels it.
#[derive(Debug)]
pub struct PeriodicHandle {
    name: &'static str,
    task: JoinHandle<()>,
}

impl PeriodicHandle {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PeriodicHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `task` once after `initial_delay`, then every `period`.
///
/// Runs never overlap: a run that overruns its period delays the next one
/// instead of bunching up.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    initial_delay: Duration,
    period: Duration,
    mut task: F,
) -> PeriodicHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let period = period.max(Duration::from_millis(1));
    let handle = tokio::spawn(async move {
        tokio::time::sleep(initial_delay).await;
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            tracing::trace!(task = name, "periodic task running");
            task().await;
        }
    });
    PeriodicHandle { name, task: handle }
}

/// Run `task` once after `delay`, cancelled with the returned handle.
pub fn spawn_delayed<Fut>(name: &'static str, delay: Duration, task: Fut) -> PeriodicHandle
where
    Fut: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        task.await;
    });
    PeriodicHandle { name, task: handle }
}
