// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Task scheduler for timed background jobs
//!
//! Jobs run in singleton mode: a firing that arrives while the previous
//! execution of the same job is still running is skipped, never queued.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Per-job execution counters
#[derive(Debug, Default)]
pub struct TaskStats {
    in_flight: AtomicBool,
    runs: AtomicU64,
    skipped: AtomicU64,
    last_run: Mutex<Option<DateTime<Utc>>>,
    last_success: Mutex<Option<DateTime<Utc>>>,
}

impl TaskStats {
    /// Claim the job for one execution, or `None` if it is already running
    fn try_begin(self: &Arc<Self>) -> Option<InFlight> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(self.clone()))
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Clears the in-flight flag when the execution ends, including on panic
struct InFlight(Arc<TaskStats>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

/// Point-in-time view of a job's counters
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub name: String,
    pub interval: Duration,
    pub runs: u64,
    pub skipped: u64,
    pub running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
}

struct ScheduledTask {
    interval: Duration,
    stats: Arc<TaskStats>,
    handle: JoinHandle<()>,
}

pub struct Scheduler {
    tasks: RwLock<HashMap<String, ScheduledTask>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            tasks: RwLock::new(HashMap::new()),
            shutdown_tx,
        }
    }

    /// Run `job` every `interval`, first firing one interval from now.
    ///
    /// Scheduling a name that already exists replaces the old job.
    pub fn schedule_singleton<F, Fut>(&self, name: &str, interval: Duration, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let stats = Arc::new(TaskStats::default());
        let handle = tokio::spawn(tick_loop(
            name.to_string(),
            interval,
            job,
            stats.clone(),
            self.shutdown_tx.subscribe(),
        ));

        let previous = self.tasks.write().insert(
            name.to_string(),
            ScheduledTask { interval, stats, handle },
        );
        if let Some(old) = previous {
            old.handle.abort();
        }
        debug!("Scheduled task '{}' with interval {:?}", name, interval);
    }

    pub fn task_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn stats(&self, name: &str) -> Option<TaskSnapshot> {
        self.tasks.read().get(name).map(|task| TaskSnapshot {
            name: name.to_string(),
            interval: task.interval,
            runs: task.stats.runs.load(Ordering::Relaxed),
            skipped: task.stats.skipped.load(Ordering::Relaxed),
            running: task.stats.is_running(),
            last_run: *task.stats.last_run.lock(),
            last_success: *task.stats.last_success.lock(),
        })
    }

    pub fn remove_task(&self, name: &str) {
        if let Some(task) = self.tasks.write().remove(name) {
            task.handle.abort();
        }
    }

    /// Stop every tick loop. Executions already in flight are left to finish.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        let tasks: Vec<_> = self.tasks.write().drain().collect();
        info!("Scheduler stopped ({} tasks)", tasks.len());
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn tick_loop<F, Fut>(
    name: String,
    period: Duration,
    job: F,
    stats: Arc<TaskStats>,
    mut shutdown: broadcast::Receiver<()>,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(guard) = stats.try_begin() else {
                    stats.skipped.fetch_add(1, Ordering::Relaxed);
                    debug!("Task '{}' still running, skipping this firing", name);
                    continue;
                };

                stats.runs.fetch_add(1, Ordering::Relaxed);
                *stats.last_run.lock() = Some(Utc::now());

                let execution = job();
                let stats = stats.clone();
                let name = name.clone();
                tokio::spawn(async move {
                    let _guard = guard;
                    match execution.await {
                        Ok(()) => *stats.last_success.lock() = Some(Utc::now()),
                        Err(e) => warn!("Task '{}' failed: {:#}", name, e),
                    }
                });
            }
            _ = shutdown.recv() => {
                debug!("Task '{}' stopped", name);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_firings_are_skipped() {
        let scheduler = Scheduler::new();
        scheduler.schedule_singleton("slow", Duration::from_millis(100), || async {
            tokio::time::sleep(Duration::from_millis(350)).await;
            Ok(())
        });

        tokio::time::sleep(Duration::from_millis(1050)).await;

        let stats = scheduler.stats("slow").unwrap();
        assert_eq!(stats.runs, 3);
        assert!(stats.skipped >= 6);
        assert!(stats.last_success.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_records_no_success() {
        let scheduler = Scheduler::new();
        scheduler.schedule_singleton("broken", Duration::from_secs(1), || async {
            Err(anyhow::anyhow!("unreachable host"))
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;

        let stats = scheduler.stats("broken").unwrap();
        assert_eq!(stats.runs, 2);
        assert_eq!(stats.skipped, 0);
        assert!(stats.last_run.is_some());
        assert!(stats.last_success.is_none());
        assert!(!stats.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_firing() {
        let scheduler = Scheduler::new();
        let counter = Arc::new(AtomicU64::new(0));
        let c = counter.clone();
        scheduler.schedule_singleton("count", Duration::from_secs(1), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        });
        assert_eq!(scheduler.task_names(), vec!["count".to_string()]);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        scheduler.shutdown();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(counter.load(Ordering::Relaxed), 1);
        assert!(scheduler.task_names().is_empty());
    }
}
