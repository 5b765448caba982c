use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Events emitted by the [`super::Scheduler`].
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    RunStarted { tasks: usize, max_concurrency: usize },
    TaskStarted { index: usize },
    TaskFinished { index: usize, ok: bool, elapsed: Duration },
    RunFinished {
        elapsed: Duration,
        metrics: SchedulerMetricsSnapshot,
    },
}

/// Observer hook for scheduler events.
pub trait SchedulerObserver: Send + Sync {
    fn on_event(&self, event: &SchedulerEvent);
}

/// Logs scheduler events through `tracing`: run boundaries at info, task events at debug.
#[derive(Debug, Default)]
pub struct TracingSchedulerObserver;

impl SchedulerObserver for TracingSchedulerObserver {
    fn on_event(&self, event: &SchedulerEvent) {
        match event {
            SchedulerEvent::RunStarted { tasks, max_concurrency } => {
                info!(tasks, max_concurrency, "batch started");
            }
            SchedulerEvent::TaskStarted { index } => debug!(index, "task started"),
            SchedulerEvent::TaskFinished { index, ok, elapsed } => {
                debug!(index, ok, elapsed_ms = elapsed.as_millis() as u64, "task finished");
            }
            SchedulerEvent::RunFinished { metrics, .. } => info!(%metrics, "batch finished"),
        }
    }
}

/// Real-time metrics for a scheduler run.
///
/// The scheduler updates these counters while it runs; callers can snapshot them at any time.
pub struct SchedulerMetrics {
    run_id: AtomicU64,
    started_at: Mutex<Option<Instant>>,
    elapsed_ns: AtomicU64,

    tasks_started: AtomicU64,
    tasks_finished: AtomicU64,
    tasks_failed: AtomicU64,

    active_tasks: AtomicUsize,
    max_active_tasks: AtomicUsize,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            started_at: Mutex::new(None),
            elapsed_ns: AtomicU64::new(0),
            tasks_started: AtomicU64::new(0),
            tasks_finished: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            active_tasks: AtomicUsize::new(0),
            max_active_tasks: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut started) = self.started_at.lock() {
            *started = Some(Instant::now());
        }

        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.tasks_started.store(0, Ordering::SeqCst);
        self.tasks_finished.store(0, Ordering::SeqCst);
        self.tasks_failed.store(0, Ordering::SeqCst);
        self.active_tasks.store(0, Ordering::SeqCst);
        self.max_active_tasks.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_task_start(&self) {
        let _ = self.tasks_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_tasks.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_tasks, now);
    }

    pub fn on_task_end(&self, ok: bool) {
        let _ = self.tasks_finished.fetch_add(1, Ordering::SeqCst);
        if !ok {
            let _ = self.tasks_failed.fetch_add(1, Ordering::SeqCst);
        }
        let _ = self.active_tasks.fetch_sub(1, Ordering::SeqCst);
    }

    /// Time since the current run began, if one has.
    pub fn running_for(&self) -> Option<Duration> {
        self.started_at.lock().ok().and_then(|s| s.map(|t| t.elapsed()))
    }

    pub fn snapshot(&self) -> SchedulerMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        SchedulerMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            tasks_started: self.tasks_started.load(Ordering::SeqCst),
            tasks_finished: self.tasks_finished.load(Ordering::SeqCst),
            tasks_failed: self.tasks_failed.load(Ordering::SeqCst),
            max_active_tasks: self.max_active_tasks.load(Ordering::SeqCst),
        }
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    loop {
        let cur = dst.load(Ordering::SeqCst);
        if now <= cur {
            break;
        }
        if dst
            .compare_exchange(cur, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            break;
        }
    }
}

/// Immutable snapshot of [`SchedulerMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub tasks_started: u64,
    pub tasks_finished: u64,
    pub tasks_failed: u64,
    pub max_active_tasks: usize,
}

impl fmt::Display for SchedulerMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, tasks={}/{}, failed={}, max_active_tasks={}, elapsed={:?}",
            self.run_id,
            self.tasks_finished,
            self.tasks_started,
            self.tasks_failed,
            self.max_active_tasks,
            self.elapsed
        )
    }
}
