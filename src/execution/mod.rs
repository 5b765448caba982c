//! Ordered, bounded-concurrency task scheduling.
//!
//! [`Scheduler`] runs one worker future per input item with at most `max_concurrency` of them in
//! flight. Results come back in input order regardless of completion order.
//!
//! Failure handling follows [`FailurePolicy`]:
//!
//! - [`FailurePolicy::FailFast`]: after the first failure no new tasks start. Tasks already in
//!   flight are drained, and items never started are reported as [`TaskOutcome::Skipped`].
//! - [`FailurePolicy::Continue`]: every item runs; failures are kept alongside successes.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use futures::stream::FuturesUnordered;

use crate::config::FailurePolicy;

pub mod observer;

pub use observer::{
    SchedulerEvent, SchedulerMetrics, SchedulerMetricsSnapshot, SchedulerObserver,
    TracingSchedulerObserver,
};

/// Result of one scheduled task, stored at the item's input index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T, E> {
    Completed(T),
    Failed(E),
    /// Never started because an earlier task failed under [`FailurePolicy::FailFast`].
    Skipped,
}

impl<T, E> TaskOutcome<T, E> {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TaskOutcome::Skipped)
    }
}

pub struct Scheduler {
    max_concurrency: usize,
    policy: FailurePolicy,
    observer: Option<Arc<dyn SchedulerObserver>>,
    metrics: Arc<SchedulerMetrics>,
}

impl Scheduler {
    /// A `max_concurrency` of zero is treated as one.
    pub fn new(max_concurrency: usize, policy: FailurePolicy) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            policy,
            observer: None,
            metrics: Arc::new(SchedulerMetrics::new()),
        }
    }

    pub fn with_observer(mut self, observer: Option<Arc<dyn SchedulerObserver>>) -> Self {
        self.observer = observer;
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn metrics(&self) -> Arc<SchedulerMetrics> {
        Arc::clone(&self.metrics)
    }

    fn emit(&self, event: SchedulerEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }

    /// Run `worker(index, item)` for every item and return the outcomes in input order.
    pub async fn run<I, T, E, F, Fut>(&self, items: Vec<I>, worker: F) -> Vec<TaskOutcome<T, E>>
    where
        F: Fn(usize, I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let total = items.len();
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(SchedulerEvent::RunStarted {
            tasks: total,
            max_concurrency: self.max_concurrency,
        });

        let mut outcomes: Vec<TaskOutcome<T, E>> =
            (0..total).map(|_| TaskOutcome::Skipped).collect();
        let mut pending = items.into_iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut stop_starting = false;

        loop {
            while !stop_starting && in_flight.len() < self.max_concurrency {
                let Some((index, item)) = pending.next() else {
                    break;
                };
                self.metrics.on_task_start();
                self.emit(SchedulerEvent::TaskStarted { index });
                let task = worker(index, item);
                in_flight.push(async move {
                    let began = Instant::now();
                    let res = task.await;
                    (index, res, began.elapsed())
                });
            }

            let Some((index, res, elapsed)) = in_flight.next().await else {
                break;
            };
            let ok = res.is_ok();
            self.metrics.on_task_end(ok);
            self.emit(SchedulerEvent::TaskFinished { index, ok, elapsed });

            outcomes[index] = match res {
                Ok(v) => TaskOutcome::Completed(v),
                Err(e) => {
                    if self.policy == FailurePolicy::FailFast {
                        stop_starting = true;
                    }
                    TaskOutcome::Failed(e)
                }
            };
        }

        let elapsed = start.elapsed();
        self.metrics.end_run(elapsed);
        self.emit(SchedulerEvent::RunFinished {
            elapsed,
            metrics: self.metrics.snapshot(),
        });
        outcomes
    }

    /// Like [`Scheduler::run`], but collapse the outcomes into all values or the failure with the
    /// lowest input index.
    pub async fn try_run<I, T, E, F, Fut>(&self, items: Vec<I>, worker: F) -> Result<Vec<T>, E>
    where
        F: Fn(usize, I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let outcomes = self.run(items, worker).await;
        let mut values = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Completed(v) => values.push(v),
                TaskOutcome::Failed(e) => return Err(e),
                TaskOutcome::Skipped => {}
            }
        }
        Ok(values)
    }
}
