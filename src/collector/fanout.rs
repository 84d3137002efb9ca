use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::error::TaskError;
use crate::metrics::{METRICS, RuntimeMetrics};
use crate::schema::{Outcome, Verdict};
use crate::worker::run_guarded;

use super::latch::Countdown;

type Work<T> = Pin<Box<dyn Future<Output = Result<T, TaskError>> + Send>>;

/// One unit of work, identified by a caller-chosen key (a path, a URL…).
pub struct Task<T> {
    pub id: String,
    work: Work<T>,
}

impl<T> Task<T> {
    pub fn new<F>(id: impl Into<String>, work: F) -> Self
    where
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            work: Box::pin(work),
        }
    }
}

/// What a worker pushes into the collection channel.
#[derive(Debug, Clone)]
pub struct Delivery<T> {
    pub id: String,
    pub outcome: Outcome<T>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub id: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub id: String,
    pub error: TaskError,
}

/// Aggregated result of one collection run.
///
/// Lists are in completion order, which is nondeterministic. Compare
/// membership, never position.
#[derive(Debug, Clone)]
pub struct Report {
    /// Tasks launched
    pub total: usize,

    /// Outcomes received (equals `total` once the run is over)
    pub received: usize,

    pub matched: Vec<String>,
    pub mismatches: Vec<Mismatch>,
    pub errors: Vec<Failure>,

    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl Report {
    /// Overall verdict: no mismatch and no error.
    pub fn success(&self) -> bool {
        self.mismatches.is_empty() && self.errors.is_empty()
    }
}

// ------------------------------------------------------------
// Collection session
// ------------------------------------------------------------
//
// Mutable state of one run. Lives on the collecting task only and is
// turned into a `Report` once every outcome has arrived.
//
struct Session {
    total: usize,
    received: usize,
    matched: Vec<String>,
    mismatches: Vec<Mismatch>,
    errors: Vec<Failure>,
    started_at: DateTime<Utc>,
}

impl Session {
    fn new(total: usize) -> Self {
        Self {
            total,
            received: 0,
            matched: Vec::new(),
            mismatches: Vec::new(),
            errors: Vec::new(),
            started_at: Utc::now(),
        }
    }

    fn record<T: Verdict>(&mut self, delivery: Delivery<T>) {
        self.received += 1;
        match delivery.outcome {
            Outcome::Success(v) if v.is_match() => self.matched.push(delivery.id),
            Outcome::Success(v) => {
                RuntimeMetrics::incr(&METRICS.mismatches);
                self.mismatches.push(Mismatch {
                    id: delivery.id,
                    detail: v.detail(),
                });
            }
            Outcome::Failure(error) => {
                RuntimeMetrics::incr(&METRICS.task_errors);
                self.errors.push(Failure {
                    id: delivery.id,
                    error,
                });
            }
        }
    }

    fn finish(self, elapsed: Duration) -> Report {
        Report {
            total: self.total,
            received: self.received,
            matched: self.matched,
            mismatches: self.mismatches,
            errors: self.errors,
            started_at: self.started_at,
            elapsed,
        }
    }
}

/// Launches one worker per task and waits for all of them.
///
/// DESIGN:
/// - One spawned worker per task, started unconditionally
/// - Workers share one channel sender and never close it
/// - The collecting task counts outcomes down and closes the channel from
///   the reader side when the count reaches zero
///
/// GUARANTEES:
/// - Exactly one outcome per task, even if the task panics
/// - A failing worker never affects the other workers or the collector
///
/// There is no global deadline: a task that never finishes keeps the
/// collection open.
#[derive(Debug, Clone)]
pub struct FanOutCollector {
    label: String,
}

impl FanOutCollector {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub async fn collect_all<T>(&self, tasks: Vec<Task<T>>) -> Report
    where
        T: Verdict + Send + 'static,
    {
        self.collect_all_with_progress(tasks, |_| {}).await
    }

    /// Same as `collect_all`, calling `on_delivery` for every outcome as
    /// it arrives (completion order).
    pub async fn collect_all_with_progress<T, P>(
        &self,
        tasks: Vec<Task<T>>,
        mut on_delivery: P,
    ) -> Report
    where
        T: Verdict + Send + 'static,
        P: FnMut(&Delivery<T>),
    {
        let start = Instant::now();
        let total = tasks.len();
        let mut session = Session::new(total);

        // Room for every outcome: a worker's send never waits on the reader.
        let (tx, mut rx) = mpsc::channel::<Delivery<T>>(total.max(1));

        info!("[{}] launching {} workers", self.label, total);
        for Task { id, work } in tasks {
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = run_guarded(work).await;
                if tx.send(Delivery { id, outcome }).await.is_err() {
                    // Only possible if the collector itself was dropped.
                    debug!("collector gone, outcome dropped");
                }
            });
        }
        drop(tx);

        let mut countdown = Countdown::new(total);
        if countdown.is_zero() {
            rx.close();
        }

        while let Some(delivery) = rx.recv().await {
            on_delivery(&delivery);
            session.record(delivery);
            RuntimeMetrics::incr(&METRICS.workers_delivered);

            if countdown.count_down() {
                rx.close();
            }
        }

        if !countdown.is_zero() {
            warn!(
                "[{}] channel drained with {} outcomes missing",
                self.label,
                countdown.remaining()
            );
        }

        let report = session.finish(start.elapsed());
        info!(
            "[{}] collected {}/{} outcomes: {} matched, {} mismatched, {} failed",
            self.label,
            report.received,
            report.total,
            report.matched.len(),
            report.mismatches.len(),
            report.errors.len(),
        );
        report
    }
}
