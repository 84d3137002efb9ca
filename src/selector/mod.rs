//! Bounded-time selection
//!
//! Runs exactly one producer in the background and races it against a
//! deadline. Whatever wins decides what the caller gets back:
//! - the producer's value, if it arrived first
//! - the caller's fallback, if the deadline fired first or the producer
//!   failed
//!
//! GUARANTEES:
//! - The caller never waits past the deadline
//! - The producer is never left blocked on a delivery nobody will read
//!   (see `handoff`)
//! - The producer is not cancelled on timeout unless the caller opts in
//!   through `select_cancellable`
//!
mod handoff;

pub use handoff::{HandoffStrategy, WorkerFate};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::metrics::{METRICS, RuntimeMetrics};
use crate::schema::Outcome;
use crate::worker::run_guarded;

/// Fire-once timer owned by the caller.
///
/// The selector only needs to know *that* it fired, so any future
/// resolving to `()` can serve as a deadline.
pub struct Deadline {
    timer: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self::from_future(tokio::time::sleep(budget))
    }

    pub fn at(instant: Instant) -> Self {
        Self::from_future(tokio::time::sleep_until(instant))
    }

    pub fn from_future<F>(timer: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            timer: Box::pin(timer),
        }
    }
}

impl Future for Deadline {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.timer.as_mut().poll(cx)
    }
}

/// Where the value of a `Selection` came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Worker,
    Timeout,
    Failed(TaskError),
}

/// Background worker left behind by a selection.
///
/// Dropping it detaches the worker; awaiting `fate` observes how its
/// delivery ended.
#[derive(Debug)]
pub struct WorkerHandle {
    inner: JoinHandle<WorkerFate>,
}

impl WorkerHandle {
    pub async fn fate(self) -> WorkerFate {
        // Workers catch their own panics, so a join error means the runtime
        // tore the task down and nothing was delivered.
        self.inner.await.unwrap_or(WorkerFate::Discarded)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

#[derive(Debug)]
pub struct Selection<T> {
    pub value: T,
    pub source: Source,
    pub worker: WorkerHandle,
}

impl<T> Selection<T> {
    pub fn used_fallback(&self) -> bool {
        self.source != Source::Worker
    }

    /// `(value, used_fallback)`, detaching the worker.
    pub fn into_parts(self) -> (T, bool) {
        let used_fallback = self.used_fallback();
        (self.value, used_fallback)
    }
}

/// Races one producer against a deadline, falling back to a fixed value.
///
/// The fallback is an immutable value supplied at construction; every
/// selection returns a clone of it when the producer does not win.
#[derive(Debug, Clone)]
pub struct BoundedSelector<T> {
    fallback: T,
    strategy: HandoffStrategy,
}

impl<T> BoundedSelector<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(fallback: T) -> Self {
        Self {
            fallback,
            strategy: HandoffStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: HandoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn fallback(&self) -> &T {
        &self.fallback
    }

    /// Runs `task` in the background and returns its value if it beats
    /// `deadline`, the fallback otherwise.
    ///
    /// A failing task yields the fallback with `Source::Failed`, so the
    /// caller can tell a broken producer from a slow one.
    pub async fn select<F>(&self, task: F, deadline: Deadline) -> Selection<T>
    where
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        self.race(task, deadline, None).await
    }

    /// Like `select`, but the task receives a token that is cancelled as
    /// soon as the deadline wins. The task decides where to observe it.
    pub async fn select_cancellable<F, M>(&self, make: M, deadline: Deadline) -> Selection<T>
    where
        M: FnOnce(CancellationToken) -> F,
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let task = make(token.clone());
        self.race(task, deadline, Some(token)).await
    }

    async fn race<F>(
        &self,
        task: F,
        mut deadline: Deadline,
        cancel: Option<CancellationToken>,
    ) -> Selection<T>
    where
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        RuntimeMetrics::incr(&METRICS.selections);

        let (tx, mut rx) = handoff::channel(self.strategy);
        let worker = WorkerHandle {
            inner: tokio::spawn(async move {
                let outcome = run_guarded(task).await;
                tx.deliver(outcome).await
            }),
        };

        tokio::select! {
            // A value already sitting in the slot wins over an expired deadline.
            biased;

            received = rx.recv() => {
                let err = match received {
                    Ok(Outcome::Success(value)) => {
                        debug!("selector: worker answered in time");
                        return Selection { value, source: Source::Worker, worker };
                    }
                    Ok(Outcome::Failure(e)) | Err(e) => e,
                };
                info!("selector: worker failed ({}), using fallback", err);
                RuntimeMetrics::incr(&METRICS.fallbacks);
                Selection {
                    value: self.fallback.clone(),
                    source: Source::Failed(err),
                    worker,
                }
            }

            _ = &mut deadline => {
                // The slot must be gone before the worker is woken, or a
                // cancelled worker can still land its value in it.
                rx.abandon();
                if let Some(token) = cancel {
                    token.cancel();
                }
                info!("selector: deadline elapsed, using fallback");
                RuntimeMetrics::incr(&METRICS.fallbacks);
                Selection {
                    value: self.fallback.clone(),
                    source: Source::Timeout,
                    worker,
                }
            }
        }
    }

    /// Convenience for a relative budget.
    pub async fn select_within<F>(&self, task: F, budget: Duration) -> Selection<T>
    where
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        self.select(task, Deadline::after(budget)).await
    }
}
