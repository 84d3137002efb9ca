use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use log::warn;

use crate::error::TaskError;
use crate::metrics::{METRICS, RuntimeMetrics};
use crate::schema::Outcome;

/// Runs one task to completion and turns whatever happens into an `Outcome`.
///
/// GUARANTEES:
/// - Always returns, even if the task panics
/// - A panic becomes `Outcome::Failure(TaskError::Panicked)`
///
/// Both the selector and the collector launch their workers through this
/// function so the exactly-once delivery rule holds for misbehaving tasks
/// too.
pub async fn run_guarded<T, F>(task: F) -> Outcome<T>
where
    F: Future<Output = Result<T, TaskError>>,
{
    RuntimeMetrics::incr(&METRICS.workers_spawned);

    match AssertUnwindSafe(task).catch_unwind().await {
        Ok(res) => res.into(),
        Err(payload) => {
            let msg = panic_message(&*payload);
            warn!("worker panicked: {}", msg);
            Outcome::Failure(TaskError::Panicked(msg))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
