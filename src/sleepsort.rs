//! Sleep sort: fan-in ordering demo.
//!
//! Every value gets its own worker which sleeps that many milliseconds and
//! then reports the value. Collecting in completion order yields the values
//! sorted, as long as neighbouring values are far enough apart for the
//! scheduler to keep them in order.
//!
//! Not a sorting algorithm anyone should use. It shows that the collector
//! hands outcomes over in completion order and that it performs exactly
//! one receive per launched worker.
use std::time::Duration;

use tokio::time::sleep;

use crate::collector::{FanOutCollector, Task};
use crate::error::TaskError;
use crate::schema::Outcome;

pub async fn sleep_sort(values: &[u64]) -> Vec<u64> {
    let tasks: Vec<Task<u64>> = values
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            Task::new(format!("value#{i}"), async move {
                sleep(Duration::from_millis(n)).await;
                Ok::<_, TaskError>(n)
            })
        })
        .collect();

    let mut sorted = Vec::with_capacity(values.len());
    FanOutCollector::new("sleepsort")
        .collect_all_with_progress(tasks, |d| {
            if let Outcome::Success(n) = &d.outcome {
                sorted.push(*n);
            }
        })
        .await;
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn sorts_well_spaced_values() {
        let values = [300, 60, 600, 200, 0, 450];
        assert_eq!(sleep_sort(&values).await, vec![0, 60, 200, 300, 450, 600]);
    }

    #[tokio::test]
    async fn empty_input_returns_immediately() {
        assert!(sleep_sort(&[]).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn duplicates_are_all_kept() {
        let mut out = sleep_sort(&[5, 5, 5]).await;
        out.sort_unstable();
        assert_eq!(out, vec![5, 5, 5]);
    }
}
