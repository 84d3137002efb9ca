//! Small helpers shared by the callers.
//!
//! IMPORTANT:
//! - No selector or collector logic should live here.
//! - This module must remain lightweight and deterministic.
//!

use std::future::Future;
use std::time::{Duration, Instant};

/// Runs `fut` and returns its output together with the wall-clock time
/// it took.
pub async fn timed<F: Future>(fut: F) -> (F::Output, Duration) {
    let start = Instant::now();
    let out = fut.await;
    (out, start.elapsed())
}

/// Formats a duration the way the summary line prints it.
///
/// Examples:
/// - 1.5s     -> "1.500s"
/// - 12ms     -> "12.000ms"
/// - 800µs    -> "800µs"
///
pub fn format_duration(d: Duration) -> String {
    if d >= Duration::from_secs(1) {
        format!("{:.3}s", d.as_secs_f64())
    } else if d >= Duration::from_millis(1) {
        format!("{:.3}ms", d.as_secs_f64() * 1_000.0)
    } else {
        format!("{}µs", d.as_micros())
    }
}
