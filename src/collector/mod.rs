/// Collector module
///
/// This module groups all logic responsible for:
/// - Launching one worker per input item
/// - Collecting every worker's outcome in completion order
/// - Aggregating outcomes into a pass/fail report
///
/// Design notes:
/// - No admission control: every task starts immediately
/// - Workers only ever send; the single reader owns closing the channel
/// - What a task computes is the caller's business (see `checksum`,
///   `sleepsort`)
pub mod fanout;
pub mod latch;

pub use fanout::{Delivery, FanOutCollector, Report, Task};
