use crate::error::TaskError;
use crate::schema::Bid;

/// Bidder is the abstraction between:
/// - The bounded selector running the auction under a deadline
/// - Bidding algorithms, whose time to completion varies
///
/// Each implementation must:
/// - Produce at most one bid per call
/// - Report failures as `TaskError`, never panic on bad input
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - Instances are shared across selector workers
///
/// Implementations do not need to watch the clock: the selector enforces
/// the deadline and falls back to the default bid on its own.
#[async_trait::async_trait]
pub trait Bidder: Send + Sync {
    /// Canonical bidder name, as used in configuration.
    fn name(&self) -> &'static str;

    /// Computes the best bid for an ad slot on `url`.
    async fn best_bid(&self, url: &str) -> Result<Bid, TaskError>;
}
