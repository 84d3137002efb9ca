//! Ad bidding under a deadline
//!
//! This module provides:
//! - The `Bidder` abstraction and the bundled bidders
//! - A factory resolving bidders by their configured name
//! - `Auction`, which runs one bidder through the bounded selector
//!
//! If a bidder does not answer within the budget, the auction returns the
//! configured default bid instead.

pub mod bidder;
pub mod simulated;

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::config::BiddingConfig;
use crate::schema::Bid;
use crate::selector::{BoundedSelector, Deadline, Selection};

use bidder::Bidder;

/// Returns a bidder instance by name.
///
/// RETURNS:
/// - `Some(Arc<dyn Bidder>)` if the bidder is known
/// - `None` otherwise
///
/// `max_delay` only matters for the random bidder.
pub fn get_bidder(name: &str, max_delay: Duration) -> Option<Arc<dyn Bidder>> {
    match name {
        "simulated" => Some(Arc::new(simulated::SimulatedBidder)),
        "random" => Some(Arc::new(simulated::RandomBidder { max_delay })),
        _ => None,
    }
}

/// One bidder, one fallback, one time budget.
pub struct Auction {
    selector: BoundedSelector<Bid>,
    bidder: Arc<dyn Bidder>,
    budget: Duration,
}

impl Auction {
    pub fn new(bidder: Arc<dyn Bidder>, cfg: &BiddingConfig) -> Self {
        Self {
            selector: BoundedSelector::new(cfg.default_bid.clone()).with_strategy(cfg.handoff),
            bidder,
            budget: Duration::from_millis(cfg.deadline_ms),
        }
    }

    /// Bids on `url` within the configured budget.
    pub async fn bid_on(&self, url: &str) -> Selection<Bid> {
        self.bid_on_until(url, Deadline::after(self.budget)).await
    }

    /// Bids on `url`, giving up when `deadline` fires.
    pub async fn bid_on_until(&self, url: &str, deadline: Deadline) -> Selection<Bid> {
        let bidder = self.bidder.clone();
        let target = url.to_string();

        let selection = self
            .selector
            .select(async move { bidder.best_bid(&target).await }, deadline)
            .await;

        info!(
            "auction [{}] {} -> {} (fallback={})",
            self.bidder.name(),
            url,
            selection.value,
            selection.used_fallback()
        );
        selection
    }
}
