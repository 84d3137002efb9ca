use std::time::Duration;

use rand::random_range;
use tokio::time::sleep;

use crate::error::TaskError;
use crate::schema::Bid;

use super::bidder::Bidder;

/// Stand-in for the algorithm team's bidder.
///
/// Secure pages are cheap to evaluate (20ms), everything else is slow
/// (100ms). The bid itself is always the same 7¢ ad.
pub struct SimulatedBidder;

impl SimulatedBidder {
    pub fn work_time(url: &str) -> Duration {
        if url.starts_with("https://") {
            Duration::from_millis(20)
        } else {
            Duration::from_millis(100)
        }
    }
}

#[async_trait::async_trait]
impl Bidder for SimulatedBidder {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn best_bid(&self, url: &str) -> Result<Bid, TaskError> {
        sleep(Self::work_time(url)).await;

        Ok(Bid {
            ad_url: "http://adsЯus.com/ad17".to_string(),
            price: 7,
        })
    }
}

/// Bidder with random latency and price.
///
/// Latency is uniform in `0..max_delay`, so against a deadline inside
/// that range some auctions are won and some fall back.
pub struct RandomBidder {
    pub max_delay: Duration,
}

#[async_trait::async_trait]
impl Bidder for RandomBidder {
    fn name(&self) -> &'static str {
        "random"
    }

    async fn best_bid(&self, url: &str) -> Result<Bid, TaskError> {
        let max_ms = self.max_delay.as_millis().max(1) as u64;
        sleep(Duration::from_millis(random_range(0..max_ms))).await;

        let price: u32 = random_range(1..=20);
        Ok(Bid {
            ad_url: format!("http://adsЯus.com/ad{price}?for={url}"),
            price,
        })
    }
}
