use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Result of one worker, produced exactly once per launched task.
///
/// This is the only thing a worker hands back to whoever launched it.
/// Both the selector and the collector rely on every worker delivering
/// exactly one `Outcome`: zero would deadlock the reader, two would
/// miscount the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(TaskError),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl<T> From<Result<T, TaskError>> for Outcome<T> {
    fn from(res: Result<T, TaskError>) -> Self {
        match res {
            Ok(v) => Outcome::Success(v),
            Err(e) => Outcome::Failure(e),
        }
    }
}

/// Judgement of a successful worker result.
///
/// The collector uses this to split successful outcomes into matched
/// items and mismatches without knowing what the payload is.
pub trait Verdict {
    fn is_match(&self) -> bool;

    /// Human readable detail printed next to a mismatch.
    fn detail(&self) -> String {
        String::new()
    }
}

// ------------------------------------------------------------
// Bid
// ------------------------------------------------------------
//
// An ad offer returned by a bidding algorithm.
//
// Price is kept in cents to avoid floating point.
//
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Bid {
    /// Ad to show if this bid wins
    pub ad_url: String,

    /// Price in ¢
    pub price: u32,
}

impl std::fmt::Display for Bid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}¢", self.ad_url, self.price)
    }
}

// ------------------------------------------------------------
// Verification
// ------------------------------------------------------------
//
// Signature computed for a file, next to the one the index expects.
//
// Hex digests are compared case-insensitively: index files in the
// wild are written in both cases.
//
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub expected: String,
    pub actual: String,
}

impl Verdict for Verification {
    fn is_match(&self) -> bool {
        self.expected.eq_ignore_ascii_case(&self.actual)
    }

    fn detail(&self) -> String {
        format!("expected {}, got {}", self.expected, self.actual)
    }
}

/// Sleep-sort values have nothing to compare against.
impl Verdict for u64 {
    fn is_match(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_ignores_hex_case() {
        let v = Verification {
            expected: "ABCDEF01".into(),
            actual: "abcdef01".into(),
        };
        assert!(v.is_match());
    }

    #[test]
    fn verification_detects_mismatch() {
        let v = Verification {
            expected: "aa".into(),
            actual: "ab".into(),
        };
        assert!(!v.is_match());
        assert_eq!(v.detail(), "expected aa, got ab");
    }

    #[test]
    fn outcome_from_result() {
        let ok: Outcome<u32> = Ok::<_, TaskError>(7).into();
        assert_eq!(ok, Outcome::Success(7));

        let err: Outcome<u32> = Err(TaskError::Cancelled).into();
        assert!(!err.is_success());
    }

    #[test]
    fn bid_roundtrips_through_json() {
        let bid = Bid {
            ad_url: "http://adsЯus.com/ad17".into(),
            price: 7,
        };
        let json = serde_json::to_string(&bid).unwrap();
        assert_eq!(serde_json::from_str::<Bid>(&json).unwrap(), bid);
        assert_eq!(bid.to_string(), "http://adsЯus.com/ad17 @ 7¢");
    }
}
