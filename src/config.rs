use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::checksum::Algorithm;
use crate::schema::Bid;
use crate::selector::HandoffStrategy;

/// Environment variable overriding `verify.root_dir`.
pub const ROOT_ENV: &str = "BOUNDED_COLLECTOR_ROOT";

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Top-level configuration loaded from `config.json`.
//
// It defines:
// - Auction settings (budget, fallback bid, handoff strategy)
// - Where the signature index lives and how files are hashed
// - Optional debug configuration
//
// Every section is optional; missing values take the defaults below.
//
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub bidding: BiddingConfig,
    pub verify: VerifyConfig,
    pub debug: Option<DebugConfig>,
}

// ------------------------------------------------------------
// Bidding configuration
// ------------------------------------------------------------
//
// Notes:
// - `default_bid` is what an auction returns when the bidder is late or
//   fails. It is never mutated at runtime.
// - `handoff` picks how a late bid is disposed of.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BiddingConfig {
    /// Time budget per auction in milliseconds
    pub deadline_ms: u64,

    pub handoff: HandoffStrategy,

    /// Bidder name ("simulated", "random")
    pub bidder: String,

    pub default_bid: Bid,
}

impl Default for BiddingConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 50,
            handoff: HandoffStrategy::Buffered,
            bidder: "simulated".to_string(),
            default_bid: Bid {
                ad_url: "http://adsЯus.com/default".to_string(),
                price: 3,
            },
        }
    }
}

impl BiddingConfig {
    /// Upper bound on how long a simulated bidder may dawdle: twice the
    /// budget, so roughly half the auctions run late.
    pub fn bidder_max_delay(&self) -> Duration {
        Duration::from_millis(self.deadline_ms.saturating_mul(2))
    }
}

// ------------------------------------------------------------
// Verification configuration
// ------------------------------------------------------------
//
// The index is `root_dir/index_file`; each entry `name` resolves to
// `root_dir/<name><file_suffix>`.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VerifyConfig {
    /// Directory with the index and the files. The
    /// `BOUNDED_COLLECTOR_ROOT` environment variable overrides it; "." when
    /// neither is set.
    pub root_dir: Option<PathBuf>,

    pub index_file: String,

    pub file_suffix: String,

    pub algorithm: Algorithm,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            index_file: "sha256sum.txt".to_string(),
            file_suffix: ".gz".to_string(),
            algorithm: Algorithm::Sha256,
        }
    }
}

// ------------------------------------------------------------
// Debug configuration
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DebugConfig {
    /// Enables debug-level logging
    pub log: Option<bool>,
}

impl Config {
    pub fn debug_log(&self) -> bool {
        self.debug.as_ref().is_some_and(|d| d.log.unwrap_or(false))
    }

    /// Rejects values that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.bidding.deadline_ms == 0 {
            bail!("bidding.deadline_ms must be greater than zero");
        }
        if self.verify.index_file.trim().is_empty() {
            bail!("verify.index_file must not be empty");
        }
        Ok(())
    }

    /// Effective verification root: explicit override, then the
    /// environment, then config, then the working directory.
    pub fn verify_root(&self, cli_root: Option<&Path>) -> PathBuf {
        self.resolve_root(cli_root, std::env::var_os(ROOT_ENV))
    }

    fn resolve_root(&self, cli_root: Option<&Path>, env_root: Option<OsString>) -> PathBuf {
        if let Some(root) = cli_root {
            return root.to_path_buf();
        }
        if let Some(root) = env_root.filter(|r| !r.is_empty()) {
            return PathBuf::from(root);
        }
        self.verify
            .root_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Reads and validates a JSON configuration file.
///
/// A missing file is not an error: the built-in defaults are used.
pub fn load_config(path: &Path) -> Result<Config> {
    let cfg: Config = match fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?,
        Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
        Err(e) => {
            return Err(e).with_context(|| format!("reading config {}", path.display()));
        }
    };

    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.bidding.deadline_ms, 50);
        assert_eq!(cfg.bidding.default_bid.price, 3);
        assert_eq!(cfg.verify.index_file, "sha256sum.txt");
        assert_eq!(cfg.verify.algorithm, Algorithm::Sha256);
        assert!(!cfg.debug_log());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "bidding": { "deadline_ms": 10, "handoff": "rendezvous" },
                "verify": { "file_suffix": "", "algorithm": "sha512" },
                "debug": { "log": true }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.bidding.deadline_ms, 10);
        assert_eq!(cfg.bidding.handoff, HandoffStrategy::Rendezvous);
        assert_eq!(cfg.bidding.bidder, "simulated");
        assert_eq!(cfg.verify.file_suffix, "");
        assert_eq!(cfg.verify.algorithm, Algorithm::Sha512);
        assert!(cfg.debug_log());
    }

    #[test]
    fn zero_deadline_is_rejected() {
        let cfg: Config = serde_json::from_str(r#"{ "bidding": { "deadline_ms": 0 } }"#).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn huge_deadline_does_not_overflow_bidder_delay() {
        let cfg: Config =
            serde_json::from_str(&format!(r#"{{ "bidding": {{ "deadline_ms": {} }} }}"#, u64::MAX))
                .unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.bidding.bidder_max_delay(), Duration::from_millis(u64::MAX));
        assert_eq!(BiddingConfig::default().bidder_max_delay(), Duration::from_millis(100));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("config.json")).unwrap();
        assert_eq!(cfg.bidding.deadline_ms, 50);
    }

    #[test]
    fn broken_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn cli_root_beats_everything() {
        let mut cfg = Config::default();
        cfg.verify.root_dir = Some(PathBuf::from("/from/config"));

        let root = cfg.resolve_root(Some(Path::new("/from/cli")), Some("/from/env".into()));
        assert_eq!(root, PathBuf::from("/from/cli"));
    }

    #[test]
    fn env_root_beats_config_root() {
        let mut cfg = Config::default();
        cfg.verify.root_dir = Some(PathBuf::from("/from/config"));

        assert_eq!(cfg.resolve_root(None, Some("/from/env".into())), PathBuf::from("/from/env"));
        assert_eq!(cfg.resolve_root(None, None), PathBuf::from("/from/config"));
    }

    #[test]
    fn root_defaults_to_working_dir() {
        let cfg = Config::default();
        assert_eq!(cfg.resolve_root(None, None), PathBuf::from("."));
        assert_eq!(cfg.resolve_root(None, Some(OsString::new())), PathBuf::from("."));
    }
}
