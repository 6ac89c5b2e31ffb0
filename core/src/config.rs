//! Indexer configuration.
//!
//! Every field has a default, so a JSON config file only needs to name what it
//! overrides. Command-line flags are applied on top by the `webdex` binary.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 4;
/// Token boundaries: any run of characters that is neither a letter nor a digit.
pub const DEFAULT_DELIMITERS: &str = r"[^\p{L}\p{N}]+";
pub const DEFAULT_MIN_TERM_LEN: usize = 2;
pub const DEFAULT_MAX_TERM_LEN: usize = 10;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_USER_AGENT: &str = "webdex/0.1";

/// Which tokens consume a slot in the position counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionCounting {
    /// Every piece produced by the delimiter split, admitted or not.
    #[default]
    AllTokens,
    /// Only admitted tokens; discarded pieces leave no gap.
    AdmittedOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub delimiters: String,
    pub stem: bool,
    /// Inclusive lower bound on term length, in characters.
    pub min_term_len: usize,
    /// Exclusive upper bound on term length, in characters.
    pub max_term_len: usize,
    pub positions: PositionCounting,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.to_string(),
            stem: false,
            min_term_len: DEFAULT_MIN_TERM_LEN,
            max_term_len: DEFAULT_MAX_TERM_LEN,
            positions: PositionCounting::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_body_bytes: usize,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Number of worker threads, fixed for the lifetime of the pool.
    pub workers: usize,
    /// Maximum number of documents waiting to be dequeued. `None` means unbounded.
    pub queue_capacity: Option<usize>,
    /// Keep finished documents for [`crate::Indexer::take_processed`]. Off by default,
    /// in which case records are dropped once merged.
    pub retain_processed: bool,
    pub tokenizer: TokenizerConfig,
    pub fetch: FetchConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: None,
            retain_processed: false,
            tokenizer: TokenizerConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl IndexerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: IndexerConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.queue_capacity == Some(0) {
            bail!("queue_capacity must be at least 1 when set");
        }
        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be at least 1");
        }
        let t = &self.tokenizer;
        if t.min_term_len > t.max_term_len {
            bail!(
                "tokenizer.min_term_len ({}) exceeds tokenizer.max_term_len ({})",
                t.min_term_len,
                t.max_term_len
            );
        }
        Regex::new(&t.delimiters)
            .with_context(|| format!("invalid delimiter pattern {:?}", t.delimiters))?;
        Ok(())
    }
}
