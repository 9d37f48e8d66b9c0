use std::collections::HashMap;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use thiserror::Error;
use tokio_retry::Retry;
use tracing::warn;

use crate::abi::ClickCounter;
use crate::provider::HttpProvider;
use crate::retry::GrowthBackoff;

/// Chain-read failure, surfaced only after every retry attempt is spent.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc call failed: {0}")]
    Rpc(String),

    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),
}

// ─── Snapshot ───────────────────────────────────────────────────────────────

/// One (address, cumulative clicks) pair as returned by the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Lowercase 0x-prefixed hex address.
    pub address: String,
    pub clicks: u64,
}

/// The full click-count snapshot for one run.
///
/// Entries preserve the contract's return order — that order is the
/// tie-break for the published leaderboard's stable sort.
#[derive(Debug, Clone, Default)]
pub struct ClickSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl ClickSnapshot {
    /// Build a snapshot from parallel address/count arrays, normalising
    /// addresses to lowercase hex. Counts beyond `u64` are clamped with a
    /// warning (a click counter cannot plausibly reach 2^64).
    pub fn from_pairs(users: &[Address], counts: &[U256]) -> Self {
        let mut entries: Vec<SnapshotEntry> = Vec::with_capacity(users.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(users.len());

        for (user, count) in users.iter().zip(counts.iter()) {
            let address = format!("{user:#x}");
            let clicks = u64::try_from(*count).unwrap_or_else(|_| {
                warn!(user = %address, clicks = %count, "Click count exceeds u64, clamping");
                u64::MAX
            });

            match index.get(&address) {
                // Contract should never return duplicates; last value wins.
                Some(&at) => entries[at].clicks = clicks,
                None => {
                    index.insert(address.clone(), entries.len());
                    entries.push(SnapshotEntry { address, clicks });
                }
            }
        }

        Self { entries }
    }

    /// Build a snapshot from already-normalised entries, preserving their
    /// order. Used by callers that do not go through the RPC path.
    pub fn from_entries(entries: Vec<SnapshotEntry>) -> Self {
        Self { entries }
    }

    /// Entries in original chain order.
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── Fetch ──────────────────────────────────────────────────────────────────

/// Retry policy for one snapshot fetch.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Total attempts before giving up (first try included).
    pub max_attempts: u32,
    /// Per-attempt RPC timeout. A timeout counts as a failed attempt.
    pub attempt_timeout: Duration,
    pub backoff: GrowthBackoff,
}

/// Fetch the current `(address, clicks)` snapshot from the contract.
///
/// Retries transient failures with backoff; fails only once the attempt
/// budget is exhausted. Nothing has been written at that point, so the
/// caller can abort the run safely.
pub async fn fetch_snapshot(
    provider: &HttpProvider,
    contract_address: Address,
    config: &FetchConfig,
) -> Result<ClickSnapshot, ChainError> {
    let contract = ClickCounter::new(contract_address, provider.clone());
    let strategy = config
        .backoff
        .clone()
        .take(config.max_attempts.saturating_sub(1) as usize);

    Retry::spawn(strategy, || async {
        let call = contract.getLeaderboard();
        match tokio::time::timeout(config.attempt_timeout, call.call()).await {
            Ok(Ok(ret)) => Ok(ClickSnapshot::from_pairs(&ret.users, &ret.clickCounts)),
            Ok(Err(e)) => {
                warn!(error = %e, "getLeaderboard call failed, will retry");
                Err(ChainError::Rpc(e.to_string()))
            }
            Err(_) => {
                warn!(timeout = ?config.attempt_timeout, "getLeaderboard call timed out, will retry");
                Err(ChainError::Timeout(config.attempt_timeout))
            }
        }
    })
    .await
}
