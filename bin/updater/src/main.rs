//! gmboard updater — derives the public leaderboard and daily check-in
//! stats from the ClickCounter contract.
//!
//! Flow:
//! 1. Fetch the full (address, clicks) snapshot with bounded retry/backoff
//! 2. Diff against the previously published leaderboard to infer check-ins
//! 3. Recompute every user's streak state from the daily history
//! 4. Publish summary, legacy mirror, and the final leaderboard
//!
//! Intended to be invoked periodically by an external scheduler, one
//! instance at a time. Nothing is written until the chain read succeeds,
//! so a failed run leaves every published artifact untouched.

use std::process::ExitCode;
use std::time::Duration;

use alloy::primitives::Address;
use chrono::Utc;
use gmboard_chain::{FetchConfig, GrowthBackoff, create_provider, fetch_snapshot};
use gmboard_core::{AppError, Settings, telemetry};
use gmboard_stats::{RunOptions, run_once};
use gmboard_store::Store;

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Update failed; previously published artifacts remain in place");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let settings = Settings::from_env()?;
    tracing::info!(
        rpc = %settings.rpc_url,
        contract = %settings.contract_address,
        data_dir = %settings.data_dir,
        "Starting leaderboard update"
    );

    let provider = create_provider(&settings.rpc_url)?;
    let contract: Address = settings
        .contract_address
        .parse()
        .map_err(|e| AppError::Config(format!("invalid CONTRACT_ADDRESS: {e}")))?;

    let fetch = FetchConfig {
        max_attempts: settings.max_retries,
        attempt_timeout: Duration::from_secs(settings.rpc_timeout_secs),
        backoff: GrowthBackoff::new(
            settings.backoff_base_ms,
            settings.backoff_growth,
            settings.backoff_cap_ms,
        ),
    };
    let snapshot = fetch_snapshot(&provider, contract, &fetch)
        .await
        .map_err(|e| AppError::ChainUnavailable(e.to_string()))?;
    tracing::info!(users = snapshot.len(), "Snapshot fetched");

    let mut store = Store::new(settings.data_dir.as_str(), settings.max_file_bytes);
    let now = Utc::now();
    let report = run_once(
        &mut store,
        &snapshot,
        &RunOptions {
            today: now.date_naive(),
            now_iso: now.to_rfc3339(),
            burst_threshold: settings.burst_threshold,
            streak_ceiling: settings.streak_ceiling,
        },
    )
    .map_err(|e| AppError::Store(e.to_string()))?;

    tracing::info!(
        total_users = report.total_users,
        new_check_ins = report.new_check_ins,
        check_ins_today = report.check_ins_today,
        total_check_ins = report.total_check_ins,
        max_streak = report.max_streak,
        "Leaderboard updated"
    );
    Ok(())
}
