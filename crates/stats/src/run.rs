use chrono::NaiveDate;
use gmboard_chain::ClickSnapshot;
use gmboard_store::models::LeaderboardArtifact;
use gmboard_store::{LEADERBOARD_KEY, Store, StoreError};

use crate::daily::{DailyAggregator, previous_clicks};
use crate::publish;
use crate::streaks::StreakCalculator;
use crate::summary::SummaryBuilder;

/// Tunables for one aggregation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub today: NaiveDate,
    /// ISO-8601 timestamp stamped into every artifact written this run.
    pub now_iso: String,
    pub burst_threshold: u64,
    pub streak_ceiling: u32,
}

/// What a completed run produced, for the operator-facing summary log.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub total_users: u64,
    pub new_check_ins: u64,
    pub check_ins_today: u64,
    pub total_check_ins: u64,
    pub max_streak: u32,
}

/// Execute the full pipeline against an already-fetched snapshot:
/// daily reconciliation, streak recomputation, summary + compat, and
/// finally the published leaderboard.
///
/// Only the summary, compat and leaderboard writes can fail the run;
/// daily and per-user write failures are absorbed upstream. If the
/// leaderboard write fails, the next run diffs against the last published
/// snapshot — deltas then span two periods, which the one-mark-per-day
/// rule already tolerates.
pub fn run_once(
    store: &mut Store,
    snapshot: &ClickSnapshot,
    options: &RunOptions,
) -> Result<RunReport, StoreError> {
    let previous: LeaderboardArtifact =
        store.read_json(LEADERBOARD_KEY, LeaderboardArtifact::default());
    let previous = previous_clicks(&previous);

    let aggregator = DailyAggregator::new(options.burst_threshold);
    let outcome = aggregator.reconcile(store, snapshot, &previous, options.today);

    let calculator = StreakCalculator::new(options.streak_ceiling);
    let max_streak = calculator.recompute_all(store, &outcome.records);

    let builder = SummaryBuilder;
    let summary = builder.build(
        &outcome.records,
        options.today,
        snapshot.len() as u64,
        max_streak,
        &options.now_iso,
    );
    let compat = builder.compat_from(&summary, options.today, outcome.records.get(&options.today));
    builder.persist(store, &summary, &compat)?;

    let artifact = publish::build_leaderboard(snapshot, &summary);
    publish::publish(store, &artifact)?;

    Ok(RunReport {
        total_users: summary.total_users,
        new_check_ins: outcome.new_check_ins,
        check_ins_today: summary.check_ins_today,
        total_check_ins: summary.total_check_ins,
        max_streak: summary.max_streak,
    })
}
