use gmboard_chain::ClickSnapshot;
use gmboard_store::models::{
    CheckInStats, LeaderboardArtifact, LeaderboardEntry, LeaderboardStats, SummaryRecord,
};
use gmboard_store::{LEADERBOARD_KEY, Store, StoreError};
use tracing::info;

/// Assemble the published leaderboard: the snapshot sorted descending by
/// clicks (stable, so ties keep chain order) plus the summary-derived
/// stats block.
pub fn build_leaderboard(snapshot: &ClickSnapshot, summary: &SummaryRecord) -> LeaderboardArtifact {
    let mut entries = snapshot.entries().to_vec();
    entries.sort_by(|a, b| b.clicks.cmp(&a.clicks));

    LeaderboardArtifact {
        last_update: summary.last_update.clone(),
        data: entries
            .into_iter()
            .map(|e| LeaderboardEntry {
                user: e.address,
                clicks: e.clicks.to_string(),
            })
            .collect(),
        stats: LeaderboardStats {
            total_users: summary.total_users,
            check_ins: CheckInStats {
                total_check_ins: summary.total_check_ins,
                max_streak: summary.max_streak,
                check_ins_today: summary.check_ins_today,
                last_update: summary.last_update.clone(),
            },
        },
        total_check_ins: summary.total_check_ins,
    }
}

/// Write the final artifact. This file is both the UI's data source and
/// the next run's source of previous click counts, so a failure here
/// propagates and aborts the run.
pub fn publish(store: &mut Store, artifact: &LeaderboardArtifact) -> Result<(), StoreError> {
    store.write_json(LEADERBOARD_KEY, artifact)?;
    info!(users = artifact.data.len(), "Leaderboard published");
    Ok(())
}
