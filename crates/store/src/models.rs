use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Daily check-ins ────────────────────────────────────────────────────────

/// Check-ins for one calendar date (`stats/daily/<YYYY-MM-DD>.json`).
///
/// Written only by the daily aggregator. `count == users.len()` after
/// reconciliation; the aggregator repairs any loaded violation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyCheckInRecord {
    pub count: u64,
    /// Addresses that checked in on this date. Values are always `true`;
    /// the map shape matches the published JSON schema.
    pub users: BTreeMap<String, bool>,
}

impl DailyCheckInRecord {
    /// Effective check-in count, trusting whichever of the two redundant
    /// fields is larger. Used when reading records this component does not
    /// own and therefore must not rewrite.
    pub fn effective_count(&self) -> u64 {
        self.count.max(self.users.len() as u64)
    }
}

// ─── Per-user streaks ───────────────────────────────────────────────────────

/// Streak state for one user (`stats/users/<shard>/<address>.json`).
///
/// Fully recomputed from the daily records each run; stored values are
/// only consulted for `maxStreak` carry-over, and even then distrusted
/// when they fail sanity checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStreakRecord {
    pub current_streak: u32,
    pub max_streak: u32,
    pub last_check_in: Option<NaiveDate>,
    pub total_check_ins: u32,
    /// Distinct check-in dates per `YYYY-MM` month. Never above 31.
    #[serde(default)]
    pub months: BTreeMap<String, u32>,
}

// ─── Global summary ─────────────────────────────────────────────────────────

/// Global summary (`stats/summary.json`), rewritten whole once per run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub last_update: String,
    pub total_users: u64,
    pub check_ins_today: u64,
    pub total_check_ins: u64,
    pub max_streak: u32,
    /// Check-in counts for the 7 most recent calendar dates ending today.
    pub last_seven_days: BTreeMap<String, u64>,
}

/// The summary subset embedded in the leaderboard and compat artifacts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStats {
    pub total_check_ins: u64,
    pub max_streak: u32,
    pub check_ins_today: u64,
    pub last_update: String,
}

// ─── Published leaderboard ──────────────────────────────────────────────────

/// One leaderboard row. `clicks` stays a decimal string, matching what the
/// UI has always consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user: String,
    pub clicks: String,
}

/// Stats block embedded in the leaderboard artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStats {
    pub total_users: u64,
    pub check_ins: CheckInStats,
}

/// The published output (`leaderboard.json`) — the UI's sole data source
/// and the next run's source of previous click counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardArtifact {
    pub last_update: String,
    /// Descending by clicks; ties keep chain order.
    pub data: Vec<LeaderboardEntry>,
    pub stats: LeaderboardStats,
    pub total_check_ins: u64,
}

// ─── Legacy mirror ──────────────────────────────────────────────────────────

/// Legacy-schema mirror (`checkin_stats.json`), rewritten in lockstep with
/// the summary for consumers of the older layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatArtifact {
    pub stats: CheckInStats,
    /// Only today's record; historical days live in `stats/daily/`.
    pub daily_data: BTreeMap<String, DailyCheckInRecord>,
    /// Always empty in the current schema, kept for shape compatibility.
    pub streaks: BTreeMap<String, serde_json::Value>,
}
