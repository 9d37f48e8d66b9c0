use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use gmboard_store::models::{DailyCheckInRecord, UserStreakRecord};
use gmboard_store::{Store, user_key};
use tracing::{error, info, warn};

/// Recomputes per-user streak state from the full daily history.
///
/// Nothing stored is trusted: every run derives streaks, totals and
/// monthly counts from the daily records alone, so corruption in a prior
/// run's output heals itself. Stored state is consulted only to carry a
/// `maxStreak` that the surviving history can no longer prove, and even
/// then only when it passes sanity checks.
#[derive(Debug, Clone)]
pub struct StreakCalculator {
    /// Stored `maxStreak` values above this are treated as corrupt.
    ceiling: u32,
}

/// Streak state derived purely from check-in dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStreak {
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_check_ins: u32,
    pub last_check_in: Option<NaiveDate>,
    pub months: BTreeMap<String, u32>,
}

impl StreakCalculator {
    pub fn new(ceiling: u32) -> Self {
        Self { ceiling }
    }

    /// Derive streak state from a user's distinct check-in dates, given in
    /// ascending order.
    ///
    /// A date exactly one day after the previous one extends the run; any
    /// gap resets it to 1. Equal dates cannot occur (one mark per day) but
    /// are skipped defensively.
    pub fn compute(&self, dates: &[NaiveDate]) -> ComputedStreak {
        let mut current = 0u32;
        let mut max = 0u32;
        let mut total = 0u32;
        let mut months: BTreeMap<String, u32> = BTreeMap::new();
        let mut prev: Option<NaiveDate> = None;

        for &date in dates {
            match prev {
                Some(p) if date == p => continue,
                Some(p) if (date - p).num_days() == 1 => current += 1,
                _ => current = 1,
            }
            max = max.max(current);
            total += 1;
            *months
                .entry(format!("{:04}-{:02}", date.year(), date.month()))
                .or_insert(0) += 1;
            prev = Some(date);
        }

        ComputedStreak {
            current_streak: current,
            max_streak: max,
            total_check_ins: total,
            last_check_in: prev,
            months,
        }
    }

    /// Merge freshly computed state with a stored record, distrusting
    /// stored values that fail sanity checks.
    pub fn heal(&self, address: &str, stored: &UserStreakRecord, computed: ComputedStreak) -> UserStreakRecord {
        let max_streak = if stored.max_streak > self.ceiling
            || stored.max_streak > computed.total_check_ins
        {
            if stored.max_streak > 0 {
                warn!(
                    user = %address,
                    stored = stored.max_streak,
                    computed = computed.max_streak,
                    ceiling = self.ceiling,
                    "Stored maxStreak fails sanity check, overwriting with computed value"
                );
            }
            computed.max_streak
        } else {
            stored.max_streak.max(computed.max_streak)
        };

        if stored.months.values().any(|&n| n > 31) {
            warn!(user = %address, "Stored month counts exceed 31 days, replacing wholesale");
        }

        UserStreakRecord {
            current_streak: computed.current_streak,
            max_streak,
            last_check_in: computed.last_check_in,
            total_check_ins: computed.total_check_ins,
            months: computed.months,
        }
    }

    /// Recompute and rewrite every user's streak record from the daily
    /// history. Returns the largest `maxStreak` across all users, for the
    /// global summary.
    ///
    /// Per-user write failures are logged and skipped: partial streak data
    /// beats a crashed run, and the next run rewrites everything anyway.
    pub fn recompute_all(
        &self,
        store: &mut Store,
        records: &BTreeMap<NaiveDate, DailyCheckInRecord>,
    ) -> u32 {
        let mut dates_by_user: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();
        for (&date, record) in records {
            for user in record.users.keys() {
                dates_by_user.entry(user.clone()).or_default().push(date);
            }
        }

        let mut global_max = 0u32;
        let users = dates_by_user.len();
        for (user, dates) in dates_by_user {
            let key = user_key(&user);
            let stored: UserStreakRecord = store.read_json(&key, UserStreakRecord::default());
            let healed = self.heal(&user, &stored, self.compute(&dates));
            global_max = global_max.max(healed.max_streak);

            if let Err(e) = store.write_json(&key, &healed) {
                error!(user = %user, error = %e, "Failed to persist streak record, continuing");
            }
        }

        info!(users, global_max, "Streak recomputation complete");
        global_max
    }
}
