use std::collections::BTreeMap;

use chrono::NaiveDate;
use gmboard_store::models::{CheckInStats, CompatArtifact, DailyCheckInRecord, SummaryRecord};
use gmboard_store::{COMPAT_KEY, SUMMARY_KEY, Store, StoreError};
use tracing::{info, warn};

/// Builds the global summary and its legacy mirror.
///
/// `totalCheckIns` is summed over every daily record on every run rather
/// than accumulated incrementally, so a drift bug in one run cannot
/// compound into the next.
#[derive(Debug, Clone, Default)]
pub struct SummaryBuilder;

impl SummaryBuilder {
    /// Assemble the summary from the reconciled daily history.
    pub fn build(
        &self,
        records: &BTreeMap<NaiveDate, DailyCheckInRecord>,
        today: NaiveDate,
        total_users: u64,
        max_streak: u32,
        now_iso: &str,
    ) -> SummaryRecord {
        let check_ins_today = records.get(&today).map(|r| r.count).unwrap_or(0);
        let mut total_check_ins: u64 = records.values().map(|r| r.count).sum();

        if total_check_ins < check_ins_today {
            warn!(
                total_check_ins,
                check_ins_today, "Total check-ins below today's count, raising to floor"
            );
            total_check_ins = check_ins_today;
        }

        let mut last_seven_days = BTreeMap::new();
        for offset in 0..7 {
            let Some(date) = today.checked_sub_days(chrono::Days::new(offset)) else {
                continue;
            };
            let count = if date == today {
                // Mirrors checkInsToday exactly, whatever the record says.
                check_ins_today
            } else {
                records.get(&date).map(|r| r.effective_count()).unwrap_or(0)
            };
            last_seven_days.insert(date.format("%Y-%m-%d").to_string(), count);
        }

        SummaryRecord {
            last_update: now_iso.to_string(),
            total_users,
            check_ins_today,
            total_check_ins,
            max_streak,
            last_seven_days,
        }
    }

    /// Derive the legacy-schema mirror from a just-built summary, so the
    /// two can never disagree within a run.
    pub fn compat_from(
        &self,
        summary: &SummaryRecord,
        today: NaiveDate,
        today_record: Option<&DailyCheckInRecord>,
    ) -> CompatArtifact {
        let mut daily_data = BTreeMap::new();
        daily_data.insert(
            today.format("%Y-%m-%d").to_string(),
            today_record.cloned().unwrap_or_default(),
        );

        CompatArtifact {
            stats: CheckInStats {
                total_check_ins: summary.total_check_ins,
                max_streak: summary.max_streak,
                check_ins_today: summary.check_ins_today,
                last_update: summary.last_update.clone(),
            },
            daily_data,
            streaks: BTreeMap::new(),
        }
    }

    /// Write the summary and compat documents. Both are load-bearing for
    /// the UI, so a failure here propagates and aborts the run.
    pub fn persist(
        &self,
        store: &mut Store,
        summary: &SummaryRecord,
        compat: &CompatArtifact,
    ) -> Result<(), StoreError> {
        store.write_json(SUMMARY_KEY, summary)?;
        store.write_json(COMPAT_KEY, compat)?;
        info!(
            total_check_ins = summary.total_check_ins,
            check_ins_today = summary.check_ins_today,
            "Summary published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(users: &[&str]) -> DailyCheckInRecord {
        let mut rec = DailyCheckInRecord::default();
        for user in users {
            rec.users.insert((*user).to_string(), true);
        }
        rec.count = users.len() as u64;
        rec
    }

    #[test]
    fn totals_are_recomputed_from_history() {
        let mut records = BTreeMap::new();
        records.insert(date("2024-03-08"), record(&["0xaa"]));
        records.insert(date("2024-03-09"), record(&["0xaa", "0xbb"]));
        records.insert(date("2024-03-10"), record(&["0xbb"]));

        let summary = SummaryBuilder.build(&records, date("2024-03-10"), 5, 3, "t");

        assert_eq!(summary.total_check_ins, 4);
        assert_eq!(summary.check_ins_today, 1);
        assert_eq!(summary.total_users, 5);
        assert_eq!(summary.max_streak, 3);
    }

    #[test]
    fn total_never_drops_below_todays_count() {
        let mut records = BTreeMap::new();
        records.insert(date("2024-03-10"), record(&["0xaa", "0xbb"]));

        let summary = SummaryBuilder.build(&records, date("2024-03-10"), 2, 0, "t");
        assert!(summary.total_check_ins >= summary.check_ins_today);
        assert_eq!(summary.total_check_ins, 2);
    }

    #[test]
    fn last_seven_days_covers_exactly_one_week() {
        let mut records = BTreeMap::new();
        records.insert(date("2024-03-10"), record(&["0xaa"]));
        records.insert(date("2024-03-07"), record(&["0xaa", "0xbb"]));
        // Older than the window, must not appear.
        records.insert(date("2024-03-01"), record(&["0xaa"]));

        let summary = SummaryBuilder.build(&records, date("2024-03-10"), 2, 1, "t");

        assert_eq!(summary.last_seven_days.len(), 7);
        assert_eq!(summary.last_seven_days["2024-03-10"], 1);
        assert_eq!(summary.last_seven_days["2024-03-07"], 2);
        assert_eq!(summary.last_seven_days["2024-03-04"], 0);
        assert!(!summary.last_seven_days.contains_key("2024-03-01"));
    }

    #[test]
    fn seven_day_window_distrusts_stale_counts() {
        // For past days the record may predate the count repair; the
        // window takes max(count, users).
        let mut stale = record(&["0xaa", "0xbb", "0xcc"]);
        stale.count = 1;
        let mut records = BTreeMap::new();
        records.insert(date("2024-03-09"), stale);

        let summary = SummaryBuilder.build(&records, date("2024-03-10"), 3, 1, "t");
        assert_eq!(summary.last_seven_days["2024-03-09"], 3);
    }

    #[test]
    fn compat_mirror_matches_summary() {
        let mut records = BTreeMap::new();
        records.insert(date("2024-03-10"), record(&["0xaa"]));
        let today = date("2024-03-10");

        let builder = SummaryBuilder;
        let summary = builder.build(&records, today, 1, 2, "2024-03-10T12:00:00Z");
        let compat = builder.compat_from(&summary, today, records.get(&today));

        assert_eq!(compat.stats.total_check_ins, summary.total_check_ins);
        assert_eq!(compat.stats.max_streak, summary.max_streak);
        assert_eq!(compat.stats.check_ins_today, summary.check_ins_today);
        assert_eq!(compat.stats.last_update, summary.last_update);
        assert_eq!(compat.daily_data["2024-03-10"].count, 1);
        assert!(compat.streaks.is_empty());
    }

    #[test]
    fn persist_writes_both_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::new(dir.path(), u64::MAX);

        let mut records = BTreeMap::new();
        let today = date("2024-03-10");
        records.insert(today, record(&["0xaa"]));

        let builder = SummaryBuilder;
        let summary = builder.build(&records, today, 1, 1, "t");
        let compat = builder.compat_from(&summary, today, records.get(&today));
        builder.persist(&mut store, &summary, &compat).unwrap();

        assert!(dir.path().join("stats/summary.json").exists());
        assert!(dir.path().join("checkin_stats.json").exists());
    }
}
