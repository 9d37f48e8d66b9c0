pub mod daily;
pub mod publish;
pub mod run;
pub mod streaks;
pub mod summary;

pub use daily::{DailyAggregator, DailyOutcome};
pub use run::{RunOptions, RunReport, run_once};
pub use streaks::{ComputedStreak, StreakCalculator};
pub use summary::SummaryBuilder;
