pub mod models;
pub mod store;

pub use store::{
    COMPAT_KEY, DAILY_DIR, LEADERBOARD_KEY, SUMMARY_KEY, Store, StoreError, daily_key, user_key,
};
