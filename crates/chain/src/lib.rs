pub mod abi;
pub mod provider;
pub mod retry;
pub mod snapshot;

pub use abi::ClickCounter;
pub use provider::{HttpProvider, create_provider};
pub use retry::GrowthBackoff;
pub use snapshot::{ChainError, ClickSnapshot, FetchConfig, SnapshotEntry, fetch_snapshot};
