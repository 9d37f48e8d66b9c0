use serde::Deserialize;

/// Global application settings loaded from environment variables.
///
/// Every option has a default, so a bare invocation against the public
/// endpoint works without any configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// ClickCounter contract address (0x-prefixed hex).
    pub contract_address: String,

    /// Root directory for all published JSON artifacts.
    pub data_dir: String,

    /// Maximum chain-read attempts before the run aborts.
    pub max_retries: u32,

    /// Per-attempt RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Backoff base delay in milliseconds.
    pub backoff_base_ms: u64,

    /// Backoff growth factor per attempt.
    pub backoff_growth: f64,

    /// Backoff delay ceiling in milliseconds.
    pub backoff_cap_ms: u64,

    /// Stored documents larger than this are treated as unreadable.
    pub max_file_bytes: u64,

    /// Stored `maxStreak` values above this are treated as corrupt.
    pub streak_ceiling: u32,

    /// Click deltas above this may also count as a previous-day check-in.
    pub burst_threshold: u64,
}

impl Settings {
    /// Load settings from environment variables (with optional `.env` file).
    pub fn from_env() -> eyre::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            rpc_url: std::env::var("RPC_URL")
                .unwrap_or_else(|_| "https://tea-sepolia.g.alchemy.com/public".into()),
            contract_address: std::env::var("CONTRACT_ADDRESS")
                .unwrap_or_else(|_| "0x0b9eD03FaA424eB56ea279462BCaAa5bA0d2eC45".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "public".into()),
            max_retries: std::env::var("MAX_RETRIES")
                .unwrap_or_else(|_| "20".into())
                .parse()?,
            rpc_timeout_secs: std::env::var("RPC_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".into())
                .parse()?,
            backoff_base_ms: std::env::var("BACKOFF_BASE_MS")
                .unwrap_or_else(|_| "1000".into())
                .parse()?,
            backoff_growth: std::env::var("BACKOFF_GROWTH")
                .unwrap_or_else(|_| "1.5".into())
                .parse()?,
            backoff_cap_ms: std::env::var("BACKOFF_CAP_MS")
                .unwrap_or_else(|_| "30000".into())
                .parse()?,
            max_file_bytes: std::env::var("MAX_FILE_BYTES")
                .unwrap_or_else(|_| (50 * 1024 * 1024).to_string())
                .parse()?,
            streak_ceiling: std::env::var("STREAK_CEILING")
                .unwrap_or_else(|_| "30".into())
                .parse()?,
            burst_threshold: std::env::var("BURST_THRESHOLD")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
        })
    }
}
