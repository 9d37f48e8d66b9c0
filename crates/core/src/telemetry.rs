use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` takes priority. Otherwise `LOG_LEVEL` selects a verbosity
/// tier: `0` = summary only (warn), `1` = errors + changes (info),
/// `2` = verbose (debug). Defaults to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match std::env::var("LOG_LEVEL").as_deref() {
            Ok("0") => "warn",
            Ok("2") => "debug",
            _ => "info",
        };
        EnvFilter::new(level)
    });

    fmt().with_env_filter(filter).with_target(true).init();
}
