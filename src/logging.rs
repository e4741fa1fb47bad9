use tracing_subscriber::{fmt, EnvFilter};

/// Overrides the default filter, e.g. `MIA_LOG=mia::bus=trace`.
pub const LOG_ENV: &str = "MIA_LOG";

/// Installs a global `fmt` subscriber for native hosts and tests. Fails if
/// one is already installed.
pub fn init_host_logging(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).or_else(|_| EnvFilter::try_new(default_filter))?;
    fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}
