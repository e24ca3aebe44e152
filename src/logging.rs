use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Filter override read before `RUST_LOG`.
pub const LOG_ENV: &str = "BINFLIX_LOG";

/// Installs the global stderr subscriber.
///
/// Directives come from `BINFLIX_LOG`, then `RUST_LOG`, then `default_directive`.
pub fn init(default_directive: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(default_directive))
        .with_context(|| format!("build log filter from {default_directive:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
