use tracing_subscriber::EnvFilter;

/// Filter directives for [`init`], e.g. `ENVKIT_LOG=envkit=debug`.
pub const LOG_ENV_VAR: &str = "ENVKIT_LOG";

/// Installs a stderr `fmt` subscriber, defaulting to `info`.
///
/// Library code only emits events; binaries call this once at startup. Does
/// nothing if a global subscriber is already set.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
