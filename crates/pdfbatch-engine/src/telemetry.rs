//! Optional convenience for embedders that want a default `tracing`
//! subscriber without configuring one themselves.

/// Installs a `tracing-subscriber` `fmt` subscriber as the process-wide
/// default, honoring `RUST_LOG` via `EnvFilter` and falling back to `info`
/// level when it is unset. Intended to be called once, near process start,
/// by a binary embedding this engine; the engine itself never calls this on
/// its own behalf.
///
/// Returns an error if a global default subscriber was already installed.
pub fn init_tracing() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
}
