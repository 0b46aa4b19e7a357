/// Installs the process-wide `tracing` subscriber: `RUST_LOG`-driven level
/// filtering, falling back to `info` for this crate's own spans and
/// `warn` everywhere else so a default run isn't flooded by dependency
/// chatter.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,ledgerdb=info".into()),
        )
        .init();
}
