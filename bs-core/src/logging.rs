use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber; `env_filter` uses `RUST_LOG` syntax, so a bare level
/// like `info` works as well as per-target directives.
pub fn setup(env_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
