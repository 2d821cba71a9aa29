use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// Debug mode prints human-readable lines with file and line numbers; any
/// other mode emits one JSON object per event. `RUST_LOG` overrides the
/// default `info` filter in both cases.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if debug {
        fmt()
            .with_env_filter(filter)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(false)
            .init();
    } else {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    }
}
