use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,sqlx=warn,sea_orm=warn";

/// Install the global subscriber. `json` selects machine-readable lines; the
/// human format is meant for local runs of the simulator.
pub fn init_tracing(json: bool) {
    init_tracing_with(json, DEFAULT_FILTER);
}

/// Like [`init_tracing`], with the filter used when `RUST_LOG` is unset.
pub fn init_tracing_with(json: bool, default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(false)
        .with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt_layer.json()).init();
    } else {
        registry.with(fmt_layer.compact()).init();
    }
}
