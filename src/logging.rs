use tracing_subscriber::EnvFilter;

/// Install the subscriber once, at process start. `--debug` wins over
/// `RUST_LOG`; without either the default stays quiet at warn.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
