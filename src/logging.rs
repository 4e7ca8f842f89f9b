use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize stderr logging.
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
pub fn init_logging(verbose: bool, quiet: bool) {
    let default_directive = if verbose {
        "redline=debug"
    } else if quiet {
        "redline=error"
    } else {
        "redline=warn"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_line_number(verbose)
        .with_file(verbose)
        .with_writer(std::io::stderr);

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
