use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Map a `--loglevel` value to a filter. `warning` is accepted for `warn`.
pub fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        _ => None,
    }
}

/// Directives applied when `RUST_LOG` is unset: our crates at `level`,
/// dependencies at warn.
pub fn default_directives(level: LevelFilter) -> String {
    format!("warn,toolbox_lib={level},that_cli_web_toolbox={level}")
}

/// Install the process-wide subscriber writing to stderr. `RUST_LOG`, when
/// set, overrides `loglevel`.
pub fn init(loglevel: &str) {
    let level = parse_level(loglevel);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(default_directives(level.unwrap_or(LevelFilter::INFO)))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if level.is_none() {
        tracing::warn!(loglevel, "Unknown log level, falling back to info");
    }
}
