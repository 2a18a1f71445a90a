//! Centralized logging initialization with environment variable support

use crate::config::{AppConfig, LogFormat};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing subscriber with environment variable support
///
/// Environment variables (in priority order):
/// - `RUST_LOG`: Standard Rust log filter (takes precedence over all)
/// - `LOG_FORMAT`: Override format (json, pretty)
///
/// # Examples
///
/// ```bash
/// # See every copied fixture
/// RUST_LOG=testkit_core=debug testkit isolate simple
///
/// # Machine-readable logs in CI
/// LOG_FORMAT=json testkit stage --source fixtures --output target/testkit/fixtures
/// ```
///
/// Logs always go to stderr so command output on stdout stays parseable.
pub fn initialize(config: &AppConfig) {
    let log_level = config.logging.level.parse().unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let format = format_override(std::env::var("LOG_FORMAT").ok().as_deref())
        .unwrap_or_else(|| config.logging.format.clone());

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Install a subscriber that writes through the test harness' captured output
///
/// Safe to call from every test; only the first call installs anything.
pub fn try_initialize_for_tests() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parse a `LOG_FORMAT` value
pub fn format_override(value: Option<&str>) -> Option<LogFormat> {
    match value?.to_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" | "human" => Some(LogFormat::Pretty),
        _ => None,
    }
}

/// Span wrapping all work done for one fixture scope
///
/// # Example
///
/// ```rust
/// use testkit_config::logging::fixture_span;
///
/// let span = fixture_span("simple");
/// let _enter = span.enter();
/// tracing::info!("Copying fixture");
/// ```
pub fn fixture_span(fixture: &str) -> tracing::Span {
    tracing::info_span!("fixture", fixture = %fixture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_override() {
        assert_eq!(format_override(Some("JSON")), Some(LogFormat::Json));
        assert_eq!(format_override(Some("human")), Some(LogFormat::Pretty));
        assert_eq!(format_override(Some("xml")), None);
        assert_eq!(format_override(None), None);
    }

    #[test]
    fn test_repeated_test_initialization_is_harmless() {
        try_initialize_for_tests();
        try_initialize_for_tests();
        tracing::debug!("still alive");
    }
}
