use std::{path::Path, sync::LazyLock};

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const SESSION_PREFIX: &str = "session";

const DEFAULT_LEVEL: &str = "info";

/// Filter limited to this crate's targets. An explicit level wins over `RUST_LOG`.
pub fn filter_directive(log_level: Option<LevelFilter>, env_level: Option<String>) -> String {
    let level = match (log_level, env_level) {
        (Some(level), _) => level.to_string(),
        (None, Some(env)) if !env.trim().is_empty() => env.trim().to_string(),
        (None, _) => DEFAULT_LEVEL.to_string(),
    };
    format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// Installs the process subscriber. Session activity is always written to daily rotated files
/// under `log_dir`. `show_std` adds a pretty console layer on top.
pub fn enable_logging(
    prefix: &str,
    log_dir: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(log_dir)
        .with_context(|| format!("Failed to open log directory {log_dir:?}"))?;

    let filter = EnvFilter::new(filter_directive(log_level, std::env::var("RUST_LOG").ok()));

    let file_layer = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE);
    let console_layer = show_std.then(|| fmt::layer().pretty().with_span_events(FmtSpan::CLOSE));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
});

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::filter_directive;

    #[test]
    fn explicit_level_overrides_environment() {
        assert_eq!(
            filter_directive(Some(LevelFilter::TRACE), Some("warn".into())),
            "pomodoro_logger=trace"
        );
    }

    #[test]
    fn environment_level_is_used_when_no_level_is_given() {
        assert_eq!(
            filter_directive(None, Some(" debug ".into())),
            "pomodoro_logger=debug"
        );
    }

    #[test]
    fn defaults_to_info() {
        assert_eq!(filter_directive(None, None), "pomodoro_logger=info");
        assert_eq!(filter_directive(None, Some(String::new())), "pomodoro_logger=info");
    }
}
