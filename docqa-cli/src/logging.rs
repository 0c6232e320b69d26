use anyhow::{Context, Result};
use docqa_core::config::LoggingConfig;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the configured level. Logs go to stderr, or to
/// `logging.file` when set; the returned guard must live until exit so the
/// file writer can flush.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level: LevelFilter = config
        .level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let Some(file) = &config.file else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let path = Path::new(file);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("Log file path '{file}' has no file name"))?;

    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}
