use crate::error::AssistError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Log file written under the configured log directory
pub const LOG_FILE_NAME: &str = "callassist.log";

/// HTTP client crates that log every connection at debug level
const NOISY_TARGETS: &[&str] = &["reqwest", "hyper", "h2"];

/// Initialize logging to stderr and `<log_dir>/callassist.log`
///
/// Answers printed by the CLI go to stdout, so the console layer stays on
/// stderr. `RUST_LOG` overrides `log_level` for both layers.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<(), AssistError> {
    let level = parse_log_level(log_level)?;
    let (log_file, log_file_path) = open_log_file(log_dir)?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter(level));

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::FULL)
        .with_filter(env_filter(level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AssistError::config(format!("Failed to initialize logging: {}", e)))?;

    tracing::info!("Logging initialized: level={}, log_file={}", level, log_file_path.display());
    Ok(())
}

/// Stderr-only logging for short commands that leave no audit trail
pub fn setup_console_logging(log_level: &str) -> Result<(), AssistError> {
    let level = parse_log_level(log_level)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(env_filter(level))
        .try_init()
        .map_err(|e| AssistError::config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Parse a `LOG_LEVEL` value
pub fn parse_log_level(level: &str) -> Result<Level, AssistError> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(AssistError::config(format!(
            "Invalid log level '{}' (expected trace, debug, info, warn or error)",
            other
        ))),
    }
}

/// Filter directives used when `RUST_LOG` is unset
///
/// HTTP client internals are capped at `warn` unless the level is `trace`.
fn default_directives(level: Level) -> String {
    let mut directives = level.to_string().to_lowercase();
    if level != Level::TRACE {
        for target in NOISY_TARGETS {
            directives.push_str(&format!(",{}=warn", target));
        }
    }
    directives
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

fn open_log_file(log_dir: &Path) -> Result<(File, PathBuf), AssistError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        AssistError::config(format!("Failed to create log directory {}: {}", log_dir.display(), e))
    })?;

    let path = log_dir.join(LOG_FILE_NAME);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| AssistError::config(format!("Failed to open log file {}: {}", path.display(), e)))?;

    Ok((file, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_levels_accepted() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level(" Warning ").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("TRACE").unwrap(), Level::TRACE);
    }

    #[test]
    fn test_unknown_level_is_config_error() {
        let err = parse_log_level("verbose").unwrap_err();
        assert!(matches!(err, AssistError::Config(_)));
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_http_noise_capped_below_trace() {
        assert_eq!(default_directives(Level::DEBUG), "debug,reqwest=warn,hyper=warn,h2=warn");
        assert_eq!(default_directives(Level::TRACE), "trace");
    }

    #[test]
    fn test_log_file_created_in_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs").join("cli");

        let (_file, path) = open_log_file(&log_dir).unwrap();
        assert_eq!(path, log_dir.join(LOG_FILE_NAME));
        assert!(path.exists());

        // Reopening appends to the same file
        std::fs::write(&path, "first\n").unwrap();
        let (mut file, _) = open_log_file(&log_dir).unwrap();
        std::io::Write::write_all(&mut file, b"second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
