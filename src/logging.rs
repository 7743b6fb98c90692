use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. Keep the guard alive until exit or buffered lines are lost.
pub fn initialize_logging(config: &LoggingConfig) -> WorkerGuard {
    ensure_log_dir(&config.directory);

    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Logging initialized successfully.");
    guard
}

/// Creates `dir` if missing. Returns `false` and reports on stderr when it cannot.
fn ensure_log_dir(dir: &str) -> bool {
    // No subscriber is installed yet, so this one goes to stderr.
    match std::fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Could not create log directory {}: {}", dir, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_log_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/logs");
        assert!(ensure_log_dir(nested.to_str().unwrap()));
        assert!(nested.is_dir());

        // A regular file in the way cannot become a directory.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        assert!(!ensure_log_dir(blocker.join("logs").to_str().unwrap()));
    }
}
