use crate::{config::LoggingConfig, paths::AppDirs};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides the configured filter directive.
pub const LOG_ENV_VAR: &str = "SONAR_LOG";

const DEFAULT_LOG_FILE: &str = "sonar.log";

/// HTTP internals are chatty at debug level; keep them at warn unless the
/// user asks for them explicitly via `SONAR_LOG`.
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "reqwest=warn", "mio=warn"];

/// Keeps the non-blocking file writer flushing until dropped.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init_logging(config: &LoggingConfig, dirs: &AppDirs) -> Result<LoggingGuard, LoggingError> {
    let log_dir = dirs.log_dir().to_path_buf();
    fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.clone(),
        source,
    })?;

    let directive = filter_directive(config, std::env::var(LOG_ENV_VAR).ok().as_deref());
    let env_filter =
        EnvFilter::try_new(&directive).map_err(|source| LoggingError::ParseLevel {
            level: directive.clone(),
            source,
        })?;

    let (file_writer, file_guard) = build_file_writer(config, &log_dir)?;
    let writer: BoxMakeWriter = match (config.console, file_writer) {
        (true, Some(file)) => BoxMakeWriter::new(
            std::io::stderr
                .with_max_level(tracing::Level::TRACE)
                .and(file),
        ),
        (true, None) => BoxMakeWriter::new(std::io::stderr),
        (false, Some(file)) => BoxMakeWriter::new(file),
        (false, None) => BoxMakeWriter::new(std::io::sink),
    };

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(config.console)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::SubscriberInstall)?;

    tracing::debug!(%directive, log_dir = %log_dir.display(), "logging initialised");
    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn filter_directive(config: &LoggingConfig, env_override: Option<&str>) -> String {
    match env_override.map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => explicit.to_string(),
        None => {
            let mut parts = vec![config.level.as_filter_directive().to_string()];
            parts.extend(QUIET_DEPENDENCIES.iter().map(|d| d.to_string()));
            parts.join(",")
        }
    }
}

fn build_file_writer(
    config: &LoggingConfig,
    log_dir: &Path,
) -> Result<(Option<NonBlocking>, Option<WorkerGuard>), LoggingError> {
    let max_files = config.max_log_files.max(1);
    let file_stem = config.file_name.as_deref().unwrap_or(DEFAULT_LOG_FILE);
    cleanup_old_logs(log_dir, file_stem, max_files)?;

    let appender = tracing_appender::rolling::daily(log_dir, file_stem);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    Ok((Some(non_blocking), Some(guard)))
}

fn cleanup_old_logs(dir: &Path, file_stem: &str, max_files: usize) -> Result<(), LoggingError> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(file_stem) {
                return None;
            }
            entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|mtime| (entry.path(), mtime))
        })
        .collect();

    if entries.len() <= max_files {
        return Ok(());
    }

    entries.sort_by_key(|(_, modified)| *modified);
    let remove_count = entries.len() - max_files;
    for (path, _) in entries.into_iter().take(remove_count) {
        fs::remove_file(&path).map_err(|source| LoggingError::Cleanup { path, source })?;
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse log filter {level}: {source}")]
    ParseLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInstall(Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to list log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove old log file {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
}
