use crate::config::{Config, DebugLogRotation};
use anyhow::{Context, Result};
use regex::Regex;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "sok-debug.log";

#[allow(dead_code)]
pub struct LogGuard(WorkerGuard);

/// Initialize debug logging.
///
/// The TUI owns the terminal, so logs only ever go to a file:
/// `~/.config/sok/sok-debug.log` unless `debug_log_path` says otherwise.
/// When `debug` is disabled, this is a no-op.
pub fn init(config: &Config) -> Result<Option<LogGuard>> {
    if !config.debug {
        return Ok(None);
    }

    let rotation = config
        .debug_log_rotation
        .unwrap_or(DebugLogRotation::Session);
    let base = resolve_base_log_path(config.debug_log_path.as_deref())?;
    let (writer, log_path, guard) = open_writer(&base, rotation, config.debug_log_keep)?;

    // Default: debug our crate, warn for everything else.
    let filter = EnvFilter::try_new("sok=debug,warn").unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer)
        .try_init()
        .ok(); // Already initialized (e.g. in tests)

    tracing::info!("debug logging enabled");
    tracing::info!(log_file = %log_path.display(), rotation = ?rotation, "writing logs to file");

    Ok(Some(LogGuard(guard)))
}

fn open_writer(
    base: &Path,
    rotation: DebugLogRotation,
    keep: Option<usize>,
) -> Result<(NonBlocking, PathBuf, WorkerGuard)> {
    match rotation {
        DebugLogRotation::None => {
            let file = open_append(base)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            Ok((writer, base.to_path_buf(), guard))
        }
        DebugLogRotation::Daily => {
            let (dir, base_name) = split_dir_and_name(base)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

            cleanup_rotated_logs(&dir, RotationKind::Daily { base_name: base_name.clone() }, keep)?;

            let appender = tracing_appender::rolling::daily(&dir, &base_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            Ok((writer, base.to_path_buf(), guard))
        }
        DebugLogRotation::Session => {
            let (dir, base_name) = split_dir_and_name(base)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

            cleanup_rotated_logs(&dir, RotationKind::Session { base_name: base_name.clone() }, keep)?;

            let session_path = build_session_log_path(&dir, &base_name);
            let file = open_append(&session_path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            Ok((writer, session_path, guard))
        }
    }
}

fn open_append(path: &Path) -> Result<std::fs::File> {
    ensure_parent_dir(path)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

fn default_log_path() -> Result<PathBuf> {
    let config_path = crate::config::config_path()?;
    Ok(config_path.with_file_name(LOG_FILE_NAME))
}

fn resolve_base_log_path(config_value: Option<&str>) -> Result<PathBuf> {
    let Some(raw) = config_value else {
        return default_log_path();
    };

    let path = PathBuf::from(expand_tilde(raw));

    // Trailing separator or an existing directory: put the default file name inside.
    if raw.ends_with(std::path::MAIN_SEPARATOR) || path.is_dir() {
        return Ok(path.join(LOG_FILE_NAME));
    }

    Ok(path)
}

fn expand_tilde(raw: &str) -> String {
    if raw == "~" || raw.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let suffix = raw.strip_prefix('~').unwrap_or("");
            return format!("{}{}", home.display(), suffix);
        }
    }
    raw.to_string()
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    Ok(())
}

fn split_dir_and_name(path: &Path) -> Result<(PathBuf, String)> {
    let dir = path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .context("Invalid debug_log_path: not valid UTF-8")?
        .to_string();
    Ok((dir, name))
}

fn build_session_log_path(dir: &Path, base_name: &str) -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    dir.join(format!("{base_name}.session-{ts}"))
}

enum RotationKind {
    Daily { base_name: String },
    Session { base_name: String },
}

fn cleanup_rotated_logs(dir: &Path, kind: RotationKind, keep: Option<usize>) -> Result<()> {
    let keep = keep.unwrap_or(match kind {
        RotationKind::Daily { .. } => 7,
        RotationKind::Session { .. } => 20,
    });

    if keep == 0 {
        return Ok(());
    }

    let prefix = match &kind {
        // tracing_appender::rolling::daily uses `{base_name}.{YYYY-MM-DD}`
        RotationKind::Daily { base_name } => format!("{base_name}."),
        RotationKind::Session { base_name } => format!("{base_name}.session-"),
    };

    let mut candidates: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read log directory: {}", dir.display()))?
    {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else { continue };
        if name.starts_with(&prefix) {
            candidates.push(name.to_string());
        }
    }

    // Newest first; both suffix formats sort lexicographically by time.
    candidates.sort_unstable_by(|a, b| b.cmp(a));

    for name in candidates.iter().skip(keep) {
        let path = dir.join(name);
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::debug!(error = %e, file = %path.display(), "failed to remove old log file");
        }
    }

    Ok(())
}

/// Best-effort redaction of Google API keys, either as a `key=` query
/// parameter or as a bare `AIza...` token.
pub fn redact_secrets(input: &str) -> String {
    static KEY_PARAM: OnceLock<Regex> = OnceLock::new();
    static GOOGLE_KEY: OnceLock<Regex> = OnceLock::new();

    let key_param = KEY_PARAM.get_or_init(|| {
        Regex::new(r"([?&]key=)[^&\s]+").expect("static regex is valid")
    });
    let google_key = GOOGLE_KEY.get_or_init(|| {
        Regex::new(r"AIza[0-9A-Za-z_\-]{8,}").expect("static regex is valid")
    });

    let redacted = key_param.replace_all(input, "${1}***REDACTED***");
    google_key
        .replace_all(&redacted, "AIza***REDACTED***")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_redacts_key_query_param() {
        let url = "https://www.googleapis.com/customsearch/v1?q=lego&key=secret123&cx=abc";
        assert_eq!(
            redact_secrets(url),
            "https://www.googleapis.com/customsearch/v1?q=lego&key=***REDACTED***&cx=abc"
        );
    }

    #[test]
    fn test_redacts_bare_google_key() {
        let text = "API key not valid: AIzaSyA1b2C3d4E5f6G7";
        assert_eq!(redact_secrets(text), "API key not valid: AIza***REDACTED***");
        // Short tokens are left alone
        assert_eq!(redact_secrets("AIza12"), "AIza12");
    }

    #[test]
    fn test_resolve_directory_log_path() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().to_str().unwrap();
        let resolved = resolve_base_log_path(Some(raw)).unwrap();
        assert_eq!(resolved, dir.path().join(LOG_FILE_NAME));

        let file = dir.path().join("custom.log");
        let resolved = resolve_base_log_path(file.to_str()).unwrap();
        assert_eq!(resolved, file);
    }

    #[test]
    fn test_cleanup_keeps_newest_sessions() {
        let dir = TempDir::new().unwrap();
        for ts in ["20260101-000000", "20260102-000000", "20260103-000000"] {
            std::fs::write(dir.path().join(format!("sok.log.session-{ts}")), "").unwrap();
        }
        std::fs::write(dir.path().join("unrelated.txt"), "").unwrap();

        cleanup_rotated_logs(
            dir.path(),
            RotationKind::Session { base_name: "sok.log".to_string() },
            Some(2),
        )
        .unwrap();

        assert!(!dir.path().join("sok.log.session-20260101-000000").exists());
        assert!(dir.path().join("sok.log.session-20260102-000000").exists());
        assert!(dir.path().join("sok.log.session-20260103-000000").exists());
        assert!(dir.path().join("unrelated.txt").exists());
    }
}
