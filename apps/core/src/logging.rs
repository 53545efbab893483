use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "qlaunch.log";
const ARCHIVE_PREFIX: &str = "qlaunch-";
const MAX_LOG_BYTES: u64 = 1_000_000;
const MAX_ARCHIVES: usize = 5;
const LOG_ENV_VAR: &str = "QLAUNCH_LOG";

static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("log file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tracing subscriber already installed")]
    AlreadyInstalled,
}

pub fn logs_dir() -> PathBuf {
    crate::config::stable_app_data_dir().join("logs")
}

/// Sends `tracing` output to the rotating log file. The terminal belongs to
/// the bar, so nothing is written to stderr.
pub fn init(verbose: bool) -> Result<PathBuf, LoggingError> {
    let log_dir = logs_dir();
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join(LOG_FILE_NAME);
    rotate_if_needed(&log_path, &log_dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let writer = Arc::new(Mutex::new(file));

    let layer = fmt::layer()
        .with_writer(move || LockedFile(Arc::clone(&writer)))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter(verbose))
        .with(layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;

    install_panic_hook();
    Ok(log_path)
}

struct LockedFile(Arc<Mutex<File>>);

impl LockedFile {
    // Poisoning is ignored so a panic on another thread keeps the log alive.
    fn file(&self) -> MutexGuard<'_, File> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for LockedFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file().flush()
    }
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV_VAR) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(if verbose { "debug" } else { "info" })
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn rotate_if_needed(log_path: &Path, log_dir: &Path) -> Result<(), std::io::Error> {
    let meta = match fs::metadata(log_path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    if meta.len() < MAX_LOG_BYTES {
        return Ok(());
    }

    let archived = log_dir.join(format!("{ARCHIVE_PREFIX}{}.log", now_secs()));
    fs::rename(log_path, archived)?;
    prune_old_archives(log_dir)?;
    Ok(())
}

fn prune_old_archives(log_dir: &Path) -> Result<(), std::io::Error> {
    let mut archives = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(ARCHIVE_PREFIX) && n.ends_with(".log"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    archives.sort();
    let excess = archives.len().saturating_sub(MAX_ARCHIVES);
    for oldest in archives.drain(..excess) {
        let _ = fs::remove_file(oldest);
    }
    Ok(())
}

fn install_panic_hook() {
    let _ = PANIC_HOOK_INSTALLED.get_or_init(|| {
        let prior = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let location = panic_info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown".to_string());
            let payload = panic_info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic payload unavailable".to_string());
            tracing::error!(%location, %payload, "panic");
            prior(panic_info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::{
        logs_dir, prune_old_archives, rotate_if_needed, LockedFile, LOG_FILE_NAME, MAX_ARCHIVES,
    };
    use std::fs::File;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn writer_survives_poisoned_lock() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        let file = Arc::new(Mutex::new(File::create(&log).unwrap()));

        let holder = Arc::clone(&file);
        let _ = std::thread::spawn(move || {
            let _guard = holder.lock().unwrap();
            panic!("panic while holding the log lock");
        })
        .join();
        assert!(file.is_poisoned());

        let mut writer = LockedFile(file);
        writer.write_all(b"still logging\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "still logging\n");
    }

    #[test]
    fn logs_dir_uses_stable_app_data_layout() {
        let dir = logs_dir();
        assert!(dir.to_string_lossy().contains("qlaunch"));
    }

    #[test]
    fn small_log_is_not_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        std::fs::write(&log, b"short").unwrap();

        rotate_if_needed(&log, dir.path()).unwrap();
        assert!(log.exists());
    }

    #[test]
    fn oversized_log_is_archived() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        std::fs::write(&log, vec![b'x'; 1_000_001]).unwrap();

        rotate_if_needed(&log, dir.path()).unwrap();
        assert!(!log.exists());
        let archived = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(archived, 1);
    }

    #[test]
    fn prune_keeps_newest_archives() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in 0..(MAX_ARCHIVES + 3) {
            let name = format!("qlaunch-{:010}.log", stamp);
            std::fs::write(dir.path().join(name), b"old").unwrap();
        }

        prune_old_archives(dir.path()).unwrap();
        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left.len(), MAX_ARCHIVES);
        assert_eq!(left[0], "qlaunch-0000000003.log");
    }
}
