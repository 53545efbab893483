use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEntry {
    pub name: String,
    pub is_executable: bool,
}

impl DiscoveredEntry {
    pub fn executable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_executable: true,
        }
    }
}

pub trait CandidateEnumerator {
    fn provider_name(&self) -> &'static str;
    fn enumerate(&self) -> Result<Vec<DiscoveredEntry>, ProviderError>;
}

/// Fixed list of names, used by tests and by callers that already know
/// their candidates.
pub struct FixedProvider {
    entries: Vec<DiscoveredEntry>,
}

impl FixedProvider {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: names.into_iter().map(DiscoveredEntry::executable).collect(),
        }
    }

    pub fn from_entries(entries: Vec<DiscoveredEntry>) -> Self {
        Self { entries }
    }
}

impl CandidateEnumerator for FixedProvider {
    fn provider_name(&self) -> &'static str {
        "fixed"
    }

    fn enumerate(&self) -> Result<Vec<DiscoveredEntry>, ProviderError> {
        Ok(self.entries.clone())
    }
}

/// Scans the directories of a search path, in order, one level deep.
pub struct PathDiscoveryProvider {
    search_dirs: Vec<PathBuf>,
}

impl PathDiscoveryProvider {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Reads `$PATH`. An unset variable is reported when enumerating.
    pub fn from_env() -> Result<Self, ProviderError> {
        let raw = std::env::var_os("PATH")
            .ok_or_else(|| ProviderError::new("PATH is not set"))?;
        Ok(Self::new(std::env::split_paths(&raw).collect()))
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }
}

impl CandidateEnumerator for PathDiscoveryProvider {
    fn provider_name(&self) -> &'static str {
        "path"
    }

    fn enumerate(&self) -> Result<Vec<DiscoveredEntry>, ProviderError> {
        let mut entries = Vec::new();
        for dir in &self.search_dirs {
            if dir.as_os_str().is_empty() {
                continue;
            }
            scan_dir(dir, &mut entries);
        }
        Ok(entries)
    }
}

/// Enumerator for environments where `$PATH` could not be read.
pub struct UnavailableProvider {
    reason: ProviderError,
}

impl UnavailableProvider {
    pub fn new(reason: ProviderError) -> Self {
        Self { reason }
    }
}

impl CandidateEnumerator for UnavailableProvider {
    fn provider_name(&self) -> &'static str {
        "unavailable"
    }

    fn enumerate(&self) -> Result<Vec<DiscoveredEntry>, ProviderError> {
        Err(self.reason.clone())
    }
}

fn scan_dir(dir: &Path, entries: &mut Vec<DiscoveredEntry>) {
    let walker = WalkDir::new(dir).min_depth(1).max_depth(1);
    for entry in walker.into_iter().filter_map(|entry| entry.ok()) {
        let file_type = entry.file_type();
        if !file_type.is_file() && !file_type.is_symlink() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        entries.push(DiscoveredEntry {
            name: name.to_string(),
            is_executable: is_executable(entry.path()),
        });
    }
}

/// Follows symlinks: the target must be a regular file the user may execute.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o100 != 0,
        Err(_) => false,
    }
}

#[cfg(windows)]
pub fn is_executable(path: &Path) -> bool {
    let is_file = std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    let runnable = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "exe" | "bat" | "cmd" | "com"
            )
        })
        .unwrap_or(false);
    is_file && runnable
}
