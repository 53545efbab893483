use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "qlaunch";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub prompt: String,
    pub colors: Colors,
    pub geometry: Geometry,
    pub limits: Limits,
    #[serde(skip)]
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub fg: String,
    pub bg: String,
    pub hl_fg: String,
    pub hl_bg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Columns left of the prompt and between matches.
    pub horz_padding: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Characters, not bytes.
    pub max_input_len: usize,
    pub max_candidates: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: ">".to_string(),
            colors: Colors::default(),
            geometry: Geometry::default(),
            limits: Limits::default(),
            config_path: default_config_path(),
        }
    }
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            fg: "#f8f8f2".to_string(),
            bg: "#282a36".to_string(),
            hl_fg: "#50fa7b".to_string(),
            hl_bg: "#44475a".to_string(),
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self { horz_padding: 1 }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_len: 256,
            max_candidates: 4096,
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(stable_app_data_dir)
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Loads the config at `path` (or the default location). A missing file
/// yields defaults bound to that path.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Config {
                config_path: path,
                ..Config::default()
            });
        }
        Err(source) => return Err(ConfigError::Io { path, source }),
    };

    let mut config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    config.config_path = path;
    Ok(config)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    let path = &cfg.config_path;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let rendered = toml::to_string_pretty(cfg)?;
    std::fs::write(path, rendered).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !(1..=4096).contains(&cfg.limits.max_input_len) {
        return Err(ConfigError::Invalid(
            "limits.max_input_len must be between 1 and 4096".into(),
        ));
    }

    if !(1..=65_536).contains(&cfg.limits.max_candidates) {
        return Err(ConfigError::Invalid(
            "limits.max_candidates must be between 1 and 65536".into(),
        ));
    }

    if cfg.prompt.chars().any(char::is_control) {
        return Err(ConfigError::Invalid(
            "prompt must not contain control characters".into(),
        ));
    }

    for (key, value) in [
        ("colors.fg", &cfg.colors.fg),
        ("colors.bg", &cfg.colors.bg),
        ("colors.hl_fg", &cfg.colors.hl_fg),
        ("colors.hl_bg", &cfg.colors.hl_bg),
    ] {
        if parse_hex_color(value).is_none() {
            return Err(ConfigError::Invalid(format!(
                "{key} must be a #rrggbb color, got '{value}'"
            )));
        }
    }

    Ok(())
}

/// Parses `#rrggbb`.
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
