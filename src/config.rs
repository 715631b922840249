use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sanitize::SanitizePolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Whitelist of file extensions to treat as audio files.
    /// Examples: ["*.mp3", "*.flac", "wav"]. Case-insensitive.
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,

    // Naming
    #[serde(default = "default_replacement")]
    pub replacement: String,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    #[serde(default)]
    pub lowercase_extension: bool,

    // Scan
    #[serde(default)]
    pub follow_links: bool,

    /// Directory for the daily-rotated log file. Logging stays on stderr only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_replacement() -> String { "_".into() }
fn default_max_name_length() -> usize { 200 }

fn default_file_extensions() -> Vec<String> {
    vec!["*.mp3", "*.flac", "*.wav"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_extensions: default_file_extensions(),
            replacement: default_replacement(),
            max_name_length: default_max_name_length(),
            lowercase_extension: false,
            follow_links: false,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&s)?;
        Ok(cfg)
    }

    /// Resolve the configuration: an explicit path wins, then the per-user
    /// `file-harmony/config.toml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(p) = explicit {
            return Self::from_path(p);
        }
        match Self::user_config_path() {
            Some(p) if p.exists() => Self::from_path(&p),
            _ => Ok(Self::default()),
        }
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("file-harmony").join("config.toml"))
    }

    pub fn sanitize_policy(&self) -> SanitizePolicy {
        SanitizePolicy {
            replacement: self.replacement.clone(),
            max_len: self.max_name_length,
        }
    }
}
