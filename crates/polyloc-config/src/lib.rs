use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "polyloc.toml";
pub const DEFAULT_ROOT: &str = "config/locales";
pub const DEFAULT_EXTENSION: &str = "yml";
pub const DEFAULT_LANGUAGES: [&str; 2] = ["en", "ja"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolylocConfig {
    /// Directory holding the source documents; output files land here too.
    pub root: Option<PathBuf>,
    pub languages: Option<Vec<String>>,
    /// Source/output file extension without the dot.
    pub extension: Option<String>,
    /// Enables the rolling debug log file when set.
    pub log_dir: Option<PathBuf>,
}

/// Configuration with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub root: PathBuf,
    pub languages: Vec<String>,
    pub extension: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        PolylocConfig::default().resolve()
    }
}

impl PolylocConfig {
    pub fn resolve(self) -> Settings {
        Settings {
            root: self.root.unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT)),
            languages: self
                .languages
                .unwrap_or_else(|| DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect()),
            extension: self
                .extension
                .map(|e| e.trim_start_matches('.').to_string())
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            log_dir: self.log_dir,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub fn load_config() -> Result<PolylocConfig, ConfigError> {
    // Search order: CWD/polyloc.toml, $CONFIG_DIR/polyloc/polyloc.toml
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(p) = std::env::current_dir() {
        candidates.push(p.join(CONFIG_FILE));
    }
    if let Some(base) = dirs::config_dir() {
        candidates.push(base.join("polyloc").join(CONFIG_FILE));
    }
    load_config_from(&candidates)
}

/// Load and merge the given files in priority order; missing files are skipped.
pub fn load_config_from(paths: &[PathBuf]) -> Result<PolylocConfig, ConfigError> {
    let mut merged = PolylocConfig::default();
    for path in paths {
        if let Some(cfg) = read_config_file(path)? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

fn read_config_file(path: &Path) -> Result<Option<PolylocConfig>, ConfigError> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    toml::from_str::<PolylocConfig>(&s)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
}

fn merge(mut a: PolylocConfig, b: PolylocConfig) -> PolylocConfig {
    if a.root.is_none() {
        a.root = b.root;
    }
    if a.languages.is_none() {
        a.languages = b.languages;
    }
    if a.extension.is_none() {
        a.extension = b.extension;
    }
    if a.log_dir.is_none() {
        a.log_dir = b.log_dir;
    }
    a
}
