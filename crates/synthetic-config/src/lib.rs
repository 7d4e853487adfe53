use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use synthetic_shortcuts::{DEFAULT_SEPARATOR, ExchangeOptions};
use thiserror::Error;

pub const CONFIG_FILE: &str = "synthetic.toml";
const DEFAULT_INDENT: usize = 2;
const MAX_INDENT: usize = 8;

/// Settings shared by every command of the shortcut tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Character joining several key combinations of one command.
    pub separator: char,
    /// Spaces before each `ShortcutItem` line.
    pub indent: usize,
    /// Emit an XML declaration when writing files.
    pub declaration: bool,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            indent: DEFAULT_INDENT,
            declaration: false,
            log_filter: None,
        }
    }
}

impl SyntheticConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.normalize()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn exchange_options(&self) -> ExchangeOptions {
        ExchangeOptions {
            separator: self.separator,
            indent: self.indent,
            declaration: self.declaration,
        }
    }

    fn normalize(&mut self) -> Result<(), ConfigError> {
        // Key names are alphanumeric and '+' joins modifiers.
        if self.separator.is_whitespace()
            || self.separator.is_alphanumeric()
            || self.separator == '+'
        {
            return Err(ConfigError::InvalidSeparator(self.separator));
        }
        self.indent = self.indent.min(MAX_INDENT);
        self.log_filter = self
            .log_filter
            .take()
            .map(|filter| filter.trim().to_string())
            .filter(|filter| !filter.is_empty());
        Ok(())
    }
}

/// Location of the configuration file inside `dir`.
pub fn config_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(CONFIG_FILE)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid shortcut separator {0:?}")]
    InvalidSeparator(char),
}

impl fmt::Display for SyntheticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyntheticConfig(separator={:?}, indent={})",
            self.separator, self.indent
        )
    }
}
