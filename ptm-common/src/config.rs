//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is a single TOML file. Every section is optional and
//! falls back to built-in defaults, so the tools start with no file at all.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PTM_CONFIG`)
//! 3. User config file (`<config dir>/ptm/config.toml`)
//! 4. Built-in defaults (fallback)
//!
//! An explicitly requested file (levels 1 and 2) must exist and parse. The user
//! config file at level 3 degrades gracefully: problems are logged and the
//! defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PTM_CONFIG";

/// Default similarity threshold for fuzzy reconciliation
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ============================================================================
// TOML schema
// ============================================================================

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Identity reconciliation settings (optional)
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Batch import settings (optional)
    #[serde(default)]
    pub import: ImportConfig,

    /// Technician roster, one `[[technicians]]` table per person
    #[serde(default)]
    pub technicians: Vec<TechnicianConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Identity reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum similarity ratio a fuzzy candidate must reach (0.0-1.0)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

/// Batch import settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Year assumed for dates written without one (current year when unset)
    #[serde(default)]
    pub default_year: Option<i32>,

    /// Field delimiter of import files
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Header names of the columns the importer normalizes
    #[serde(default)]
    pub columns: ColumnConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_year: None,
            delimiter: default_delimiter(),
            columns: ColumnConfig::default(),
        }
    }
}

impl ImportConfig {
    /// Delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(Error::Config(format!(
                "import.delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )))
        }
    }
}

/// Header names for each normalized column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default = "default_id_column")]
    pub id: String,
    #[serde(default = "default_client_name_column")]
    pub client_name: String,
    #[serde(default = "default_technician_column")]
    pub technician: String,
    #[serde(default = "default_price_column")]
    pub price: String,
    #[serde(default = "default_date_column")]
    pub date: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            id: default_id_column(),
            client_name: default_client_name_column(),
            technician: default_technician_column(),
            price: default_price_column(),
            date: default_date_column(),
        }
    }
}

/// One technician roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianConfig {
    /// Identifier issued by the scheduling system
    pub id: String,
    /// Display name
    pub name: String,
    /// System username (no hyphens)
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_threshold() -> f64 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_delimiter() -> char {
    ','
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_client_name_column() -> String {
    "client_name".to_string()
}

fn default_technician_column() -> String {
    "technician".to_string()
}

fn default_price_column() -> String {
    "price".to_string()
}

fn default_date_column() -> String {
    "date".to_string()
}

fn default_active() -> bool {
    true
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let level = self.logging.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::Config(format!(
                "logging.level must be one of {}, got '{}'",
                VALID_LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }

        let threshold = self.matching.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "matching.threshold must be within 0.0-1.0, got {}",
                threshold
            )));
        }

        self.import.delimiter_byte()?;

        let mut seen = HashSet::new();
        for technician in &self.technicians {
            if !seen.insert(technician.id.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate technician id '{}'",
                    technician.id
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserFile(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommandLine(path) => write!(f, "command line ({})", path.display()),
            Self::Environment(path) => write!(f, "{} ({})", CONFIG_ENV_VAR, path.display()),
            Self::UserFile(path) => write!(f, "user config ({})", path.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Resolves and loads the bootstrap configuration
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
    user_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver; `cli_path` is the `--config` argument, if any
    pub fn new(cli_path: Option<&Path>) -> Self {
        Self {
            cli_path: cli_path.map(Path::to_path_buf),
            user_path: default_config_path(),
        }
    }

    /// Override the user config location (tests, portable installs)
    pub fn with_user_path(mut self, user_path: Option<PathBuf>) -> Self {
        self.user_path = user_path;
        self
    }

    /// Determine which source wins, without reading it
    pub fn source(&self) -> ConfigSource {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return ConfigSource::CommandLine(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        // Priority 3: User config file, only when present
        if let Some(path) = &self.user_path {
            if path.exists() {
                return ConfigSource::UserFile(path.clone());
            }
        }

        // Priority 4: Built-in defaults
        ConfigSource::Defaults
    }

    /// Load the effective configuration
    pub fn load(&self) -> Result<(TomlConfig, ConfigSource)> {
        let source = self.source();
        let config = match &source {
            ConfigSource::CommandLine(path) | ConfigSource::Environment(path) => {
                load_toml_config(path)?
            }
            ConfigSource::UserFile(path) => match load_toml_config(path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring config file {}: {}. Using defaults.", path.display(), e);
                    TomlConfig::default()
                }
            },
            ConfigSource::Defaults => {
                debug!("No config file found, using built-in defaults");
                TomlConfig::default()
            }
        };

        info!("Configuration loaded from {}", source);
        Ok((config, source))
    }
}

/// Read and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read config {} failed: {}", path.display(), e))
    })?;
    TomlConfig::from_toml_str(&content)
}

/// Platform user config location: `<config dir>/ptm/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ptm").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.matching.threshold, DEFAULT_MATCH_THRESHOLD);
        assert_eq!(config.import.delimiter, ',');
        assert_eq!(config.import.columns.client_name, "client_name");
        assert!(config.import.default_year.is_none());
        assert!(config.technicians.is_empty());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [import]
            default_year = 2024
            delimiter = ";"

            [import.columns]
            price = "montant"
            "#,
        )
        .unwrap();
        assert_eq!(config.import.default_year, Some(2024));
        assert_eq!(config.import.delimiter_byte().unwrap(), b';');
        assert_eq!(config.import.columns.price, "montant");
        assert_eq!(config.import.columns.date, "date");
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let err = TomlConfig::from_toml_str("[matching]\nthreshold = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("matching.threshold"));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let err = TomlConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let err = TomlConfig::from_toml_str("[import]\ndelimiter = \"é\"\n").unwrap_err();
        assert!(err.to_string().contains("delimiter"));
    }

    #[test]
    fn test_duplicate_technician_ids_rejected() {
        let content = r#"
            [[technicians]]
            id = "usr_1"
            name = "Jean-Philippe"
            username = "jeanphilippe"

            [[technicians]]
            id = "usr_1"
            name = "Nicolas"
            username = "nicolas"
        "#;
        let err = TomlConfig::from_toml_str(content).unwrap_err();
        assert!(err.to_string().contains("usr_1"));
    }

    #[test]
    fn test_technician_defaults_to_active() {
        let content = r#"
            [[technicians]]
            id = "usr_2"
            name = "Allan"
            username = "allan"
        "#;
        let config = TomlConfig::from_toml_str(content).unwrap();
        assert!(config.technicians[0].active);
        assert!(config.technicians[0].email.is_none());
    }
}
