use crate::adapters::http::{DEFAULT_IMPORT_PATH, DEFAULT_TIMEOUT};
use crate::core::sheet::DelimiterPolicy;
use crate::core::validator::ValidatorOptions;
use crate::domain::ports::{ConfigProvider, ImportMode};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Advisory upload size shown to users; enforced when configured.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 5;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub import: ImportSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_import_path")]
    pub import_path: String,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            import_path: default_import_path(),
            token: None,
            timeout_seconds: None,
            mode: default_mode(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    /// `0` turns the size check off.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default)]
    pub delimiter_policy: DelimiterPolicy,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            delimiter_policy: DelimiterPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
}

fn default_import_path() -> String {
    DEFAULT_IMPORT_PATH.to_string()
}

fn default_mode() -> String {
    "upload".to_string()
}

fn default_max_file_size_mb() -> u64 {
    DEFAULT_MAX_FILE_SIZE_MB
}

const MODES: [&str; 2] = ["upload", "per_product"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML after replacing `${VAR}` with the environment value.
    /// Unset variables are left as written.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| ImportError::config(format!("TOML parsing error: {}", e)))
    }

    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validator_options(&self) -> ValidatorOptions {
        let max_file_size = match self.import.max_file_size_mb {
            0 => None,
            mb => Some(mb.saturating_mul(BYTES_PER_MB)),
        };
        ValidatorOptions {
            delimiter_policy: self.import.delimiter_policy,
            max_file_size,
        }
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.level.as_deref()
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.backend.base_url
    }

    fn import_path(&self) -> &str {
        &self.backend.import_path
    }

    fn auth_token(&self) -> Option<&str> {
        self.backend
            .token
            .as_deref()
            .filter(|t| !t.is_empty() && !env_var_pattern().is_match(t))
    }

    fn request_timeout(&self) -> Duration {
        self.backend
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    fn import_mode(&self) -> ImportMode {
        match self.backend.mode.as_str() {
            "per_product" => ImportMode::PerProduct,
            _ => ImportMode::Upload,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("backend.base_url", &self.backend.base_url)?;
        validation::validate_api_path("backend.import_path", &self.backend.import_path)?;
        validation::validate_one_of("backend.mode", &self.backend.mode, &MODES)?;

        if let Some(timeout) = self.backend.timeout_seconds {
            validation::validate_positive_number("backend.timeout_seconds", timeout, 1)?;
        }

        if self.import.max_file_size_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(ImportError::InvalidConfigValueError {
                field: "import.max_file_size_mb".to_string(),
                value: self.import.max_file_size_mb.to_string(),
                reason: format!("Value must be at most {}", u64::MAX / BYTES_PER_MB),
            });
        }

        if let Some(level) = &self.logging.level {
            validation::validate_one_of("logging.level", level, &LOG_LEVELS)?;
        }

        Ok(())
    }
}
