use crate::config::toml_config::TomlConfig;
use crate::core::sheet::DelimiterPolicy;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Upload,
    PerProduct,
}

impl ModeArg {
    fn as_config_value(self) -> &'static str {
        match self {
            ModeArg::Upload => "upload",
            ModeArg::PerProduct => "per_product",
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-import")]
#[command(about = "Validate a product catalog file and import it into the storefront backend")]
pub struct CliConfig {
    /// Catalog files (.csv, .xls, .xlsx); only the first one is used
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Backend base URL, overrides backend.base_url
    #[arg(long)]
    pub base_url: Option<String>,

    /// Bearer token, overrides backend.token
    #[arg(long)]
    pub token: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Parse CSV with quoting support instead of splitting on `,` and `;`
    #[arg(long)]
    pub strict_csv: bool,

    /// Reject files larger than this many megabytes (0 disables the check)
    #[arg(long)]
    pub max_size_mb: Option<u64>,

    /// Validate only, do not contact the backend
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Loads the config file (or defaults) and applies command-line overrides.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.backend.base_url = base_url.clone();
        }
        if let Some(token) = &self.token {
            config.backend.token = Some(token.clone());
        }
        if let Some(mode) = self.mode {
            config.backend.mode = mode.as_config_value().to_string();
        }
        if self.strict_csv {
            config.import.delimiter_policy = DelimiterPolicy::Rfc4180;
        }
        if let Some(max_size_mb) = self.max_size_mb {
            config.import.max_file_size_mb = max_size_mb;
        }
        if self.json_logs {
            config.logging.json = true;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ConfigProvider, ImportMode};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[backend]\nbase_url = \"https://file.example.com\"\ntoken = \"file-token\"\n")
            .unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let cli = CliConfig::parse_from([
            "catalog-import",
            "catalog.csv",
            "--config",
            path.as_str(),
            "--base-url",
            "https://cli.example.com",
            "--mode",
            "per-product",
            "--strict-csv",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.base_url(), "https://cli.example.com");
        assert_eq!(config.auth_token(), Some("file-token"));
        assert_eq!(config.import_mode(), ImportMode::PerProduct);
        assert_eq!(config.import.delimiter_policy, DelimiterPolicy::Rfc4180);
    }

    #[test]
    fn test_defaults_without_config_file() {
        let cli = CliConfig::parse_from(["catalog-import", "a.csv", "b.csv", "--max-size-mb", "0"]);
        let config = cli.resolve().unwrap();

        assert_eq!(cli.files, vec!["a.csv", "b.csv"]);
        assert_eq!(config.import_mode(), ImportMode::Upload);
        assert_eq!(config.validator_options().max_file_size, None);
    }
}
