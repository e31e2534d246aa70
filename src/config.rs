use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use crate::cli::{Args, Tab};
use crate::fetch::Period;
use crate::Result;

/// Configuration for the ETF dashboard.
/// Loaded from a TOML file to set default values for CLI parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default ETF selection
    pub etfs: Option<Vec<String>>,

    /// Default period
    pub period: Option<Period>,

    /// Default investment amount
    pub investment: Option<f64>,

    /// Default section to render
    pub function: Option<Tab>,

    /// Default output file
    pub output: Option<String>,

    /// Catalog CSV file
    pub catalog: Option<String>,

    /// Directory of offline price files
    pub data_dir: Option<String>,

    /// Force overwrite without prompting
    pub force: Option<bool>,

    /// Verbose mode
    pub verbose: Option<bool>,

    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Market data endpoint settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config file: {}", e)))?;
        Ok(config)
    }

    /// Load configuration from default locations
    /// Checks in order:
    /// 1. ./.etf_dashboard.toml (current directory)
    /// 2. ~/.config/etf_dashboard/config.toml (user config directory)
    /// 3. ~/.etf_dashboard.toml (home directory)
    pub fn load_default() -> Result<Option<Self>> {
        let current_dir_config = PathBuf::from(".etf_dashboard.toml");
        if current_dir_config.exists() {
            return Ok(Some(Self::from_file(current_dir_config)?));
        }

        if let Some(config_dir) = Self::get_config_dir() {
            let config_path = config_dir.join("etf_dashboard").join("config.toml");
            if config_path.exists() {
                return Ok(Some(Self::from_file(config_path)?));
            }
        }

        if let Some(home_dir) = Self::get_home_dir() {
            let home_config = home_dir.join(".etf_dashboard.toml");
            if home_config.exists() {
                return Ok(Some(Self::from_file(home_config)?));
            }
        }

        Ok(None)
    }

    fn get_config_dir() -> Option<PathBuf> {
        if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            Some(PathBuf::from(config_dir))
        } else {
            Self::get_home_dir().map(|home| home.join(".config"))
        }
    }

    fn get_home_dir() -> Option<PathBuf> {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from)
    }

    /// Merge config with CLI arguments, giving CLI arguments priority
    pub fn merge_with_cli(&self, cli_args: &mut Args) {
        if cli_args.etfs.is_empty() {
            if let Some(etfs) = &self.etfs {
                cli_args.etfs = etfs.clone();
            }
        }

        if cli_args.period.is_none() {
            cli_args.period = self.period;
        }

        if cli_args.investment.is_none() {
            cli_args.investment = self.investment;
        }

        // Only override function if it's still the default
        if cli_args.function == Tab::All {
            if let Some(function) = self.function {
                cli_args.function = function;
            }
        }

        if cli_args.output.is_none() {
            cli_args.output = self.output.clone();
        }

        if cli_args.catalog.is_none() {
            cli_args.catalog = self.catalog.clone();
        }

        if cli_args.data_dir.is_none() {
            cli_args.data_dir = self.data_dir.clone();
        }

        // Booleans: only set from config if CLI flag wasn't explicitly set
        if !cli_args.force && self.force == Some(true) {
            cli_args.force = true;
        }

        if !cli_args.verbose && self.verbose == Some(true) {
            cli_args.verbose = true;
        }
    }
}
