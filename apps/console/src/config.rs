//! # Console Configuration
//!
//! ## Configuration Sources (Priority Order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Configuration Loading                                 │
//! │                                                                         │
//! │  Priority (highest to lowest):                                          │
//! │                                                                         │
//! │  1. Environment Variables                                               │
//! │     BISTRO_RESTAURANT_NAME, BISTRO_MAX_CAPACITY,                        │
//! │     BISTRO_POINTS_PER_DISH, BISTRO_CREDIT_DIVISOR,                      │
//! │     BISTRO_OUTPUT_FORMAT, BISTRO_LOG, BISTRO_JOURNAL_CAPACITY           │
//! │                                                                         │
//! │  2. Config File (bistro.toml)                                           │
//! │     Location: {config_dir}/bistro/bistro.toml, or --config <path>       │
//! │                                                                         │
//! │  3. Default Values                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [restaurant]
//! name = "Da Mario"
//! max_capacity = 12
//!
//! [rewards]
//! points_per_dish = 1
//! credit_divisor = 10
//!
//! [output]
//! format = "json"
//! log_filter = "warn,bistro_core=debug"
//! journal_capacity = 500
//! ```

use std::path::PathBuf;

use bistro_core::validation::{validate_capacity, validate_name};
use bistro_core::{RewardPolicy, DEFAULT_JOURNAL_CAPACITY};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

// =============================================================================
// Output Format
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One narrated sentence per event.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(OutputFormat::Text),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            other => Err(AppError::InvalidConfig(format!(
                "Unknown output format: '{}'. Valid options: text, json",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// The restaurant the walkthrough runs in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantSettings {
    #[serde(default = "default_restaurant_name")]
    pub name: String,

    /// Maximum number of tables.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,
}

fn default_restaurant_name() -> String {
    "Bistro".to_string()
}

fn default_max_capacity() -> u32 {
    10
}

impl Default for RestaurantSettings {
    fn default() -> Self {
        Self {
            name: default_restaurant_name(),
            max_capacity: default_max_capacity(),
        }
    }
}

/// Member reward parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardSettings {
    #[serde(default = "default_points_per_dish")]
    pub points_per_dish: u32,

    /// Whole currency units per redeemed credit. 0 disables redemption.
    #[serde(default = "default_credit_divisor")]
    pub credit_divisor: u32,
}

fn default_points_per_dish() -> u32 {
    RewardPolicy::default().points_per_dish
}

fn default_credit_divisor() -> u32 {
    RewardPolicy::default().credit_divisor
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            points_per_dish: default_points_per_dish(),
            credit_divisor: default_credit_divisor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Undrained events kept before the oldest are dropped.
    #[serde(default = "default_journal_capacity")]
    pub journal_capacity: usize,
}

fn default_log_filter() -> String {
    "warn,bistro_core=info".to_string()
}

fn default_journal_capacity() -> usize {
    DEFAULT_JOURNAL_CAPACITY
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            log_filter: default_log_filter(),
            journal_capacity: default_journal_capacity(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BistroConfig {
    #[serde(default)]
    pub restaurant: RestaurantSettings,

    #[serde(default)]
    pub rewards: RewardSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

impl BistroConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (bistro.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> AppResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| AppError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| AppError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        validate_name("restaurant name", &self.restaurant.name, 2, 100)
            .map_err(|e| AppError::InvalidConfig(e.to_string()))?;
        validate_capacity(self.restaurant.max_capacity)
            .map_err(|e| AppError::InvalidConfig(e.to_string()))?;

        if self.output.log_filter.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "log_filter must not be empty".into(),
            ));
        }

        if self.output.journal_capacity == 0 {
            return Err(AppError::InvalidConfig(
                "journal_capacity must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Reward policy handed to the registry.
    pub fn reward_policy(&self) -> RewardPolicy {
        RewardPolicy {
            points_per_dish: self.rewards.points_per_dish,
            credit_divisor: self.rewards.credit_divisor,
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `BISTRO_*` overrides read through `lookup`. Unparseable numbers
    /// are ignored with a warning.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("BISTRO_RESTAURANT_NAME") {
            debug!(name = %name, "Overriding restaurant name from environment");
            self.restaurant.name = name;
        }

        if let Some(capacity) = lookup("BISTRO_MAX_CAPACITY") {
            match capacity.parse::<u32>() {
                Ok(c) => self.restaurant.max_capacity = c,
                Err(_) => warn!(value = %capacity, "Ignoring invalid BISTRO_MAX_CAPACITY"),
            }
        }

        if let Some(points) = lookup("BISTRO_POINTS_PER_DISH") {
            match points.parse::<u32>() {
                Ok(p) => self.rewards.points_per_dish = p,
                Err(_) => warn!(value = %points, "Ignoring invalid BISTRO_POINTS_PER_DISH"),
            }
        }

        if let Some(divisor) = lookup("BISTRO_CREDIT_DIVISOR") {
            match divisor.parse::<u32>() {
                Ok(d) => self.rewards.credit_divisor = d,
                Err(_) => warn!(value = %divisor, "Ignoring invalid BISTRO_CREDIT_DIVISOR"),
            }
        }

        if let Some(format) = lookup("BISTRO_OUTPUT_FORMAT") {
            match format.parse() {
                Ok(parsed) => {
                    debug!(format = %format, "Overriding output format from environment");
                    self.output.format = parsed;
                }
                Err(_) => warn!(format = %format, "Unknown output format in environment"),
            }
        }

        if let Some(filter) = lookup("BISTRO_LOG") {
            self.output.log_filter = filter;
        }

        if let Some(capacity) = lookup("BISTRO_JOURNAL_CAPACITY") {
            match capacity.parse::<usize>() {
                Ok(c) => self.output.journal_capacity = c,
                Err(_) => warn!(value = %capacity, "Ignoring invalid BISTRO_JOURNAL_CAPACITY"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "bistro", "bistro")
            .map(|dirs| dirs.config_dir().join("bistro.toml"))
    }
}
