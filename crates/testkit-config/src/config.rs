//! Configuration management for TestKit

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use testkit_foundation::locator::LOCATOR_FILE_NAME;
use testkit_foundation::{TestKitError, TestKitResult};

/// Config files looked up in the working directory, first match wins
pub const CONFIG_FILE_PATHS: [&str; 2] = ["testkit.toml", ".testkit/config.toml"];

/// Prefix for environment overrides, e.g. `TESTKIT__LOCATOR__PATH`
pub const ENV_PREFIX: &str = "TESTKIT__";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where to look for the locator file
    #[serde(default)]
    pub locator: LocatorConfig,
    /// Host build tool invocation
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Locator file lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Explicit locator file; when set, the search roots are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Locator file name joined onto each search root
    pub file_name: String,
    /// Directories searched in order, relative ones resolved against the working directory
    pub search_roots: Vec<PathBuf>,
}

/// Host build tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Executable to run against isolated fixtures
    pub program: String,
    /// Extra environment variables for the build tool process
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Log output format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format for development
    #[default]
    Pretty,
    /// Structured JSON format for CI
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            path: None,
            file_name: LOCATOR_FILE_NAME.to_string(),
            search_roots: vec![PathBuf::from("target/testkit"), PathBuf::from(".")],
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "gradle".to_string(),
            env: BTreeMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration relative to the current working directory
    pub fn load() -> TestKitResult<Self> {
        let cwd = std::env::current_dir()?;
        Self::load_from(&cwd)
    }

    /// Load configuration from config files in `dir` and the environment
    ///
    /// Configuration is loaded in the following priority order (highest to lowest):
    /// 1. Environment variables (TESTKIT__*)
    /// 2. `testkit.toml` or `.testkit/config.toml` in `dir`
    /// 3. Default values
    pub fn load_from(dir: &Path) -> TestKitResult<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Toml},
            Figment,
        };

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        for config_path in CONFIG_FILE_PATHS {
            let path = dir.join(config_path);
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading TOML configuration");
                figment = figment.merge(Toml::file(path));
                break;
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: AppConfig = figment.extract().map_err(|e| {
            TestKitError::configuration(format!("Failed to load configuration: {}", e))
        })?;

        config.validate()?;

        tracing::debug!(
            search_roots = config.locator.search_roots.len(),
            explicit_locator = config.locator.path.is_some(),
            program = %config.runner.program,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> TestKitResult<()> {
        if self.locator.file_name.trim().is_empty() {
            return Err(TestKitError::configuration(
                "Locator file name cannot be empty",
            ));
        }

        if self.locator.path.is_none() && self.locator.search_roots.is_empty() {
            return Err(TestKitError::configuration(
                "At least one locator search root is required when no locator path is set",
            ));
        }

        if self.runner.program.trim().is_empty() {
            return Err(TestKitError::configuration("Runner program cannot be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(TestKitError::configuration(format!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }
}
