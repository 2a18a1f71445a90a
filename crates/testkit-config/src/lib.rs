//! Configuration loading and logging setup for TestKit

pub mod config;
pub mod logging;

pub use config::{AppConfig, LocatorConfig, LogFormat, LoggingConfig, RunnerConfig};
