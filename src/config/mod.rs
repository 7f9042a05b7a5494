// src/config/mod.rs
//! Configuration management for the miner
//!
//! This module handles all configuration-related functionality including:
//! - Loading, parsing and validating configuration files
//! - Generating configuration templates
//!
//! The configuration uses TOML format. It is read once at startup and
//! handed to every worker read-only.

/// Core configuration implementation
///
/// Contains the [`Config`] struct with its defaults and validation rules.
pub mod config;

// Re-export key items for easy access
pub use config::Config;

use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Loads miner configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file (anything convertible to PathBuf)
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(MinerError)` - If the file couldn't be read, parsed or validated
pub fn load(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    Config::load(path)
}

/// Reads a TOML configuration file without validating it
///
/// Used when command-line overrides must be applied before validation.
pub fn read(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    Config::read(path)
}

/// Generates a commented configuration template for `username`
pub fn generate_template(username: &str) -> String {
    Config::generate_template(username)
}
