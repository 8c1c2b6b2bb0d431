//! Builder pattern for configuring and installing the sink.
//!
//! # Example
//!
//! ```rust,no_run
//! cloudlog::builder()
//!     .with_directory("/var/log/app_engine")
//!     .with_max_bytes(128 * 1024 * 1024)
//!     .with_backup_count(3)
//!     .with_level("info")
//!     .init()
//!     .expect("Failed to initialize logging");
//! ```

use std::path::PathBuf;

use crate::{Result, SinkConfig, init_logging};

/// A builder for configuring and installing the rotating JSON sink.
#[derive(Debug, Clone)]
pub struct SinkBuilder {
    config: SinkConfig,
}

impl SinkBuilder {
    /// Create a new builder with the reference defaults.
    pub fn new() -> Self {
        Self {
            config: SinkConfig::new(),
        }
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: SinkConfig) -> Self {
        Self { config }
    }

    /// Set the log directory.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_directory(directory);
        self
    }

    /// Set the active-file size cap in bytes.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.config = self.config.with_max_bytes(max_bytes);
        self
    }

    /// Set the number of retained backup generations.
    pub fn with_backup_count(mut self, backup_count: usize) -> Self {
        self.config = self.config.with_backup_count(backup_count);
        self
    }

    /// Set the filter level (e.g., "trace", "debug", "info", "warn", "error").
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config = self.config.with_level(level);
        self
    }

    /// Get the configuration without installing anything.
    pub fn build(self) -> SinkConfig {
        self.config
    }

    /// Install the sink as the global `tracing` subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if a subscriber is already installed or the log
    /// directory/file cannot be opened.
    pub fn init(self) -> Result<()> {
        init_logging(&self.config)
    }
}

impl Default for SinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
