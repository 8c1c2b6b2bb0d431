use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, de};

/// Default log directory expected by the collector.
pub const DEFAULT_LOG_DIR: &str = "/var/log/app_engine";

/// Default cap on the active file before rotation (128 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 128 * 1024 * 1024;

/// Default number of rotated generations to retain.
pub const DEFAULT_BACKUP_COUNT: usize = 3;

/// Parse a size string with optional units (K/M/G, case-insensitive), defaulting to bytes.
fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".to_string());
    }

    let (num_str, unit) = if s.chars().last().unwrap().is_alphabetic() {
        let len = s.len();
        let num_part = &s[..len - 1];
        let unit_char = s.chars().last().unwrap().to_ascii_uppercase();
        (num_part, Some(unit_char))
    } else {
        (s, None)
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    let multiplier = match unit {
        None => 1,
        Some('K') => 1024,
        Some('M') => 1024 * 1024,
        Some('G') => 1024 * 1024 * 1024,
        Some(other) => return Err(format!("invalid unit: {}, supported: K/M/G", other)),
    };

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

/// Size value that can be a number or string with units.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Number(u64),
    String(String),
}

fn deserialize_max_bytes<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeValue::deserialize(deserializer)? {
        SizeValue::Number(n) => Ok(n),
        SizeValue::String(s) => parse_size(&s).map_err(de::Error::custom),
    }
}

/// Operating parameters of the rotating sink.
///
/// These are fixed at construction time; nothing here changes per record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Directory the active file and its backups live in.
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,
    /// Maximum size of the active file in bytes before rotation.
    /// Accepts a plain byte count or a string with K/M/G units ("128M").
    #[serde(default = "default_max_bytes", deserialize_with = "deserialize_max_bytes")]
    pub max_bytes: u64,
    /// Number of rotated generations to retain; the oldest is discarded.
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,
    /// Filter directive for the tracing layer (e.g., "info", "debug").
    #[serde(default = "default_level")]
    pub level: String,
}

impl SinkConfig {
    /// Create a config with the reference defaults.
    pub fn new() -> Self {
        Self {
            directory: default_log_dir(),
            max_bytes: default_max_bytes(),
            backup_count: default_backup_count(),
            level: default_level(),
        }
    }

    /// Set the log directory.
    pub fn with_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.directory = directory.into();
        self
    }

    /// Set the active-file size cap in bytes.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the number of retained backup generations.
    pub fn with_backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = backup_count;
        self
    }

    /// Set the filter level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Path of the active file for this process.
    ///
    /// The filename is keyed by the process id so that two processes never
    /// interleave writes into the same file.
    pub fn log_path(&self) -> PathBuf {
        self.log_path_for(std::process::id())
    }

    /// Path of the active file for an arbitrary process id.
    pub fn log_path_for(&self, pid: u32) -> PathBuf {
        self.directory.join(format!("app.{}.json", pid))
    }

    /// Directory the sink writes into.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn default_backup_count() -> usize {
    DEFAULT_BACKUP_COUNT
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SinkConfig::new();
        assert_eq!(config.directory, PathBuf::from(DEFAULT_LOG_DIR));
        assert_eq!(config.max_bytes, 128 * 1024 * 1024);
        assert_eq!(config.backup_count, 3);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_config_combinators() {
        let config = SinkConfig::new()
            .with_directory("/tmp/logs")
            .with_max_bytes(1024)
            .with_backup_count(5)
            .with_level("debug");
        assert_eq!(config.directory, PathBuf::from("/tmp/logs"));
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.backup_count, 5);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_log_path_contains_pid() {
        let config = SinkConfig::new().with_directory("/tmp/logs");
        let path = config.log_path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(name, format!("app.{}.json", std::process::id()));
    }

    #[test]
    fn test_log_paths_distinct_per_pid() {
        let config = SinkConfig::new();
        assert_ne!(config.log_path_for(100), config.log_path_for(101));
        assert_eq!(
            config.log_path_for(42),
            PathBuf::from(DEFAULT_LOG_DIR).join("app.42.json")
        );
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("4K").unwrap(), 4 * 1024);
        assert_eq!(parse_size("2m").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
        assert!(parse_size("").is_err());
        assert!(parse_size("12X").is_err());
        assert!(parse_size("notanumber").is_err());
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = r#"
directory: /tmp/logs
max_bytes: "128M"
backup_count: 3
level: warn
"#;
        let config: SinkConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.directory, PathBuf::from("/tmp/logs"));
        assert_eq!(config.max_bytes, 128 * 1024 * 1024);
        assert_eq!(config.backup_count, 3);
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn test_deserialize_numeric_size() {
        let yaml = "max_bytes: 4096";
        let config: SinkConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_bytes, 4096);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.backup_count, DEFAULT_BACKUP_COUNT);
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
directory = "/srv/logs"
max_bytes = "64M"
"#;
        let config: SinkConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.directory, PathBuf::from("/srv/logs"));
        assert_eq!(config.max_bytes, 64 * 1024 * 1024);
        assert_eq!(config.level, "info");
    }
}
