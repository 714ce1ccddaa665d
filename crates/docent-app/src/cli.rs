//! CLI argument definitions for the Docent binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Docent — a conversational assistant grounded in your documentation.
#[derive(Parser, Debug)]
#[command(name = "docent", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > DOCENT_CONFIG env var > platform default
    /// (~/.docent/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("DOCENT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory path.
    ///
    /// Priority: --data-dir flag > config file value.
    /// Returns `None` if not overridden (use config default).
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".docent").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".docent").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_flag_wins() {
        let args = CliArgs::parse_from(["docent", "--config", "/tmp/custom.toml"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_data_dir_flag_resolves() {
        let args = CliArgs::parse_from(["docent", "-d", "/var/lib/docent"]);
        assert_eq!(args.resolve_data_dir(), Some("/var/lib/docent".to_string()));
    }

    #[test]
    fn test_no_overrides_leave_config_values() {
        let args = CliArgs::parse_from(["docent"]);
        assert!(args.resolve_data_dir().is_none());
        assert!(args.resolve_log_level().is_none());
    }
}
