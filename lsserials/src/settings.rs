//! Application settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serial_usage::HostLayout;
use tracing::{debug, warn};

use crate::cli::Cli;

/// Settings file contents, every field optional
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Monitor poll delay in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// A port is free only if that is certain
    #[serde(default)]
    pub require_certain: bool,
    /// Look up /dev/serial/by-id and by-path links
    #[serde(default = "default_true")]
    pub check_serial_by: bool,
    /// Host roots (/proc, /dev, ...)
    #[serde(default)]
    pub layout: HostLayout,
}

fn default_poll_interval_ms() -> u64 {
    1500
}

fn default_true() -> bool {
    true
}

fn settings_file_in(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    let base = match xdg_config_home {
        Some(dir) if dir.is_absolute() => dir,
        _ => home?.join(".config"),
    };
    Some(base.join("lsserials").join("settings.json"))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            require_certain: false,
            check_serial_by: true,
            layout: HostLayout::default(),
        }
    }
}

impl Settings {
    /// `lsserials/settings.json` under `$XDG_CONFIG_HOME`, or under
    /// `~/.config` when that is unset or relative
    pub fn default_path() -> Option<PathBuf> {
        settings_file_in(
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            dirs::home_dir(),
        )
    }

    /// Settings from [`Settings::default_path`]
    ///
    /// No file means defaults. A file that exists but cannot be used also
    /// falls back to defaults, with a warning naming the problem.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            debug!("No config directory, using default settings");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("Ignoring settings file: {:#}", e);
            Self::default()
        })
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// Settings file (explicit or default) with command line overrides
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Self::load_from(path)?,
            None => Self::load(),
        };
        settings.apply(cli);
        Ok(settings)
    }

    fn apply(&mut self, cli: &Cli) {
        if cli.certain {
            self.require_certain = true;
        }
        if let Some(ms) = cli.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
        if cli.no_serial_by {
            self.check_serial_by = false;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.poll_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_partial_layout() {
        let settings: Settings =
            serde_json::from_str(r#"{"layout": {"dev_root": "/chroot/dev"}, "check_serial_by": false}"#)
                .unwrap();
        assert_eq!(settings.layout.dev_root, PathBuf::from("/chroot/dev"));
        assert_eq!(settings.layout.proc_root, PathBuf::from("/proc"));
        assert!(!settings.check_serial_by);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"poll_interval_ms": 200, "require_certain": false}"#).unwrap();

        let cli = Cli::try_parse_from([
            "lsserials",
            "--config",
            path.to_str().unwrap(),
            "-c",
            "--no-serial-by",
        ])
        .unwrap();
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.poll_interval_ms, 200);
        assert!(settings.require_certain);
        assert!(!settings.check_serial_by);
    }

    #[test]
    fn test_settings_file_location() {
        let home = Some(PathBuf::from("/home/op"));
        assert_eq!(
            settings_file_in(Some(PathBuf::from("/xdg")), home.clone()),
            Some(PathBuf::from("/xdg/lsserials/settings.json"))
        );
        assert_eq!(
            settings_file_in(Some(PathBuf::from("relative/xdg")), home.clone()),
            Some(PathBuf::from("/home/op/.config/lsserials/settings.json"))
        );
        assert_eq!(
            settings_file_in(None, home),
            Some(PathBuf::from("/home/op/.config/lsserials/settings.json"))
        );
        assert_eq!(settings_file_in(None, None), None);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let cli = Cli::try_parse_from(["lsserials", "--config", "/nonexistent/settings.json"])
            .unwrap();
        assert!(Settings::resolve(&cli).is_err());
    }
}
