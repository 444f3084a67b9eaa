//! Configuration for logging and navigation defaults.
//!
//! Settings are read from a TOML file whose tables mirror the structs below.
//! Every field has a default, so a partial file (or no file at all) is valid:
//!
//! ```toml
//! [logging]
//! enabled = true
//! level = "debug"
//!
//! [navigation]
//! animated = false
//! clear-stack-on-navigation = true
//! intercept-hooks = true
//! ```

use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub logging: LoggingSettings,
    pub navigation: NavigationSettings,
}

/// Structured log output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingSettings {
    /// Whether JSON log files are written at all.
    pub enabled: bool,
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Run logs kept per scope in `directory`, the new one included
    /// (0 keeps every file).
    pub max_files: usize,
    /// Log directory, relative to the working directory.
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            enabled: true,
            level: "info".to_string(),
            max_files: 3,
            directory: PathBuf::from("logs"),
        }
    }
}

/// Defaults applied by the navigation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NavigationSettings {
    /// Animation flag used when a request does not specify one.
    pub animated: bool,
    /// Clear-stack policy for stacks whose page and view-model don't decide.
    pub clear_stack_on_navigation: bool,
    /// Whether push and pop intercept hooks are dispatched.
    pub intercept_hooks: bool,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        NavigationSettings {
            animated: true,
            clear_stack_on_navigation: true,
            intercept_hooks: true,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults when the file
    /// doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, Error> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "settings file missing, using defaults");
            return Ok(Settings::default());
        }

        crate::helpers::load_toml::<Settings, _>(path)
            .with_context(|| format!("can't load settings from {}", path.display()))
    }

    /// Writes settings to `path`, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        crate::helpers::save_toml(self, path).context("failed to save settings file")
    }
}
