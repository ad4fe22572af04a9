//! Configuration source wrangling
// (c) 2025 fxfer developers

use std::fmt::{self, Display};
use std::path::PathBuf;

use anyhow::Result;
use figment::providers::{Env, Format as _, Toml};
use figment::{Figment, Provider};
use serde::Deserialize;
use tracing::debug;

use super::structure::{Configuration, PartialConfiguration, SystemDefault};
use crate::cli::styles::header;

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "FXFER_";

/// Processes and merges all possible configuration sources.
///
/// Run `fxfer --config-files` to see which files are read on the current platform.
#[derive(Debug, Clone)]
pub struct Manager {
    /// Configuration data
    data: Figment,
}

impl Manager {
    fn new(apply_env: bool, apply_config_files: bool) -> Self {
        let mut new1 = Self {
            data: Figment::new(),
        };
        if apply_config_files {
            for path in Self::config_file_paths() {
                if path.exists() {
                    debug!("reading configuration from {}", path.display());
                    new1.merge_provider(Toml::file(path));
                } else {
                    debug!("configuration file {} not present", path.display());
                }
            }
        }
        if apply_env {
            new1.merge_provider(Env::prefixed(ENV_PREFIX));
        }
        new1
    }

    /// General constructor for production use.
    ///
    /// Reads the user's configuration file, then the environment.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(true, true)
    }

    /// Testing/internal constructor. Does not read files or the environment; DOES apply system default.
    #[must_use]
    #[cfg(test)]
    pub(crate) fn without_files() -> Self {
        let mut new1 = Self::new(false, false);
        new1.apply_system_default();
        new1
    }

    fn config_file_paths() -> Vec<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("fxfer").join("fxfer.toml"))
            .into_iter()
            .collect()
    }

    /// Returns the list of configuration files we read.
    ///
    /// This is a function of platform and the current user.
    #[must_use]
    pub fn config_files() -> Vec<String> {
        Self::config_file_paths()
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect()
    }

    /// Merges in a data set, which is some sort of [`figment::Provider`].
    /// This uses figment's `merge` operation, which prefers to _replace_ existing items.
    pub fn merge_provider<T>(&mut self, provider: T)
    where
        T: Provider,
    {
        let f = std::mem::take(&mut self.data);
        self.data = f.merge(provider); // in the error case, this leaves the provider in a fused state
    }

    /// Applies the system default settings, at a lower priority than everything else
    pub fn apply_system_default(&mut self) {
        let f = std::mem::take(&mut self.data);
        self.data = f.join(SystemDefault {});
    }

    /// Attempts to extract a particular struct from the data.
    pub fn get<'de, T>(&self) -> Result<T, Box<figment::Error>>
    where
        T: Deserialize<'de>,
    {
        self.data.extract::<T>().map_err(Box::new)
    }

    /// Performs validation checks on the fields present in the configuration, as far as possible.
    pub fn validate_configuration(&self) -> Result<()> {
        let working: PartialConfiguration = self.get()?;
        working.validate()?;
        Ok(())
    }

    /// Extracts and validates the complete configuration
    pub fn configuration(&self) -> Result<Configuration> {
        let config: Configuration = self.get()?;
        config.validate()?;
        Ok(config)
    }
}

impl Display for Manager {
    /// Lists each configuration field with its value and where that value came from.
    ///
    /// N.B. This uses CLI styling.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = header();
        writeln!(f, "{style}{:<12} {:<16} {}{style:#}", "Field", "Value", "Source")?;
        for field in Configuration::FIELD_NAMES {
            let Ok(value) = self.data.find_value(field) else {
                continue;
            };
            let source = self
                .data
                .get_metadata(value.tag())
                .map(|m| {
                    m.source
                        .as_ref()
                        .map_or_else(|| m.name.to_string(), figment::Source::to_string)
                })
                .unwrap_or_default();
            let rendered = value
                .as_str()
                .map(str::to_owned)
                .or_else(|| value.to_u128().map(|n| n.to_string()))
                .unwrap_or_else(|| format!("{value:?}"));
            writeln!(f, "{field:<12} {rendered:<16} {source}")?;
        }
        Ok(())
    }
}
