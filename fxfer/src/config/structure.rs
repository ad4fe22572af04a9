//! Configuration structure
// (c) 2025 fxfer developers

use std::sync::LazyLock;

use anyhow::{Result, ensure};
use clap::Args;
use figment::{Metadata, Profile, Provider, providers::Serialized, value::Dict, value::Map};
use serde::{Deserialize, Serialize};

use crate::cli::styles::ColourMode;
use crate::util::TimeFormat;

/// The server address used when none is configured
pub const DEFAULT_SERVER_IP: &str = "127.0.0.1";
/// The server port used when none is configured
pub const DEFAULT_SERVER_PORT: u16 = 31337;

/// The set of configurable options supported by fxfer.
///
/// These may be given on the command line (in kebab-case), in the environment
/// (as `FXFER_SERVER_PORT` and so on) or in the configuration file.
///
/// There is no `default()`. The hard-wired defaults are available through [`Configuration::system_default()`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Configuration {
    /// Address of the server
    pub server_ip: String,
    /// Port the server listens on. Must not be zero.
    pub server_port: u16,
    /// Format of time stamps in log messages
    pub time_format: TimeFormat,
    /// Whether to use colours in terminal output
    pub color: ColourMode,
}

static SYSTEM_DEFAULT_CONFIG: LazyLock<Configuration> = LazyLock::new(|| Configuration {
    server_ip: DEFAULT_SERVER_IP.into(),
    server_port: DEFAULT_SERVER_PORT,
    time_format: TimeFormat::Local,
    color: ColourMode::Auto,
});

impl Configuration {
    /// Names of the configurable fields, in display order
    pub const FIELD_NAMES: &[&str] = &["server_ip", "server_port", "time_format", "color"];

    /// Hard-wired defaults
    #[must_use]
    pub fn system_default() -> &'static Self {
        &SYSTEM_DEFAULT_CONFIG
    }

    /// Checks the values make sense before anything goes on the network
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.server_ip.is_empty(), "server_ip must not be empty");
        ensure!(self.server_port != 0, "server_port must not be zero");
        Ok(())
    }
}

/// The command-line form of [`Configuration`].
///
/// Every member is optional; anything the user does not give falls through to lower priority
/// sources (environment, configuration file, system default).
#[derive(Debug, Clone, Default, PartialEq, Eq, Args, Deserialize, Serialize)]
pub struct PartialConfiguration {
    /// Address of the server [default: 127.0.0.1]
    #[arg(short('i'), long, value_name("ADDRESS"), help_heading("Connection"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,

    /// Port the server listens on [default: 31337]
    #[arg(short('p'), long, value_name("PORT"), help_heading("Connection"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,

    /// Format of time stamps in log messages [default: local]
    #[arg(long, value_enum, value_name("FORMAT"), help_heading("Output"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<TimeFormat>,

    /// Whether to use colours in terminal output [default: auto]
    #[arg(long, value_enum, value_name("MODE"), help_heading("Output"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColourMode>,
}

impl PartialConfiguration {
    /// Checks whatever values are present
    pub fn validate(&self) -> Result<()> {
        if let Some(ip) = &self.server_ip {
            ensure!(!ip.is_empty(), "server_ip must not be empty");
        }
        if let Some(port) = self.server_port {
            ensure!(port != 0, "server_port must not be zero");
        }
        Ok(())
    }
}

impl Provider for PartialConfiguration {
    fn metadata(&self) -> Metadata {
        Metadata::named("command line")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}

/// A [`figment::Provider`] that holds the set of system default options
pub(super) struct SystemDefault {}

impl Provider for SystemDefault {
    fn metadata(&self) -> Metadata {
        Metadata::named("default")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(Configuration::system_default()).data()
    }
}
