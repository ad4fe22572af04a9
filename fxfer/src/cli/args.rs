//! Command-line argument definition and processing
// (c) 2025 fxfer developers

use std::ffi::OsString;

use clap::Parser;

use crate::Parameters;
use crate::client::Intent;
use crate::config::{Manager, PartialConfiguration};

/// What the program is going to do this run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum MainMode {
    /// Talk to a server
    #[default]
    Client,
    /// Print the configuration and exit
    ShowConfig,
    /// Print the configuration file locations and exit
    ShowConfigFiles,
}

/// Options for fxfer, in the order they are presented in `--help`
#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "Client for an authenticated binary file-transfer protocol.\n\nGive exactly one command. Passwords are always prompted for, never passed on the command line.",
    styles = super::styles::CLAP_STYLES,
    after_help = "Configuration may also be set in the environment (FXFER_SERVER_PORT=...) or in a configuration file; see --config-files.",
)]
pub(crate) struct CliArgs {
    // CONFIGURATION ==================================================================
    /// Outputs the configuration, then exits.
    ///
    /// Shows each field, its current value and the source it came from.
    #[arg(long, help_heading("Configuration"), display_order(0))]
    pub(crate) show_config: bool,

    /// Outputs the paths to configuration file(s), then exits
    #[arg(long, help_heading("Configuration"), display_order(0))]
    pub(crate) config_files: bool,

    /// Persistent options, which may also come from the environment or a configuration file
    #[command(flatten)]
    pub(crate) config: PartialConfiguration,

    /// Per-run options
    #[command(flatten)]
    pub(crate) client_params: Parameters,

    /// The command to run
    #[command(flatten)]
    pub(crate) intent: Intent,

    /// Set by [`CliArgs::custom_parse`]
    #[arg(skip)]
    pub(crate) mode_: MainMode,
}

impl CliArgs {
    /// Parses arguments and works out the main mode.
    pub(crate) fn custom_parse<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut args = CliArgs::try_parse_from(args)?;
        args.mode_ = if args.config_files {
            MainMode::ShowConfigFiles
        } else if args.show_config {
            MainMode::ShowConfig
        } else {
            MainMode::Client
        };
        Ok(args)
    }
}

impl From<&CliArgs> for Manager {
    /// Folds the command-line configuration in on top of the environment and configuration file.
    ///
    /// The system default is NOT applied here.
    fn from(args: &CliArgs) -> Self {
        let mut mgr = Manager::standard();
        mgr.merge_provider(args.config.clone());
        mgr
    }
}
