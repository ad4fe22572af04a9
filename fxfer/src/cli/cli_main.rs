//! Main CLI for fxfer
// (c) 2025 fxfer developers

use std::ffi::OsString;
use std::io::Write as _;
use std::process::ExitCode;

use super::args::{CliArgs, MainMode};
use crate::{
    Parameters,
    cli::styles::{configure_colours, error, use_colours},
    client::Intent,
    config::{Configuration, Manager, PartialConfiguration},
};

use anyhow::Result;

/// Main CLI entrypoint
///
/// Call this from `main`, passing the arguments to use.
/// Normally you will call `cli(std::env::args_os())` but you can pass in alternate arguments for CLI testing.
///
/// # Safety
/// - This function may start a tokio runtime and perform work in it.
/// - This function is not safe to call from multi-threaded code.
#[must_use]
pub fn cli<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    #[allow(clippy::match_bool)] // improved readability
    cli_inner(args)
        .inspect_err(|e| {
            if crate::util::tracing_is_initialised() {
                tracing::error!("{e:#}");
            } else {
                let style = error();
                let _ = writeln!(anstream::stderr(), "{style}Error:{style:#} {e:#}");
            }
        })
        .map_or(ExitCode::FAILURE, |success| match success {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        })
}

/// Inner CLI logic
///
/// # Return
/// true indicates success. false indicates a failure where the callee has output to stderr.
///
/// # Note
/// - This function starts a tokio runtime and performs work in it.
fn cli_inner<I, T>(args: I) -> Result<bool>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let Some(args) = parse_args(args)? else {
        return Ok(true); // help/version shown; exit
    };

    // Now fold the arguments in with the rest of the configuration
    let config_manager = Manager::from(&*args);
    setup_colours(&config_manager)?;

    let args = *args;
    handle_mode(
        args.mode_,
        config_manager,
        args.client_params,
        args.intent,
    )
}

fn parse_args<I, T>(args: I) -> Result<Option<Box<CliArgs>>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    use clap::error::ErrorKind::{DisplayHelp, DisplayVersion};
    match CliArgs::custom_parse(args) {
        Ok(args) => Ok(Some(Box::new(args))),
        Err(e) if matches!(e.kind(), DisplayHelp | DisplayVersion) => {
            let message = e.render();
            if use_colours() {
                println!("{}", message.ansi());
            } else {
                println!("{message}");
            }
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn setup_colours(manager: &Manager) -> Result<()> {
    let partial: PartialConfiguration = manager.get()?;
    configure_colours(
        partial
            .color
            .unwrap_or(Configuration::system_default().color),
    );
    Ok(())
}

// MODE HANDLERS ///////////////////////////////////////////////////////////

#[tokio::main(flavor = "current_thread")]
async fn handle_mode(
    mode: MainMode,
    mut config_manager: Manager,
    client_params: Parameters,
    intent: Intent,
) -> Result<bool> {
    config_manager.apply_system_default();
    match mode {
        MainMode::ShowConfigFiles => {
            println!("{:?}", Manager::config_files());
            Ok(true)
        }
        MainMode::ShowConfig => show_config(&config_manager),
        MainMode::Client => {
            config_manager.validate_configuration()?;
            // this mode may return false
            crate::client::client_main(&config_manager, client_params, intent).await
        }
    }
}

fn show_config(config_manager: &Manager) -> Result<bool> {
    let _ = writeln!(anstream::stdout(), "{}", show_config_data(config_manager));
    config_manager.validate_configuration()?;
    Ok(true)
}

fn show_config_data(config_manager: &Manager) -> String {
    format!("Client configuration:\n{config_manager}")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use assertables::assert_contains;

    use super::{MainMode, handle_mode, show_config_data};
    use crate::{
        Parameters,
        client::Intent,
        config::{Manager, PartialConfiguration},
    };

    fn test_mgr() -> Manager {
        Manager::without_files()
    }

    #[test]
    fn show_config() {
        let mut mgr = test_mgr();
        mgr.merge_provider(PartialConfiguration {
            server_port: Some(4444),
            ..Default::default()
        });
        let data = console::strip_ansi_codes(&show_config_data(&mgr)).into_owned();
        assert_contains!(data, "Client config");
        assert_contains!(data, "server_port");
        assert_contains!(data, "4444");
    }

    #[test]
    fn show_config_files() {
        let params = Parameters::default();
        assert!(
            handle_mode(
                MainMode::ShowConfigFiles,
                test_mgr(),
                params,
                Intent::default()
            )
            .unwrap()
        );
    }

    #[test]
    fn show_config_rejects_bad_port() {
        let mut mgr = test_mgr();
        mgr.merge_provider(PartialConfiguration {
            server_port: Some(0),
            ..Default::default()
        });
        assert!(
            handle_mode(
                MainMode::ShowConfig,
                mgr,
                Parameters::default(),
                Intent::default()
            )
            .is_err()
        );
    }

    #[test]
    fn help_is_not_an_error() {
        assert!(super::cli_inner(["fxfer", "--help"]).unwrap());
        assert!(super::cli_inner(["fxfer", "--version"]).unwrap());
    }
}
