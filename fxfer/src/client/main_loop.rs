//! Main client mode entrypoint
// (c) 2025 fxfer developers

use std::io::Write;

use anyhow::{Context as _, Result};
use tracing::{Instrument as _, debug, trace_span};

use super::dispatch::{handle_response, report_failure};
use super::interrupt::Interrupt;
use super::prompt::{Prompt, Terminal};
use super::shell::run_shell;
use super::{Intent, Parameters, one_shot};
use crate::Error;
use crate::config::{Configuration, Manager};
use crate::protocol::{Action, Target};
use crate::util::{self, ConsoleTraceType, TimeFormat};

fn setup_tracing(parameters: &Parameters, time_format: TimeFormat) -> Result<()> {
    util::setup_tracing(
        util::trace_level(parameters),
        ConsoleTraceType::Standard,
        parameters.log_file.as_ref(),
        time_format,
        crate::cli::styles::use_colours(),
    ) // to provoke error: set RUST_LOG=.
}

/// Main client mode entrypoint
///
/// Runs the shell if that is what `intent` asks for; otherwise sends a single request.
///
/// # Return value
/// `true` if the requested operation succeeded.
#[allow(clippy::module_name_repetitions)]
pub async fn client_main(
    manager: &Manager,
    parameters: Parameters,
    intent: Intent,
) -> Result<bool> {
    let config: Configuration = manager.configuration()?;
    setup_tracing(&parameters, config.time_format)?;

    let username = parameters
        .username
        .as_deref()
        .context("a username is required")?;
    let target = Target::new(&config.server_ip, config.server_port, username);
    debug!("target is {}:{}", target.host, target.port);

    run(
        &target,
        &intent,
        &mut Terminal::new()?,
        &mut anstream::stdout(),
    )
    .instrument(trace_span!("CLIENT"))
    .await
}

/// Resolves and carries out one intent.
///
/// The intent is validated before the user is asked for anything.
pub(crate) async fn run<P: Prompt, W: Write>(
    target: &Target,
    intent: &Intent,
    prompt: &mut P,
    out: &mut W,
) -> Result<bool> {
    let descriptor = intent.resolve(target)?;
    if descriptor.action == Action::Shell {
        return run_shell(target, prompt, out, Interrupt::on_ctrl_c()).await;
    }

    let password = prompt.read_password("password: ").await?;
    let mut descriptor = descriptor.with_password(password);
    if descriptor.requires_other_password() {
        let other = descriptor.other_username.clone().unwrap_or_default();
        let other_password = prompt
            .read_password(&format!("password for new user {other}: "))
            .await?;
        descriptor = descriptor.with_other_password(other_password);
    }

    let response = match one_shot(descriptor).await {
        Ok(r) => r,
        Err(e @ Error::SessionExpired(_)) => {
            report_failure(out, &e)?;
            return Ok(false);
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("request to {}:{} failed", target.host, target.port)
            });
        }
    };
    handle_response(&response, out).await
}
