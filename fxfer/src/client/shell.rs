//! Interactive shell
// (c) 2025 fxfer developers

use std::io::Write;

use anyhow::{Context as _, Result};
use tracing::{debug, info};

use super::dispatch::{handle_response, report_failure, report_success};
use super::intent::Intent;
use super::interrupt::Interrupt;
use super::prompt::Prompt;
use super::session::{Session, TcpSession};
use crate::Error;
use crate::protocol::common::{ReceivingStream, SendingStream};
use crate::protocol::{Action, Field, IntentKind, RequestDescriptor, Target};

const PASSWORD_PROMPT: &str = "password: ";
const COMMAND_PROMPT: &str = "> ";

/// What a shell command does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Run(IntentKind),
    Help,
    Quit,
}

/// A positional argument to a shell command
#[derive(Debug, Clone, Copy)]
struct Param {
    field: Field,
    required: bool,
}

const fn required(field: Field) -> Param {
    Param {
        field,
        required: true,
    }
}

const fn optional(field: Field) -> Param {
    Param {
        field,
        required: false,
    }
}

#[derive(Debug)]
struct Command {
    name: &'static str,
    help: &'static str,
    params: &'static [Param],
    verb: Verb,
}

const COMMANDS: &[Command] = &[
    Command {
        name: "get",
        help: "Fetches the file at server [dst] and saves it at client [src]",
        params: &[required(Field::Destination), required(Field::Source)],
        verb: Verb::Run(IntentKind::Get),
    },
    Command {
        name: "put",
        help: "Sends the file at client [src] to be placed at server [dst]",
        params: &[required(Field::Destination), required(Field::Source)],
        verb: Verb::Run(IntentKind::Put),
    },
    Command {
        name: "help",
        help: "Displays this help menu",
        params: &[],
        verb: Verb::Help,
    },
    Command {
        name: "quit",
        help: "Exits interactive mode",
        params: &[],
        verb: Verb::Quit,
    },
    Command {
        name: "delete",
        help: "Deletes the file at server [dst]",
        params: &[required(Field::Destination)],
        verb: Verb::Run(IntentKind::Delete),
    },
    Command {
        name: "l_delete",
        help: "Deletes the file at client [src]",
        params: &[required(Field::Source)],
        verb: Verb::Run(IntentKind::LocalDelete),
    },
    Command {
        name: "ls",
        help: "Lists remote directory contents",
        params: &[optional(Field::Destination)],
        verb: Verb::Run(IntentKind::List),
    },
    Command {
        name: "l_ls",
        help: "Lists local directory contents at [src]",
        params: &[optional(Field::Source)],
        verb: Verb::Run(IntentKind::LocalList),
    },
    Command {
        name: "mkdir",
        help: "Makes a directory at server [dst]",
        params: &[required(Field::Destination)],
        verb: Verb::Run(IntentKind::MakeDir),
    },
    Command {
        name: "l_mkdir",
        help: "Makes a directory at client [src]",
        params: &[required(Field::Source)],
        verb: Verb::Run(IntentKind::LocalMakeDir),
    },
];

fn param_name(field: Field) -> &'static str {
    match field {
        Field::Source => "src",
        Field::Destination => "dst",
        Field::Permission => "permission",
    }
}

fn param_help(field: Field) -> &'static str {
    match field {
        Field::Source => "Local path",
        Field::Destination => "Remote path",
        Field::Permission => "Permission level",
    }
}

fn lookup(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// The main help menu
pub(crate) fn menu() -> String {
    use std::fmt::Write as _;
    let mut s = String::from("Commands:\n");
    for cmd in COMMANDS {
        let _ = writeln!(s, "  {:<10}{}", cmd.name, cmd.help);
    }
    s
}

/// Help for a single command
fn command_help(cmd: &Command) -> String {
    use std::fmt::Write as _;
    let mut usage = String::from(cmd.name);
    for p in cmd.params {
        if p.required {
            let _ = write!(usage, " {}", param_name(p.field));
        } else {
            let _ = write!(usage, " [{}]", param_name(p.field));
        }
    }
    let mut s = format!("CMD:  {usage}\nHELP: {}\n", cmd.help);
    for p in cmd.params {
        let _ = writeln!(s, "       - {:<8}{}", param_name(p.field), param_help(p.field));
    }
    s
}

/// A parsed line of shell input
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Line {
    /// Nothing to do
    Empty,
    /// Show help, optionally for one command
    Help(Option<String>),
    /// Leave the shell
    Quit,
    /// Send this
    Run(Box<Intent>),
}

/// Parses one line of input. `Err` carries a message for the user.
pub(crate) fn parse_line(line: &str) -> Result<Line, String> {
    let Some(words) = shlex::split(line) else {
        return Err("unbalanced quotes".into());
    };
    let Some((name, args)) = words.split_first() else {
        return Ok(Line::Empty);
    };
    let name = name.to_lowercase();
    let Some(cmd) = lookup(&name) else {
        return Err(format!("invalid command {name:?}. Use \"help\" if you need guidance"));
    };
    let max = match cmd.verb {
        Verb::Help => 1,
        _ => cmd.params.len(),
    };
    if args.len() > max {
        return Err(format!(
            "too many arguments for {name}. Use \"help {name}\" for more guidance"
        ));
    }

    let kind = match cmd.verb {
        Verb::Help => return Ok(Line::Help(args.first().map(|a| a.to_lowercase()))),
        Verb::Quit => return Ok(Line::Quit),
        Verb::Run(kind) => kind,
    };
    let mut intent = Intent::for_kind(kind);
    for (i, param) in cmd.params.iter().enumerate() {
        let value = match args.get(i) {
            Some(v) => v.clone(),
            None if param.required => {
                return Err(format!(
                    "{name} needs the {} argument. Use \"help {name}\" for more guidance",
                    param_name(param.field)
                ));
            }
            None => ".".to_owned(),
        };
        match param.field {
            Field::Source => intent.src = Some(value.into()),
            Field::Destination => intent.dst = Some(value),
            Field::Permission => (),
        }
    }
    Ok(Line::Run(Box::new(intent)))
}

/// Why the shell's command loop ended
#[derive(Debug)]
pub(crate) enum Exit {
    /// The user asked to leave
    Quit,
    /// Input ran out
    EndOfInput,
    /// Ctrl-C
    Interrupted,
    /// The server would not accept our credentials
    AuthenticationFailed,
    /// The connection failed
    Disconnected(Error),
}

enum Handshake {
    Accepted,
    Refused,
    Lost(Error),
}

/// What came back from a prompt
enum Input {
    Line(String),
    End,
    Interrupted,
}

/// Interactive shell state: who we are, and where input comes from and output goes to
pub(crate) struct Shell<'a, P: Prompt, W: Write> {
    target: &'a Target,
    password: String,
    prompt: &'a mut P,
    out: &'a mut W,
    interrupt: Interrupt,
}

impl<P: Prompt, W: Write> std::fmt::Debug for Shell<'_, P, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<'a, P: Prompt, W: Write> Shell<'a, P, W> {
    /// Creates a shell. Call [`Shell::ask_password`] before [`Shell::run`].
    pub(crate) fn new(
        target: &'a Target,
        prompt: &'a mut P,
        out: &'a mut W,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            target,
            password: String::new(),
            prompt,
            out,
            interrupt,
        }
    }

    /// Prompts for the user's password.
    ///
    /// # Return
    /// false if Ctrl-C was pressed instead
    pub(crate) async fn ask_password(&mut self) -> Result<bool> {
        let password = tokio::select! {
            biased;
            () = self.interrupt.raised() => return Ok(false),
            password = self.prompt.read_password(PASSWORD_PROMPT) => password?,
        };
        self.password = password;
        Ok(true)
    }

    async fn read_input(&mut self, prompt: &str) -> Result<Input> {
        let line = tokio::select! {
            biased;
            () = self.interrupt.raised() => return Ok(Input::Interrupted),
            line = self.prompt.read_line(prompt) => line?,
        };
        Ok(line.map_or(Input::End, Input::Line))
    }

    fn descriptor(&self, action: Action) -> RequestDescriptor {
        RequestDescriptor::new(self.target, action).with_password(self.password.clone())
    }

    async fn authenticate<S, R>(&mut self, session: &mut Session<S, R>) -> Result<Handshake>
    where
        S: SendingStream,
        R: ReceivingStream,
    {
        match session.request(self.descriptor(Action::Shell)).await {
            Ok(resp) if resp.successful() => {
                report_success(self.out, &resp.message())?;
                Ok(Handshake::Accepted)
            }
            Ok(resp) => {
                report_failure(self.out, &resp.message())?;
                Ok(Handshake::Refused)
            }
            Err(e @ Error::SessionExpired(_)) => {
                report_failure(self.out, &e)?;
                Ok(Handshake::Refused)
            }
            Err(e) if e.is_transport() => Ok(Handshake::Lost(e)),
            Err(e) => Err(e.into()),
        }
    }

    /// Authenticates over `session`, then reads and runs commands until told to stop.
    ///
    /// A request in flight is always allowed to finish. Ctrl-C is acted on once it has.
    pub(crate) async fn run<S, R>(&mut self, session: &mut Session<S, R>) -> Result<Exit>
    where
        S: SendingStream,
        R: ReceivingStream,
    {
        let handshake = self.authenticate(session).await?;
        if self.interrupt.is_raised() {
            return Ok(Exit::Interrupted);
        }
        match handshake {
            Handshake::Accepted => (),
            Handshake::Refused => return Ok(Exit::AuthenticationFailed),
            Handshake::Lost(e) => return Ok(Exit::Disconnected(e)),
        }
        write!(self.out, "{}", menu())?;

        loop {
            let line = match self.read_input(COMMAND_PROMPT).await? {
                Input::Line(line) => line,
                Input::End => return Ok(Exit::EndOfInput),
                Input::Interrupted => return Ok(Exit::Interrupted),
            };
            let intent = match parse_line(&line) {
                Ok(Line::Empty) => continue,
                Ok(Line::Quit) => return Ok(Exit::Quit),
                Ok(Line::Help(None)) => {
                    write!(self.out, "{}", menu())?;
                    continue;
                }
                Ok(Line::Help(Some(name))) => {
                    match lookup(&name) {
                        Some(cmd) => write!(self.out, "{}", command_help(cmd))?,
                        None => report_failure(self.out, &format!("no such command {name:?}"))?,
                    }
                    continue;
                }
                Ok(Line::Run(intent)) => intent,
                Err(msg) => {
                    report_failure(self.out, &msg)?;
                    continue;
                }
            };
            if let Some(exit) = self.execute(session, &intent).await? {
                return Ok(exit);
            }
            if self.interrupt.is_raised() {
                return Ok(Exit::Interrupted);
            }
        }
    }

    /// Sends one command. Returns `Some` if the loop must end.
    async fn execute<S, R>(
        &mut self,
        session: &mut Session<S, R>,
        intent: &Intent,
    ) -> Result<Option<Exit>>
    where
        S: SendingStream,
        R: ReceivingStream,
    {
        let descriptor = match intent.resolve(self.target) {
            Ok(d) => d.with_password(self.password.clone()),
            Err(e) => {
                report_failure(self.out, &e)?;
                return Ok(None);
            }
        };
        match session.request(descriptor).await {
            Ok(response) => {
                let _ = handle_response(&response, self.out).await?;
                Ok(None)
            }
            Err(e @ Error::SessionExpired(_)) => {
                report_failure(self.out, &format!("{e}; please log in again"))?;
                session.reset();
                if !self.ask_password().await? {
                    return Ok(Some(Exit::Interrupted));
                }
                Ok(match self.authenticate(session).await? {
                    Handshake::Accepted => None,
                    Handshake::Refused => Some(Exit::AuthenticationFailed),
                    Handshake::Lost(e) => Some(Exit::Disconnected(e)),
                })
            }
            Err(e) if e.is_transport() => Ok(Some(Exit::Disconnected(e))),
            Err(e) => {
                report_failure(self.out, &e)?;
                Ok(None)
            }
        }
    }
}

fn wants_reconnect(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Runs the interactive shell against the server in `target`.
///
/// The connection is closed on every exit path. If it fails, the user is offered a reconnect.
/// Ctrl-C, as reported by `interrupt`, ends the shell at the next prompt or once the
/// request in flight completes.
///
/// # Return
/// true if the shell ended normally
pub(crate) async fn run_shell<P: Prompt, W: Write>(
    target: &Target,
    prompt: &mut P,
    out: &mut W,
    interrupt: Interrupt,
) -> Result<bool> {
    let mut shell = Shell::new(target, prompt, out, interrupt);
    if !shell.ask_password().await? {
        info!("interrupted");
        return Ok(false);
    }
    loop {
        let mut session = TcpSession::connect(&target.host, target.port)
            .await
            .with_context(|| format!("could not connect to {}:{}", target.host, target.port))?;
        let exit = shell.run(&mut session).await;
        if let Err(e) = session.close().await {
            debug!("closing connection: {e}");
        }
        match exit? {
            Exit::Quit | Exit::EndOfInput => return Ok(true),
            Exit::Interrupted => {
                info!("interrupted");
                return Ok(false);
            }
            Exit::AuthenticationFailed => return Ok(false),
            Exit::Disconnected(e) => {
                report_failure(shell.out, &format!("connection lost: {e}"))?;
                let answer = match shell.read_input("Reconnect? [y/N] ").await? {
                    Input::Line(answer) => Some(answer),
                    Input::End => None,
                    Input::Interrupted => {
                        info!("interrupted");
                        return Ok(false);
                    }
                };
                if !wants_reconnect(answer.as_deref()) {
                    return Ok(false);
                }
            }
        }
    }
}
