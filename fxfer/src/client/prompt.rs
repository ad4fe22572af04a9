//! Reading commands and credentials from the user
// (c) 2025 fxfer developers

use std::io::{BufRead, Write as _};
use std::sync::mpsc as std_mpsc;

use anyhow::{Context as _, Result, anyhow};
use tokio::sync::oneshot;

/// Source of user input.
///
/// Passwords are requested at the moment they are needed and are not retained here.
pub(crate) trait Prompt {
    /// Shows `prompt` and reads one line. `None` means end of input.
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Shows `prompt` and reads a password without echoing it
    async fn read_password(&mut self, prompt: &str) -> Result<String>;
}

#[derive(Debug)]
enum Request {
    Line,
    Password(String),
}

type Reply = std::io::Result<Option<String>>;

/// The controlling terminal.
///
/// Reads happen on a dedicated thread, and only on request. An abandoned read
/// leaves that thread blocked but never holds up runtime shutdown.
#[derive(Debug)]
pub(crate) struct Terminal {
    requests: std_mpsc::Sender<(Request, oneshot::Sender<Reply>)>,
}

impl Terminal {
    pub(crate) fn new() -> Result<Self> {
        Self::with_input(std::io::BufReader::new(std::io::stdin()))
    }

    fn with_input<R: BufRead + Send + 'static>(input: R) -> Result<Self> {
        let (requests, rx) = std_mpsc::channel();
        let _ = std::thread::Builder::new()
            .name("terminal".into())
            .spawn(move || serve(input, &rx))
            .context("could not start terminal reader")?;
        Ok(Self { requests })
    }

    async fn ask(&self, request: Request) -> Result<Option<String>> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send((request, tx))
            .map_err(|_| anyhow!("terminal reader has stopped"))?;
        Ok(rx.await.context("terminal reader has stopped")??)
    }
}

fn serve<R: BufRead>(mut input: R, requests: &std_mpsc::Receiver<(Request, oneshot::Sender<Reply>)>) {
    while let Ok((request, reply)) = requests.recv() {
        let result = match request {
            Request::Line => read_one_line(&mut input),
            Request::Password(prompt) => {
                let term = console::Term::stderr();
                term.write_str(&prompt)
                    .and_then(|()| term.read_secure_line())
                    .map(Some)
            }
        };
        let _ = reply.send(result);
    }
}

fn read_one_line<R: BufRead>(input: &mut R) -> Reply {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        let _ = line.pop();
        if line.ends_with('\r') {
            let _ = line.pop();
        }
    }
    Ok(Some(line))
}

impl Prompt for Terminal {
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut out = anstream::stdout();
        write!(out, "{prompt}")?;
        out.flush()?;
        self.ask(Request::Line).await
    }

    async fn read_password(&mut self, prompt: &str) -> Result<String> {
        self.ask(Request::Password(prompt.to_owned()))
            .await
            .context("could not read password")?
            .context("no password was entered")
    }
}

/// Canned input, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Scripted {
    pub(crate) lines: std::collections::VecDeque<String>,
    pub(crate) passwords: std::collections::VecDeque<String>,
    pub(crate) password_prompts: Vec<String>,
}

#[cfg(test)]
impl Scripted {
    pub(crate) fn new(lines: &[&str], passwords: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|s| (*s).to_owned()).collect(),
            passwords: passwords.iter().map(|s| (*s).to_owned()).collect(),
            password_prompts: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Prompt for Scripted {
    async fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    async fn read_password(&mut self, prompt: &str) -> Result<String> {
        self.password_prompts.push(prompt.to_owned());
        self.passwords
            .pop_front()
            .context("test script ran out of passwords")
    }
}

/// Input that never arrives, for tests.
/// Optionally presses Ctrl-C the first time it is asked for something.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Silent {
    pub(crate) line_prompts: usize,
    pub(crate) password_prompts: usize,
    ctrl_c: Option<tokio::sync::watch::Sender<bool>>,
}

#[cfg(test)]
impl Silent {
    pub(crate) fn pressing_ctrl_c(ctrl_c: tokio::sync::watch::Sender<bool>) -> Self {
        Self {
            ctrl_c: Some(ctrl_c),
            ..Self::default()
        }
    }

    fn press(&mut self) {
        if let Some(tx) = self.ctrl_c.take() {
            let _ = tx.send(true);
        }
    }
}

#[cfg(test)]
impl Prompt for Silent {
    async fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        self.line_prompts += 1;
        self.press();
        std::future::pending().await
    }

    async fn read_password(&mut self, _prompt: &str) -> Result<String> {
        self.password_prompts += 1;
        self.press();
        std::future::pending().await
    }
}
