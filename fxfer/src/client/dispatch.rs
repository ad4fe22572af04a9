//! Acting on a decoded response: reporting it, and carrying out whatever follows from it
// (c) 2025 fxfer developers

use std::io::Write;

use anyhow::Result;
use tracing::{debug, warn};

use super::{listing, local};
use crate::Error;
use crate::cli::styles::{error, success, warning};
use crate::protocol::{Action, ServerResponse};

pub(crate) fn report_failure<W: Write>(out: &mut W, message: &dyn std::fmt::Display) -> Result<()> {
    let style = error();
    writeln!(out, "{style}[!]{style:#} {message}")?;
    Ok(())
}

pub(crate) fn report_success<W: Write>(out: &mut W, message: &dyn std::fmt::Display) -> Result<()> {
    let style = success();
    writeln!(out, "{style}[+]{style:#} {message}")?;
    Ok(())
}

fn print_listing<W: Write>(out: &mut W, text: &[u8]) -> Result<bool> {
    match listing::parse_bytes(text) {
        Ok(entries) => {
            for entry in entries {
                writeln!(out, "{entry}")?;
            }
            Ok(true)
        }
        Err(e) => {
            report_failure(out, &format!("{e:#}"))?;
            Ok(false)
        }
    }
}

/// Reports a response to the user and performs any follow-up it calls for:
/// displaying a listing, saving a fetched file, or carrying out a local operation.
///
/// A payload is only used after it passes its integrity check.
/// A payload that fails is discarded with a warning; the session is unaffected.
///
/// # Return
/// true if the request and its follow-up succeeded
pub async fn handle_response<W: Write>(response: &ServerResponse, out: &mut W) -> Result<bool> {
    if !response.successful() {
        report_failure(out, &response.message())?;
        return Ok(false);
    }

    let payload = match response.verified_payload() {
        Ok(p) => p,
        Err(Error::Integrity) => {
            warn!("{}: payload digest mismatch", response.action().opcode());
            let style = warning();
            writeln!(
                out,
                "{style}[!]{style:#} {}; payload discarded",
                Error::Integrity
            )?;
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    match response.action() {
        Action::List => match payload {
            Some(text) => print_listing(out, text),
            None => {
                report_success(out, &response.message())?;
                Ok(true)
            }
        },
        Action::Get => {
            let Some(path) = response.request.src.as_deref() else {
                report_failure(out, &"no local path to save to")?;
                return Ok(false);
            };
            let contents = payload.unwrap_or_default();
            if let Err(e) = tokio::fs::write(path, contents).await {
                report_failure(out, &format!("could not write {}: {e}", path.display()))?;
                return Ok(false);
            }
            debug!("wrote {} bytes to {}", contents.len(), path.display());
            report_success(
                out,
                &format!("{} (saved to {})", response.message(), path.display()),
            )?;
            Ok(true)
        }
        Action::Local(op) => {
            let Some(path) = response.request.src.as_deref() else {
                report_failure(out, &"no local path given")?;
                return Ok(false);
            };
            match local::perform(op, path).await {
                Ok(local::Outcome::Listing(text)) => print_listing(out, text.as_bytes()),
                Ok(local::Outcome::Done(what)) => {
                    report_success(out, &what)?;
                    Ok(true)
                }
                Err(e) => {
                    report_failure(out, &format!("{e:#}"))?;
                    Ok(false)
                }
            }
        }
        Action::Delete | Action::MakeDir | Action::Put | Action::User(_) | Action::Shell => {
            report_success(out, &response.message())?;
            Ok(true)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::handle_response;
    use crate::protocol::test_helpers::encode_response;
    use crate::protocol::{Action, LocalOp, RequestDescriptor, ReturnCode, ServerResponse, Target};
    use assertables::assert_contains;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    async fn response(
        action: Action,
        src: Option<&Path>,
        code: ReturnCode,
        message: &str,
        payload: Option<&[u8]>,
    ) -> ServerResponse {
        let mut req = RequestDescriptor::new(&Target::new("h", 1, "u"), action);
        req.src = src.map(Path::to_path_buf);
        let wire = encode_response(code, 1, message, payload);
        let mut mock = tokio_test::io::Builder::new().read(&wire).build();
        ServerResponse::read_from(&mut mock, req).await.unwrap()
    }

    async fn run(resp: &ServerResponse) -> (bool, String) {
        let mut out = Vec::new();
        let ok = handle_response(resp, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        (ok, console::strip_ansi_codes(&text).into_owned())
    }

    #[tokio::test]
    async fn failure_shows_message() {
        let resp = response(Action::Delete, None, ReturnCode(8), "directory not empty", None).await;
        let (ok, text) = run(&resp).await;
        assert!(!ok);
        assert_eq!(text, "[!] directory not empty\n");
    }

    #[tokio::test]
    async fn remote_listing() {
        let payload = b"[F]:3:a\n[D]:0:d\n";
        let resp = response(Action::List, None, ReturnCode::SUCCESS, "", Some(payload)).await;
        let (ok, text) = run(&resp).await;
        assert!(ok);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[D]"));
        assert!(lines[1].ends_with(" a"));
    }

    #[tokio::test]
    async fn tampered_listing_is_discarded() {
        let mut resp =
            response(Action::List, None, ReturnCode::SUCCESS, "", Some(b"[F]:3:a\n")).await;
        if let Some(p) = resp.payload.as_mut() {
            p[0] = b'X';
        }
        let (ok, text) = run(&resp).await;
        assert!(!ok);
        assert_contains!(text, "integrity");
        assert!(!text.contains("[F]"));
    }

    #[tokio::test]
    async fn get_saves_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("fetched");
        let resp = response(
            Action::Get,
            Some(&dest),
            ReturnCode::SUCCESS,
            "file sent",
            Some(b"contents"),
        )
        .await;
        let (ok, text) = run(&resp).await;
        assert!(ok, "{text}");
        assert_eq!(std::fs::read(&dest).unwrap(), b"contents");
        assert_contains!(text, "file sent");
    }

    #[tokio::test]
    async fn get_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no/such/dir/file");
        let resp = response(Action::Get, Some(&dest), ReturnCode::SUCCESS, "", Some(b"x")).await;
        let (ok, text) = run(&resp).await;
        assert!(!ok);
        assert_contains!(text, "could not write");
    }

    #[tokio::test]
    async fn local_mkdir_after_authentication() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("newdir");
        let resp = response(
            Action::Local(LocalOp::MakeDir),
            Some(&target),
            ReturnCode::SUCCESS,
            "",
            None,
        )
        .await;
        let (ok, text) = run(&resp).await;
        assert!(ok);
        assert!(target.is_dir());
        assert_contains!(text, "created directory");
    }

    #[tokio::test]
    async fn local_op_refused_by_server() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("newdir");
        let resp = response(
            Action::Local(LocalOp::MakeDir),
            Some(&target),
            ReturnCode(7),
            "user authentication failed",
            None,
        )
        .await;
        let (ok, _) = run(&resp).await;
        assert!(!ok);
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn plain_success() {
        let resp = response(Action::MakeDir, None, ReturnCode::SUCCESS, "created", None).await;
        let (ok, text) = run(&resp).await;
        assert!(ok);
        assert_eq!(text, "[+] created\n");
    }
}
