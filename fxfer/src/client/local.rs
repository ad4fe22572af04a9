//! Operations on the client's own disk
// (c) 2025 fxfer developers

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context as _, Result, anyhow};
use tracing::debug;

use super::listing::{Entry, EntryKind};
use crate::protocol::LocalOp;

/// Lists a local directory, in the same record format the server uses.
///
/// Only regular files and directories are included.
pub async fn list(path: &Path) -> Result<String> {
    let mut dir = tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("could not list {}", path.display()))?;
    let mut out = String::new();
    while let Some(entry) = dir.next_entry().await? {
        let meta = entry.metadata().await?;
        let kind = if meta.is_file() {
            EntryKind::File
        } else if meta.is_dir() {
            EntryKind::Directory
        } else {
            continue;
        };
        let record = Entry {
            kind,
            size: meta.len(),
            name: entry.file_name().to_string_lossy().into_owned(),
        }
        .to_record();
        out.push_str(&record);
        out.push('\n');
    }
    Ok(out)
}

/// Creates a single local directory. Its parent must already exist.
pub async fn make_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            anyhow!("path is missing parent directories; create those first")
        }
        ErrorKind::AlreadyExists => anyhow!("{} already exists", path.display()),
        _ => anyhow!(e).context(format!("could not create {}", path.display())),
    })
}

/// Deletes a local file, or an empty directory
pub async fn delete(path: &Path) -> Result<&'static str> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            anyhow!("file not found")
        } else {
            anyhow!(e).context(format!("could not delete {}", path.display()))
        }
    })?;
    if meta.is_dir() {
        tokio::fs::remove_dir(path)
            .await
            .with_context(|| format!("could not delete {}", path.display()))?;
        Ok("deleted directory")
    } else {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("could not delete {}", path.display()))?;
        Ok("deleted file")
    }
}

/// What a local operation produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A listing, in record form
    Listing(String),
    /// A short confirmation
    Done(&'static str),
}

/// Carries out a local operation on `path`
pub async fn perform(op: LocalOp, path: &Path) -> Result<Outcome> {
    debug!("local {op:?} on {}", path.display());
    Ok(match op {
        LocalOp::List => Outcome::Listing(list(path).await?),
        LocalOp::MakeDir => {
            make_dir(path).await?;
            Outcome::Done("created directory")
        }
        LocalOp::Delete => Outcome::Done(delete(path).await?),
    })
}
