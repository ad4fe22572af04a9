//! Error taxonomy for the protocol client
// (c) 2025 fxfer developers

use std::path::PathBuf;

use crate::protocol::{Field, IntentKind};

/// Everything that can go wrong between reading the user's intent and receiving a response.
///
/// The variants fall into families; see [`Error::is_validation`] and [`Error::is_transport`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    // VALIDATION ////////////////////////////////////////////////////////////////////
    /// More than one command was requested
    #[error("only one command may be given at a time")]
    MultipleActions,
    /// No command was requested
    #[error("no command given")]
    NoAction,
    /// The chosen command needs an argument that was not supplied
    #[error("command \"{intent}\" requires the {field} argument")]
    MissingDependency {
        /// The command that was requested
        intent: IntentKind,
        /// The first missing argument
        field: Field,
    },
    /// A string field does not fit its 16-bit length prefix
    #[error("{field} is too long for the wire ({len} bytes)")]
    FieldTooLong {
        /// Which field
        field: &'static str,
        /// Its length in bytes
        len: usize,
    },

    // TRANSPORT /////////////////////////////////////////////////////////////////////
    /// The peer closed the connection before a complete field arrived
    #[error("connection closed while reading {field} ({expected} bytes expected)")]
    ConnectionClosed {
        /// The field being read
        field: &'static str,
        /// How many bytes the field needed
        expected: u64,
    },
    /// Any other I/O failure on the connection
    #[error(transparent)]
    Io(#[from] std::io::Error),

    // SESSION ///////////////////////////////////////////////////////////////////////
    /// The server reported that our session is no longer valid
    #[error("session expired: {0}")]
    SessionExpired(String),

    // PAYLOAD ///////////////////////////////////////////////////////////////////////
    /// The payload did not match the digest the server sent with it
    #[error("payload failed its integrity check")]
    Integrity,
    /// The local source file for a PUT could not be read
    #[error("could not read {}", path.display())]
    FileRead {
        /// The file we tried to read
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Is this a problem with the user's request, detected before any network I/O?
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MultipleActions
                | Error::NoAction
                | Error::MissingDependency { .. }
                | Error::FieldTooLong { .. }
        )
    }

    /// Is this a problem with the connection itself?
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::ConnectionClosed { .. } | Error::Io(_))
    }
}
