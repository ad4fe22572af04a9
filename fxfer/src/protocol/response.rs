//! Response header, server response and wire decoder
// (c) 2025 fxfer developers

use std::fmt::{self, Display};

use tracing::trace;

use super::action::Action;
use super::common::{ReceivingStream, read_u8, read_u32, read_u64, read_vec};
use super::request::RequestDescriptor;
use crate::Error;

/// Size of the payload digest (SHA-256)
pub const DIGEST_SIZE: usize = 32;

/// Size of the message length field, which `payload length` counts
const MSG_LEN_SIZE: u64 = 1;

/// Machine-readable outcome of a request, as sent by the server.
///
/// Values the client does not know are carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnCode(pub u8);

impl ReturnCode {
    /// The request succeeded. Only after this code may a digest and payload follow.
    pub const SUCCESS: Self = Self(1);
    /// The session id we sent is no longer valid; the user must authenticate again.
    pub const SESSION_EXPIRED: Self = Self(2);

    /// Did the request succeed?
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Has the session expired?
    #[must_use]
    pub fn is_session_expired(self) -> bool {
        self == Self::SESSION_EXPIRED
    }

    /// A short description of the code, if we know it
    #[must_use]
    pub fn description(self) -> Option<&'static str> {
        Some(match self.0 {
            1 => "success",
            2 => "session error",
            3 => "permission error",
            4 => "user exists",
            5 => "file exists",
            6 => "credential rule error",
            7 => "user authentication failed",
            8 => "directory not empty",
            9 => "path could not be resolved",
            10 => "path is not a directory",
            11 => "path is not a file",
            12 => "directory exists",
            13 => "socket closed",
            254 => "I/O error",
            255 => "failure",
            _ => return None,
        })
    }
}

impl Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(d) => write!(f, "{d}"),
            None => write!(f, "unknown return code {}", self.0),
        }
    }
}

/// The fixed part of every response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Outcome of the request
    pub return_code: ReturnCode,
    /// Unused
    pub reserved: u8,
    /// The session id the server wants us to use from now on
    pub session_id: u32,
    /// Number of bytes following this field: message length byte, message, digest and payload
    pub payload_len: u64,
    /// Length of the message in bytes
    pub message_len: u8,
    /// Human-readable message
    pub message: String,
}

impl ResponseHeader {
    /// Reads a header from the stream, field by field.
    ///
    /// Each field is read in full even if it arrives in fragments.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self, Error>
    where
        R: ReceivingStream,
    {
        let return_code = ReturnCode(read_u8(reader, "return code").await?);
        let reserved = read_u8(reader, "reserved").await?;
        let session_id = read_u32(reader, "session id").await?;
        let payload_len = read_u64(reader, "payload length").await?;
        let message_len = read_u8(reader, "message length").await?;
        let message = read_vec(reader, u64::from(message_len), "message").await?;
        Ok(Self {
            return_code,
            reserved,
            session_id,
            payload_len,
            message_len,
            message: String::from_utf8_lossy(&message).into_owned(),
        })
    }

    /// How many raw payload bytes follow the digest, if any.
    ///
    /// `None` if the payload length leaves no room for a payload beyond the message and digest.
    #[must_use]
    pub fn trailing_payload_len(&self) -> Option<u64> {
        self.payload_len
            .checked_sub(u64::from(self.message_len) + MSG_LEN_SIZE + DIGEST_SIZE as u64)
            .filter(|remaining| *remaining > 0)
    }
}

/// A complete decoded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResponse {
    /// The request this responds to
    pub request: RequestDescriptor,
    /// The header fields
    pub header: ResponseHeader,
    /// Digest of the payload, if there was one
    pub digest: Option<[u8; DIGEST_SIZE]>,
    /// Raw payload bytes, if there were any
    pub payload: Option<Vec<u8>>,
}

impl ServerResponse {
    /// Reads a complete response to `request` from the stream.
    ///
    /// A digest and payload are only read after a success return code,
    /// and only when the payload length leaves room for them.
    pub async fn read_from<R>(reader: &mut R, request: RequestDescriptor) -> Result<Self, Error>
    where
        R: ReceivingStream,
    {
        let header = ResponseHeader::read_from(reader).await?;
        trace!(
            "response: {} session={} payload_len={} message={:?}",
            header.return_code, header.session_id, header.payload_len, header.message
        );
        let (digest, payload) = match header.trailing_payload_len() {
            Some(remaining) if header.return_code.is_success() => {
                let mut digest = [0u8; DIGEST_SIZE];
                super::common::read_field(reader, &mut digest, "digest").await?;
                let payload = read_vec(reader, remaining, "payload").await?;
                (Some(digest), Some(payload))
            }
            _ => (None, None),
        };
        Ok(Self {
            request,
            header,
            digest,
            payload,
        })
    }

    /// Did the request succeed?
    #[must_use]
    pub fn successful(&self) -> bool {
        self.header.return_code.is_success()
    }

    /// The server's message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.header.message
    }

    /// The action this response answers.
    ///
    /// The server echoes only a return code, so this comes from the originating request.
    #[must_use]
    pub fn action(&self) -> Action {
        self.request.action
    }
}

impl Display for ServerResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header.message)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::{ResponseHeader, ReturnCode, ServerResponse};
    use crate::protocol::test_helpers::encode_response;
    use crate::protocol::{Action, RequestDescriptor, Target};
    use assertables::assert_contains;
    use pretty_assertions::assert_eq;
    use tokio_test::io::Builder;

    fn request(action: Action) -> RequestDescriptor {
        RequestDescriptor::new(&Target::new("localhost", 1, "alice"), action)
    }

    #[tokio::test]
    async fn header_one_byte_at_a_time() {
        let wire = encode_response(ReturnCode::SUCCESS, 0xdead_beef, "welcome", None);
        let mut builder = Builder::new();
        for b in &wire {
            let _ = builder.read(std::slice::from_ref(b));
        }
        let mut mock = builder.build();
        let header = ResponseHeader::read_from(&mut mock).await.unwrap();
        assert_eq!(
            header,
            ResponseHeader {
                return_code: ReturnCode::SUCCESS,
                reserved: 0,
                session_id: 0xdead_beef,
                payload_len: 8,
                message_len: 7,
                message: "welcome".into(),
            }
        );
        assert_eq!(header.trailing_payload_len(), None);
    }

    #[tokio::test]
    async fn success_with_payload() {
        let wire = encode_response(ReturnCode::SUCCESS, 5, "ok", Some(b"[F]:5:hello\n"));
        let mut mock = Builder::new().read(&wire).build();
        let resp = ServerResponse::read_from(&mut mock, request(Action::List))
            .await
            .unwrap();
        assert!(resp.successful());
        assert_eq!(resp.message(), "ok");
        assert_eq!(resp.payload.as_deref(), Some(&b"[F]:5:hello\n"[..]));
        assert!(resp.digest.is_some());
        assert_eq!(resp.action(), Action::List);
    }

    #[tokio::test]
    async fn failure_reads_no_payload() {
        // Bytes after a failure header would belong to the next response; we must not consume them.
        let mut wire = encode_response(ReturnCode(3), 0, "permission error", None);
        wire[6..14].copy_from_slice(&100u64.to_be_bytes());
        let mut mock = Builder::new().read(&wire).build();
        let resp = ServerResponse::read_from(&mut mock, request(Action::Get))
            .await
            .unwrap();
        assert!(!resp.successful());
        assert_eq!(resp.digest, None);
        assert_eq!(resp.payload, None);
    }

    #[tokio::test]
    async fn short_payload_length_means_no_payload() {
        let mut wire = encode_response(ReturnCode::SUCCESS, 1, "made it", None);
        // claim a payload length smaller than message + digest
        wire[6..14].copy_from_slice(&20u64.to_be_bytes());
        let mut mock = Builder::new().read(&wire).build();
        let resp = ServerResponse::read_from(&mut mock, request(Action::MakeDir))
            .await
            .unwrap();
        assert_eq!(resp.payload, None);
    }

    #[tokio::test]
    async fn closed_during_payload() {
        let wire = encode_response(ReturnCode::SUCCESS, 1, "m", Some(b"0123456789"));
        let mut mock = Builder::new().read(&wire[..wire.len() - 3]).build();
        let err = ServerResponse::read_from(&mut mock, request(Action::Get))
            .await
            .unwrap_err();
        assert!(err.is_transport(), "{err:?}");
    }

    #[tokio::test]
    async fn closed_during_header() {
        let mut mock = Builder::new().read(&[1, 0, 0]).build();
        let err = ResponseHeader::read_from(&mut mock).await.unwrap_err();
        assert_contains!(err.to_string(), "session id");
    }

    #[test]
    fn return_code_display() {
        assert_eq!(ReturnCode::SUCCESS.to_string(), "success");
        assert_eq!(ReturnCode(12).to_string(), "directory exists");
        assert_eq!(ReturnCode(99).to_string(), "unknown return code 99");
        assert!(ReturnCode(2).is_session_expired());
    }
}
