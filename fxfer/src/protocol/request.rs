//! Request descriptor and wire encoder
// (c) 2025 fxfer developers

use std::fmt;
use std::path::PathBuf;

use bytes::{BufMut as _, BytesMut};
use tokio::io::AsyncWriteExt as _;
use tracing::trace;

use super::action::{Action, Permission, UserOp};
use super::common::SendingStream;
use crate::Error;

/// Where to connect, and as whom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Server address
    pub host: String,
    /// Server port
    pub port: u16,
    /// User to log in as
    pub username: String,
}

impl Target {
    /// Convenience constructor
    #[must_use]
    pub fn new(host: &str, port: u16, username: &str) -> Self {
        Self {
            host: host.to_owned(),
            port,
            username: username.to_owned(),
        }
    }
}

/// A fully resolved request, ready to encode.
///
/// A descriptor is built once per command by [`Intent::resolve`](crate::Intent::resolve),
/// has its credentials and session id filled in, and is then consumed by sending it.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Server address
    pub host: String,
    /// Server port
    pub port: u16,
    /// User to authenticate as
    pub username: String,
    /// That user's password
    pub password: String,
    /// The user being created or deleted (user management only)
    pub other_username: Option<String>,
    /// The password for a user being created
    pub other_password: Option<String>,
    /// Local path
    pub src: Option<PathBuf>,
    /// Remote path
    pub dst: Option<String>,
    /// Permission for a user being created
    pub permission: Permission,
    /// Session id; 0 when not authenticated
    pub session_id: u32,
    /// What to do
    pub action: Action,
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("other_username", &self.other_username)
            .field("src", &self.src)
            .field("dst", &self.dst)
            .field("permission", &self.permission)
            .field("session_id", &self.session_id)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

/// Size of the fixed part of the request header
const FIXED_HEADER_SIZE: usize = 12;

impl RequestDescriptor {
    /// Creates a descriptor for `action` against `target`, with no credentials or paths yet
    #[must_use]
    pub fn new(target: &Target, action: Action) -> Self {
        Self {
            host: target.host.clone(),
            port: target.port,
            username: target.username.clone(),
            password: String::new(),
            other_username: None,
            other_password: None,
            src: None,
            dst: None,
            permission: Permission::default(),
            session_id: 0,
            action,
        }
    }

    /// Sets the password of the user making the request
    #[must_use]
    pub fn with_password(mut self, password: String) -> Self {
        self.password = password;
        self
    }

    /// Sets the password of the user being created
    #[must_use]
    pub fn with_other_password(mut self, password: String) -> Self {
        self.other_password = Some(password);
        self
    }

    /// Sets the session id to send
    #[must_use]
    pub fn with_session(mut self, session_id: u32) -> Self {
        self.session_id = session_id;
        self
    }

    /// Does this request need a second password (for a user being created)?
    #[must_use]
    pub fn requires_other_password(&self) -> bool {
        self.action == Action::User(UserOp::Create)
    }

    /// Serializes this request into its wire form.
    ///
    /// For `PUT` the source file is read in full first; if it cannot be read,
    /// this fails with [`Error::FileRead`] and nothing has been produced to send.
    pub async fn encode(&self) -> Result<BytesMut, Error> {
        let sub_payload = self.sub_payload().await?;
        let username = wire_len(&self.username, "username")?;
        let password = wire_len(&self.password, "password")?;

        let mut buf = BytesMut::with_capacity(
            FIXED_HEADER_SIZE + self.username.len() + self.password.len() + 8 + sub_payload.len(),
        );
        buf.put_u8(self.action.opcode() as u8);
        buf.put_u8(self.action.sub_flag() as u8);
        buf.put_u16(0); // reserved
        buf.put_u16(username);
        buf.put_u16(password);
        buf.put_u32(self.session_id);
        buf.put_slice(self.username.as_bytes());
        buf.put_slice(self.password.as_bytes());
        buf.put_u64(sub_payload.len() as u64);
        buf.put_slice(&sub_payload);
        Ok(buf)
    }

    async fn sub_payload(&self) -> Result<BytesMut, Error> {
        let mut sub = BytesMut::new();
        match self.action {
            Action::User(op) => {
                let other = self.other_username.as_deref().unwrap_or_default();
                sub.put_u8(self.action.sub_flag() as u8);
                sub.put_u8(self.permission as u8);
                sub.put_u16(wire_len(other, "other username")?);
                sub.put_slice(other.as_bytes());
                if op == UserOp::Create {
                    let other_password = self.other_password.as_deref().unwrap_or_default();
                    sub.put_u16(wire_len(other_password, "other password")?);
                    sub.put_slice(other_password.as_bytes());
                }
            }
            Action::Local(_) | Action::Shell => (),
            Action::Delete | Action::List | Action::Get | Action::MakeDir | Action::Put => {
                let dst = self.dst.as_deref().unwrap_or_default();
                sub.put_u16(wire_len(dst, "destination path")?);
                sub.put_slice(dst.as_bytes());
                if self.action == Action::Put {
                    let path = self.src.clone().unwrap_or_default();
                    let contents =
                        tokio::fs::read(&path)
                            .await
                            .map_err(|source| Error::FileRead {
                                path: path.clone(),
                                source,
                            })?;
                    sub.put_slice(&contents);
                }
            }
        }
        Ok(sub)
    }

    /// Encodes this request and writes it to `stream`.
    ///
    /// The request is fully encoded before the first byte is written.
    pub async fn send<S>(&self, stream: &mut S) -> Result<(), Error>
    where
        S: SendingStream,
    {
        let wire = self.encode().await?;
        trace!(
            "sending {} ({} bytes): {}",
            self.action.opcode(),
            wire.len(),
            hex::encode(&wire[..wire.len().min(64)])
        );
        stream.write_all(&wire).await?;
        stream.flush().await?;
        Ok(())
    }
}

/// Checks that a string fits its 16-bit length prefix
fn wire_len(s: &str, field: &'static str) -> Result<u16, Error> {
    u16::try_from(s.len()).map_err(|_| Error::FieldTooLong {
        field,
        len: s.len(),
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::{RequestDescriptor, Target};
    use crate::Error;
    use crate::protocol::test_helpers::{WireRequest, user_sub_payload};
    use crate::protocol::{Action, LocalOp, Opcode, Permission, SubFlag, UserOp};
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    fn target() -> Target {
        Target::new("127.0.0.1", 31337, "alice")
    }

    #[tokio::test]
    async fn header_layout() {
        let mut req = RequestDescriptor::new(&target(), Action::List)
            .with_password("secret".into())
            .with_session(0x0102_0304);
        req.dst = Some("/a".into());
        let wire = req.encode().await.unwrap();
        #[rustfmt::skip]
        let expected: &[u8] = &[
            3, 0, 0, 0,             // opcode, sub flag, reserved
            0, 5, 0, 6,             // username len, password len
            1, 2, 3, 4,             // session id
            b'a', b'l', b'i', b'c', b'e',
            b's', b'e', b'c', b'r', b'e', b't',
            0, 0, 0, 0, 0, 0, 0, 4, // sub payload len
            0, 2, b'/', b'a',       // path len, path
        ];
        assert_eq!(&wire[..], expected);
    }

    #[tokio::test]
    async fn round_trip_create_user() {
        let mut req = RequestDescriptor::new(&target(), Action::User(UserOp::Create))
            .with_password("hunter22".into())
            .with_other_password("bobspassword".into())
            .with_session(77);
        req.other_username = Some("bob".into());
        req.permission = Permission::ReadWrite;

        let wire = req.encode().await.unwrap();
        let decoded = WireRequest::parse(&wire).unwrap();
        assert_eq!(decoded.opcode, Opcode::UserOp as u8);
        assert_eq!(decoded.sub_flag, SubFlag::CreateUser as u8);
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.password, "hunter22");
        assert_eq!(decoded.session_id, 77);

        let user = user_sub_payload(&decoded.sub_payload).unwrap();
        assert_eq!(user.sub_flag, SubFlag::CreateUser as u8);
        assert_eq!(user.permission, Permission::ReadWrite as u8);
        assert_eq!(user.username, "bob");
        assert_eq!(user.password.as_deref(), Some("bobspassword"));
    }

    #[tokio::test]
    async fn delete_user_has_no_password() {
        let mut req = RequestDescriptor::new(&target(), Action::User(UserOp::Delete))
            .with_password("hunter22".into());
        req.other_username = Some("bob".into());
        let wire = req.encode().await.unwrap();
        let decoded = WireRequest::parse(&wire).unwrap();
        let user = user_sub_payload(&decoded.sub_payload).unwrap();
        assert_eq!(user.sub_flag, SubFlag::DeleteUser as u8);
        assert_eq!(user.username, "bob");
        assert_eq!(user.password, None);
    }

    #[tokio::test]
    async fn local_op_is_authentication_only() {
        let mut req = RequestDescriptor::new(&target(), Action::Local(LocalOp::MakeDir))
            .with_password("pw".into());
        req.src = Some("/tmp/newdir".into());
        let wire = req.encode().await.unwrap();
        let decoded = WireRequest::parse(&wire).unwrap();
        assert_eq!(decoded.opcode, Opcode::LocalOp as u8);
        assert_eq!(decoded.sub_flag, SubFlag::LocalMakeDir as u8);
        assert!(decoded.sub_payload.is_empty());
        // the sub payload length field is present and zero
        assert_eq!(&wire[wire.len() - 8..], &[0u8; 8]);
    }

    #[tokio::test]
    async fn put_appends_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"file body").unwrap();
        let mut req = RequestDescriptor::new(&target(), Action::Put).with_password("pw".into());
        req.src = Some(file.path().to_path_buf());
        req.dst = Some("up.txt".into());

        let wire = req.encode().await.unwrap();
        let decoded = WireRequest::parse(&wire).unwrap();
        assert_eq!(decoded.opcode, Opcode::Put as u8);
        // path len + path + file bytes
        assert_eq!(decoded.sub_payload.len(), 2 + 6 + 9);
        assert_eq!(&decoded.sub_payload[..2], &[0, 6]);
        assert_eq!(&decoded.sub_payload[2..8], b"up.txt");
        assert_eq!(&decoded.sub_payload[8..], b"file body");
    }

    #[tokio::test]
    async fn put_unreadable_source() {
        let mut req = RequestDescriptor::new(&target(), Action::Put);
        req.src = Some("/this/file/does/not/exist".into());
        req.dst = Some("x".into());
        let err = req.encode().await.unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn over_long_field() {
        let mut req = RequestDescriptor::new(&target(), Action::Delete);
        req.dst = Some("x".repeat(70_000));
        let err = req.encode().await.unwrap_err();
        assert!(err.is_validation(), "{err:?}");
    }

    #[test]
    fn debug_hides_passwords() {
        let req = RequestDescriptor::new(&target(), Action::Shell)
            .with_password("topsecret".into())
            .with_other_password("alsosecret".into());
        let s = format!("{req:?}");
        assert!(!s.contains("topsecret"));
        assert!(!s.contains("alsosecret"));
        assert!(s.contains("alice"));
    }

    #[tokio::test]
    async fn send_writes_whole_request() {
        let req = RequestDescriptor::new(&target(), Action::Shell).with_password("pw".into());
        let expected = req.encode().await.unwrap();
        let mut mock = tokio_test::io::Builder::new().write(&expected).build();
        req.send(&mut mock).await.unwrap();
    }
}
