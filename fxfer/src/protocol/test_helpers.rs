//! Test helpers for functions dealing with the wire protocol
// (c) 2025 fxfer developers

use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};
use crate::protocol::{ReturnCode, integrity};

use anyhow::{Context as _, Result, ensure};
use bytes::{Buf as _, BufMut as _};
use tokio::io::{
    AsyncReadExt as _, AsyncWriteExt as _, ReadHalf, SimplexStream, WriteHalf, simplex,
};

pub(crate) type TestStreamPair = SendReceivePair<WriteHalf<SimplexStream>, ReadHalf<SimplexStream>>;

impl SendingStream for WriteHalf<SimplexStream> {}
impl ReceivingStream for ReadHalf<SimplexStream> {}

const STREAM_BUFFER_SIZE: usize = 4_096;

/// In order to test a streaming function we need a bi-directional stream.
/// A pipe isn't useful by itself, as it returns
/// a writer which the corresponding reader accesses.
/// We need two such pipes; each side of the function under test takes one
/// such reader and the _opposite_ writer.
pub(crate) fn new_test_plumbing() -> (TestStreamPair, TestStreamPair) {
    let p1 = simplex(STREAM_BUFFER_SIZE);
    let p2 = simplex(STREAM_BUFFER_SIZE);
    let r1 = (p1.1, p2.0).into();
    let r2 = (p2.1, p1.0).into();
    (r1, r2)
}

/// A request as seen by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WireRequest {
    pub(crate) opcode: u8,
    pub(crate) sub_flag: u8,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) session_id: u32,
    pub(crate) sub_payload: Vec<u8>,
}

fn take_string(buf: &mut &[u8], len: usize) -> Result<String> {
    ensure!(buf.len() >= len, "short string");
    let s = String::from_utf8(buf[..len].to_vec())?;
    buf.advance(len);
    Ok(s)
}

impl WireRequest {
    /// Decodes a complete request
    pub(crate) fn parse(mut buf: &[u8]) -> Result<Self> {
        ensure!(buf.len() >= 12, "short header");
        let opcode = buf.get_u8();
        let sub_flag = buf.get_u8();
        let _reserved = buf.get_u16();
        let username_len = usize::from(buf.get_u16());
        let password_len = usize::from(buf.get_u16());
        let session_id = buf.get_u32();
        let username = take_string(&mut buf, username_len)?;
        let password = take_string(&mut buf, password_len)?;
        ensure!(buf.len() >= 8, "short sub payload length");
        let len = usize::try_from(buf.get_u64())?;
        ensure!(buf.len() == len, "sub payload length mismatch");
        Ok(Self {
            opcode,
            sub_flag,
            username,
            password,
            session_id,
            sub_payload: buf.to_vec(),
        })
    }

    /// Reads one complete request from a stream, as a server would
    pub(crate) async fn read_from<R: ReceivingStream>(reader: &mut R) -> Result<Self> {
        let mut wire = vec![0u8; 12];
        let _ = reader.read_exact(&mut wire).await.context("header")?;
        let username_len = usize::from(u16::from_be_bytes([wire[4], wire[5]]));
        let password_len = usize::from(u16::from_be_bytes([wire[6], wire[7]]));
        let mut creds = vec![0u8; username_len + password_len];
        let _ = reader.read_exact(&mut creds).await?;
        wire.extend_from_slice(&creds);
        let len = reader.read_u64().await?;
        wire.put_u64(len);
        let mut sub = vec![0u8; usize::try_from(len)?];
        let _ = reader.read_exact(&mut sub).await?;
        wire.extend_from_slice(&sub);
        Self::parse(&wire)
    }
}

/// The user-management sub payload, as seen by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UserSubPayload {
    pub(crate) sub_flag: u8,
    pub(crate) permission: u8,
    pub(crate) username: String,
    pub(crate) password: Option<String>,
}

pub(crate) fn user_sub_payload(mut buf: &[u8]) -> Result<UserSubPayload> {
    ensure!(buf.len() >= 4, "short user payload");
    let sub_flag = buf.get_u8();
    let permission = buf.get_u8();
    let len = usize::from(buf.get_u16());
    let username = take_string(&mut buf, len)?;
    let password = if buf.is_empty() {
        None
    } else {
        ensure!(buf.len() >= 2, "short password length");
        let len = usize::from(buf.get_u16());
        Some(take_string(&mut buf, len)?)
    };
    Ok(UserSubPayload {
        sub_flag,
        permission,
        username,
        password,
    })
}

/// Builds the wire form of a response, with a digest if there is a payload
pub(crate) fn encode_response(
    code: ReturnCode,
    session_id: u32,
    message: &str,
    payload: Option<&[u8]>,
) -> Vec<u8> {
    let msg_len = u8::try_from(message.len()).expect("test message too long");
    let extra = payload.map_or(0, |p| 32 + p.len());
    let mut wire = Vec::new();
    wire.put_u8(code.0);
    wire.put_u8(0);
    wire.put_u32(session_id);
    wire.put_u64((1 + message.len() + extra) as u64);
    wire.put_u8(msg_len);
    wire.put_slice(message.as_bytes());
    if let Some(p) = payload {
        wire.put_slice(&integrity::digest(p));
        wire.put_slice(p);
    }
    wire
}

/// Writes a response to a stream, as a server would
pub(crate) async fn respond<S: SendingStream>(
    writer: &mut S,
    code: ReturnCode,
    session_id: u32,
    message: &str,
    payload: Option<&[u8]>,
) -> Result<()> {
    writer
        .write_all(&encode_response(code, session_id, message, payload))
        .await?;
    writer.flush().await?;
    Ok(())
}
