// (c) 2025 fxfer developers
//! 📖 The fxfer wire protocol
//!
//! The protocol runs over a single TCP connection. The client sends one request,
//! then waits for the complete response before sending anything else.
//! There is no pipelining and no multiplexing.
//!
//! All multi-byte integers are big-endian. All lengths are in bytes.
//!
//! # Request
//!
//! ```text
//!  0               1               2               3
//! +---------------+---------------+---------------+---------------+
//! |    OPCODE     |   SUB FLAG    |           RESERVED            |
//! +---------------+---------------+---------------+---------------+
//! |         USERNAME LEN          |         PASSWORD LEN          |
//! +---------------+---------------+---------------+---------------+
//! |                          SESSION ID                           |
//! +---------------+---------------+---------------+---------------+
//! |                    USERNAME  +  PASSWORD  ...                 |
//! +---------------+---------------+---------------+---------------+
//! |                       SUB PAYLOAD LEN (u64)                   |
//! +---------------+---------------+---------------+---------------+
//! |                         SUB PAYLOAD ...                       |
//! +---------------+---------------+---------------+---------------+
//! ```
//!
//! The sub payload depends on the [`Opcode`]:
//!
//! * `USER_OP`: sub flag (u8), permission (u8), other username length (u16), other username;
//!   then for `CREATE_USER` only, other password length (u16) and other password.
//! * `LOCAL_OP`: empty. The server only authenticates; the client then acts on its own disk.
//! * Everything else: destination path length (u16) and destination path.
//!   For `PUT`, the whole source file follows as a raw byte stream.
//!
//! # Response
//!
//! ```text
//! +---------------+---------------+-------------------------------+
//! |  RETURN CODE  |   RESERVED    |     SESSION ID (u32) ...      |
//! +---------------+---------------+-------------------------------+
//! |                     PAYLOAD LEN (u64) ...                     |
//! +---------------+-----------------------------------------------+
//! |  MESSAGE LEN  |  MESSAGE ...  [ DIGEST (32) ]  [ PAYLOAD ... ]
//! +---------------+-----------------------------------------------+
//! ```
//!
//! `PAYLOAD LEN` counts every byte after itself: the message length byte, the message,
//! and (if present) the digest and raw payload. A digest and payload are only read
//! when the return code is [`ReturnCode::SUCCESS`] and the length leaves room for them.
//!
//! The digest is the SHA-256 of the raw payload; see [`integrity`].
//!
//! # Sessions
//!
//! Every request carries the username and password, and the session id from the most
//! recent successful response (0 before the first one).
//! [`ReturnCode::SESSION_EXPIRED`] tells the client that its session id is no longer valid.

mod action;
pub use action::{Action, DependencyRule, Field, IntentKind, LocalOp, Opcode, Permission, SubFlag, UserOp};

pub mod common;
pub mod integrity;

mod request;
pub use request::{RequestDescriptor, Target};

mod response;
pub use response::{DIGEST_SIZE, ResponseHeader, ReturnCode, ServerResponse};

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod test_helpers;
