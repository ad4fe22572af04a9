//! Session manager: connection lifecycle and the authentication state machine
// (c) 2025 fxfer developers

use tokio::io::AsyncWriteExt as _;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info, warn};

use crate::Error;
use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};
use crate::protocol::{RequestDescriptor, ServerResponse};

/// Where a session stands with the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No successful response yet; requests carry session id 0
    #[default]
    Unauthenticated,
    /// The server has issued us this session id
    Authenticated(u32),
    /// The server rejected our session id. The caller must obtain fresh credentials.
    Expired,
}

impl SessionState {
    /// The session id to send with the next request
    #[must_use]
    pub fn session_id(self) -> u32 {
        match self {
            SessionState::Authenticated(id) => id,
            SessionState::Unauthenticated | SessionState::Expired => 0,
        }
    }
}

/// One connection to a server, and the session carried over it.
///
/// Requests are strictly sequential: [`Session::request`] sends one request and
/// waits for its complete response before returning.
#[derive(Debug)]
pub struct Session<S: SendingStream, R: ReceivingStream> {
    stream: SendReceivePair<S, R>,
    state: SessionState,
}

/// A session over TCP
pub type TcpSession = Session<OwnedWriteHalf, OwnedReadHalf>;

impl TcpSession {
    /// Opens a connection to the server. The session starts unauthenticated.
    pub async fn connect(host: &str, port: u16) -> Result<Self, Error> {
        let stream = TcpStream::connect((host, port)).await?;
        debug!("connected to {}", stream.peer_addr()?);
        let (recv, send) = stream.into_split();
        Ok(Self::new((send, recv).into()))
    }
}

impl<S: SendingStream, R: ReceivingStream> Session<S, R> {
    /// Wraps an established stream
    pub fn new(stream: SendReceivePair<S, R>) -> Self {
        Self {
            stream,
            state: SessionState::Unauthenticated,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The session id that will be sent with the next request
    #[must_use]
    pub fn session_id(&self) -> u32 {
        self.state.session_id()
    }

    /// Sends one request and reads its response.
    ///
    /// The descriptor is stamped with the current session id before it is encoded.
    /// A success response stores the session id it carries.
    /// A session-expired response moves us to [`SessionState::Expired`] and is
    /// returned as [`Error::SessionExpired`]. Any other response leaves the state alone.
    pub async fn request(
        &mut self,
        descriptor: RequestDescriptor,
    ) -> Result<ServerResponse, Error> {
        let descriptor = descriptor.with_session(self.session_id());
        debug!("request {:?}", descriptor);
        descriptor.send(&mut self.stream.send).await?;
        let response = ServerResponse::read_from(&mut self.stream.recv, descriptor).await?;

        let code = response.header.return_code;
        if code.is_success() {
            if !matches!(self.state, SessionState::Authenticated(_)) {
                info!("authenticated as {}", response.request.username);
            }
            self.state = SessionState::Authenticated(response.header.session_id);
        } else if code.is_session_expired() {
            warn!("session expired: {}", response.message());
            self.state = SessionState::Expired;
            return Err(Error::SessionExpired(response.message().to_owned()));
        } else {
            debug!("request failed: {code}: {}", response.message());
        }
        Ok(response)
    }

    /// Forgets an expired session so the next request authenticates from scratch
    pub fn reset(&mut self) {
        if self.state == SessionState::Expired {
            self.state = SessionState::Unauthenticated;
        }
    }

    /// Shuts down the sending side of the connection. The connection closes when this is dropped.
    pub async fn close(mut self) -> Result<(), Error> {
        self.stream.send.shutdown().await?;
        Ok(())
    }
}

/// Connects, sends a single request, reads its response and closes the connection.
///
/// The connection is closed whether or not the request succeeded.
pub async fn one_shot(descriptor: RequestDescriptor) -> Result<ServerResponse, Error> {
    let mut session = TcpSession::connect(&descriptor.host, descriptor.port).await?;
    let result = session.request(descriptor).await;
    if let Err(e) = session.close().await {
        debug!("closing connection: {e}");
    }
    result
}
