//! Client side: turning what the user asked for into requests, and acting on the responses
// (c) 2025 fxfer developers

mod options;
pub use options::Parameters;

mod intent;
pub use intent::Intent;

mod session;
pub use session::{Session, SessionState, TcpSession, one_shot};

mod dispatch;
pub use dispatch::handle_response;

pub mod listing;
pub mod local;

pub(crate) mod interrupt;
pub(crate) mod prompt;
pub(crate) mod shell;

mod main_loop;
#[allow(clippy::module_name_repetitions)]
pub use main_loop::client_main;
