// (c) 2025 fxfer developers

#![allow(clippy::doc_markdown)]
//! `fxfer` is a client for a small authenticated binary file-transfer protocol.
//!
//! A single TCP connection carries requests (list, create, delete, put and get files;
//! create and delete users) and receives structured responses, some of which carry
//! an integrity-checked payload.
//!
//! ## 📖 Documentation
//!
//! * [About the wire protocol](protocol)
//! * [Configuring fxfer](config)
//!
//! ## Overview
//!
//! * One-shot mode: `fxfer -U alice --ls --dst /` connects, authenticates, performs the request and disconnects.
//! * Shell mode: `fxfer -U alice --shell` authenticates once and keeps the connection open for
//!   any number of commands, reauthenticating when the server reports that the session expired.
//!
//! Every request embeds the user's credentials and the current session id.
//! The server hands out a session id on the first successful response and may rotate it on any later one.
//!
//! #### What fxfer is not
//!
//! * A secure transport. Credentials and data travel in clear text.
//! * A server. Only the client side of the protocol lives here.
//!
//! ## Layout
//!
//! * [`protocol`] holds the action model, the request encoder, the response decoder and the integrity check.
//! * [`client`] resolves user intent into requests and manages the session lifecycle.
//! * [`config`] merges configuration files, environment and command line.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub(crate) mod cli;
pub use cli::cli as main;
pub use cli::styles;

pub mod client;
pub use client::{Intent, Parameters, Session, SessionState};

pub mod config;
pub use config::Configuration;

mod error;
pub use error::Error;

pub mod protocol;
pub mod util;
