// (c) 2025 fxfer developers
//! # 📖 Configuration management
//!
//! fxfer obtains run-time configuration from the following sources, in order:
//! 1. Command-line options
//! 2. Environment variables, prefixed `FXFER_` (for example `FXFER_SERVER_PORT=4000`)
//! 3. The user's configuration file
//!    * On Linux, this is `~/.config/fxfer/fxfer.toml`
//!    * On macOS, this is `~/Library/Application Support/fxfer/fxfer.toml`
//!    * On Windows, this is `%AppData%\Roaming\fxfer\fxfer.toml`
//! 4. Hard-wired defaults
//!
//! Run `fxfer --config-files` for the file we read on this platform.
//!
//! Each option may appear in multiple places; the highest-priority source wins.
//!
//! ## File format
//!
//! The configuration file is [TOML](https://toml.io/). Keys are the field names of [Configuration]:
//!
//! ```toml
//! server_ip = "192.0.2.7"
//! server_port = 4000
//! time_format = "utc"
//! color = "never"
//! ```
//!
//! ## Configurable options
//!
//! The set of supported fields is the [Configuration] structure.
//!
//! * `fxfer --show-config` outputs the supported fields, their current values, and where each value came from.
//! * For an explanation of each field, refer to `fxfer --help` .

mod manager;
pub use manager::{ENV_PREFIX, Manager};

mod structure;
pub use structure::{Configuration, DEFAULT_SERVER_IP, DEFAULT_SERVER_PORT, PartialConfiguration};
