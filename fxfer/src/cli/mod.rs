//! Command Line Interface for fxfer
// (c) 2025 fxfer developers
mod args;
mod cli_main;
pub mod styles;
pub use cli_main::cli;
