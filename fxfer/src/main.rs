//! fxfer utility - main entrypoint
// (c) 2025 fxfer developers

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::process::ExitCode;

#[cfg_attr(coverage_nightly, coverage(off))]
fn main() -> ExitCode {
    fxfer::main(std::env::args_os())
}
