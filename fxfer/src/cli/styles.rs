// (c) 2025 fxfer developers
//! CLI output styling
//!
//! This module provides styles for use with the `anstream` print macros, and also a `RESET`
//! constant to reset styling to the default.

use anstream::ColorChoice;
#[allow(clippy::enum_glob_use)]
use anstyle::AnsiColor::*;
use anstyle::Color::Ansi;
use clap::builder::styling::Styles;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal as _;

// RAW STYLE DEFINITIONS //////////////////////////////////////////////////////////////////

const _ERROR: anstyle::Style = anstyle::Style::new().bold().fg_color(Some(Ansi(Red)));

const _WARNING: anstyle::Style = anstyle::Style::new().bold().fg_color(Some(Ansi(Yellow)));

const _INFO: anstyle::Style = anstyle::Style::new().fg_color(Some(Ansi(Cyan)));

const _SUCCESS: anstyle::Style = anstyle::Style::new().fg_color(Some(Ansi(Green)));

const _HEADER: anstyle::Style = anstyle::Style::new()
    .underline()
    .fg_color(Some(Ansi(Yellow)));

/// Resets styling to default. This is a re-export of [`anstyle::Reset`].
pub use anstyle::Reset as RESET;

// COMPOSITE STYLES //////////////////////////////////////////////////////////////////////

pub(crate) const CLAP_STYLES: Styles = Styles::styled()
    .usage(_HEADER)
    .header(_HEADER)
    .literal(anstyle::Style::new().bold())
    .invalid(_WARNING)
    .error(_ERROR)
    .valid(_INFO.bold().underline())
    .placeholder(_INFO);

// CONDITIONAL STYLES ////////////////////////////////////////////////////////////////////

/// Wrap a constant in a function that returns the style if colours are enabled.
macro_rules! wrap {
    ($func:ident, $def:ident) => {
        #[allow(clippy::missing_const_for_fn)]
        #[must_use]
        /// Conditional styling accessor for
        #[doc = stringify!($func)]
        /// messages
        ///
        /// This function returns either an active [`anstyle::Style`], or
        /// (if colours are disabled) the empty Style.
        pub fn $func() -> anstyle::Style {
            if use_colours() {
                $def
            } else {
                anstyle::Style::new()
            }
        }
    };
}

wrap!(error, _ERROR);
wrap!(warning, _WARNING);
wrap!(info, _INFO);
wrap!(success, _SUCCESS);
wrap!(header, _HEADER);

// CONDITIONALITY ////////////////////////////////////////////////////////////////

/// Are we configured to use terminal colours?
#[must_use]
pub fn use_colours() -> bool {
    console::colors_enabled()
}

/// The available terminal colour modes
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "kebab-case")] // to match clap::ValueEnum
#[strum(serialize_all = "kebab-case")]
pub enum ColourMode {
    #[value(alias = "on", alias = "yes")]
    /// Forces colours on, whatever is happening
    /// (aliases: `on`, `yes`)
    Always,
    #[value(alias = "off", alias = "no", alias = "none")]
    /// (aliases: `off`, `no`, `none`)
    Never,
    /// Use colours only when writing to a terminal. This is the default behaviour.
    #[default]
    Auto,
}

/// Detect the desired colour mode from the environment variables
///
/// See [https://bixense.com/clicolors/](https://bixense.com/clicolors/) for more information.
pub(crate) fn autodetect_colour() -> bool {
    let clicolor_force = std::env::var("CLICOLOR_FORCE").unwrap_or_default();
    let no_color = std::env::var("NO_COLOR").unwrap_or_default();

    if !no_color.is_empty() {
        false
    } else if !clicolor_force.is_empty() {
        true
    } else {
        std::io::stdout().is_terminal()
    }
}

/// Set up the terminal colour mode.
///
/// `Auto` uses the quasi-standard `CLICOLOR_FORCE` and `NO_COLOR` environment variables to determine the mode.
pub fn configure_colours(mode: ColourMode) {
    let state = match mode {
        ColourMode::Always => true,
        ColourMode::Never => false,
        ColourMode::Auto => autodetect_colour(),
    };
    console::set_colors_enabled(state);
    console::set_colors_enabled_stderr(state);
    if state {
        ColorChoice::Always
    } else {
        ColorChoice::Never
    }
    .write_global();
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::{ColourMode, configure_colours, error, use_colours};
    use rusty_fork::rusty_fork_test;

    rusty_fork_test! {
        #[test]
        fn colour_switch() {
            // modifies global state, so runs in a fork
            configure_colours(ColourMode::Never);
            assert!(!use_colours());
            assert_eq!(error(), anstyle::Style::new());
            configure_colours(ColourMode::Always);
            assert!(use_colours());
            assert_ne!(error(), anstyle::Style::new());
        }
    }
}
