//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Confirmation prompts
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All terminal output and prompts of the command line go through this
//! module so quiet mode and non-interactive use behave the same everywhere.
//! Library code logs through `tracing` instead.

pub mod output;
pub mod prompts;
