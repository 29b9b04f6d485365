//! CLI argument definitions for scmap
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod fourcc;

pub use self::core::{Cli, Commands, ExtractArgs};
pub use fourcc::FourccCommand;
