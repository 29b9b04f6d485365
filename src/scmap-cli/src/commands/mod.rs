//! Command handlers for scmap CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod block;
pub mod configure;
pub mod dump;
pub mod entity;
pub mod extract;
pub mod fourcc;
