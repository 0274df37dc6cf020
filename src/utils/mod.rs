//! Shared helpers for the build stages and commands.

pub mod command;
pub mod date;
pub mod minify;
