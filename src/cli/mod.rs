//! CLI module for blobtier
//!
//! This module contains all command-line interface related functionality,
//! including command definitions, argument parsing, command execution and
//! report rendering.

pub mod commands;
pub mod report;

pub use commands::*;
