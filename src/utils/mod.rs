//! Utility functions module
//!
//! This module contains various utility functions including container name
//! validation, retry logic, value parsing, table formatting and prompts.

pub mod format;
pub mod interactive;
pub mod parse;
pub mod retry;
pub mod sanitizer;

pub use format::*;
pub use parse::*;
pub use retry::*;
pub use sanitizer::*;
