//! Authentication module for Azure Storage
//!
//! This module provides Azure AD credentials for storage accounts that are
//! addressed by account name rather than by connection string.

pub mod provider;

pub use provider::*;
