//! Shared utilities.
//!
//! Filesystem helpers used by the configuration store and project definition.

pub mod fs;
