//! Shared utilities for Tsunagi packages.

pub mod logger;
pub mod time;
