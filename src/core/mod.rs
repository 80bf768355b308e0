//! Core infrastructure: shared foundation used across the whole crate.
//!
//! - **config**: configuration loading and resolved types.
//! - **error**: application-wide error enum.
//! - **json**: spaced-separator JSON text for hashes and CSV cells.
//! - **time**: UTC timestamp formatting and parsing.

pub mod config;
pub mod error;
pub mod json;
pub mod time;
