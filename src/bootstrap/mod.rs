//! Process bootstrap: pieces that run once before any command executes.

pub mod logger;
