//! Elyria coherence control plane.
//!
//! A local node store plus the controls that keep recursive LLM refinement
//! loops bounded: an entropy gate, a Kₜ/Rₜ coherence layer with
//! segmentation, and the read-only governance views built on their logs.

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod core;
pub mod llm;
pub mod subsystems;

pub use crate::core::{config, error};
