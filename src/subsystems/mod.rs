//! Subsystem modules for the Elyria control plane.
//!
//! Data flows store → gate → layer → control, with instrumentation watching
//! the gate after the fact and policy/reasoning reading what it recorded.

pub mod control;
pub mod covenant;
pub mod experiment;
pub mod gate;
pub mod instrumentation;
pub mod layer;
pub mod memory;
pub mod policy;
pub mod reasoning;
pub mod store;
pub mod themes;
