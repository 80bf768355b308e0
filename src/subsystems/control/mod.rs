//! Control plane: the controller that turns gate and layer readings into
//! actions, plus the two loops that drive it: an interactive stdin session
//! and an LLM self-refinement run.

pub mod plane;
pub mod refine;
pub mod session;

pub use plane::{ControlAction, ControlPlane, TurnReport};
pub use refine::{refine, write_trace, RefineOptions, TracePoint};
pub use session::{run_session, SessionSinks, SessionSummary};
