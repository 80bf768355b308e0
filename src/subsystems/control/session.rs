//! Interactive session: one control step per stdin line.

use std::io::Write;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::error::AppError;
use crate::subsystems::instrumentation::ObservationLog;
use crate::subsystems::store::{Node, NodeStore};

use super::plane::{ControlAction, ControlPlane, TurnReport};

pub const TURN_KIND: &str = "turn";

/// Where each session turn is recorded.
#[derive(Debug, Clone)]
pub struct SessionSinks {
    pub store: NodeStore,
    pub log: ObservationLog,
}

impl SessionSinks {
    fn record(&self, text: &str, report: &TurnReport) -> Result<(), AppError> {
        let mut node = Node::new(TURN_KIND, text);
        let m = &report.metrics;
        node.meta.insert("turn".into(), json!(m.turn));
        node.meta.insert("K_t".into(), json!(m.k_t));
        node.meta.insert("R_t".into(), json!(m.r_t));
        node.meta.insert("action".into(), json!(report.action.label()));
        node.meta.insert("trace_hash".into(), json!(m.trace_hash));
        self.store.append(node)?;
        self.log.append(&report.observation())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns: usize,
    pub stabilizations: usize,
    pub segments: usize,
    /// Segment seeds still unexpired when the session ended.
    pub seeds_held: usize,
}

/// Read lines until EOF or `shutdown`, printing one status line per turn.
pub async fn run_session<R, W>(
    plane: &mut ControlPlane,
    input: R,
    out: &mut W,
    sinks: &SessionSinks,
    shutdown: CancellationToken,
) -> Result<SessionSummary, AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut summary = SessionSummary::default();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("session interrupted");
                break;
            }

            line = lines.next_line() => {
                let text = match line {
                    Ok(Some(l)) => l,
                    Ok(None) => {
                        info!("session input closed");
                        break;
                    }
                    Err(e) => {
                        warn!("session read error: {e}");
                        break;
                    }
                };
                if text.trim().is_empty() {
                    continue;
                }

                let report = plane.observe(&text)?;
                sinks.record(&text, &report)?;
                writeln!(out, "{}", report.status_line())?;

                summary.turns += 1;
                match report.action {
                    ControlAction::Stabilize { .. } => summary.stabilizations += 1,
                    ControlAction::Segment(_) => summary.segments += 1,
                    ControlAction::Continue => {}
                }
            }
        }
    }

    summary.seeds_held = plane.remembered_seeds().len();
    info!(turns = summary.turns, segments = summary.segments, seeds_held = summary.seeds_held, "session ended");
    Ok(summary)
}
