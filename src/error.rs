use chess::RulesError;
use engine::EngineError;
use thiserror::Error;

use crate::mode::ModeKind;

/// Failures inside the coordinator. None of these reach the presentation
/// layer as errors; they end up in status text or the log.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),
    #[error("Engine is not ready")]
    NotReady,
    #[error("Cannot start {requested:?} while {active:?} is running")]
    ModeBusy { requested: ModeKind, active: ModeKind },
}
