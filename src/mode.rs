//! Which search the engine is currently running on our behalf.
//!
//! Every `go` is answered by exactly one `bestmove`, in order. The tracker
//! keeps one [`Generation`] per `go` that has not been answered yet; output is
//! attributed to the oldest of them, so lines from a superseded search can be
//! told apart from the current one even when both share a base position.

use std::collections::VecDeque;

use chess::{GamePosition, MoveDescriptor};
use engine::GoParams;
use serde::Serialize;

use crate::error::SessionError;

pub const PRIMARY_LINES: usize = 3;
pub const PRIMARY_DEPTH: u32 = 18;
pub const PROBE_LINES: usize = 2;
pub const PROBE_MOVETIME_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModeKind {
    Idle,
    PrimaryAnalysis,
    ResponseProbe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisMode {
    Idle,
    PrimaryAnalysis {
        base: GamePosition,
        generation: Generation,
    },
    ResponseProbe {
        base: GamePosition,
        preceding: MoveDescriptor,
        generation: Generation,
    },
}

impl AnalysisMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            AnalysisMode::Idle => ModeKind::Idle,
            AnalysisMode::PrimaryAnalysis { .. } => ModeKind::PrimaryAnalysis,
            AnalysisMode::ResponseProbe { .. } => ModeKind::ResponseProbe,
        }
    }

    pub fn base(&self) -> Option<&GamePosition> {
        match self {
            AnalysisMode::Idle => None,
            AnalysisMode::PrimaryAnalysis { base, .. } | AnalysisMode::ResponseProbe { base, .. } => Some(base),
        }
    }

    pub fn generation(&self) -> Option<Generation> {
        match self {
            AnalysisMode::Idle => None,
            AnalysisMode::PrimaryAnalysis { generation, .. }
            | AnalysisMode::ResponseProbe { generation, .. } => Some(*generation),
        }
    }

    pub fn line_cap(&self) -> usize {
        match self {
            AnalysisMode::ResponseProbe { .. } => PROBE_LINES,
            _ => PRIMARY_LINES,
        }
    }
}

/// Commands that start the search for one accepted request, in send order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub generation: Generation,
    /// The previous search has not answered yet and should be stopped first.
    pub supersedes: bool,
    pub commands: Vec<String>,
}

#[derive(Debug)]
pub struct ModeTracker {
    mode: AnalysisMode,
    next_generation: u64,
    in_flight: VecDeque<Generation>,
}

impl Default for ModeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeTracker {
    pub fn new() -> Self {
        Self {
            mode: AnalysisMode::Idle,
            next_generation: 1,
            in_flight: VecDeque::new(),
        }
    }

    pub fn mode(&self) -> &AnalysisMode {
        &self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == AnalysisMode::Idle
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Allowed from `Idle`, and as a restart while a primary analysis runs.
    pub fn begin_primary(&mut self, base: GamePosition) -> Result<SearchRequest, SessionError> {
        if let AnalysisMode::ResponseProbe { .. } = self.mode {
            return Err(SessionError::ModeBusy {
                requested: ModeKind::PrimaryAnalysis,
                active: ModeKind::ResponseProbe,
            });
        }

        let generation = self.allocate();
        let commands = vec![
            engine::position_command(base.fen()),
            engine::multipv_command(PRIMARY_LINES as u32),
            GoParams::depth(PRIMARY_DEPTH).to_command(),
        ];
        self.mode = AnalysisMode::PrimaryAnalysis { base, generation };
        Ok(self.enqueue(generation, commands))
    }

    /// Only allowed from `Idle`.
    pub fn begin_probe(&mut self, base: GamePosition, preceding: MoveDescriptor) -> Result<SearchRequest, SessionError> {
        if !self.is_idle() {
            return Err(SessionError::ModeBusy {
                requested: ModeKind::ResponseProbe,
                active: self.mode.kind(),
            });
        }

        let generation = self.allocate();
        let commands = vec![
            engine::position_command(base.fen()),
            engine::multipv_command(PROBE_LINES as u32),
            GoParams::movetime(PROBE_MOVETIME_MS).to_command(),
        ];
        self.mode = AnalysisMode::ResponseProbe { base, preceding, generation };
        Ok(self.enqueue(generation, commands))
    }

    /// True when engine output arriving now belongs to the active request.
    pub fn accepts_output(&self) -> bool {
        match (self.mode.generation(), self.in_flight.front()) {
            (Some(current), Some(oldest)) => current == *oldest,
            _ => false,
        }
    }

    /// Handles a `bestmove`. Returns the mode that just finished, or `None`
    /// when the answer belonged to a superseded search (or nothing was running).
    pub fn finish_search(&mut self) -> Option<AnalysisMode> {
        let finished = match self.in_flight.pop_front() {
            Some(generation) => generation,
            None => {
                log::warn!("bestmove without a pending search");
                return None;
            }
        };

        if self.mode.generation() == Some(finished) {
            Some(std::mem::replace(&mut self.mode, AnalysisMode::Idle))
        } else {
            log::debug!("Drained bestmove of superseded search {:?}", finished);
            None
        }
    }

    /// Forget everything; used when the engine goes away.
    pub fn reset(&mut self) {
        self.mode = AnalysisMode::Idle;
        self.in_flight.clear();
    }

    fn allocate(&mut self) -> Generation {
        let generation = Generation(self.next_generation);
        self.next_generation += 1;
        generation
    }

    fn enqueue(&mut self, generation: Generation, commands: Vec<String>) -> SearchRequest {
        let supersedes = !self.in_flight.is_empty();
        self.in_flight.push_back(generation);
        SearchRequest { generation, supersedes, commands }
    }
}
