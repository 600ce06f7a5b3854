use chess::{uci_line_to_san, GamePosition, MoveSpec};
use engine::Score;
use serde::Serialize;

/// One ranked engine line, tied to the position it was searched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvLine {
    pub rank: u32,
    pub score: Score,
    pub moves: Vec<String>,
    pub base: GamePosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PvDisplay {
    pub rank: u32,
    pub score: String,
    pub san: String,
}

impl PvLine {
    pub fn display(&self) -> PvDisplay {
        PvDisplay {
            rank: self.rank,
            score: self.score.to_string(),
            san: uci_line_to_san(&self.base, &self.moves).to_string(),
        }
    }
}

/// Lines keyed by rank, sorted ascending, never more than `cap`.
#[derive(Debug, Clone)]
pub struct PvSet {
    cap: usize,
    lines: Vec<PvLine>,
}

impl PvSet {
    pub fn with_cap(cap: usize) -> Self {
        Self { cap, lines: Vec::with_capacity(cap) }
    }

    pub fn lines(&self) -> &[PvLine] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&PvLine> {
        self.lines.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Returns true when the set changed.
    pub fn upsert(&mut self, line: PvLine) -> bool {
        if line.rank == 0 || line.rank as usize > self.cap {
            log::debug!("Ignoring line rank {} (cap {})", line.rank, self.cap);
            return false;
        }

        match self.lines.iter_mut().find(|l| l.rank == line.rank) {
            Some(existing) if *existing == line => return false,
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
        self.lines.sort_by_key(|l| l.rank);
        self.lines.truncate(self.cap);
        true
    }

    pub fn displays(&self) -> Vec<PvDisplay> {
        self.lines.iter().map(PvLine::display).collect()
    }
}

/// The opponent's reply at the head of a probe line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpponentResponse {
    pub rank: u32,
    pub from: String,
    pub to: String,
    pub san: String,
    pub is_capture: bool,
    pub is_check_or_mate: bool,
}

impl OpponentResponse {
    pub fn from_line(rank: u32, base: &GamePosition, first_move: &str) -> Option<Self> {
        match base.play(&MoveSpec::Uci(first_move.to_string())) {
            Ok((_, mv)) => Some(Self {
                rank,
                is_check_or_mate: mv.is_check_or_mate(),
                from: mv.from,
                to: mv.to,
                san: mv.san,
                is_capture: mv.is_capture,
            }),
            Err(e) => {
                log::warn!("Could not validate reply '{}' on {}: {}", first_move, base.fen(), e);
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseSet {
    cap: usize,
    responses: Vec<OpponentResponse>,
}

impl ResponseSet {
    pub fn with_cap(cap: usize) -> Self {
        Self { cap, responses: Vec::with_capacity(cap) }
    }

    pub fn responses(&self) -> &[OpponentResponse] {
        &self.responses
    }

    pub fn clear(&mut self) {
        self.responses.clear();
    }

    pub fn upsert(&mut self, response: OpponentResponse) -> bool {
        if response.rank == 0 || response.rank as usize > self.cap {
            return false;
        }
        match self.responses.iter_mut().find(|r| r.rank == response.rank) {
            Some(existing) if *existing == response => return false,
            Some(existing) => *existing = response,
            None => self.responses.push(response),
        }
        self.responses.sort_by_key(|r| r.rank);
        true
    }
}
